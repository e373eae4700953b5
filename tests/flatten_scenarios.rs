//! End-to-end flattening scenarios through the public API
//!
//! Packets are built from structured YAML records, the same way the upstream decoder
//! hands them over, and flattened with the built-in schemas.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use lapflux::{
    Decoder, DropReason, Driver, DriverRegistry, Flattener, IngestError, LapSnapshot, Point, RaceContext, RawPacket,
    Session, classify,
};

fn context(drivers: usize) -> Arc<RaceContext> {
    let registry: DriverRegistry =
        (0..drivers).map(|i| Driver::new(format!("DRIVER_{i}"), format!("Team {}", i / 2))).collect();
    Arc::new(RaceContext::new(Session::new("austria", 4_821_337, "race"), registry))
}

/// Lap-data packet with `cars` records of eight fields each.
fn lap_packet(cars: usize) -> Result<RawPacket> {
    let mut yaml = String::from("header: { player_car_index: 0 }\nlap_data:\n");
    for car in 0..cars {
        writeln!(
            yaml,
            "  - {{ last_lap_time_in_ms: 67012, current_lap_time_in_ms: 1200, sector1_time_in_ms: 0, \
             lap_distance: 12.5, car_position: {}, current_lap_num: {}, pit_status: 0, driver_status: 1 }}",
            car + 1,
            car % 5 + 1
        )?;
    }
    Ok(RawPacket::from_yaml("PacketLapData", &yaml)?)
}

/// Telemetry packet with `cars` records of five fields, two of them corner arrays.
fn telemetry_packet(cars: usize, top_level: &str) -> Result<RawPacket> {
    let mut yaml = String::from("header: { player_car_index: 0 }\ncar_telemetry_data:\n");
    for car in 0..cars {
        writeln!(
            yaml,
            "  - {{ speed: {}, gear: 7, drs: 0, brakes_temperature: [500, 501, 600, 601], \
             tyres_pressure: [22.1, 22.2, 23.1, 23.2] }}",
            250 + car
        )?;
    }
    yaml.push_str(top_level);
    Ok(RawPacket::from_yaml("PacketCarTelemetryData", &yaml)?)
}

fn by_driver(points: &[Point]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for point in points {
        *counts.entry(point.tag_str("driver_name").unwrap_or_default()).or_default() += 1;
    }
    counts
}

#[test]
fn lap_packet_with_sixty_records_against_twenty_drivers() -> Result<()> {
    let flattener = Flattener::new(context(20));
    let flattened = flattener.flatten_raw(&lap_packet(60)?, &LapSnapshot::default())?;

    assert_eq!(flattened.points.len(), 160);
    assert_eq!(flattened.report.skipped_drivers, 40);

    let counts = by_driver(&flattened.points);
    assert_eq!(counts.len(), 20);
    assert!(counts.values().all(|&n| n == 8));
    assert!(!counts.contains_key("DRIVER_20"));
    Ok(())
}

#[test]
fn telemetry_packet_fans_out_per_driver() -> Result<()> {
    let flattener = Flattener::new(context(15));
    let raw = telemetry_packet(15, "mfd_panel_index: 255\nsuggested_gear: 0\n")?;
    let flattened = flattener.flatten_raw(&raw, &LapSnapshot::new(vec![9; 15]))?;

    // 15 drivers x (3 scalars + 2 x 4 corners), plus two top-level scalars of car 0
    assert_eq!(flattened.points.len(), 165 + 2);
    assert!(flattened.report.dropped.is_empty());

    let counts = by_driver(&flattened.points);
    assert_eq!(counts["DRIVER_0"], 11 + 2);
    assert!((1..15).all(|i| counts[&format!("DRIVER_{i}")] == 11));

    let corners: HashSet<_> = flattened
        .points
        .iter()
        .filter(|p| p.field_key == "tyres_pressure" && p.tag_str("driver_name").as_deref() == Some("DRIVER_3"))
        .filter_map(|p| p.tag_str("corner"))
        .collect();
    assert_eq!(corners, HashSet::from(["rear_left", "rear_right", "front_left", "front_right"].map(String::from)));
    Ok(())
}

#[test]
fn undeclared_four_element_list_is_not_a_corner_array() -> Result<()> {
    let flattener = Flattener::new(context(1));
    let raw = telemetry_packet(1, "rev_lights_percent: [10, 20, 30, 40]\n")?;
    let flattened = flattener.flatten_raw(&raw, &LapSnapshot::default())?;

    assert_eq!(flattened.points.len(), 11);
    assert!(flattened.points.iter().all(|p| p.field_key != "rev_lights_percent"));
    assert_eq!(flattened.report.dropped.len(), 1);
    assert_eq!(flattened.report.dropped[0].path, "rev_lights_percent");
    Ok(())
}

#[test]
fn empty_corner_array_is_reported_as_an_empty_sequence() -> Result<()> {
    let raw = RawPacket::from_yaml("PacketMotionData", "header: { player_car_index: 0 }\nwheel_speed: []\n")?;
    let flattened = Flattener::new(context(1)).flatten_raw(&raw, &LapSnapshot::default())?;

    assert!(flattened.points.is_empty());
    assert_eq!(flattened.report.dropped.len(), 1);
    assert_eq!(flattened.report.dropped[0].path, "wheel_speed");
    assert_eq!(flattened.report.dropped[0].reason, DropReason::UnexpectedSequence { len: 0 });
    Ok(())
}

#[test]
fn session_packet_skips_forecast() -> Result<()> {
    let raw = RawPacket::from_yaml(
        "PacketSessionData",
        r#"
header: { player_car_index: 1 }
track_temperature: 31
marshal_zones:
  - { zone_start: 0.1, zone_flag: 0 }
weather_forecast_samples:
  - { time_offset: 0, weather: 2, track_temperature: 30 }
  - { time_offset: 5, weather: 3, track_temperature: 29 }
"#,
    )?;

    let flattened = Flattener::new(context(2)).flatten_raw(&raw, &LapSnapshot::new(vec![4, 7]))?;
    let keys: Vec<_> = flattened.points.iter().map(|p| p.field_key.as_str()).collect();
    assert_eq!(keys, ["track_temperature", "zone_start", "zone_flag"]);
    assert!(flattened.points.iter().all(|p| p.tag_str("lap").as_deref() == Some("7")));
    Ok(())
}

#[test]
fn history_packet_expands_completed_laps_only() -> Result<()> {
    let raw = RawPacket::from_yaml(
        "PacketSessionHistoryData",
        r#"
header: { player_car_index: 0 }
car_idx: 1
num_laps: 2
lap_history_data:
  - { lap_time_in_ms: 67811, sector1_time_in_ms: 17102, lap_valid_bit_flags: 15 }
  - { lap_time_in_ms: 0, sector1_time_in_ms: 0, lap_valid_bit_flags: 0 }
"#,
    )?;

    let flattened = Flattener::new(context(2)).flatten_raw(&raw, &LapSnapshot::new(vec![3, 2]))?;
    assert_eq!(flattened.points.len(), 2 + 3);
    assert!(flattened.points.iter().all(|p| p.tag_str("driver_name").as_deref() == Some("DRIVER_1")));
    assert!(flattened.points.iter().all(|p| p.tag_str("lap").as_deref() == Some("2")));
    Ok(())
}

#[test]
fn unrecognized_packet_types_are_errors() {
    assert!(matches!(classify("PacketParticipantsData"), Err(IngestError::UnrecognizedPacketType { .. })));

    let raw = RawPacket::from_yaml("PacketFinalClassificationData", "header: { player_car_index: 0 }")
        .expect("valid yaml");
    let result = Flattener::new(context(1)).flatten_raw(&raw, &LapSnapshot::default());
    assert!(matches!(result, Err(IngestError::UnrecognizedPacketType { .. })));
}

#[test]
fn lap_snapshot_follows_lap_packets() -> Result<()> {
    let packet = Decoder::new().decode(&lap_packet(7)?)?;
    let snapshot = LapSnapshot::from_lap_packet(&packet)?;

    assert_eq!(snapshot.len(), 7);
    assert_eq!(snapshot.lap_for(0), Some(1));
    assert_eq!(snapshot.lap_for(6), Some(2));
    assert_eq!(snapshot.lap_or_zero(30), 0);
    Ok(())
}
