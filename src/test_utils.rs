//! Test utilities: fixture builders and test data access
//!
//! Packet builders produce the shapes the extraction tests and benchmarks rely on, and
//! the path helpers locate recorded captures under `test-data/`.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::classify::PacketKind;
use crate::context::{CURRENT_LAP_FIELD, Driver, DriverRegistry, RaceContext, Session};
use crate::types::{Corners, FieldValue, Packet, PacketHeader, Record, Scalar};

/// Guidance shown when capture fixtures are missing from the repository checkout.
pub const FIXTURE_INSTALL_GUIDANCE: &str =
    "Telemetry captures are stored under test-data/captures. Make sure the directory was checked out.";

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl FixtureError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// Install a `fmt` subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The `test-data` directory of this crate.
pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Require that a specific fixture exists on disk.
pub fn require_fixture<P: AsRef<Path>>(path: P) -> Result<PathBuf, FixtureError> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        Ok(path_ref.to_path_buf())
    } else {
        Err(FixtureError::new(format!(
            "Missing telemetry fixture: {}. {}",
            path_ref.display(),
            FIXTURE_INSTALL_GUIDANCE
        )))
    }
}

/// Require a recorded capture in `test-data/captures` by file name.
pub fn require_capture(file_name: &str) -> Result<PathBuf, FixtureError> {
    require_fixture(test_data_dir().join("captures").join(file_name))
}

/// Race context at a fixed session with drivers `DRIVER_0..DRIVER_{n-1}` of teams
/// `Team 0..Team {n-1}`.
pub fn context_with_drivers(drivers: usize) -> RaceContext {
    RaceContext::new(
        Session::new("silverstone", 8_675_309, "race"),
        (0..drivers).map(|i| Driver::new(format!("DRIVER_{i}"), format!("Team {i}"))).collect::<DriverRegistry>(),
    )
}

/// A lap record of `fields` scalar fields, the first being the current lap number.
pub fn lap_record(lap: i64, fields: usize) -> Record {
    (1..fields).fold(Record::default().with(CURRENT_LAP_FIELD, Scalar::Int(lap)), |record, i| {
        record.with(format!("lap_field_{i}"), Scalar::Int(i as i64 * 1_000))
    })
}

/// A lap-data packet of `records` lap records with `fields` fields each.
pub fn lap_data_packet(records: usize, fields: usize) -> Packet {
    let records = (0..records).map(|i| lap_record(i as i64 + 1, fields)).collect();
    Packet::new(PacketKind::LapData, PacketHeader::new(0)).with("lap_data", FieldValue::PerDriver(records))
}

/// A car-array packet of the given kind with `records` per-driver records, each holding
/// three scalars and two corner arrays.
pub fn car_packet(kind: PacketKind, records: usize) -> Packet {
    let records = (0..records)
        .map(|i| {
            Record::default()
                .with("speed", Scalar::Int(280 + i as i64))
                .with("throttle", Scalar::Float(0.98))
                .with("drs", Scalar::Bool(i % 2 == 0))
                .with("tyres_pressure", Corners::from([22.1, 22.3, 23.0, 23.1]))
                .with("brakes_temperature", Corners::from([410, 415, 520, 522]))
        })
        .collect();
    Packet::new(kind, PacketHeader::new(0)).with("car_data", FieldValue::PerDriver(records))
}

/// A historical lap record with five fields.
pub fn history_lap(lap_time_in_ms: i64, valid_flags: i64) -> Record {
    Record::default()
        .with("lap_time_in_ms", Scalar::Int(lap_time_in_ms))
        .with("sector1_time_in_ms", Scalar::Int(lap_time_in_ms / 3))
        .with("sector2_time_in_ms", Scalar::Int(lap_time_in_ms / 3))
        .with("sector3_time_in_ms", Scalar::Int(lap_time_in_ms - 2 * (lap_time_in_ms / 3)))
        .with("lap_valid_bit_flags", Scalar::Int(valid_flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_inside_the_crate() {
        assert!(test_data_dir().ends_with("test-data"));
    }

    #[test]
    fn fixture_builders_have_documented_shapes() {
        assert_eq!(lap_record(3, 8).len(), 8);
        assert_eq!(lap_record(3, 1).scalar(CURRENT_LAP_FIELD), Some(Scalar::Int(3)));
        assert_eq!(history_lap(90_000, 1).len(), 5);
        assert_eq!(context_with_drivers(4).drivers.len(), 4);
    }

    #[test]
    fn test_require_fixture_errors_when_missing() {
        let result = require_fixture(Path::new("test-data/__missing_fixture"));
        assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Missing telemetry fixture"));
    }
}
