//! Current lap numbers per car
//!
//! A [`LapSnapshot`] is an immutable view of every car's current lap at one point in
//! time. Whoever tracks laps publishes a new snapshot after each lap-data packet, and
//! every extraction call receives the snapshot it should attribute laps from. Sharing
//! the snapshot behind an `Arc` makes "write once per tick, read many" the only
//! possible access pattern.

use serde::{Deserialize, Serialize};

use crate::classify::PacketKind;
use crate::types::{FieldValue, Packet, Record};
use crate::{IngestError, Result};

/// Field of a lap-data record holding the car's current lap number.
pub const CURRENT_LAP_FIELD: &str = "current_lap_num";

/// Current lap number of every car, indexed by car index.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapSnapshot {
    laps: Vec<u32>,
}

impl LapSnapshot {
    pub fn new(laps: Vec<u32>) -> Self {
        Self { laps }
    }

    /// Current lap of a car, if known.
    pub fn lap_for(&self, car_index: usize) -> Option<u32> {
        self.laps.get(car_index).copied()
    }

    /// Current lap of a car, or lap 0 when no lap data has been seen for it yet.
    pub fn lap_or_zero(&self, car_index: usize) -> u32 {
        self.lap_for(car_index).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    /// Build the snapshot a lap-data packet describes (one entry per lap record).
    pub fn from_lap_packet(packet: &Packet) -> Result<Self> {
        if packet.kind != PacketKind::LapData {
            return Err(IngestError::Parse {
                context: "lap snapshot".to_string(),
                details: format!("expected a lap-data packet, found {}", packet.packet_type),
            });
        }

        let records = packet
            .body
            .iter()
            .find_map(|field| match &field.value {
                FieldValue::PerDriver(records) => Some(records),
                _ => None,
            })
            .ok_or_else(|| IngestError::field_not_found("lap_data", packet.packet_type.as_str()))?;

        let laps = records.iter().map(record_lap).collect::<Result<Vec<_>>>()?;
        Ok(Self { laps })
    }
}

/// Lap number embedded in a lap-data record.
pub(crate) fn record_lap(record: &Record) -> Result<u32> {
    let value = record
        .scalar(CURRENT_LAP_FIELD)
        .ok_or_else(|| IngestError::field_not_found(CURRENT_LAP_FIELD, "lap record"))?;

    value.as_u64().and_then(|lap| u32::try_from(lap).ok()).ok_or_else(|| {
        IngestError::TypeConversion { details: format!("{CURRENT_LAP_FIELD} {value} is not a lap number") }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PacketHeader, Scalar};

    fn lap_record(lap: i64) -> Record {
        Record::default().with("last_lap_time_in_ms", Scalar::Int(91_000)).with(CURRENT_LAP_FIELD, Scalar::Int(lap))
    }

    #[test]
    fn snapshot_follows_lap_records() {
        let packet = Packet::new(PacketKind::LapData, PacketHeader::new(0))
            .with("lap_data", FieldValue::PerDriver(vec![lap_record(3), lap_record(5)]));

        let snapshot = LapSnapshot::from_lap_packet(&packet).unwrap();
        assert_eq!(snapshot.lap_for(0), Some(3));
        assert_eq!(snapshot.lap_for(1), Some(5));
        assert_eq!(snapshot.lap_for(2), None);
        assert_eq!(snapshot.lap_or_zero(2), 0);
    }

    #[test]
    fn negative_lap_is_a_conversion_error() {
        let packet = Packet::new(PacketKind::LapData, PacketHeader::new(0))
            .with("lap_data", FieldValue::PerDriver(vec![lap_record(-1)]));

        assert!(matches!(LapSnapshot::from_lap_packet(&packet), Err(IngestError::TypeConversion { .. })));
    }

    #[test]
    fn record_without_lap_number_is_reported() {
        let packet = Packet::new(PacketKind::LapData, PacketHeader::new(0)).with(
            "lap_data",
            FieldValue::PerDriver(vec![Record::default().with("car_position", Scalar::Int(1))]),
        );

        assert!(matches!(LapSnapshot::from_lap_packet(&packet), Err(IngestError::FieldNotFound { .. })));
    }

    #[test]
    fn other_packet_kinds_are_rejected() {
        let packet = Packet::new(PacketKind::Session, PacketHeader::new(0));
        assert!(LapSnapshot::from_lap_packet(&packet).is_err());
    }
}
