//! Session-history extraction.
//!
//! A session-history packet describes one car, addressed by its `car_idx` field. All of
//! its points carry that car's driver and current lap from the snapshot, never the lap a
//! historical record describes.

use serde::{Deserialize, Serialize};

use super::{Emitter, nested_path};
use crate::context::{Driver, LapSnapshot, RaceContext};
use crate::types::{FieldValue, Packet, Record};
use crate::{IngestError, Result};

/// Field addressing the car a history packet describes.
pub const CAR_INDEX_FIELD: &str = "car_idx";

/// Lap time of a historical lap record; zero marks a lap without data.
pub const LAP_TIME_FIELD: &str = "lap_time_in_ms";

/// Validity bits of a historical lap (`lap_valid_bit_flags`).
///
/// Points carry the raw integer; this type is for consumers that need to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapValidFlags(pub u8);

impl LapValidFlags {
    pub const LAP: u8 = 0x01;
    pub const SECTOR_1: u8 = 0x02;
    pub const SECTOR_2: u8 = 0x04;
    pub const SECTOR_3: u8 = 0x08;

    pub fn lap_valid(self) -> bool {
        self.0 & Self::LAP != 0
    }

    /// Validity of sector 1, 2 or 3. Other sector numbers are never valid.
    pub fn sector_valid(self, sector: u8) -> bool {
        match sector {
            1 => self.0 & Self::SECTOR_1 != 0,
            2 => self.0 & Self::SECTOR_2 != 0,
            3 => self.0 & Self::SECTOR_3 != 0,
            _ => false,
        }
    }
}

pub(crate) fn extract(
    packet: &Packet,
    context: &RaceContext,
    laps: &LapSnapshot,
    out: &mut Emitter<'_, '_>,
) -> Result<()> {
    let car_index = addressed_car(packet)?;
    let Some(driver) = context.drivers.get(car_index) else {
        out.skip_driver(car_index);
        return Ok(());
    };
    let lap = laps.lap_or_zero(car_index);

    for field in &packet.body {
        match &field.value {
            FieldValue::Scalar(value) => out.driver_scalar(&field.name, *value, lap, driver),
            FieldValue::LapHistory(records) => {
                for (index, record) in records.iter().enumerate() {
                    if !has_lap_time(record)? {
                        continue;
                    }
                    emit_record(&field.name, index, record, lap, driver, out);
                }
            }
            FieldValue::Records(records) => {
                for (index, record) in records.iter().enumerate() {
                    emit_record(&field.name, index, record, lap, driver, out);
                }
            }
            FieldValue::Ignored => {}
            other => out.drop_value(&field.name, other),
        }
    }

    Ok(())
}

fn addressed_car(packet: &Packet) -> Result<usize> {
    let value = packet
        .body
        .scalar(CAR_INDEX_FIELD)
        .ok_or_else(|| IngestError::field_not_found(CAR_INDEX_FIELD, packet.packet_type.as_str()))?;

    value.as_u64().and_then(|index| usize::try_from(index).ok()).ok_or_else(|| {
        IngestError::TypeConversion { details: format!("{CAR_INDEX_FIELD} {value} is not a car index") }
    })
}

fn has_lap_time(record: &Record) -> Result<bool> {
    let lap_time = record
        .scalar(LAP_TIME_FIELD)
        .ok_or_else(|| IngestError::field_not_found(LAP_TIME_FIELD, "lap history record"))?;
    Ok(!lap_time.is_zero())
}

fn emit_record(
    list: &str,
    index: usize,
    record: &Record,
    lap: u32,
    driver: &Driver,
    out: &mut Emitter<'_, '_>,
) {
    for field in record {
        match &field.value {
            FieldValue::Scalar(value) => out.driver_scalar(&field.name, *value, lap, driver),
            FieldValue::Ignored => {}
            other => out.drop_value(nested_path(list, index, &field.name), other),
        }
    }
}
