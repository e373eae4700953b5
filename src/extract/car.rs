//! Car-array extraction (motion, setups, damage, telemetry and status packets).
//!
//! Top-level scalars and corner arrays belong to the viewing car named by the header.
//! The per-driver list fans out to every registered driver. Every point of the packet
//! carries the viewing car's current lap; lap attribution does not vary per driver.

use super::{DropReason, Emitter, Rounding, nested_path};
use crate::context::{LapSnapshot, RaceContext};
use crate::types::{FieldValue, Packet, Record};
use crate::Result;

/// Decimal digits kept for the viewing car's corner arrays.
const CORNER_DIGITS: i32 = 6;

pub(crate) fn extract(
    packet: &Packet,
    context: &RaceContext,
    laps: &LapSnapshot,
    out: &mut Emitter<'_, '_>,
) -> Result<()> {
    let owner_index = packet.header.player_car_index;
    let owner = context.drivers.get(owner_index);
    let lap = laps.lap_or_zero(owner_index);

    for field in &packet.body {
        match (&field.value, owner) {
            (FieldValue::PerDriver(records), _) => {
                per_driver(&field.name, records, lap, context, out);
            }
            (FieldValue::Ignored, _) => {}
            (FieldValue::Scalar(_) | FieldValue::Corners(_), None) => {
                out.drop_field(&field.name, DropReason::UnregisteredOwner { car_index: owner_index });
            }
            (FieldValue::Scalar(value), Some(driver)) => {
                out.driver_scalar(&field.name, *value, lap, driver);
            }
            (FieldValue::Corners(corners), Some(driver)) => {
                out.driver_corners(&field.name, corners, lap, driver, Rounding::Digits(CORNER_DIGITS));
            }
            (other, _) => out.drop_value(&field.name, other),
        }
    }

    Ok(())
}

fn per_driver(list: &str, records: &[Record], lap: u32, context: &RaceContext, out: &mut Emitter<'_, '_>) {
    for (car_index, record) in records.iter().enumerate() {
        let Some(driver) = context.drivers.get(car_index) else {
            out.skip_driver(car_index);
            continue;
        };

        for field in record {
            match &field.value {
                FieldValue::Scalar(value) => out.driver_scalar(&field.name, *value, lap, driver),
                FieldValue::Corners(corners) => {
                    out.driver_corners(&field.name, corners, lap, driver, Rounding::None)
                }
                FieldValue::Ignored => {}
                other => out.drop_value(nested_path(list, car_index, &field.name), other),
            }
        }
    }
}
