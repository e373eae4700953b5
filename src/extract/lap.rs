//! Lap-data extraction.
//!
//! Every field of every registered driver's lap record becomes one point, attributed to
//! the lap number embedded in that same record rather than the external snapshot. The
//! lap-number field itself is emitted like any other field.

use super::{DropReason, Emitter, nested_path};
use crate::context::RaceContext;
use crate::context::laps::record_lap;
use crate::types::{FieldValue, Packet};
use crate::Result;

pub(crate) fn extract(packet: &Packet, context: &RaceContext, out: &mut Emitter<'_, '_>) -> Result<()> {
    for field in &packet.body {
        let records = match &field.value {
            FieldValue::PerDriver(records) => records,
            FieldValue::Ignored => continue,
            _ => {
                out.drop_field(&field.name, DropReason::Unattributed);
                continue;
            }
        };

        for (car_index, record) in records.iter().enumerate() {
            let Some(driver) = context.drivers.get(car_index) else {
                out.skip_driver(car_index);
                continue;
            };
            let lap = record_lap(record)?;

            for lap_field in record {
                match &lap_field.value {
                    FieldValue::Scalar(value) => out.driver_scalar(&lap_field.name, *value, lap, driver),
                    FieldValue::Ignored => {}
                    other => out.drop_value(nested_path(&field.name, car_index, &lap_field.name), other),
                }
            }
        }
    }

    Ok(())
}
