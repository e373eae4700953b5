//! Session extraction.
//!
//! Session-wide values carry no driver or team, only the viewing car's current lap.

use super::{DropReason, Emitter, nested_path};
use crate::context::LapSnapshot;
use crate::types::{FieldValue, Packet};
use crate::Result;

/// Weather forecast table, never emitted regardless of its contents.
pub const WEATHER_FORECAST_FIELD: &str = "weather_forecast_samples";

pub(crate) fn extract(packet: &Packet, laps: &LapSnapshot, out: &mut Emitter<'_, '_>) -> Result<()> {
    let lap = laps.lap_or_zero(packet.header.player_car_index);

    for field in &packet.body {
        if field.name == WEATHER_FORECAST_FIELD {
            continue;
        }

        match &field.value {
            FieldValue::Scalar(value) => out.session_scalar(&field.name, *value, lap),
            FieldValue::Records(records) => {
                for (index, record) in records.iter().enumerate() {
                    for nested in record {
                        match &nested.value {
                            FieldValue::Scalar(value) => out.session_scalar(&nested.name, *value, lap),
                            FieldValue::Ignored => {}
                            other => out.drop_value(nested_path(&field.name, index, &nested.name), other),
                        }
                    }
                }
            }
            FieldValue::PerDriver(_) => out.drop_field(&field.name, DropReason::Unattributed),
            FieldValue::Ignored => {}
            other => out.drop_value(&field.name, other),
        }
    }

    Ok(())
}
