//! Packet schema descriptors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::classify::{PacketKind, Strategy};

/// Declared shape of a packet field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FieldShape {
    /// Plain number or boolean
    Scalar,
    /// Four-element per-wheel array
    Corners,
    /// List of sub-records indexed by car index
    PerDriver,
    /// Named list of sub-records
    Records,
    /// List of historical per-lap records
    LapHistory,
    /// Never emitted
    Ignored,
}

/// Explicit field layout of one packet kind.
///
/// Names are matched at every nesting level: a declared corner array inside a
/// per-driver sub-record is found by its own name. Fields that are not declared are
/// decoded by inference (see [`crate::decode`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketSchema {
    pub kind: PacketKind,
    /// Map of field names to their declared shape (O(1) lookup)
    pub fields: HashMap<String, FieldShape>,
}

impl PacketSchema {
    /// Create a new PacketSchema with validation.
    pub fn new(kind: PacketKind, fields: HashMap<String, FieldShape>) -> crate::Result<Self> {
        let schema = Self { kind, fields };
        schema.validate()?;
        Ok(schema)
    }

    /// Validate the schema can drive its kind's extraction strategy.
    pub fn validate(&self) -> crate::Result<()> {
        let per_driver = self.count(FieldShape::PerDriver);
        if per_driver > 1 {
            return Err(crate::IngestError::schema_validation_error(format!(
                "{} declares {} per-driver lists, at most one is allowed",
                self.kind.type_name(),
                per_driver
            )));
        }

        match self.kind.strategy() {
            Strategy::LapData if per_driver == 0 => {
                Err(crate::IngestError::schema_validation_error(format!(
                    "{} must declare its per-driver lap list",
                    self.kind.type_name()
                )))
            }
            Strategy::SessionHistory if self.count(FieldShape::LapHistory) == 0 => {
                Err(crate::IngestError::schema_validation_error(format!(
                    "{} must declare its lap history field",
                    self.kind.type_name()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Declared shape of a field, if any.
    pub fn shape_of(&self, name: &str) -> Option<FieldShape> {
        self.fields.get(name).copied()
    }

    fn count(&self, shape: FieldShape) -> usize {
        self.fields.values().filter(|s| **s == shape).count()
    }

    /// Built-in layout of the F1 2021 packet formats.
    pub fn builtin(kind: PacketKind) -> Self {
        use FieldShape::*;

        let declared: &[(&str, FieldShape)] = match kind {
            PacketKind::Motion => &[
                ("car_motion_data", PerDriver),
                ("suspension_position", Corners),
                ("suspension_velocity", Corners),
                ("suspension_acceleration", Corners),
                ("wheel_speed", Corners),
                ("wheel_slip", Corners),
            ],
            PacketKind::CarSetups => &[("car_setups", PerDriver)],
            PacketKind::CarDamage => &[
                ("car_damage_data", PerDriver),
                ("tyres_wear", Corners),
                ("tyres_damage", Corners),
                ("brakes_damage", Corners),
            ],
            PacketKind::CarTelemetry => &[
                ("car_telemetry_data", PerDriver),
                ("brakes_temperature", Corners),
                ("tyres_surface_temperature", Corners),
                ("tyres_inner_temperature", Corners),
                ("tyres_pressure", Corners),
                ("surface_type", Corners),
            ],
            PacketKind::CarStatus => &[("car_status_data", PerDriver)],
            PacketKind::LapData => &[("lap_data", PerDriver)],
            PacketKind::Session => {
                &[("marshal_zones", Records), ("weather_forecast_samples", Ignored)]
            }
            PacketKind::SessionHistory => {
                &[("lap_history_data", LapHistory), ("tyre_stints_history_data", Records)]
            }
        };

        let fields = declared.iter().map(|(name, shape)| (name.to_string(), *shape)).collect();
        Self { kind, fields }
    }
}
