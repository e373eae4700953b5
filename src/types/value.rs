//! Decoded packet field values

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Record;

/// A single numeric telemetry value.
///
/// Values are passed through to points untouched; the flattener never validates or
/// converts between variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    /// Only used for values that do not fit `i64` (e.g. session UIDs)
    UInt(u64),
    Float(f64),
}

impl Scalar {
    /// Round floats to `digits` decimal places. Integers and booleans are returned as-is.
    pub fn rounded(self, digits: i32) -> Self {
        match self {
            // Decimal formatting rounds the exact binary value
            Scalar::Float(v) => match usize::try_from(digits) {
                Ok(precision) => Scalar::Float(format!("{v:.precision$}").parse().unwrap_or(v)),
                Err(_) => Scalar::Float(v),
            },
            other => other,
        }
    }

    /// Interpret this value as a non-negative integer (lap numbers, car indices).
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Scalar::Int(v) => u64::try_from(v).ok(),
            Scalar::UInt(v) => Some(v),
            Scalar::Float(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
                Some(v as u64)
            }
            Scalar::Float(_) | Scalar::Bool(_) => None,
        }
    }

    /// Returns `true` for a numeric zero (used for "no data" sentinels).
    pub fn is_zero(self) -> bool {
        match self {
            Scalar::Int(v) => v == 0,
            Scalar::UInt(v) => v == 0,
            Scalar::Float(v) => v == 0.0,
            Scalar::Bool(v) => !v,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Scalar::Int(v),
            Err(_) => Scalar::UInt(v),
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v.into())
    }
}

/// One of the four wheel positions used to fan out per-wheel quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    RearLeft,
    RearRight,
    FrontLeft,
    FrontRight,
}

impl Corner {
    /// Wire order of per-wheel arrays in the game's packets.
    pub const ALL: [Corner; 4] =
        [Corner::RearLeft, Corner::RearRight, Corner::FrontLeft, Corner::FrontRight];

    /// Tag value for this corner.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Corner::RearLeft => "rear_left",
            Corner::RearRight => "rear_right",
            Corner::FrontLeft => "front_left",
            Corner::FrontRight => "front_right",
        }
    }
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quantity measured at each of the four wheels, in [`Corner::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corners(pub [Scalar; 4]);

impl Corners {
    /// Pair every value with its wheel position.
    pub fn iter(&self) -> impl Iterator<Item = (Corner, Scalar)> + '_ {
        Corner::ALL.into_iter().zip(self.0.iter().copied())
    }

    /// Value at a single corner.
    pub fn get(&self, corner: Corner) -> Scalar {
        self.0[corner as usize]
    }
}

impl<T: Into<Scalar>> From<[T; 4]> for Corners {
    fn from(values: [T; 4]) -> Self {
        Corners(values.map(Into::into))
    }
}

/// Decoded value of a packet field.
///
/// The variant is chosen once, when the structured record is decoded against its
/// [`PacketSchema`](super::PacketSchema). Extractors dispatch on the variant and never
/// inspect sequence lengths, so a four-element list that is not a declared corner
/// array can never be mistaken for one.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain number or boolean
    Scalar(Scalar),
    /// Per-wheel array
    Corners(Corners),
    /// One sub-record per car, indexed by car index
    PerDriver(Vec<Record>),
    /// Named list of sub-records without a per-driver dimension
    Records(Vec<Record>),
    /// A driver's historical per-lap records
    LapHistory(Vec<Record>),
    /// Declared as never emitted
    Ignored,
    /// Numeric list that is not a declared corner array
    Sequence(Vec<Scalar>),
    /// Strings, nulls, nested mappings or mixed lists
    Unsupported { kind: &'static str },
}

impl FieldValue {
    /// Short description of the value's shape, for diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Corners(_) => "corner array",
            FieldValue::PerDriver(_) => "per-driver list",
            FieldValue::Records(_) => "record list",
            FieldValue::LapHistory(_) => "lap history",
            FieldValue::Ignored => "ignored",
            FieldValue::Sequence(_) => "sequence",
            FieldValue::Unsupported { kind } => kind,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            FieldValue::Scalar(s) => Some(*s),
            _ => None,
        }
    }
}

impl From<Scalar> for FieldValue {
    fn from(v: Scalar) -> Self {
        FieldValue::Scalar(v)
    }
}

impl From<Corners> for FieldValue {
    fn from(v: Corners) -> Self {
        FieldValue::Corners(v)
    }
}
