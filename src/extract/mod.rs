//! Packet flattening.
//!
//! The [`Flattener`] turns one decoded [`Packet`] into a sequence of [`Point`]s. The
//! packet's kind selects one of four extraction strategies:
//!
//! - [`Strategy::CarArray`]: scalars and corner arrays of the viewing car, plus one
//!   per-driver list of sub-records
//! - [`Strategy::LapData`]: per-driver lap records, each attributed to its own lap
//! - [`Strategy::Session`]: session-wide scalars and named record lists
//! - [`Strategy::SessionHistory`]: one driver's completed historical laps
//!
//! Extraction is a pure, synchronous transformation. It reads the [`RaceContext`] and the
//! [`LapSnapshot`] it is handed and nothing else.
//!
//! Fields that produce no point because of their shape are not silently lost: each one
//! is reported as a [`DroppedField`] and logged at `debug` level.
//!
//! ```rust
//! use std::sync::Arc;
//! use lapflux::{Driver, DriverRegistry, Flattener, LapSnapshot, PacketKind, RaceContext, Session};
//! use lapflux::types::{Corners, Packet, PacketHeader, Scalar};
//!
//! let context = RaceContext::new(
//!     Session::new("silverstone", 1, "race"),
//!     DriverRegistry::new(vec![Driver::new("HAMILTON", "Mercedes")]),
//! );
//! let flattener = Flattener::new(Arc::new(context));
//!
//! let packet = Packet::new(PacketKind::Motion, PacketHeader::new(0))
//!     .with("wheel_speed", Corners::from([80.1, 80.2, 80.3, 80.4]))
//!     .with("front_wheels_angle", Scalar::Float(0.02));
//!
//! let flattened = flattener.flatten(&packet, &LapSnapshot::new(vec![12])).unwrap();
//! assert_eq!(flattened.points.len(), 5);
//! assert!(flattened.points.iter().all(|p| p.measurement == "Motion"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

mod car;
mod history;
mod lap;
mod session;

pub use history::{CAR_INDEX_FIELD, LAP_TIME_FIELD, LapValidFlags};
pub use session::WEATHER_FORECAST_FIELD;

use crate::classify::{Strategy, measurement_name};
use crate::context::{Driver, LapSnapshot, RaceContext};
use crate::decode::Decoder;
use crate::point::{CORNER_TAG, Point, PointBuilder, TagValue};
use crate::types::{Corners, FieldValue, Packet, RawPacket, Scalar};
use crate::Result;

/// Why a field produced no point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum DropReason {
    /// A numeric list that is not a four-element corner array
    UnexpectedSequence { len: usize },
    /// Sub-records where this extractor only handles values
    UnexpectedRecords { len: usize },
    /// A corner array where this extractor has no per-wheel semantics
    UnexpectedCorners,
    /// A value with no numeric representation
    Unsupported { kind: String },
    /// The viewing car has no registered driver to attribute its fields to
    UnregisteredOwner { car_index: usize },
    /// A field outside the records this extractor attributes
    Unattributed,
}

impl DropReason {
    /// Reason for a value whose shape the current extractor cannot emit.
    pub fn for_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Sequence(values) => DropReason::UnexpectedSequence { len: values.len() },
            FieldValue::PerDriver(records)
            | FieldValue::Records(records)
            | FieldValue::LapHistory(records) => DropReason::UnexpectedRecords { len: records.len() },
            FieldValue::Corners(_) => DropReason::UnexpectedCorners,
            other => DropReason::Unsupported { kind: other.shape_name().to_string() },
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::UnexpectedSequence { len } => write!(f, "sequence of {len} values"),
            DropReason::UnexpectedRecords { len } => write!(f, "list of {len} records"),
            DropReason::UnexpectedCorners => f.write_str("corner array"),
            DropReason::Unsupported { kind } => write!(f, "unsupported {kind}"),
            DropReason::UnregisteredOwner { car_index } => {
                write!(f, "car {car_index} has no registered driver")
            }
            DropReason::Unattributed => f.write_str("no driver or session attribution"),
        }
    }
}

/// A field that produced no point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DroppedField {
    /// Field path, e.g. `car_telemetry_data[3].surface_type`
    pub path: String,
    pub reason: DropReason,
}

/// Outcome of flattening one packet, apart from the points themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenReport {
    pub measurement: String,
    /// Number of points emitted
    pub emitted: usize,
    pub dropped: Vec<DroppedField>,
    /// Sub-records (or addressed cars) skipped for lack of a registered driver
    pub skipped_drivers: usize,
}

/// Points derived from one packet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    pub points: Vec<Point>,
    pub report: FlattenReport,
}

/// Flattens decoded packets against a race context.
#[derive(Debug, Clone)]
pub struct Flattener {
    context: Arc<RaceContext>,
    decoder: Decoder,
}

impl Flattener {
    pub fn new(context: Arc<RaceContext>) -> Self {
        Self { context, decoder: Decoder::new() }
    }

    /// Use a decoder with custom schemas for [`flatten_raw`](Self::flatten_raw).
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn context(&self) -> &Arc<RaceContext> {
        &self.context
    }

    /// Replace the race context (e.g. after the driver list changed).
    pub fn set_context(&mut self, context: Arc<RaceContext>) {
        self.context = context;
    }

    /// Flatten one packet into points.
    pub fn flatten(&self, packet: &Packet, laps: &LapSnapshot) -> Result<Flattened> {
        let mut points = Vec::new();
        let report = self.flatten_with(packet, laps, &mut |point| points.push(point))?;
        Ok(Flattened { points, report })
    }

    /// Decode, classify and flatten a raw packet.
    pub fn flatten_raw(&self, raw: &RawPacket, laps: &LapSnapshot) -> Result<Flattened> {
        let packet = self.decoder.decode(raw)?;
        self.flatten(&packet, laps)
    }

    /// Flatten one packet, handing every point to `sink` as it is built.
    ///
    /// On error, points already handed over stay with the sink.
    pub fn flatten_with(
        &self,
        packet: &Packet,
        laps: &LapSnapshot,
        sink: &mut dyn FnMut(Point),
    ) -> Result<FlattenReport> {
        let measurement = measurement_name(&packet.packet_type);
        let context = self.context.as_ref();
        let mut emitter = Emitter::new(PointBuilder::new(&context.session, &measurement), sink);

        match packet.kind.strategy() {
            Strategy::CarArray => car::extract(packet, context, laps, &mut emitter)?,
            Strategy::LapData => lap::extract(packet, context, &mut emitter)?,
            Strategy::Session => session::extract(packet, laps, &mut emitter)?,
            Strategy::SessionHistory => history::extract(packet, context, laps, &mut emitter)?,
        }

        let report = emitter.into_report();
        trace!(
            packet_type = %packet.packet_type,
            points = report.emitted,
            dropped = report.dropped.len(),
            skipped_drivers = report.skipped_drivers,
            "Flattened packet"
        );
        Ok(report)
    }
}

/// Rounding applied to corner-array values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rounding {
    None,
    Digits(i32),
}

/// Collects the points and diagnostics of one extraction.
pub(crate) struct Emitter<'s, 'f> {
    builder: PointBuilder<'s>,
    sink: &'f mut dyn FnMut(Point),
    emitted: usize,
    dropped: Vec<DroppedField>,
    skipped_drivers: usize,
}

impl<'s, 'f> Emitter<'s, 'f> {
    fn new(builder: PointBuilder<'s>, sink: &'f mut dyn FnMut(Point)) -> Self {
        Self { builder, sink, emitted: 0, dropped: Vec::new(), skipped_drivers: 0 }
    }

    fn emit(&mut self, point: Point) {
        self.emitted += 1;
        (self.sink)(point);
    }

    /// One point attributed to a driver.
    pub(crate) fn driver_scalar(&mut self, key: &str, value: Scalar, lap: u32, driver: &Driver) {
        let point = self.builder.for_driver(key, value, lap, driver, &[]);
        self.emit(point);
    }

    /// Four corner-tagged points attributed to a driver.
    pub(crate) fn driver_corners(
        &mut self,
        key: &str,
        corners: &Corners,
        lap: u32,
        driver: &Driver,
        rounding: Rounding,
    ) {
        for (corner, value) in corners.iter() {
            let value = match rounding {
                Rounding::None => value,
                Rounding::Digits(digits) => value.rounded(digits),
            };
            let tags = [(CORNER_TAG, TagValue::from(corner.as_str()))];
            let point = self.builder.for_driver(key, value, lap, driver, &tags);
            self.emit(point);
        }
    }

    /// One session-wide point without driver or team.
    pub(crate) fn session_scalar(&mut self, key: &str, value: Scalar, lap: u32) {
        let point = self.builder.build(key, value, lap, None, None, &[]);
        self.emit(point);
    }

    pub(crate) fn drop_field(&mut self, path: impl Into<String>, reason: DropReason) {
        let path = path.into();
        debug!(measurement = self.builder.measurement(), %path, %reason, "Dropped field");
        self.dropped.push(DroppedField { path, reason });
    }

    /// Drop a field because of its value's shape.
    pub(crate) fn drop_value(&mut self, path: impl Into<String>, value: &FieldValue) {
        self.drop_field(path, DropReason::for_value(value));
    }

    pub(crate) fn skip_driver(&mut self, car_index: usize) {
        trace!(measurement = self.builder.measurement(), car_index, "No registered driver");
        self.skipped_drivers += 1;
    }

    fn into_report(self) -> FlattenReport {
        FlattenReport {
            measurement: self.builder.measurement().to_string(),
            emitted: self.emitted,
            dropped: self.dropped,
            skipped_drivers: self.skipped_drivers,
        }
    }
}

/// Path of a field inside the `index`-th record of list `list`.
pub(crate) fn nested_path(list: &str, index: usize, field: &str) -> String {
    format!("{list}[{index}].{field}")
}
