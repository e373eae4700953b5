//! Flattens racing-simulation telemetry packets into tagged time-series points.
//!
//! Lapflux takes the structured packets an F1 telemetry decoder produces (per-car
//! physics, per-lap timing, session metadata, historical laps) and turns each one into a
//! flat sequence of [`Point`]s with a consistent tag vocabulary, ready for a metrics
//! database such as InfluxDB.
//!
//! # Features
//!
//! - **Explicit schemas**: field shapes (scalar, corner array, per-driver list, ...) are
//!   fixed once at decode time by a [`PacketSchema`], never guessed from list lengths
//! - **Pure core**: [`Flattener`] is synchronous and side-effect free; current laps arrive
//!   as an immutable [`LapSnapshot`] per call
//! - **Visible drops**: every field that yields no point is reported as a [`DroppedField`]
//! - **Async glue**: a tokio [`Pipeline`] connects a [`PacketSource`] to a [`PointSink`]
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use lapflux::{Flattener, LapSnapshot, RaceContext, RawPacket};
//!
//! let context = RaceContext::parse(r#"
//! Session: { Circuit: austria, SessionLinkIdentifier: 99, SessionType: race }
//! Drivers:
//!   - { Name: VERSTAPPEN, Team: Red Bull Racing }
//! "#)?;
//!
//! let raw = RawPacket::from_yaml("PacketLapData", r#"
//! header: { player_car_index: 0 }
//! lap_data:
//!   - { current_lap_num: 3, car_position: 1, last_lap_time_in_ms: 67012 }
//! "#)?;
//!
//! let flattener = Flattener::new(Arc::new(context));
//! let flattened = flattener.flatten_raw(&raw, &LapSnapshot::default())?;
//!
//! assert_eq!(flattened.points.len(), 3);
//! for point in &flattened.points {
//!     println!("{}", point.line_protocol());
//! }
//! # Ok::<(), lapflux::IngestError>(())
//! ```

// Core types and error handling
pub mod classify;
pub mod context;
pub mod decode;
mod error;
pub mod extract;
pub mod point;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Ingestion glue
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod sources;

// Core exports
pub use classify::{PacketKind, Strategy, classify, measurement_name};
pub use context::{CURRENT_LAP_FIELD, Driver, DriverRegistry, LapSnapshot, RaceContext, Session};
pub use decode::{Decoder, decode_packet, decode_with_schema};
pub use error::*;
pub use extract::{DropReason, DroppedField, FlattenReport, Flattened, Flattener, LapValidFlags};
pub use point::{LineProtocol, Point, PointBuilder, TagValue};
pub use types::*;

// Glue exports
pub use pipeline::{IngestStats, Pipeline, PipelineConfig, PipelineHandle};
pub use sink::{LineProtocolSink, MemorySink, PointSink};
pub use source::PacketSource;
pub use sources::{ChannelSource, ReplaySource};

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Unified entry point for ingestion.
///
/// # Examples
///
/// ## Capture Replay
/// ```rust,no_run
/// use lapflux::{Lapflux, LineProtocolSink, RaceContext};
///
/// #[tokio::main]
/// async fn main() -> lapflux::Result<()> {
///     let context = RaceContext::from_path("context.yaml")?;
///     let source = Lapflux::open("capture.yaml")?;
///
///     let (_context_tx, handle) = Lapflux::ingest(source, context, LineProtocolSink::new(std::io::stdout()));
///     let stats = handle.join().await?;
///     eprintln!("{} points, {} dropped fields", stats.points, stats.dropped_fields);
///     Ok(())
/// }
/// ```
///
/// ## Live Feed
/// ```rust,no_run
/// use lapflux::{Lapflux, MemorySink, RaceContext};
///
/// # #[tokio::main]
/// # async fn main() -> lapflux::Result<()> {
/// let (packets, source) = Lapflux::listen(256);
/// let (context_tx, handle) = Lapflux::ingest(source, RaceContext::default(), MemorySink::new());
/// // Hand `packets` to the wire decoder, publish contexts on `context_tx`...
/// # drop((packets, context_tx));
/// # handle.join().await?;
/// # Ok(())
/// # }
/// ```
pub struct Lapflux;

impl Lapflux {
    /// Open a recorded capture for replay.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File does not exist or is not readable
    /// - A document is not a `packet_type` / `packet` pair
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<ReplaySource> {
        ReplaySource::from_path(path)
    }

    /// Create a channel-fed source for a live decoder.
    pub fn listen(capacity: usize) -> (mpsc::Sender<RawPacket>, ChannelSource) {
        ChannelSource::channel(capacity)
    }

    /// Spawn a pipeline with the default configuration.
    ///
    /// Returns the sender for context updates along with the pipeline handle. Must be
    /// called inside a tokio runtime.
    pub fn ingest<S, K>(
        source: S,
        context: RaceContext,
        sink: K,
    ) -> (watch::Sender<Arc<RaceContext>>, PipelineHandle)
    where
        S: PacketSource,
        K: PointSink,
    {
        let (context_tx, context_rx) = watch::channel(Arc::new(context));
        let handle = Pipeline::default().spawn(source, context_rx, sink);
        (context_tx, handle)
    }
}
