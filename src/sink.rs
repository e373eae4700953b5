//! Point sinks
//!
//! A sink receives the points of one packet per [`PointSink::write`] call, so the points
//! of a packet always travel together. Sinks do no batching across packets and the
//! pipeline never retries a failed write.

use std::io::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::point::Point;
use crate::{IngestError, Result};

/// Trait for point destinations
#[async_trait::async_trait]
pub trait PointSink: Send + 'static {
    /// Write all points derived from one packet.
    async fn write(&mut self, points: &[Point]) -> Result<()>;

    /// Flush buffered output. Called once when the pipeline stops.
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shared in-memory collector.
///
/// Clones share the same buffer, so a test can keep one clone while the pipeline owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    points: Arc<Mutex<Vec<Point>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every point written so far.
    pub async fn points(&self) -> Vec<Point> {
        self.points.lock().await.clone()
    }

    /// Number of `write` calls received.
    pub async fn writes(&self) -> usize {
        *self.writes.lock().await
    }

    /// Take the collected points, leaving the buffer empty.
    pub async fn take(&self) -> Vec<Point> {
        std::mem::take(&mut *self.points.lock().await)
    }
}

#[async_trait::async_trait]
impl PointSink for MemorySink {
    async fn write(&mut self, points: &[Point]) -> Result<()> {
        self.points.lock().await.extend_from_slice(points);
        *self.writes.lock().await += 1;
        Ok(())
    }
}

/// Writes InfluxDB line protocol, one line per point.
pub struct LineProtocolSink<W> {
    writer: W,
    timestamps: bool,
}

impl<W: Write + Send + 'static> LineProtocolSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, timestamps: false }
    }

    /// Append a nanosecond timestamp to every line. All points of one write share it.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Returns the number of lines written. Points with a NaN or infinite value are
    /// skipped, since the database rejects them.
    fn write_lines(&mut self, points: &[Point]) -> std::io::Result<usize> {
        let timestamp = if self.timestamps {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
            Some(now.as_nanos())
        } else {
            None
        };

        let mut lines = 0;
        for point in points {
            if !point.has_finite_value() {
                debug!(
                    measurement = %point.measurement,
                    field = %point.field_key,
                    value = %point.field_value,
                    "Skipping non-finite field value"
                );
                continue;
            }
            match timestamp {
                Some(ts) => writeln!(self.writer, "{} {ts}", point.line_protocol())?,
                None => writeln!(self.writer, "{}", point.line_protocol())?,
            }
            lines += 1;
        }
        Ok(lines)
    }
}

#[async_trait::async_trait]
impl<W: Write + Send + 'static> PointSink for LineProtocolSink<W> {
    async fn write(&mut self, points: &[Point]) -> Result<()> {
        let lines = self
            .write_lines(points)
            .map_err(|e| IngestError::sink_failed_with_source("line protocol write failed", Box::new(e)))?;
        trace!(lines, "Wrote line protocol");
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| IngestError::sink_failed_with_source("line protocol flush failed", Box::new(e)))
    }
}
