//! Pipeline spawns and manages the ingestion task
//!
//! One task owns the [`PacketSource`] and the [`PointSink`]. For every packet it:
//!
//! 1. decodes and classifies the structured record (unrecognized types are counted and
//!    skipped before they reach the flattener)
//! 2. flattens it against the latest [`RaceContext`] and the current [`LapSnapshot`]
//! 3. writes all resulting points in one sink call
//! 4. for a lap-data packet, publishes the next [`LapSnapshot`]
//!
//! The task is the only writer of lap snapshots, so every extraction happens after the
//! lap update of the packet before it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::classify::PacketKind;
use crate::context::{LapSnapshot, RaceContext};
use crate::decode::Decoder;
use crate::extract::Flattener;
use crate::sink::PointSink;
use crate::source::PacketSource;
use crate::types::RawPacket;
use crate::{IngestError, Result};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(default)]
pub struct PipelineConfig {
    /// Consecutive source errors before the pipeline shuts down
    pub max_source_errors: u32,
    /// Backoff after the first source error, doubled per further error
    pub initial_backoff_ms: u64,
    /// Upper bound of the backoff
    pub max_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { max_source_errors: 10, initial_backoff_ms: 50, max_backoff_ms: 1_600 }
    }
}

impl PipelineConfig {
    /// Parse a configuration from YAML. Missing keys take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| IngestError::Parse {
            context: "PipelineConfig deserialization".to_string(),
            details: e.to_string(),
        })
    }

    /// Backoff after the `errors`-th consecutive source error.
    pub fn backoff(&self, errors: u32) -> Duration {
        let factor = 1u64 << errors.saturating_sub(1).min(16);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms))
    }
}

/// Running totals of one pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct IngestStats {
    /// Packets received from the source
    pub packets: u64,
    /// Points handed to the sink
    pub points: u64,
    /// Fields that produced no point because of their shape
    pub dropped_fields: u64,
    /// Records skipped for lack of a registered driver
    pub skipped_drivers: u64,
    /// Packets of a type without an extraction strategy
    pub unrecognized: u64,
    /// Packets whose structured record failed to decode
    pub decode_errors: u64,
    /// Decoded packets the flattener rejected (missing or malformed lap and car indices)
    pub flatten_errors: u64,
    pub source_errors: u64,
    pub sink_errors: u64,
}

/// Handle to a running pipeline
pub struct PipelineHandle {
    stats: watch::Receiver<IngestStats>,
    laps: watch::Receiver<Arc<LapSnapshot>>,
    cancel: CancellationToken,
    task: JoinHandle<IngestStats>,
}

impl PipelineHandle {
    /// Latest statistics
    pub fn stats(&self) -> IngestStats {
        self.stats.borrow().clone()
    }

    /// Stream of statistics, one item per processed packet (intermediate values may be
    /// skipped by slow consumers)
    pub fn stats_updates(&self) -> WatchStream<IngestStats> {
        WatchStream::new(self.stats.clone())
    }

    /// Current lap snapshot
    pub fn current_laps(&self) -> Arc<LapSnapshot> {
        Arc::clone(&self.laps.borrow())
    }

    /// Receiver of lap snapshots as they are published
    pub fn laps(&self) -> watch::Receiver<Arc<LapSnapshot>> {
        self.laps.clone()
    }

    /// Cancellation token of the pipeline task
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request shutdown. The task flushes the sink and exits.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the task to finish and return its final statistics.
    pub async fn join(self) -> Result<IngestStats> {
        self.task.await.map_err(|e| IngestError::Source {
            reason: "pipeline task failed".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// Ingestion pipeline
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lapflux::{MemorySink, Pipeline, RaceContext, ReplaySource};
/// use tokio::sync::watch;
///
/// # async fn run() -> lapflux::Result<()> {
/// let context = RaceContext::from_path("context.yaml")?;
/// let source = ReplaySource::from_path("capture.yaml")?;
/// let sink = MemorySink::new();
///
/// let (_context_tx, context_rx) = watch::channel(Arc::new(context));
/// let handle = Pipeline::default().spawn(source, context_rx, sink.clone());
/// let stats = handle.join().await?;
/// println!("{} points from {} packets", stats.points, stats.packets);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    decoder: Decoder,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, decoder: Decoder::new() }
    }

    /// Decode with custom packet schemas.
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Spawn the ingestion task
    ///
    /// The context receiver is read before every packet, so publishing a new context
    /// (e.g. once the participant list is known) takes effect on the next packet.
    pub fn spawn<S, K>(
        self,
        source: S,
        context: watch::Receiver<Arc<RaceContext>>,
        sink: K,
    ) -> PipelineHandle
    where
        S: PacketSource,
        K: PointSink,
    {
        let (stats_tx, stats_rx) = watch::channel(IngestStats::default());
        let (laps_tx, laps_rx) = watch::channel(Arc::new(LapSnapshot::default()));
        let cancel = CancellationToken::new();
        let initial = Arc::clone(&context.borrow());

        let task = Task {
            config: self.config,
            decoder: self.decoder,
            flattener: Flattener::new(initial),
            context,
            stats: IngestStats::default(),
            stats_tx,
            laps_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(task.run(source, sink));

        PipelineHandle { stats: stats_rx, laps: laps_rx, cancel, task }
    }
}

struct Task {
    config: PipelineConfig,
    decoder: Decoder,
    flattener: Flattener,
    context: watch::Receiver<Arc<RaceContext>>,
    stats: IngestStats,
    stats_tx: watch::Sender<IngestStats>,
    laps_tx: watch::Sender<Arc<LapSnapshot>>,
    cancel: CancellationToken,
}

impl Task {
    async fn run<S, K>(mut self, mut source: S, mut sink: K) -> IngestStats
    where
        S: PacketSource,
        K: PointSink,
    {
        info!("Pipeline task started");
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Pipeline cancelled");
                    break;
                }
                result = source.next_packet() => result,
            };

            match result {
                Ok(Some(raw)) => {
                    error_count = 0;
                    self.process(raw, &mut sink).await;
                }
                Ok(None) => {
                    info!("Source ended after {} packets", self.stats.packets);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    self.stats.source_errors += 1;
                    self.publish_stats();
                    error!("Source error ({}/{}): {}", error_count, self.config.max_source_errors, e);

                    if error_count >= self.config.max_source_errors {
                        error!("Too many source errors, shutting down");
                        break;
                    }

                    let backoff = self.config.backoff(error_count);
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        if let Err(e) = sink.flush().await {
            self.stats.sink_errors += 1;
            error!("Sink flush failed: {}", e);
        }
        self.publish_stats();

        info!(
            packets = self.stats.packets,
            points = self.stats.points,
            dropped_fields = self.stats.dropped_fields,
            "Pipeline task ended"
        );
        self.stats
    }

    async fn process<K: PointSink>(&mut self, raw: RawPacket, sink: &mut K) {
        self.stats.packets += 1;

        let packet = match self.decoder.decode(&raw) {
            Ok(packet) => packet,
            Err(IngestError::UnrecognizedPacketType { packet_type }) => {
                trace!(%packet_type, "Skipping unrecognized packet");
                self.stats.unrecognized += 1;
                self.publish_stats();
                return;
            }
            Err(e) => {
                warn!(packet_type = %raw.packet_type, "Failed to decode packet: {}", e);
                self.stats.decode_errors += 1;
                self.publish_stats();
                return;
            }
        };

        if self.context.has_changed().unwrap_or(false) {
            let context = Arc::clone(&self.context.borrow_and_update());
            debug!(drivers = context.drivers.len(), "Race context updated");
            self.flattener.set_context(context);
        }

        let laps = Arc::clone(&self.laps_tx.borrow());
        match self.flattener.flatten(&packet, &laps) {
            Ok(flattened) => {
                let report = flattened.report;
                self.stats.dropped_fields += report.dropped.len() as u64;
                self.stats.skipped_drivers += report.skipped_drivers as u64;

                if !flattened.points.is_empty() {
                    match sink.write(&flattened.points).await {
                        Ok(()) => self.stats.points += flattened.points.len() as u64,
                        Err(e) => {
                            self.stats.sink_errors += 1;
                            error!(measurement = %report.measurement, "Sink write failed: {}", e);
                        }
                    }
                }
            }
            Err(e) => {
                warn!(packet_type = %packet.packet_type, "Failed to flatten packet: {}", e);
                self.stats.flatten_errors += 1;
            }
        }

        if packet.kind == PacketKind::LapData {
            match LapSnapshot::from_lap_packet(&packet) {
                Ok(snapshot) => {
                    self.laps_tx.send_replace(Arc::new(snapshot));
                }
                Err(e) => warn!("Lap snapshot not updated: {}", e),
            }
        }

        self.publish_stats();
    }

    fn publish_stats(&self) {
        self.stats_tx.send_replace(self.stats.clone());
    }
}
