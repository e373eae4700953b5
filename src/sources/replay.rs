//! Replay source for recorded packet captures
//!
//! A capture is a multi-document YAML (or JSON-compatible) file with one packet per
//! document:
//!
//! ```text
//! packet_type: PacketLapData
//! packet:
//!   header: { player_car_index: 0 }
//!   lap_data:
//!     - { current_lap_num: 3, car_position: 1 }
//! ---
//! packet_type: PacketSessionData
//! packet:
//!   header: { player_car_index: 0 }
//!   track_temperature: 31
//! ```

use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Interval, interval};
use tracing::{debug, info, trace};

use crate::source::PacketSource;
use crate::types::{Pacing, RawPacket};
use crate::{IngestError, Result};

/// Replay source that yields the packets of a capture in recorded order
pub struct ReplaySource {
    /// Remaining packets
    packets: VecDeque<RawPacket>,

    /// Number of packets in the capture
    total: usize,

    /// Packet pacing
    pacing: Pacing,

    /// Created on first use, inside the runtime
    interval: Option<Interval>,
}

impl ReplaySource {
    /// Build a replay source from already decoded packets
    pub fn new(packets: Vec<RawPacket>) -> Self {
        let total = packets.len();
        Self { packets: packets.into(), total, pacing: Pacing::Unpaced, interval: None }
    }

    /// Load a capture file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| IngestError::file_error(path.to_path_buf(), e))?;
        let source = Self::parse(&text)?;
        info!("Opened capture {}: {} packets", path.display(), source.total);
        Ok(source)
    }

    /// Parse a capture from text
    pub fn parse(text: &str) -> Result<Self> {
        let mut packets = Vec::new();
        for (index, document) in serde_yaml_ng::Deserializer::from_str(text).enumerate() {
            let packet = RawPacket::deserialize(document).map_err(|e| IngestError::Parse {
                context: format!("capture document {index}"),
                details: e.to_string(),
            })?;
            packets.push(packet);
        }
        Ok(Self::new(packets))
    }

    /// Set packet pacing, builder style
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.set_pacing(pacing);
        self
    }

    /// Change packet pacing
    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = pacing.normalize();
        self.interval = None;
        debug!(pacing = ?self.pacing, "Replay pacing set");
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Packets not yet yielded
    pub fn remaining(&self) -> usize {
        self.packets.len()
    }

    /// Packets in the capture
    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait::async_trait]
impl PacketSource for ReplaySource {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        if self.packets.is_empty() {
            debug!("Reached end of capture");
            return Ok(None);
        }

        if let Some(period) = self.pacing.interval() {
            self.interval.get_or_insert_with(|| interval(period)).tick().await;
        }

        let packet = self.packets.pop_front();
        if let Some(packet) = &packet {
            trace!(
                "Packet {}/{}: {}",
                self.total - self.packets.len(),
                self.total,
                packet.packet_type
            );
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use std::time::Duration;

    const CAPTURE: &str = r#"
packet_type: PacketSessionData
packet:
  header: { player_car_index: 0 }
  track_temperature: 31
---
packet_type: PacketLapData
packet:
  header: { player_car_index: 0 }
  lap_data:
    - { current_lap_num: 2, car_position: 1 }
"#;

    #[tokio::test]
    async fn yields_documents_in_order() {
        let mut source = ReplaySource::parse(CAPTURE).unwrap();
        assert_eq!(source.total(), 2);

        let first = source.next_packet().await.unwrap().unwrap();
        let second = source.next_packet().await.unwrap().unwrap();
        assert_eq!(first.packet_type, "PacketSessionData");
        assert_eq!(second.packet_type, "PacketLapData");
        assert!(source.next_packet().await.unwrap().is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn document_without_packet_type_is_a_parse_error() {
        let result = ReplaySource::parse("packet: { header: { player_car_index: 0 } }");
        assert!(matches!(result, Err(IngestError::Parse { .. })));
    }

    #[test]
    fn missing_capture_is_a_file_error() {
        assert!(matches!(ReplaySource::from_path("/no/such/capture.yaml"), Err(IngestError::File { .. })));
    }

    #[test]
    fn zero_rate_is_unpaced() {
        let source = ReplaySource::parse(CAPTURE).unwrap().with_pacing(Pacing::Max(0));
        assert_eq!(source.pacing(), Pacing::Unpaced);
    }

    #[tokio::test(start_paused = true)]
    async fn paced_replay_spaces_packets() {
        let mut source = ReplaySource::parse(CAPTURE).unwrap().with_pacing(Pacing::Max(10));
        let start = tokio::time::Instant::now();

        source.next_packet().await.unwrap();
        source.next_packet().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn recorded_capture_loads() {
        test_utils::init_tracing();
        let path = test_utils::require_capture("austria_race.yaml").unwrap();
        let mut source = ReplaySource::from_path(path).unwrap();

        let mut count = 0;
        while let Some(packet) = source.next_packet().await.unwrap() {
            assert!(!packet.packet_type.is_empty());
            count += 1;
        }
        assert_eq!(count, source.total());
        assert!(count > 0);
    }
}
