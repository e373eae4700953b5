//! Channel source for live packet feeds
//!
//! An external wire decoder (UDP listener, game plugin) pushes structured packets into an
//! mpsc channel; the pipeline pulls them through this source.

use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::source::PacketSource;
use crate::types::RawPacket;

/// Source fed by an mpsc channel. Ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<RawPacket>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<RawPacket>) -> Self {
        Self { receiver }
    }

    /// Create a source together with the sender that feeds it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<RawPacket>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self::new(receiver))
    }
}

#[async_trait::async_trait]
impl PacketSource for ChannelSource {
    async fn next_packet(&mut self) -> Result<Option<RawPacket>> {
        let packet = self.receiver.recv().await;
        if packet.is_none() {
            debug!("Packet channel closed");
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ends_when_senders_drop() {
        let (sender, mut source) = ChannelSource::channel(4);
        let raw = RawPacket::from_yaml("PacketLapData", "header: { player_car_index: 0 }").unwrap();

        sender.send(raw.clone()).await.unwrap();
        drop(sender);

        assert_eq!(source.next_packet().await.unwrap(), Some(raw));
        assert_eq!(source.next_packet().await.unwrap(), None);
    }
}
