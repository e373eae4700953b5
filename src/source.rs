//! Source trait for inbound packets

use crate::Result;
use crate::types::RawPacket;

/// Trait for packet sources
///
/// Sources abstract over where structured packets come from (a recorded capture, an
/// external wire decoder feeding a channel) and handle their own pacing internally.
#[async_trait::async_trait]
pub trait PacketSource: Send + 'static {
    /// Get the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - Next packet available
    /// - `Ok(None)` - Source exhausted (normal termination)
    /// - `Err(e)` - Error occurred; the pipeline may retry
    async fn next_packet(&mut self) -> Result<Option<RawPacket>>;
}
