//! Replay pacing control

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How fast a replay source hands packets to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Pacing {
    /// As fast as the pipeline consumes them
    #[default]
    Unpaced,

    /// At most this many packets per second
    /// A rate of zero is treated as Unpaced
    Max(u32),
}

impl Pacing {
    /// Normalize a zero rate to Unpaced
    pub fn normalize(self) -> Self {
        match self {
            Pacing::Max(0) => Pacing::Unpaced,
            other => other,
        }
    }

    /// Get the interval between packets, if paced
    pub fn interval(self) -> Option<Duration> {
        match self.normalize() {
            Pacing::Unpaced => None,
            Pacing::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_unpaced() {
        assert_eq!(Pacing::Max(0).normalize(), Pacing::Unpaced);
        assert_eq!(Pacing::Max(0).interval(), None);
        assert_eq!(Pacing::Unpaced.interval(), None);
    }

    #[test]
    fn rate_maps_to_interval() {
        assert_eq!(Pacing::Max(20).interval(), Some(Duration::from_millis(50)));
    }
}
