//! # Race Context
//!
//! Long-lived state the flattener reads but never owns: the session's metadata, the
//! driver registry, and the per-car current laps.
//!
//! [`RaceContext`] bundles the session and the drivers. It is immutable and shared behind
//! an `Arc`; a new context replaces the old one when participants change. Current laps
//! change every tick and travel separately as a [`LapSnapshot`].
//!
//! ## YAML Format
//!
//! Contexts can be loaded from a YAML document:
//!
//! ```text
//! Session:
//!   Circuit: silverstone
//!   SessionLinkIdentifier: 1234567
//!   SessionType: race
//! Drivers:
//!   - Name: HAMILTON
//!     Team: Mercedes
//!   - Name: VERSTAPPEN
//!     Team: Red Bull Racing
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub mod driver;
pub mod laps;
pub mod session;

pub use driver::{Driver, DriverRegistry};
pub use laps::{CURRENT_LAP_FIELD, LapSnapshot};
pub use session::Session;

/// Session metadata plus the driver registry.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "PascalCase")]
pub struct RaceContext {
    pub session: Session,
    #[serde(default)]
    pub drivers: DriverRegistry,
}

impl RaceContext {
    pub fn new(session: Session, drivers: DriverRegistry) -> Self {
        Self { session, drivers }
    }

    /// Parse a context from YAML.
    pub fn parse(yaml: &str) -> crate::Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| crate::IngestError::Parse {
            context: "RaceContext deserialization".to_string(),
            details: e.to_string(),
        })
    }

    /// Load a context from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| crate::IngestError::file_error(path.to_path_buf(), e))?;
        let context = Self::parse(&yaml)?;
        debug!(
            circuit = %context.session.circuit,
            drivers = context.drivers.len(),
            "Loaded race context from {}",
            path.display()
        );
        Ok(context)
    }
}
