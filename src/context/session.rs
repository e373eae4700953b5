//! Session metadata

use serde::{Deserialize, Serialize};

/// Metadata of one race, practice or qualifying session.
///
/// Immutable while packets of the session are flattened.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    /// Circuit identifier
    pub circuit: String,
    /// Link identifier correlating every point to one session
    pub session_link_identifier: u64,
    /// Session type (race, qualifying, practice, ...)
    pub session_type: String,
}

impl Session {
    pub fn new(
        circuit: impl Into<String>,
        session_link_identifier: u64,
        session_type: impl Into<String>,
    ) -> Self {
        Self {
            circuit: circuit.into(),
            session_link_identifier,
            session_type: session_type.into(),
        }
    }
}
