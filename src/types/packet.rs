//! Packet types flowing into the flattener

use serde::{Deserialize, Serialize};

use super::{Field, FieldValue, Record};
use crate::classify::PacketKind;

/// Packet header. Identifies the viewing car; never emitted as a measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketHeader {
    /// Index of the player's (viewing) car
    pub player_car_index: usize,
    /// Game-assigned session identifier
    pub session_uid: Option<u64>,
    /// Frame counter of the game's physics loop
    pub frame_identifier: Option<u64>,
    /// Session timestamp in seconds
    pub session_time: Option<f64>,
}

impl PacketHeader {
    pub fn new(player_car_index: usize) -> Self {
        Self { player_car_index, ..Self::default() }
    }
}

/// A decoded packet: one structured telemetry snapshot of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Declared type name, e.g. `PacketCarTelemetryData`
    pub packet_type: String,
    /// Classified kind of the packet
    pub kind: PacketKind,
    pub header: PacketHeader,
    /// Body fields in declaration order, `header` excluded
    pub body: Record,
}

impl Packet {
    /// Create an empty packet of the given kind, named by its canonical type name.
    pub fn new(kind: PacketKind, header: PacketHeader) -> Self {
        Self { packet_type: kind.type_name().to_string(), kind, header, body: Record::default() }
    }

    /// Append a body field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.body.fields.push(Field::new(name, value));
        self
    }

    /// Override the declared type name (the measurement name is derived from it).
    pub fn named(mut self, packet_type: impl Into<String>) -> Self {
        self.packet_type = packet_type.into();
        self
    }

    /// Look up a body field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.body.get(name)
    }
}

/// An undecoded packet: its declared type name plus the structured record the upstream
/// wire decoder produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPacket {
    pub packet_type: String,
    #[serde(rename = "packet")]
    pub body: serde_yaml_ng::Value,
}

impl RawPacket {
    pub fn new(packet_type: impl Into<String>, body: serde_yaml_ng::Value) -> Self {
        Self { packet_type: packet_type.into(), body }
    }

    /// Parse a structured record from YAML (or JSON) text.
    pub fn from_yaml(packet_type: impl Into<String>, text: &str) -> crate::Result<Self> {
        let body = serde_yaml_ng::from_str(text).map_err(|e| crate::IngestError::Parse {
            context: "packet body".to_string(),
            details: e.to_string(),
        })?;
        Ok(Self::new(packet_type, body))
    }
}
