//! Structured record decoding.
//!
//! Turns the structured record produced by the upstream wire decoder (a
//! `serde_yaml_ng::Value` mapping; JSON dumps parse into the same model) into a
//! [`Packet`] whose field shapes are fixed once, here, by the packet kind's
//! [`PacketSchema`].
//!
//! Declared fields take their declared shape when the data fits it. A declared corner
//! array that does not hold exactly four numbers becomes a [`FieldValue::Sequence`], and
//! a declared record list that does not hold mappings becomes
//! [`FieldValue::Unsupported`]; the flattener reports both as dropped fields.
//!
//! Undeclared fields are inferred conservatively: numbers and booleans are scalars,
//! numeric lists are plain sequences (never corner arrays), lists of mappings are record
//! lists, and everything else is unsupported.

use serde_yaml_ng::{Mapping, Number, Value};
use std::collections::HashMap;
use tracing::trace;

use crate::classify::PacketKind;
use crate::types::{
    Field, FieldShape, FieldValue, Packet, PacketHeader, PacketSchema, RawPacket, Record, Scalar,
};
use crate::{IngestError, Result};

const HEADER_FIELD: &str = "header";

/// Decoder holding one schema per packet kind.
#[derive(Debug, Clone)]
pub struct Decoder {
    schemas: HashMap<PacketKind, PacketSchema>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Decoder using the built-in F1 2021 schemas.
    pub fn new() -> Self {
        let schemas =
            PacketKind::ALL.into_iter().map(|kind| (kind, PacketSchema::builtin(kind))).collect();
        Self { schemas }
    }

    /// Replace the schema of one packet kind after validating it.
    pub fn with_schema(mut self, schema: PacketSchema) -> Result<Self> {
        schema.validate()?;
        self.schemas.insert(schema.kind, schema);
        Ok(self)
    }

    /// Schema currently used for a kind.
    pub fn schema(&self, kind: PacketKind) -> Option<&PacketSchema> {
        self.schemas.get(&kind)
    }

    /// Classify and decode a raw packet.
    pub fn decode(&self, raw: &RawPacket) -> Result<Packet> {
        let kind = PacketKind::from_type_name(&raw.packet_type)?;
        match self.schemas.get(&kind) {
            Some(schema) => decode_with_schema(raw, schema),
            None => decode_with_schema(raw, &PacketSchema::builtin(kind)),
        }
    }
}

/// Classify and decode a raw packet with the built-in schema of its kind.
pub fn decode_packet(raw: &RawPacket) -> Result<Packet> {
    let kind = PacketKind::from_type_name(&raw.packet_type)?;
    decode_with_schema(raw, &PacketSchema::builtin(kind))
}

/// Decode a raw packet against an explicit schema.
pub fn decode_with_schema(raw: &RawPacket, schema: &PacketSchema) -> Result<Packet> {
    let mapping = raw.body.as_mapping().ok_or_else(|| IngestError::Parse {
        context: format!("{} body", raw.packet_type),
        details: format!("expected a mapping, found {}", kind_of(&raw.body)),
    })?;

    let header = mapping
        .get(HEADER_FIELD)
        .ok_or_else(|| IngestError::field_not_found(HEADER_FIELD, raw.packet_type.as_str()))
        .and_then(decode_header)?;

    let mut body = Record::default();
    for (key, value) in mapping {
        let name = field_name(key, &raw.packet_type)?;
        if name == HEADER_FIELD {
            continue;
        }
        body.fields.push(Field { name: name.to_string(), value: decode_field(name, value, schema)? });
    }

    trace!(packet_type = %raw.packet_type, fields = body.len(), "Decoded packet");

    Ok(Packet { packet_type: raw.packet_type.clone(), kind: schema.kind, header, body })
}

fn decode_header(value: &Value) -> Result<PacketHeader> {
    let mapping = value.as_mapping().ok_or_else(|| IngestError::Parse {
        context: "packet header".to_string(),
        details: format!("expected a mapping, found {}", kind_of(value)),
    })?;

    let player_car_index = mapping
        .get("player_car_index")
        .ok_or_else(|| IngestError::field_not_found("player_car_index", "packet header"))?;
    let player_car_index = player_car_index
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| IngestError::TypeConversion {
            details: format!("player_car_index must be a car index, found {player_car_index:?}"),
        })?;

    Ok(PacketHeader {
        player_car_index,
        session_uid: mapping.get("session_uid").and_then(Value::as_u64),
        frame_identifier: mapping.get("frame_identifier").and_then(Value::as_u64),
        session_time: mapping.get("session_time").and_then(Value::as_f64),
    })
}

fn field_name<'a>(key: &'a Value, packet_type: &str) -> Result<&'a str> {
    key.as_str().ok_or_else(|| IngestError::Parse {
        context: format!("{packet_type} field name"),
        details: format!("expected a string key, found {}", kind_of(key)),
    })
}

fn decode_field(name: &str, value: &Value, schema: &PacketSchema) -> Result<FieldValue> {
    let unsupported = || FieldValue::Unsupported { kind: kind_of(value) };

    let decoded = match schema.shape_of(name) {
        Some(FieldShape::Ignored) => FieldValue::Ignored,
        Some(FieldShape::Scalar) => scalar(value).map(FieldValue::Scalar).unwrap_or_else(unsupported),
        Some(FieldShape::Corners) => match numeric_list(value) {
            Some(values) => match <[Scalar; 4]>::try_from(values) {
                Ok(corners) => FieldValue::Corners(crate::types::Corners(corners)),
                Err(values) => FieldValue::Sequence(values),
            },
            None if value.as_sequence().is_some_and(Vec::is_empty) => FieldValue::Sequence(Vec::new()),
            None => unsupported(),
        },
        Some(FieldShape::PerDriver) => records(value, schema)?.map(FieldValue::PerDriver).unwrap_or_else(unsupported),
        Some(FieldShape::Records) => records(value, schema)?.map(FieldValue::Records).unwrap_or_else(unsupported),
        Some(FieldShape::LapHistory) => records(value, schema)?.map(FieldValue::LapHistory).unwrap_or_else(unsupported),
        None => infer(value, schema)?,
    };

    Ok(decoded)
}

fn infer(value: &Value, schema: &PacketSchema) -> Result<FieldValue> {
    if let Some(s) = scalar(value) {
        return Ok(FieldValue::Scalar(s));
    }
    if let Some(values) = numeric_list(value) {
        return Ok(FieldValue::Sequence(values));
    }
    Ok(match records(value, schema)? {
        Some(records) => FieldValue::Records(records),
        None => FieldValue::Unsupported { kind: kind_of(value) },
    })
}

fn scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => Some(number(n)),
        _ => None,
    }
}

fn number(n: &Number) -> Scalar {
    if let Some(v) = n.as_i64() {
        Scalar::Int(v)
    } else if let Some(v) = n.as_u64() {
        Scalar::UInt(v)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// A non-empty list holding only numbers.
fn numeric_list(value: &Value) -> Option<Vec<Scalar>> {
    let items = value.as_sequence()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(scalar).collect()
}

/// A list holding only mappings. `Ok(None)` when the value has another shape.
fn records(value: &Value, schema: &PacketSchema) -> Result<Option<Vec<Record>>> {
    let Some(items) = value.as_sequence() else {
        return Ok(None);
    };
    if !items.iter().all(Value::is_mapping) {
        return Ok(None);
    }

    items
        .iter()
        .filter_map(Value::as_mapping)
        .map(|mapping| decode_record(mapping, schema))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn decode_record(mapping: &Mapping, schema: &PacketSchema) -> Result<Record> {
    mapping
        .iter()
        .map(|(key, value)| {
            let name = field_name(key, "sub-record")?;
            Ok(Field { name: name.to_string(), value: decode_field(name, value, schema)? })
        })
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "mixed sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
