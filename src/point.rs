//! Normalized time-series points.
//!
//! A [`Point`] is one tagged measurement carrying exactly one field. [`PointBuilder`]
//! applies the canonical tag set every extractor shares:
//!
//! - `circuit`, `session_uid`, `session_type` and `lap` on every point
//! - `driver_name` when a driver is supplied, `team` when a team is supplied
//! - extractor-supplied extras such as `corner`, merged last
//!
//! Points carry no timestamp; the sink assigns one when it writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::context::{Driver, Session};
use crate::types::Scalar;

pub const CIRCUIT_TAG: &str = "circuit";
pub const SESSION_UID_TAG: &str = "session_uid";
pub const SESSION_TYPE_TAG: &str = "session_type";
pub const LAP_TAG: &str = "lap";
pub const DRIVER_NAME_TAG: &str = "driver_name";
pub const TEAM_TAG: &str = "team";
pub const CORNER_TAG: &str = "corner";

/// Tags extra tags can never replace.
const CANONICAL_TAGS: [&str; 4] = [CIRCUIT_TAG, SESSION_UID_TAG, SESSION_TYPE_TAG, LAP_TAG];

/// Value of a point tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(untagged)]
pub enum TagValue {
    Int(i64),
    UInt(u64),
    Text(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Int(v) => write!(f, "{v}"),
            TagValue::UInt(v) => write!(f, "{v}"),
            TagValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Text(v.to_string())
    }
}

impl From<String> for TagValue {
    fn from(v: String) -> Self {
        TagValue::Text(v)
    }
}

impl From<u32> for TagValue {
    fn from(v: u32) -> Self {
        TagValue::Int(v.into())
    }
}

impl From<u64> for TagValue {
    fn from(v: u64) -> Self {
        TagValue::UInt(v)
    }
}

/// A single tagged measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct Point {
    /// Metric family, derived from the packet type name
    pub measurement: String,
    /// Tags, kept sorted by name
    pub tags: BTreeMap<String, TagValue>,
    pub field_key: String,
    pub field_value: Scalar,
}

impl Point {
    /// Tag value by name.
    pub fn tag(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    /// Tag value as text, for assertions and display.
    pub fn tag_str(&self, name: &str) -> Option<String> {
        self.tags.get(name).map(ToString::to_string)
    }

    /// Whether the field value can be stored. NaN and infinite floats cannot.
    pub fn has_finite_value(&self) -> bool {
        match self.field_value {
            Scalar::Float(v) => v.is_finite(),
            _ => true,
        }
    }

    /// Render this point as one line of InfluxDB line protocol (without timestamp).
    pub fn line_protocol(&self) -> LineProtocol<'_> {
        LineProtocol(self)
    }
}

/// Line protocol view of a [`Point`].
pub struct LineProtocol<'a>(&'a Point);

// https://docs.influxdata.com/influxdb/cloud/reference/syntax/line-protocol/#special-characters
const MEASUREMENT_DELIMITERS: &[char] = &[',', ' '];
const KEY_DELIMITERS: &[char] = &[',', '=', ' '];

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str, delimiters: &[char]) -> fmt::Result {
    let mut last = 0;
    for (idx, delim) in value.match_indices(delimiters) {
        write!(f, r"{}\{}", &value[last..idx], delim)?;
        last = idx + delim.len();
    }
    f.write_str(&value[last..])
}

impl fmt::Display for LineProtocol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = self.0;
        write_escaped(f, &point.measurement, MEASUREMENT_DELIMITERS)?;

        // Empty tag values are not valid line protocol and are left out
        for (key, value) in &point.tags {
            let value = value.to_string();
            if value.is_empty() {
                continue;
            }
            f.write_str(",")?;
            write_escaped(f, key, KEY_DELIMITERS)?;
            f.write_str("=")?;
            write_escaped(f, &value, KEY_DELIMITERS)?;
        }

        f.write_str(" ")?;
        write_escaped(f, &point.field_key, KEY_DELIMITERS)?;
        match point.field_value {
            Scalar::Bool(v) => write!(f, "={}", if v { "t" } else { "f" }),
            Scalar::Int(v) => write!(f, "={v}i"),
            Scalar::UInt(v) => write!(f, "={v}u"),
            Scalar::Float(v) => write!(f, "={v}"),
        }
    }
}

/// Builds points of one metric family against one session.
#[derive(Debug, Clone, Copy)]
pub struct PointBuilder<'a> {
    session: &'a Session,
    measurement: &'a str,
}

impl<'a> PointBuilder<'a> {
    pub fn new(session: &'a Session, measurement: &'a str) -> Self {
        Self { session, measurement }
    }

    pub fn measurement(&self) -> &'a str {
        self.measurement
    }

    /// Assemble one point with the canonical tag set.
    pub fn build(
        &self,
        key: &str,
        value: Scalar,
        lap: u32,
        driver: Option<&Driver>,
        team: Option<&str>,
        extra: &[(&str, TagValue)],
    ) -> Point {
        let mut tags = BTreeMap::new();
        tags.insert(CIRCUIT_TAG.to_string(), TagValue::from(self.session.circuit.as_str()));
        tags.insert(SESSION_UID_TAG.to_string(), TagValue::from(self.session.session_link_identifier));
        tags.insert(SESSION_TYPE_TAG.to_string(), TagValue::from(self.session.session_type.as_str()));
        tags.insert(LAP_TAG.to_string(), TagValue::from(lap));

        if let Some(driver) = driver {
            tags.insert(DRIVER_NAME_TAG.to_string(), TagValue::from(driver.name.as_str()));
        }
        if let Some(team) = team {
            tags.insert(TEAM_TAG.to_string(), TagValue::from(team));
        }

        for (name, value) in extra {
            if CANONICAL_TAGS.contains(name) {
                debug!(tag = name, "Ignoring extra tag that would replace a canonical tag");
                continue;
            }
            tags.insert(name.to_string(), value.clone());
        }

        Point {
            measurement: self.measurement.to_string(),
            tags,
            field_key: key.to_string(),
            field_value: value,
        }
    }

    /// Point attributed to a registered driver and their team.
    pub fn for_driver(
        &self,
        key: &str,
        value: Scalar,
        lap: u32,
        driver: &Driver,
        extra: &[(&str, TagValue)],
    ) -> Point {
        self.build(key, value, lap, Some(driver), Some(driver.team.as_str()), extra)
    }
}
