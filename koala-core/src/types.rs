//! Event and property types
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event** | A named occurrence reported to a backend, with its properties |
//! | **Property** | A string key mapped to a string, boolean or integer value |
//! | **Default properties** | Device/app metadata attached to every event |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property mapping attached to an event.
///
/// Ordered so that emitted payloads are deterministic.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single property value.
///
/// Serializes to the bare JSON scalar, so `Bool(true)` is `true`, not `"true"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Bool(bool),
    Int(i64),
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

/// An event as handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event name, e.g. "App Open"
    #[serde(rename = "event")]
    pub name: String,
    /// Merged default and event-specific properties
    pub properties: Properties,
}

impl Event {
    pub fn new(name: impl Into<String>, properties: Properties) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}
