//! Snapshot serialization.
//!
//! A blob holds exactly one record's attribute map under a single top-level
//! `attributes` key, as pretty-printed JSON:
//!
//! ```text
//! {
//!   "attributes": {
//!     "title": "Hello",
//!     "views": 3
//!   }
//! }
//! ```
//!
//! Keys are sorted at every level so identical attribute maps always produce
//! identical bytes, and successive commits diff line by line.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::versioning::error::VersioningResult;

/// A record's attribute map, ordered by key.
pub type Attributes = BTreeMap<String, Value>;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    attributes: &'a Attributes,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotDocument {
    attributes: Attributes,
}

/// serialize an attribute map to blob bytes
pub fn serialize(attributes: &Attributes) -> VersioningResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(&SnapshotRef { attributes })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// deserialize blob bytes back into an attribute map
pub fn deserialize(bytes: &[u8]) -> VersioningResult<Attributes> {
    let document: SnapshotDocument = serde_json::from_slice(bytes)?;
    Ok(document.attributes)
}

/// capture the attributes of a serde-modelled record
///
/// fields marked `#[serde(skip)]` are transient and are not captured.
pub fn to_attributes<T: Serialize>(value: &T) -> VersioningResult<Attributes> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
            "record attributes must serialize to a map, got {}",
            kind_of(&other)
        ))
        .into()),
    }
}

/// rebuild a serde-modelled record from its attributes
pub fn from_attributes<T: DeserializeOwned>(attributes: Attributes) -> VersioningResult<T> {
    let map: serde_json::Map<String, Value> = attributes.into_iter().collect();
    Ok(serde_json::from_value(Value::Object(map))?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}
