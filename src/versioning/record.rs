//! The record capability the versioning engine needs.
//!
//! The record layer itself (fields, validation, primary database) belongs to
//! the calling application. The engine only reads a record's type and
//! identity and reads or replaces its attribute map.

use serde::{Deserialize, Serialize};

use crate::versioning::error::VersioningResult;
use crate::versioning::snapshot::Attributes;

/// A record whose state can be snapshotted into the repository.
///
/// `record_id` must be stable across process runs (a primary key or UUID),
/// never an in-memory address or hash.
pub trait Versioned {
    /// Name of the record type; becomes the blob directory.
    ///
    /// Must be a valid directory name: letters, digits, `_` and `-`,
    /// starting with a letter or `_`. Flatten namespaced types yourself
    /// (`blog::Article` as `blog-Article`); separators are not escaped.
    fn type_name(&self) -> &str;

    /// Stable identity of this record.
    fn record_id(&self) -> String;

    /// Persistent attributes. Transient state must be left out.
    fn attributes(&self) -> VersioningResult<Attributes>;

    /// Replace the in-memory state with restored attributes.
    fn restore_attributes(&mut self, attributes: Attributes) -> VersioningResult<()>;
}

/// A schemaless record: a type name, an identity and a bag of attributes.
///
/// Useful for tooling that handles blobs without knowing the concrete
/// record types, and as the simplest possible [`Versioned`] implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub type_name: String,
    pub id: String,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

impl Versioned for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn record_id(&self) -> String {
        self.id.clone()
    }

    fn attributes(&self) -> VersioningResult<Attributes> {
        Ok(self.attributes.clone())
    }

    fn restore_attributes(&mut self, attributes: Attributes) -> VersioningResult<()> {
        self.attributes = attributes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accessors() {
        let mut record = Record::new("Article", "1").with("title", "Hello");
        record.set("views", 3);

        assert_eq!(record.type_name(), "Article");
        assert_eq!(record.record_id(), "1");
        assert_eq!(record.get("title"), Some(&json!("Hello")));
        assert_eq!(record.attributes().unwrap().len(), 2);
    }

    #[test]
    fn test_restore_replaces_all_attributes() {
        let mut record = Record::new("Article", "1").with("title", "Draft").with("extra", 1);

        let mut restored = Attributes::new();
        restored.insert("title".to_string(), json!("Final"));
        record.restore_attributes(restored).unwrap();

        assert_eq!(record.get("title"), Some(&json!("Final")));
        assert_eq!(record.get("extra"), None);
    }
}
