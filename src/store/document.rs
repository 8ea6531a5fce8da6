//! Document representation
//!
//! A document is a semi-structured record: a JSON object with a unique
//! `id` scoped to its container and partition key. During full-hierarchy
//! backups each document is additionally tagged with the name of the
//! container it was scanned from, so snapshots from different containers
//! stay distinguishable after export.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the document identity.
pub const ID_FIELD: &str = "id";

/// Field holding the partition key value.
pub const PARTITION_KEY_FIELD: &str = "partitionKey";

/// Partition key path used for every container this tool creates.
pub const PARTITION_KEY_PATH: &str = "/partitionKey";

/// Provenance field injected during full-hierarchy backups.
pub const CONTAINER_NAME_FIELD: &str = "container_name";

/// A single document: a mapping of string keys to arbitrary JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Document(fields)
    }

    /// Build from a JSON value; returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Document(map)),
            _ => None,
        }
    }

    /// The document identity, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    /// The partition key value. Documents without one land in the null
    /// partition rather than being rejected.
    pub fn partition_key(&self) -> &Value {
        self.0.get(PARTITION_KEY_FIELD).unwrap_or(&Value::Null)
    }

    /// The container this document was exported from, when tagged.
    pub fn container_name(&self) -> Option<&str> {
        self.0.get(CONTAINER_NAME_FIELD).and_then(Value::as_str)
    }

    /// Tag the document with its source container. Overwrites any
    /// existing tag; the latest scan wins.
    pub fn tag_container(&mut self, container: &str) {
        self.0.insert(
            CONTAINER_NAME_FIELD.to_string(),
            Value::String(container.to_string()),
        );
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn test_id_and_partition_key_accessors() {
        let d = doc(json!({"id": "1", "partitionKey": "p", "v": 7}));
        assert_eq!(d.id(), Some("1"));
        assert_eq!(d.partition_key(), &json!("p"));
    }

    #[test]
    fn test_missing_id_is_none() {
        let d = doc(json!({"partitionKey": "p"}));
        assert_eq!(d.id(), None);
    }

    #[test]
    fn test_missing_partition_key_is_null() {
        let d = doc(json!({"id": "1"}));
        assert_eq!(d.partition_key(), &Value::Null);
    }

    #[test]
    fn test_tag_container_injects_field() {
        let mut d = doc(json!({"id": "1"}));
        assert_eq!(d.container_name(), None);

        d.tag_container("orders");
        assert_eq!(d.container_name(), Some("orders"));
        assert_eq!(d.get(CONTAINER_NAME_FIELD), Some(&json!("orders")));
    }

    #[test]
    fn test_tag_container_overwrites() {
        let mut d = doc(json!({"id": "1", "container_name": "stale"}));
        d.tag_container("orders");
        assert_eq!(d.container_name(), Some("orders"));
    }

    #[test]
    fn test_serializes_transparently() {
        let d = doc(json!({"id": "1", "nested": {"a": [1, 2]}}));
        let text = serde_json::to_string(&d).unwrap();
        let back: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(back, d);

        // No wrapper object around the fields
        let raw: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["id"], "1");
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Document::from_value(json!([1, 2])).is_none());
        assert!(Document::from_value(json!("text")).is_none());
    }
}
