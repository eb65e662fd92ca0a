//! Tracked element model
//!
//! A generic stand-in for the Part-DB entities (parts, categories, storage
//! locations, ...) whose mutations are logged. Beyond its name an element is a
//! bag of JSON fields; the log only ever needs to diff and revert those.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::target::Target;

/// Key under which the element name appears in its document
pub const NAME_FIELD: &str = "name";

/// A tracked element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Type and id of the element
    pub target: Target,

    /// Display name
    pub name: String,

    /// All other attributes
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// When the element was created
    pub created_at: DateTime<Utc>,

    /// When the element was last modified
    pub updated_at: DateTime<Utc>,
}

impl Element {
    /// Create a new element
    pub fn new(target: Target, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            target,
            name: name.into(),
            fields: Map::new(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// The element as a flat JSON document: its fields plus `name`
    pub fn document(&self) -> Map<String, Value> {
        let mut doc = self.fields.clone();
        doc.insert(NAME_FIELD.to_string(), Value::String(self.name.clone()));
        doc
    }

    /// Replace name and fields from a document produced by [`Element::document`]
    ///
    /// A missing or non-string `name` keeps the current name.
    pub fn set_document(&mut self, mut doc: Map<String, Value>) {
        if let Some(Value::String(name)) = doc.remove(NAME_FIELD) {
            self.name = name;
        }
        self.fields = doc;
    }

    /// Get a field value
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetType;
    use serde_json::json;

    fn part() -> Element {
        Element::new(Target::new(TargetType::Part, 42), "Resistor 10k", Utc::now())
            .with_field("quantity", json!(5))
    }

    #[test]
    fn test_document_includes_name() {
        let doc = part().document();
        assert_eq!(doc.get("name"), Some(&json!("Resistor 10k")));
        assert_eq!(doc.get("quantity"), Some(&json!(5)));
    }

    #[test]
    fn test_set_document() {
        let mut element = part();
        let mut doc = element.document();
        doc.insert("name".into(), json!("Resistor 22k"));
        doc.insert("quantity".into(), json!(9));

        element.set_document(doc);
        assert_eq!(element.name, "Resistor 22k");
        assert_eq!(element.field("quantity"), Some(&json!(9)));
        assert!(element.field("name").is_none());
    }
}
