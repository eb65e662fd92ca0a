//! Field-level change sets for edit log entries
//!
//! An edit entry stores, per changed field, the value before and after the
//! edit. That is enough both to show a human-readable diff and to walk an
//! element's state backward in time.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Old and new value of a single field
///
/// `None` means the field did not exist on that side of the edit, which is
/// different from the field holding JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub old: Option<Value>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub new: Option<Value>,
}

/// Keep an explicit `null` as `Some(Value::Null)`; only a missing key is `None`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldChange {
    pub fn new(old: Option<Value>, new: Option<Value>) -> Self {
        Self { old, new }
    }

    fn describe(&self, field: &str) -> String {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => {
                format!("{}: {} -> {}", field, format_value(old), format_value(new))
            }
            (None, Some(new)) => format!("{}: (added) -> {}", field, format_value(new)),
            (Some(old), None) => format!("{}: {} -> (removed)", field, format_value(old)),
            (None, None) => format!("{}: (unchanged)", field),
        }
    }
}

/// The set of field changes made by one edit, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the top-level field changes between two documents
    pub fn between(before: &Map<String, Value>, after: &Map<String, Value>) -> Self {
        let mut changes = BTreeMap::new();

        // Modified and removed fields
        for (key, before_val) in before {
            match after.get(key) {
                Some(after_val) if after_val == before_val => {}
                Some(after_val) => {
                    changes.insert(
                        key.clone(),
                        FieldChange::new(Some(before_val.clone()), Some(after_val.clone())),
                    );
                }
                None => {
                    changes.insert(key.clone(), FieldChange::new(Some(before_val.clone()), None));
                }
            }
        }

        // Added fields
        for (key, after_val) in after {
            if !before.contains_key(key) {
                changes.insert(key.clone(), FieldChange::new(None, Some(after_val.clone())));
            }
        }

        Self(changes)
    }

    /// Builder-style insert of a single change
    pub fn with(mut self, field: impl Into<String>, old: Option<Value>, new: Option<Value>) -> Self {
        self.0.insert(field.into(), FieldChange::new(old, new));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Undo this edit on a document (restore every `old` value)
    pub fn revert(&self, doc: &mut Map<String, Value>) {
        for (field, change) in &self.0 {
            match &change.old {
                Some(old) => {
                    doc.insert(field.clone(), old.clone());
                }
                None => {
                    doc.remove(field);
                }
            }
        }
    }

    /// Redo this edit on a document (apply every `new` value)
    pub fn apply(&self, doc: &mut Map<String, Value>) {
        for (field, change) in &self.0 {
            match &change.new {
                Some(new) => {
                    doc.insert(field.clone(), new.clone());
                }
                None => {
                    doc.remove(field);
                }
            }
        }
    }

    /// One-line human-readable summary, e.g. `quantity: 5 -> 10, name: (added) -> "R1"`
    pub fn summary(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }

        Some(
            self.0
                .iter()
                .map(|(field, change)| change.describe(field))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// One line per change, descending into nested objects and arrays
    pub fn detailed_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (field, change) in &self.0 {
            match (&change.old, &change.new) {
                (Some(old), Some(new)) => lines.extend(nested_changes(old, new, field)),
                _ => lines.push(change.describe(field)),
            }
        }
        lines
    }
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

/// Describe the differences between two values, recursing into objects and
/// equally-sized arrays. Paths are dotted (`lot.amount`) and indexed (`tags[1]`).
pub fn nested_changes(before: &Value, after: &Value, prefix: &str) -> Vec<String> {
    let mut changes = Vec::new();

    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                let path = join(key);
                match after_obj.get(key) {
                    Some(after_val) if after_val != before_val => {
                        changes.extend(nested_changes(before_val, after_val, &path));
                    }
                    Some(_) => {}
                    None => changes.push(format!(
                        "{}: {} -> (removed)",
                        path,
                        format_value(before_val)
                    )),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!(
                        "{}: (added) -> {}",
                        join(key),
                        format_value(after_val)
                    ));
                }
            }
        }
        (Value::Array(before_arr), Value::Array(after_arr))
            if before_arr.len() == after_arr.len() =>
        {
            for (i, (b, a)) in before_arr.iter().zip(after_arr.iter()).enumerate() {
                if b != a {
                    changes.extend(nested_changes(b, a, &format!("{}[{}]", prefix, i)));
                }
            }
        }
        _ => {
            if before != after {
                changes.push(format!(
                    "{}: {} -> {}",
                    prefix,
                    format_value(before),
                    format_value(after)
                ));
            }
        }
    }

    changes
}
