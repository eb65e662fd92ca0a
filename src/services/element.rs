//! Element service
//!
//! Creates, edits and deletes tracked elements. Every mutation and the log
//! entry describing it are written in the same storage transaction, so either
//! both land or neither does.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::audit::{AuditLog, ChangeSet, LogEntry, LogEvent, NewLogEntry};
use crate::error::{PartLogError, PartLogResult};
use crate::models::{Element, Target, TargetType, UserRef, NAME_FIELD};
use crate::storage::Storage;

/// Field holding the stock amount of a part lot
pub const AMOUNT_FIELD: &str = "amount";

/// Requested changes to an element
#[derive(Debug, Clone, Default)]
pub struct ElementUpdate {
    pub name: Option<String>,
    pub set: Map<String, Value>,
    pub unset: Vec<String>,
    pub comment: Option<String>,
}

impl ElementUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.insert(field.into(), value);
        self
    }

    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Result of an edit
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub element: Element,
    /// `None` when the update changed nothing and no entry was written
    pub entry: Option<LogEntry>,
}

/// Service for element management
pub struct ElementService<'a> {
    storage: &'a Storage,
}

impl<'a> ElementService<'a> {
    /// Create a new element service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create an element under the next free id of its type
    pub fn create(
        &self,
        target_type: TargetType,
        name: &str,
        fields: Map<String, Value>,
        user: Option<UserRef>,
        at: DateTime<Utc>,
    ) -> PartLogResult<Element> {
        let id = self.storage.elements.next_id(target_type)?;
        self.create_with_id(Target::new(target_type, id), name, fields, user, at)
    }

    /// Create an element under a caller-chosen id
    pub fn create_with_id(
        &self,
        target: Target,
        name: &str,
        fields: Map<String, Value>,
        user: Option<UserRef>,
        at: DateTime<Utc>,
    ) -> PartLogResult<Element> {
        let name = validate_name(name)?;
        if fields.contains_key(NAME_FIELD) {
            return Err(reserved_name_field());
        }

        self.storage.transaction(|tx| {
            if tx.elements().get(target)?.is_some() {
                return Err(PartLogError::Duplicate {
                    entity_type: "Element",
                    identifier: target.to_string(),
                });
            }

            let mut element = Element::new(target, name, at);
            element.fields = fields;
            tx.elements().upsert(element.clone())?;

            AuditLog::new(tx, tx).record_event(LogEvent::created(), Some(target), user, at)?;

            debug!(%target, "element created");
            Ok(element)
        })
    }

    /// Get an element
    pub fn get(&self, target: Target) -> PartLogResult<Option<Element>> {
        self.storage.elements.get(target)
    }

    /// List elements, optionally of one type
    pub fn list(&self, target_type: Option<TargetType>) -> PartLogResult<Vec<Element>> {
        self.storage.elements.get_all(target_type)
    }

    /// Apply an update and log the field changes it made
    ///
    /// An update that changes nothing writes nothing.
    pub fn edit(
        &self,
        target: Target,
        update: ElementUpdate,
        user: Option<UserRef>,
        at: DateTime<Utc>,
    ) -> PartLogResult<EditOutcome> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        // Renames only go through `update.name`
        if update.set.contains_key(NAME_FIELD) || update.unset.iter().any(|f| f == NAME_FIELD) {
            return Err(reserved_name_field());
        }

        self.storage.transaction(|tx| {
            let mut element = tx
                .elements()
                .get(target)?
                .ok_or_else(|| PartLogError::element_not_found(target.to_string()))?;

            let before = element.document();
            let mut after = before.clone();
            for field in &update.unset {
                after.remove(field);
            }
            for (field, value) in &update.set {
                after.insert(field.clone(), value.clone());
            }
            if let Some(name) = &update.name {
                after.insert(NAME_FIELD.to_string(), Value::String(name.trim().to_string()));
            }

            let changes = ChangeSet::between(&before, &after);
            if changes.is_empty() {
                return Ok(EditOutcome {
                    element,
                    entry: None,
                });
            }

            element.set_document(after);
            element.updated_at = at;
            tx.elements().upsert(element.clone())?;

            let event = LogEvent::Edited {
                changes,
                comment: update.comment.clone(),
            };
            let entry = AuditLog::new(tx, tx).record_event(event, Some(target), user, at)?;

            Ok(EditOutcome {
                element,
                entry: Some(entry),
            })
        })
    }

    /// Delete an element, keeping its last state in the log
    pub fn delete(
        &self,
        target: Target,
        user: Option<UserRef>,
        at: DateTime<Utc>,
        comment: Option<String>,
    ) -> PartLogResult<LogEntry> {
        self.storage.transaction(|tx| {
            let element = tx
                .elements()
                .delete(target)?
                .ok_or_else(|| PartLogError::element_not_found(target.to_string()))?;

            let event = LogEvent::Deleted {
                old_name: Some(element.name.clone()),
                snapshot: Some(element.document()),
                comment,
            };
            AuditLog::new(tx, tx).record_event(event, Some(target), user, at)
        })
    }

    /// Delete `child` as a member of `parent`'s `collection`
    ///
    /// Writes a collection entry on the parent and a deletion entry on the child.
    pub fn remove_from_collection(
        &self,
        parent: Target,
        collection: &str,
        child: Target,
        user: Option<UserRef>,
        at: DateTime<Utc>,
    ) -> PartLogResult<LogEntry> {
        self.storage.transaction(|tx| {
            if tx.elements().get(parent)?.is_none() {
                return Err(PartLogError::element_not_found(parent.to_string()));
            }

            let element = tx
                .elements()
                .delete(child)?
                .ok_or_else(|| PartLogError::element_not_found(child.to_string()))?;

            let log = AuditLog::new(tx, tx);
            log.record_event(
                LogEvent::deleted(Some(element.name.clone()), Some(element.document())),
                Some(child),
                user.clone(),
                at,
            )?;

            log.record_event(
                LogEvent::CollectionElementDeleted {
                    collection: collection.to_string(),
                    deleted: child,
                    old_name: Some(element.name),
                },
                Some(parent),
                user,
                at,
            )
        })
    }

    /// Set the stock amount of a part lot
    pub fn adjust_stock(
        &self,
        lot: Target,
        new_amount: f64,
        user: Option<UserRef>,
        at: DateTime<Utc>,
        comment: Option<String>,
    ) -> PartLogResult<LogEntry> {
        if lot.target_type != TargetType::PartLot {
            return Err(PartLogError::InvalidArgument(format!(
                "stock can only be adjusted on part lots, not on {}",
                lot.target_type
            )));
        }
        if !new_amount.is_finite() || new_amount < 0.0 {
            return Err(PartLogError::InvalidArgument(format!(
                "invalid stock amount {}",
                new_amount
            )));
        }

        self.storage.transaction(|tx| {
            let mut element = tx
                .elements()
                .get(lot)?
                .ok_or_else(|| PartLogError::element_not_found(lot.to_string()))?;

            let old_amount = element
                .field(AMOUNT_FIELD)
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            element
                .fields
                .insert(AMOUNT_FIELD.to_string(), serde_json::json!(new_amount));
            element.updated_at = at;
            tx.elements().upsert(element)?;

            let entry = NewLogEntry::new(
                LogEvent::InstockChanged {
                    old_amount,
                    new_amount,
                    comment,
                },
                at,
            )
            .target(lot)
            .user(user);
            AuditLog::new(tx, tx).record(entry)
        })
    }
}

fn reserved_name_field() -> PartLogError {
    PartLogError::InvalidArgument(format!(
        "'{}' is not a field; use the element name instead",
        NAME_FIELD
    ))
}

fn validate_name(name: &str) -> PartLogResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PartLogError::InvalidArgument(
            "Element name cannot be empty".into(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventKind, SortOrder};
    use crate::config::paths::PartLogPaths;
    use crate::models::ElementId;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = PartLogPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn alice() -> Option<UserRef> {
        Some(UserRef::new(1, "alice"))
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn history(storage: &Storage, target: Target) -> Vec<LogEntry> {
        AuditLog::new(&storage.log, &storage.elements)
            .history(target, SortOrder::Ascending, None, None)
            .unwrap()
    }

    #[test]
    fn test_create_logs_created() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);

        let element = service
            .create(TargetType::Part, "  Resistor 10k ", fields(json!({"quantity": 5})), alice(), at(100))
            .unwrap();

        assert_eq!(element.name, "Resistor 10k");
        assert_eq!(element.target.id, ElementId::new(1));

        let entries = history(&storage, element.target);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind(), EventKind::Created);
        assert_eq!(entries[0].user, alice());
        assert_eq!(entries[0].timestamp, at(100));
    }

    #[test]
    fn test_create_rejects_empty_name_without_logging() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);

        let err = service
            .create(TargetType::Part, "   ", Map::new(), alice(), at(100))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(storage.log.len().unwrap(), 0);
    }

    #[test]
    fn test_create_with_existing_id_fails() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let target = Target::new(TargetType::Part, 42);

        service
            .create_with_id(target, "Resistor", Map::new(), alice(), at(100))
            .unwrap();
        let err = service
            .create_with_id(target, "Other", Map::new(), alice(), at(110))
            .unwrap_err();

        assert!(matches!(err, PartLogError::Duplicate { .. }));
        assert_eq!(history(&storage, target).len(), 1);
    }

    #[test]
    fn test_edit_logs_field_changes() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let element = service
            .create(TargetType::Part, "Resistor", fields(json!({"quantity": 5, "memo": "x"})), alice(), at(100))
            .unwrap();

        let outcome = service
            .edit(
                element.target,
                ElementUpdate::new().set("quantity", json!(10)).unset("memo").name("Resistor 10k"),
                alice(),
                at(200),
            )
            .unwrap();

        assert_eq!(outcome.element.name, "Resistor 10k");
        assert_eq!(outcome.element.field("quantity"), Some(&json!(10)));
        assert!(outcome.element.field("memo").is_none());

        let changes = outcome.entry.unwrap().changes().cloned().unwrap();
        assert_eq!(changes.len(), 3);
        assert_eq!(changes.get("quantity").unwrap().old, Some(json!(5)));
        assert_eq!(changes.get("memo").unwrap().new, None);
        assert_eq!(changes.get("name").unwrap().new, Some(json!("Resistor 10k")));
    }

    #[test]
    fn test_edit_rejects_name_as_field() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let element = service
            .create(TargetType::Part, "Resistor", fields(json!({"quantity": 5})), alice(), at(100))
            .unwrap();

        let err = service
            .edit(element.target, ElementUpdate::new().unset(NAME_FIELD), alice(), at(200))
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = service
            .edit(element.target, ElementUpdate::new().set(NAME_FIELD, json!("")), alice(), at(210))
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = service
            .edit(element.target, ElementUpdate::new().set(NAME_FIELD, json!(7)), alice(), at(220))
            .unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(service.get(element.target).unwrap().unwrap().name, "Resistor");
        assert_eq!(history(&storage, element.target).len(), 1);
    }

    #[test]
    fn test_edit_rename_rejects_blank_name() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let element = service
            .create(TargetType::Part, "Resistor", Map::new(), alice(), at(100))
            .unwrap();

        let err = service
            .edit(element.target, ElementUpdate::new().name("  "), alice(), at(200))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(history(&storage, element.target).len(), 1);
    }

    #[test]
    fn test_create_rejects_name_as_field() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);

        let err = service
            .create(TargetType::Part, "Resistor", fields(json!({"name": "Other"})), alice(), at(100))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(storage.log.len().unwrap(), 0);
    }

    #[test]
    fn test_noop_edit_writes_nothing() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let element = service
            .create(TargetType::Part, "Resistor", fields(json!({"quantity": 5})), alice(), at(100))
            .unwrap();

        let outcome = service
            .edit(element.target, ElementUpdate::new().set("quantity", json!(5)), alice(), at(200))
            .unwrap();

        assert!(outcome.entry.is_none());
        assert_eq!(history(&storage, element.target).len(), 1);
    }

    #[test]
    fn test_edit_missing_element() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);

        let err = service
            .edit(
                Target::new(TargetType::Part, 9),
                ElementUpdate::new().set("quantity", json!(1)),
                alice(),
                at(200),
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.log.len().unwrap(), 0);
    }

    #[test]
    fn test_delete_keeps_snapshot() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let element = service
            .create(TargetType::Part, "Resistor", fields(json!({"quantity": 5})), alice(), at(100))
            .unwrap();

        let entry = service.delete(element.target, alice(), at(300), None).unwrap();
        assert!(service.get(element.target).unwrap().is_none());

        match entry.event {
            LogEvent::Deleted {
                old_name, snapshot, ..
            } => {
                assert_eq!(old_name.as_deref(), Some("Resistor"));
                assert_eq!(snapshot.unwrap().get("quantity"), Some(&json!(5)));
            }
            other => panic!("unexpected event {:?}", other),
        }

        let log = AuditLog::new(&storage.log, &storage.elements);
        let entries = history(&storage, element.target);
        assert_eq!(entries.len(), 2);
        assert_eq!(log.resolve_target(&entries[0]).unwrap(), None);
    }

    #[test]
    fn test_delete_missing_element() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let err = service
            .delete(Target::new(TargetType::Part, 1), alice(), at(300), None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_from_collection() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let part = service
            .create(TargetType::Part, "Resistor", Map::new(), alice(), at(100))
            .unwrap();
        let lot = service
            .create(TargetType::PartLot, "Drawer A1", fields(json!({"amount": 3.0})), alice(), at(110))
            .unwrap();

        let entry = service
            .remove_from_collection(part.target, "part_lots", lot.target, alice(), at(200))
            .unwrap();

        assert_eq!(entry.kind(), EventKind::CollectionElementDeleted);
        assert_eq!(entry.target, Some(part.target));
        assert!(service.get(lot.target).unwrap().is_none());

        let lot_history = history(&storage, lot.target);
        assert_eq!(lot_history.last().unwrap().kind(), EventKind::Deleted);
    }

    #[test]
    fn test_adjust_stock() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let lot = service
            .create(TargetType::PartLot, "Drawer A1", fields(json!({"amount": 3.0})), alice(), at(100))
            .unwrap();

        let entry = service
            .adjust_stock(lot.target, 7.5, alice(), at(200), Some("restock".into()))
            .unwrap();

        match entry.event {
            LogEvent::InstockChanged {
                old_amount,
                new_amount,
                ..
            } => {
                assert_eq!(old_amount, 3.0);
                assert_eq!(new_amount, 7.5);
            }
            other => panic!("unexpected event {:?}", other),
        }
        let updated = service.get(lot.target).unwrap().unwrap();
        assert_eq!(updated.field(AMOUNT_FIELD), Some(&json!(7.5)));
    }

    #[test]
    fn test_adjust_stock_rejects_non_lots() {
        let (_temp, storage) = create_test_storage();
        let service = ElementService::new(&storage);
        let part = service
            .create(TargetType::Part, "Resistor", Map::new(), alice(), at(100))
            .unwrap();

        let err = service
            .adjust_stock(part.target, 1.0, alice(), at(200), None)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
