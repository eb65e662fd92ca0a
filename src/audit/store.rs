//! The audit log store
//!
//! Records log entries and answers history, time-travel and attribution
//! questions on top of a [`LogRecords`] backend and an [`ElementLookup`].
//!
//! The store never opens or commits a transaction. Writers are expected to
//! hand it the transaction they are already mutating elements in (see
//! [`crate::storage::Storage::transaction`]) so that a rolled-back mutation
//! also drops its log entry.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::entry::{EventKind, LogEntry, LogEvent, NewLogEntry};
use super::query::{LogQuery, SortOrder};
use crate::error::PartLogResult;
use crate::models::{Element, Target, UserRef};
use crate::storage::{ElementLookup, LogRecords};

/// Audit log over a record store and an element store
pub struct AuditLog<'a> {
    records: &'a dyn LogRecords,
    elements: &'a dyn ElementLookup,
}

impl<'a> AuditLog<'a> {
    pub fn new(records: &'a dyn LogRecords, elements: &'a dyn ElementLookup) -> Self {
        Self { records, elements }
    }

    /// Append one entry
    ///
    /// Invalid entries are rejected before the backend is touched. Store
    /// failures are returned as-is; the append is never retried, since a retry
    /// after an ambiguous failure could duplicate the entry.
    pub fn record(&self, entry: NewLogEntry) -> PartLogResult<LogEntry> {
        entry.validate()?;
        let stored = self.records.insert(entry)?;

        info!(
            log_id = %stored.id,
            kind = %stored.kind(),
            target = ?stored.target,
            "recorded log entry"
        );

        Ok(stored)
    }

    /// Append one event about `target`, performed by `user` at `timestamp`
    pub fn record_event(
        &self,
        event: LogEvent,
        target: Option<Target>,
        user: Option<UserRef>,
        timestamp: DateTime<Utc>,
    ) -> PartLogResult<LogEntry> {
        let mut entry = NewLogEntry::new(event, timestamp).user(user);
        entry.target = target;
        self.record(entry)
    }

    /// All entries about one element
    pub fn history(
        &self,
        target: Target,
        order: SortOrder,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> PartLogResult<Vec<LogEntry>> {
        debug!(%target, %order, ?limit, ?offset, "loading element history");
        self.records
            .query(&LogQuery::new().target(target).order(order).page(limit, offset))
    }

    /// All entries, system-wide
    pub fn all_history(
        &self,
        order: SortOrder,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> PartLogResult<Vec<LogEntry>> {
        self.records
            .query(&LogQuery::new().order(order).page(limit, offset))
    }

    /// Edit entries for `target` newer than `cutoff`, newest first
    ///
    /// Reverting them in this order over the element's current state yields
    /// its state at `cutoff`. An empty result means nothing changed since.
    pub fn edits_after(&self, target: Target, cutoff: DateTime<Utc>) -> PartLogResult<Vec<LogEntry>> {
        self.records.query(
            &LogQuery::new()
                .target(target)
                .kind(EventKind::Edited)
                .after(cutoff)
                .order(SortOrder::Descending),
        )
    }

    /// Whether `target` is not known to have been created after `timestamp`
    ///
    /// Only `Created` entries are consulted. An element that was created and
    /// then deleted before `timestamp` still reports `true`, as does an element
    /// with no `Created` entry at all.
    pub fn existed_at(&self, target: Target, timestamp: DateTime<Utc>) -> PartLogResult<bool> {
        let created_later = self.records.count(
            &LogQuery::new()
                .target(target)
                .kind(EventKind::Created)
                .after(timestamp),
        )?;

        Ok(created_later == 0)
    }

    /// The live element an entry is about, or `None` if it has no target or
    /// the element is gone
    pub fn resolve_target(&self, entry: &LogEntry) -> PartLogResult<Option<Element>> {
        match entry.target {
            Some(target) => self.elements.find(target),
            None => Ok(None),
        }
    }

    /// User of the most recent `kind` entry about `target`
    pub fn acting_user(&self, target: Target, kind: EventKind) -> PartLogResult<Option<UserRef>> {
        let latest = self.records.query(
            &LogQuery::new()
                .target(target)
                .kind(kind)
                .order(SortOrder::Descending)
                .limit(1),
        )?;

        Ok(latest.into_iter().next().and_then(|entry| entry.user))
    }

    pub fn creating_user(&self, target: Target) -> PartLogResult<Option<UserRef>> {
        self.acting_user(target, EventKind::Created)
    }

    pub fn last_editing_user(&self, target: Target) -> PartLogResult<Option<UserRef>> {
        self.acting_user(target, EventKind::Edited)
    }

    /// Entries matching arbitrary criteria
    pub fn find(&self, query: &LogQuery) -> PartLogResult<Vec<LogEntry>> {
        self.records.query(query)
    }

    /// Number of entries matching the filter part of `query`
    pub fn count(&self, query: &LogQuery) -> PartLogResult<usize> {
        self.records.count(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ChangeSet;
    use crate::error::PartLogError;
    use crate::models::{ElementId, TargetType};
    use crate::storage::{ElementRepository, LogRepository};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn alice() -> Option<UserRef> {
        Some(UserRef::new(1, "alice"))
    }

    fn bob() -> Option<UserRef> {
        Some(UserRef::new(2, "bob"))
    }

    struct Fixture {
        _temp: TempDir,
        records: LogRepository,
        elements: ElementRepository,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let records = LogRepository::new(temp.path().join("log.jsonl"));
            let elements = ElementRepository::new(temp.path().join("elements.json"));
            records.load().unwrap();
            elements.load().unwrap();
            Self {
                _temp: temp,
                records,
                elements,
            }
        }

        fn log(&self) -> AuditLog<'_> {
            AuditLog::new(&self.records, &self.elements)
        }
    }

    fn part_42() -> Target {
        Target::new(TargetType::Part, 42)
    }

    fn quantity_edit(old: i64, new: i64) -> LogEvent {
        LogEvent::edited(ChangeSet::new().with("quantity", Some(json!(old)), Some(json!(new))))
    }

    /// Created at 100 by alice, edited at 200 by bob (5 -> 10), edited at 300 by alice (10 -> 7)
    fn record_part_lifecycle(log: &AuditLog<'_>) {
        log.record_event(LogEvent::created(), Some(part_42()), alice(), at(100))
            .unwrap();
        log.record_event(quantity_edit(5, 10), Some(part_42()), bob(), at(200))
            .unwrap();
        log.record_event(quantity_edit(10, 7), Some(part_42()), alice(), at(300))
            .unwrap();
    }

    #[test]
    fn test_full_lifecycle_history() {
        let fixture = Fixture::new();
        let log = fixture.log();

        log.record_event(LogEvent::created(), Some(part_42()), alice(), at(100))
            .unwrap();
        log.record_event(quantity_edit(5, 10), Some(part_42()), bob(), at(200))
            .unwrap();
        log.record_event(LogEvent::deleted(None, None), Some(part_42()), alice(), at(300))
            .unwrap();

        let desc = log.history(part_42(), SortOrder::Descending, None, None).unwrap();
        let kinds: Vec<EventKind> = desc.iter().map(LogEntry::kind).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Deleted, EventKind::Edited, EventKind::Created]
        );

        let asc = log.history(part_42(), SortOrder::Ascending, None, None).unwrap();
        assert_eq!(asc.len(), 3);
        assert_eq!(asc[0].kind(), EventKind::Created);
    }

    #[test]
    fn test_descending_is_reverse_of_ascending() {
        let fixture = Fixture::new();
        let log = fixture.log();

        // Same-timestamp events are allowed
        for _ in 0..3 {
            log.record_event(quantity_edit(1, 2), Some(part_42()), None, at(500))
                .unwrap();
        }
        record_part_lifecycle(&log);

        let asc = log.history(part_42(), SortOrder::Ascending, None, None).unwrap();
        let mut desc = log.history(part_42(), SortOrder::Descending, None, None).unwrap();
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_history_only_covers_target() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);
        log.record_event(
            LogEvent::created(),
            Some(Target::new(TargetType::Category, 42)),
            None,
            at(150),
        )
        .unwrap();

        assert_eq!(log.history(part_42(), SortOrder::Descending, None, None).unwrap().len(), 3);
        assert_eq!(log.all_history(SortOrder::Descending, None, None).unwrap().len(), 4);
    }

    #[test]
    fn test_history_is_repeatable() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        let first = log.history(part_42(), SortOrder::Descending, Some(2), Some(0)).unwrap();
        let second = log.history(part_42(), SortOrder::Descending, Some(2), Some(0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_history_pagination() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        let page = log.history(part_42(), SortOrder::Ascending, Some(1), Some(1)).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].timestamp, at(200));

        let past_end = log.history(part_42(), SortOrder::Ascending, Some(5), Some(10)).unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_all_history_feed_order() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        let feed = log.all_history(SortOrder::Descending, Some(2), None).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].timestamp, at(300));
        assert_eq!(feed[1].timestamp, at(200));
    }

    #[test]
    fn test_edits_after_scenario() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        let edits = log.edits_after(part_42(), at(150)).unwrap();
        let times: Vec<DateTime<Utc>> = edits.iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![at(300), at(200)]);

        // Replay backward from the current state
        let mut doc = serde_json::Map::new();
        doc.insert("quantity".into(), json!(7));
        for edit in &edits {
            edit.changes().unwrap().revert(&mut doc);
        }
        assert_eq!(doc.get("quantity"), Some(&json!(5)));
    }

    #[test]
    fn test_edits_after_cutoff_is_strict() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        let edits = log.edits_after(part_42(), at(200)).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].timestamp, at(300));

        assert!(log.edits_after(part_42(), at(300)).unwrap().is_empty());
    }

    #[test]
    fn test_existed_at_around_creation() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);

        assert!(!log.existed_at(part_42(), at(50)).unwrap());
        assert!(!log.existed_at(part_42(), at(99)).unwrap());
        assert!(log.existed_at(part_42(), at(100)).unwrap());
        assert!(log.existed_at(part_42(), at(1000)).unwrap());
    }

    #[test]
    fn test_existed_at_ignores_deletion() {
        // Pins current behaviour: Deleted entries are not consulted, so an
        // element deleted before the timestamp still reports true.
        let fixture = Fixture::new();
        let log = fixture.log();
        log.record_event(LogEvent::created(), Some(part_42()), alice(), at(100))
            .unwrap();
        log.record_event(LogEvent::deleted(None, None), Some(part_42()), alice(), at(200))
            .unwrap();

        assert!(log.existed_at(part_42(), at(500)).unwrap());
    }

    #[test]
    fn test_existed_at_without_created_entry() {
        let fixture = Fixture::new();
        let log = fixture.log();
        assert!(log.existed_at(part_42(), at(0)).unwrap());
    }

    #[test]
    fn test_resolve_target() {
        let fixture = Fixture::new();
        let log = fixture.log();

        let element = Element::new(part_42(), "Resistor", at(100));
        fixture.elements.upsert(element.clone()).unwrap();

        let entry = log
            .record_event(LogEvent::created(), Some(part_42()), alice(), at(100))
            .unwrap();
        assert_eq!(log.resolve_target(&entry).unwrap(), Some(element));

        fixture.elements.delete(part_42()).unwrap();
        assert_eq!(log.resolve_target(&entry).unwrap(), None);
    }

    #[test]
    fn test_resolve_target_without_target() {
        let fixture = Fixture::new();
        let log = fixture.log();
        let entry = log
            .record_event(LogEvent::UserLogin { ip: "::1".into() }, None, None, at(1))
            .unwrap();
        assert_eq!(log.resolve_target(&entry).unwrap(), None);
    }

    #[test]
    fn test_acting_user() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);
        log.record_event(LogEvent::deleted(None, None), Some(part_42()), bob(), at(400))
            .unwrap();

        assert_eq!(log.last_editing_user(part_42()).unwrap(), alice());
        assert_eq!(log.creating_user(part_42()).unwrap(), alice());
        assert_eq!(log.acting_user(part_42(), EventKind::Deleted).unwrap(), bob());
    }

    #[test]
    fn test_acting_user_none_without_edits() {
        let fixture = Fixture::new();
        let log = fixture.log();
        log.record_event(LogEvent::created(), Some(part_42()), alice(), at(100))
            .unwrap();
        log.record_event(LogEvent::deleted(None, None), Some(part_42()), bob(), at(200))
            .unwrap();

        assert_eq!(log.last_editing_user(part_42()).unwrap(), None);
    }

    #[test]
    fn test_acting_user_system_edit() {
        let fixture = Fixture::new();
        let log = fixture.log();
        record_part_lifecycle(&log);
        log.record_event(quantity_edit(7, 8), Some(part_42()), None, at(400))
            .unwrap();

        assert_eq!(log.last_editing_user(part_42()).unwrap(), None);
    }

    #[test]
    fn test_invalid_entry_is_not_written() {
        let fixture = Fixture::new();
        let log = fixture.log();

        let err = log
            .record_event(LogEvent::created(), None, alice(), at(100))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(log.count(&LogQuery::new()).unwrap(), 0);
    }

    #[test]
    fn test_ids_are_assigned_in_insert_order() {
        let fixture = Fixture::new();
        let log = fixture.log();
        let first = log
            .record_event(LogEvent::created(), Some(part_42()), None, at(100))
            .unwrap();
        let second = log
            .record_event(quantity_edit(1, 2), Some(part_42()), None, at(100))
            .unwrap();
        assert!(first.id < second.id);
    }

    /// Backend that fails every call
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl LogRecords for BrokenStore {
        fn insert(&self, _entry: NewLogEntry) -> PartLogResult<LogEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PartLogError::Storage("connection refused".into()))
        }

        fn query(&self, _query: &LogQuery) -> PartLogResult<Vec<LogEntry>> {
            Err(PartLogError::Storage("connection refused".into()))
        }

        fn count(&self, _query: &LogQuery) -> PartLogResult<usize> {
            Err(PartLogError::Storage("connection refused".into()))
        }
    }

    struct NoElements;

    impl ElementLookup for NoElements {
        fn find(&self, _target: Target) -> PartLogResult<Option<Element>> {
            Err(PartLogError::Storage("connection refused".into()))
        }
    }

    #[test]
    fn test_store_failures_propagate_without_retry() {
        let store = BrokenStore {
            calls: AtomicUsize::new(0),
        };
        let log = AuditLog::new(&store, &NoElements);

        let err = log
            .record_event(LogEvent::created(), Some(part_42()), None, at(1))
            .unwrap_err();
        assert!(err.is_storage());
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);

        assert!(log.history(part_42(), SortOrder::Descending, None, None).unwrap_err().is_storage());
        assert!(log.existed_at(part_42(), at(1)).unwrap_err().is_storage());
        assert!(log.acting_user(part_42(), EventKind::Edited).unwrap_err().is_storage());

        let entry = NewLogEntry::new(LogEvent::created(), at(1))
            .target(Target::new(TargetType::Part, ElementId::new(1)))
            .into_entry(crate::models::LogEntryId::new(1));
        assert!(log.resolve_target(&entry).unwrap_err().is_storage());
    }
}
