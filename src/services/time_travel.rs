//! Reconstruction of past element states
//!
//! Works backwards from the newest known state: the live element, or the
//! snapshot kept by its deletion entry, with every edit after the cutoff
//! undone newest first.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::audit::{AuditLog, EventKind, LogEntry, LogEvent, LogQuery, SortOrder};
use crate::error::PartLogResult;
use crate::models::{Element, Target};
use crate::storage::{ElementLookup, LogRecords};

pub struct TimeTravel<'a> {
    log: AuditLog<'a>,
    elements: &'a dyn ElementLookup,
}

impl<'a> TimeTravel<'a> {
    pub fn new(records: &'a dyn LogRecords, elements: &'a dyn ElementLookup) -> Self {
        Self {
            log: AuditLog::new(records, elements),
            elements,
        }
    }

    /// The state of `target` as it was at `timestamp`
    ///
    /// `None` when the element had not been created yet, or when neither the
    /// element nor a deletion snapshot of it is available.
    pub fn state_at(&self, target: Target, timestamp: DateTime<Utc>) -> PartLogResult<Option<Element>> {
        if !self.log.existed_at(target, timestamp)? {
            return Ok(None);
        }

        let mut element = match self.elements.find(target)? {
            Some(element) => element,
            None => match self.deleted_state(target)? {
                Some(element) => element,
                None => return Ok(None),
            },
        };

        let edits = self.log.edits_after(target, timestamp)?;
        debug!(%target, reverted = edits.len(), "reconstructing element state");
        revert_edits(&mut element, &edits);

        let last_edit = self.log.find(
            &LogQuery::new()
                .target(target)
                .kind(EventKind::Edited)
                .until(timestamp)
                .order(SortOrder::Descending)
                .limit(1),
        )?;
        element.updated_at = last_edit
            .first()
            .map(|entry| entry.timestamp)
            .unwrap_or(element.created_at);

        Ok(Some(element))
    }

    /// Element rebuilt from the newest deletion entry of `target`
    fn deleted_state(&self, target: Target) -> PartLogResult<Option<Element>> {
        let deletions = self.log.find(
            &LogQuery::new()
                .target(target)
                .kind(EventKind::Deleted)
                .order(SortOrder::Descending)
                .limit(1),
        )?;
        let Some(deletion) = deletions.into_iter().next() else {
            return Ok(None);
        };
        let LogEvent::Deleted {
            old_name,
            snapshot: Some(snapshot),
            ..
        } = deletion.event
        else {
            return Ok(None);
        };

        let created_at = self
            .log
            .find(
                &LogQuery::new()
                    .target(target)
                    .kind(EventKind::Created)
                    .until(deletion.timestamp)
                    .order(SortOrder::Descending)
                    .limit(1),
            )?
            .first()
            .map(|entry| entry.timestamp)
            .unwrap_or(deletion.timestamp);

        let mut element = Element::new(target, old_name.unwrap_or_default(), created_at);
        element.set_document(snapshot);
        Ok(Some(element))
    }
}

/// Undo `edits` (newest first) on `element`
pub fn revert_edits(element: &mut Element, edits: &[LogEntry]) {
    let mut document = element.document();
    for changes in edits.iter().filter_map(LogEntry::changes) {
        changes.revert(&mut document);
    }
    element.set_document(document);
}
