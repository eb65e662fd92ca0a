//! Log query criteria
//!
//! A [`LogQuery`] is handed to the record store as-is: filtering, ordering and
//! pagination all happen in the store, never on an already-paginated page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entry::{EventKind, LogEntry};
use crate::error::PartLogError;
use crate::models::{Target, TargetType, UserId};

/// Timestamp ordering of query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = PartLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(PartLogError::InvalidArgument(format!(
                "unknown sort order '{}'",
                other
            ))),
        }
    }
}

/// Filter, order and page criteria for log entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogQuery {
    pub target: Option<Target>,
    /// Match every entry about this kind of element (ignored when `target` is set)
    pub target_type: Option<TargetType>,
    pub kind: Option<EventKind>,
    pub user: Option<UserId>,
    /// Only entries strictly after this instant
    pub after: Option<DateTime<Utc>>,
    /// Only entries at or before this instant
    pub until: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: Option<usize>, offset: Option<usize>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an entry passes the filter part of the query
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(target) = self.target {
            if entry.target != Some(target) {
                return false;
            }
        } else if let Some(target_type) = self.target_type {
            if entry.target.map(|t| t.target_type) != Some(target_type) {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if entry.kind() != kind {
                return false;
            }
        }

        if let Some(user) = self.user {
            if entry.user.as_ref().map(|u| u.id) != Some(user) {
                return false;
            }
        }

        if let Some(after) = self.after {
            if entry.timestamp <= after {
                return false;
            }
        }

        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }

        true
    }

    /// Filter, sort by `(timestamp, id)` and paginate a set of entries
    ///
    /// The id tie-break makes descending order the exact reverse of ascending
    /// even when several entries share a timestamp.
    pub fn apply<'a, I>(&self, entries: I) -> Vec<LogEntry>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut matched: Vec<&LogEntry> = entries.into_iter().filter(|e| self.matches(e)).collect();

        matched.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        if self.order == SortOrder::Descending {
            matched.reverse();
        }

        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{LogEvent, NewLogEntry};
    use crate::audit::ChangeSet;
    use crate::models::{LogEntryId, UserRef};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn entry(id: u64, secs: i64, event: LogEvent, target: Target) -> LogEntry {
        NewLogEntry::new(event, at(secs))
            .target(target)
            .user(Some(UserRef::new(id % 2, "someone")))
            .into_entry(LogEntryId::new(id))
    }

    fn sample() -> Vec<LogEntry> {
        let part = Target::new(TargetType::Part, 42);
        let category = Target::new(TargetType::Category, 1);
        vec![
            entry(1, 100, LogEvent::created(), part),
            entry(2, 200, LogEvent::edited(ChangeSet::new()), part),
            entry(3, 200, LogEvent::created(), category),
            entry(4, 300, LogEvent::deleted(None, None), part),
        ]
    }

    #[test]
    fn test_filter_by_target_and_kind() {
        let entries = sample();
        let part = Target::new(TargetType::Part, 42);

        let result = LogQuery::new().target(part).apply(&entries);
        assert_eq!(result.len(), 3);

        let result = LogQuery::new().target(part).kind(EventKind::Edited).apply(&entries);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, LogEntryId::new(2));

        let result = LogQuery::new().target_type(TargetType::Category).apply(&entries);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_time_window_bounds() {
        let entries = sample();
        // `after` is strict, `until` is inclusive
        let result = LogQuery::new().after(at(100)).until(at(200)).apply(&entries);
        let ids: Vec<u64> = result.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_order_tie_break_on_id() {
        let entries = sample();
        let asc: Vec<u64> = LogQuery::new()
            .order(SortOrder::Ascending)
            .apply(&entries)
            .iter()
            .map(|e| e.id.get())
            .collect();
        let mut desc: Vec<u64> = LogQuery::new()
            .apply(&entries)
            .iter()
            .map(|e| e.id.get())
            .collect();

        assert_eq!(asc, vec![1, 2, 3, 4]);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_pagination_after_sort() {
        let entries = sample();
        let page = LogQuery::new().page(Some(2), Some(1)).apply(&entries);
        let ids: Vec<u64> = page.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_filter_by_user() {
        let entries = sample();
        let result = LogQuery::new().user(UserId::new(0)).apply(&entries);
        assert!(result.iter().all(|e| e.id.get() % 2 == 0));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
