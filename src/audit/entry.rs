//! Audit entry data structures
//!
//! A log entry is a tagged variant: the common header (id, timestamp, level,
//! target, acting user) plus a [`LogEvent`] payload whose discriminator is
//! [`EventKind`]. Event kinds carry stable codes just like target types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::diff::ChangeSet;
use crate::error::{PartLogError, PartLogResult};
use crate::models::{LogEntryId, Target, TargetType, UserRef};

/// Discriminator of the event axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UserLogin,
    UserLogout,
    UserNotAllowed,
    Deleted,
    Created,
    Edited,
    InstockChanged,
    CollectionElementDeleted,
    SecurityEvent,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::UserLogin,
        EventKind::UserLogout,
        EventKind::UserNotAllowed,
        EventKind::Deleted,
        EventKind::Created,
        EventKind::Edited,
        EventKind::InstockChanged,
        EventKind::CollectionElementDeleted,
        EventKind::SecurityEvent,
    ];

    /// Stable persisted code. Gaps belong to kinds this crate does not record.
    pub fn code(self) -> u8 {
        match self {
            EventKind::UserLogin => 1,
            EventKind::UserLogout => 2,
            EventKind::UserNotAllowed => 3,
            EventKind::Deleted => 5,
            EventKind::Created => 6,
            EventKind::Edited => 7,
            EventKind::InstockChanged => 9,
            EventKind::CollectionElementDeleted => 11,
            EventKind::SecurityEvent => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::UserLogin => "user_login",
            EventKind::UserLogout => "user_logout",
            EventKind::UserNotAllowed => "user_not_allowed",
            EventKind::Deleted => "deleted",
            EventKind::Created => "created",
            EventKind::Edited => "edited",
            EventKind::InstockChanged => "instock_changed",
            EventKind::CollectionElementDeleted => "collection_element_deleted",
            EventKind::SecurityEvent => "security_event",
        }
    }

    pub fn from_code(code: u8) -> PartLogResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| PartLogError::InvalidArgument(format!("unknown event kind code {}", code)))
    }

    /// Whether events of this kind must name the element they changed
    pub fn requires_target(self) -> bool {
        matches!(
            self,
            EventKind::Created
                | EventKind::Edited
                | EventKind::Deleted
                | EventKind::InstockChanged
                | EventKind::CollectionElementDeleted
        )
    }

    /// Severity used when the writer does not choose one
    pub fn default_level(self) -> LogLevel {
        match self {
            EventKind::UserNotAllowed => LogLevel::Warning,
            EventKind::SecurityEvent => LogLevel::Notice,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = PartLogError;

    /// Parse from the name ("edited", "Edited", "user-login") or the code ("7")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code);
        }

        let normalized = s.to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| PartLogError::InvalidArgument(format!("unknown event kind '{}'", s)))
    }
}

/// Syslog-style severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Emergency => "emergency",
            LogLevel::Alert => "alert",
            LogLevel::Critical => "critical",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Notice => "notice",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LogLevel {
    type Err = PartLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emergency" => Ok(LogLevel::Emergency),
            "alert" => Ok(LogLevel::Alert),
            "critical" => Ok(LogLevel::Critical),
            "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "notice" => Ok(LogLevel::Notice),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(PartLogError::InvalidArgument(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

/// Account-security events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    PasswordChanged,
    PasswordReset,
    BackupKeysReset,
    U2fAdded,
    U2fRemoved,
    GoogleEnabled,
    GoogleDisabled,
    TrustedDeviceReset,
}

/// Event-specific payload of a log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    UserLogin {
        ip: String,
    },
    UserLogout {
        ip: String,
    },
    UserNotAllowed {
        path: String,
    },
    Deleted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_name: Option<String>,
        /// Document of the element right before it was removed
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snapshot: Option<Map<String, Value>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    Created {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    Edited {
        changes: ChangeSet,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    InstockChanged {
        old_amount: f64,
        new_amount: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
    CollectionElementDeleted {
        collection: String,
        deleted: Target,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_name: Option<String>,
    },
    SecurityEvent {
        event: SecurityEventType,
        ip: String,
    },
}

impl LogEvent {
    pub fn created() -> Self {
        LogEvent::Created { comment: None }
    }

    pub fn edited(changes: ChangeSet) -> Self {
        LogEvent::Edited {
            changes,
            comment: None,
        }
    }

    pub fn deleted(old_name: Option<String>, snapshot: Option<Map<String, Value>>) -> Self {
        LogEvent::Deleted {
            old_name,
            snapshot,
            comment: None,
        }
    }

    /// Build an event from a kind and a free-form JSON payload
    ///
    /// `data` holds the variant fields (`null` for none). For `edited`, a payload
    /// without a `changes` key is taken to be the change set itself.
    pub fn from_parts(kind: EventKind, data: Value) -> PartLogResult<Self> {
        let mut fields = match data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(PartLogError::InvalidArgument(format!(
                    "event data must be a JSON object, got {}",
                    other
                )))
            }
        };

        if kind == EventKind::Edited && !fields.contains_key("changes") {
            fields = Map::from_iter([("changes".to_string(), Value::Object(fields))]);
        }

        fields.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            PartLogError::InvalidArgument(format!("invalid data for {} event: {}", kind, e))
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            LogEvent::UserLogin { .. } => EventKind::UserLogin,
            LogEvent::UserLogout { .. } => EventKind::UserLogout,
            LogEvent::UserNotAllowed { .. } => EventKind::UserNotAllowed,
            LogEvent::Deleted { .. } => EventKind::Deleted,
            LogEvent::Created { .. } => EventKind::Created,
            LogEvent::Edited { .. } => EventKind::Edited,
            LogEvent::InstockChanged { .. } => EventKind::InstockChanged,
            LogEvent::CollectionElementDeleted { .. } => EventKind::CollectionElementDeleted,
            LogEvent::SecurityEvent { .. } => EventKind::SecurityEvent,
        }
    }

    /// Short human-readable description of the payload
    pub fn summary(&self) -> String {
        match self {
            LogEvent::UserLogin { ip } => format!("login from {}", ip),
            LogEvent::UserLogout { ip } => format!("logout from {}", ip),
            LogEvent::UserNotAllowed { path } => format!("access denied to {}", path),
            LogEvent::Deleted { old_name, .. } => match old_name {
                Some(name) => format!("deleted \"{}\"", name),
                None => "deleted".to_string(),
            },
            LogEvent::Created { comment } => match comment {
                Some(comment) => format!("created ({})", comment),
                None => "created".to_string(),
            },
            LogEvent::Edited { changes, .. } => changes
                .summary()
                .unwrap_or_else(|| "no field changes".to_string()),
            LogEvent::InstockChanged {
                old_amount,
                new_amount,
                ..
            } => format!("stock: {} -> {}", old_amount, new_amount),
            LogEvent::CollectionElementDeleted {
                collection,
                deleted,
                old_name,
            } => match old_name {
                Some(name) => format!("removed {} \"{}\" from {}", deleted, name, collection),
                None => format!("removed {} from {}", deleted, collection),
            },
            LogEvent::SecurityEvent { event, ip } => format!("{:?} from {}", event, ip),
        }
    }
}

/// A single, immutable log entry as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Assigned by the record store on insert
    pub id: LogEntryId,

    /// When the event happened (UTC)
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// The element this entry is about, if any. May no longer exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    /// Acting user; `None` when the system acted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,

    pub event: LogEvent,
}

impl LogEntry {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// The change set of an edit entry
    pub fn changes(&self) -> Option<&ChangeSet> {
        match &self.event {
            LogEvent::Edited { changes, .. } => Some(changes),
            _ => None,
        }
    }

    pub fn is_about(&self, target: Target) -> bool {
        self.target == Some(target)
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.id,
            self.kind().as_str().to_uppercase(),
        );

        if let Some(target) = &self.target {
            output.push_str(&format!(" {}", target));
        }

        if let Some(user) = &self.user {
            output.push_str(&format!(" by {}", user.username));
        }

        if let Some(changes) = self.changes() {
            if let Some(summary) = changes.summary() {
                output.push_str(&format!("\n  Changes: {}", summary));
            }
        } else {
            output.push_str(&format!("\n  {}", self.event.summary()));
        }

        output
    }
}

/// A log entry that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: Option<LogLevel>,
    pub target: Option<Target>,
    pub user: Option<UserRef>,
    pub event: LogEvent,
}

impl NewLogEntry {
    pub fn new(event: LogEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            level: None,
            target: None,
            user: None,
            event,
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn user(mut self, user: Option<UserRef>) -> Self {
        self.user = user;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Reject entries whose target does not fit the event
    pub fn validate(&self) -> PartLogResult<()> {
        let kind = self.event.kind();

        if kind.requires_target() && self.target.is_none() {
            return Err(PartLogError::InvalidArgument(format!(
                "{} events must name a target element",
                kind
            )));
        }

        match (kind, self.target) {
            (EventKind::InstockChanged, Some(target)) if target.target_type != TargetType::PartLot => {
                Err(PartLogError::InvalidArgument(format!(
                    "stock changes are recorded on part lots, not on {}",
                    target.target_type
                )))
            }
            (
                EventKind::UserLogin
                | EventKind::UserLogout
                | EventKind::UserNotAllowed
                | EventKind::SecurityEvent,
                Some(target),
            ) if target.target_type != TargetType::User => Err(PartLogError::InvalidArgument(
                format!("{} events can only target users, not {}", kind, target.target_type),
            )),
            _ => Ok(()),
        }
    }

    /// Turn into a stored entry under the given id
    pub fn into_entry(self, id: LogEntryId) -> LogEntry {
        let level = self.level.unwrap_or_else(|| self.event.kind().default_level());
        LogEntry {
            id,
            timestamp: self.timestamp,
            level,
            target: self.target,
            user: self.user,
            event: self.event,
        }
    }
}
