//! Log CLI commands
//!
//! History, attribution and time-travel queries over the audit log, plus
//! manual recording of events that have no element mutation behind them
//! (logins, access denials, security events).

use clap::Subcommand;
use serde_json::Value;

use super::{parse_target, parse_timestamp, parse_user, timestamp_or_now};
use crate::audit::{
    AuditLog, EventKind, LogEntry, LogEvent, LogLevel, LogQuery, NewLogEntry, SortOrder,
};
use crate::config::Settings;
use crate::display::{format_entry_details, format_history_lines, format_history_table};
use crate::error::{PartLogError, PartLogResult};
use crate::models::{LogEntryId, TargetType, UserId, UserRef};
use crate::storage::Storage;

/// Log subcommands
#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// History of one element
    History {
        target_type: String,
        id: u64,
        /// asc or desc (default from settings)
        #[arg(short, long)]
        order: Option<String>,
        /// Maximum number of entries (default from settings)
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
        /// One line per entry instead of a table
        #[arg(long)]
        lines: bool,
    },
    /// Recent entries across all elements
    Feed {
        /// Only entries about elements of this type
        #[arg(short = 't', long = "type")]
        target_type: Option<String>,
        /// Only entries of this kind
        #[arg(short, long)]
        kind: Option<String>,
        /// Only entries by this user id
        #[arg(short, long)]
        user: Option<u64>,
        /// Only entries strictly after this time
        #[arg(long)]
        after: Option<String>,
        /// Only entries at or before this time
        #[arg(long)]
        until: Option<String>,
        #[arg(short, long)]
        order: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        lines: bool,
    },
    /// Edits of an element after a point in time, newest first
    Since {
        target_type: String,
        id: u64,
        /// Cutoff (RFC 3339 or unix seconds)
        timestamp: String,
    },
    /// Whether an element existed at a point in time
    Existed {
        target_type: String,
        id: u64,
        timestamp: String,
    },
    /// Who created and who last edited an element
    Who { target_type: String, id: u64 },
    /// Show one log entry
    Show {
        /// Entry id
        id: String,
    },
    /// Record a user or security event by hand
    Record {
        /// Event kind (user_login, user_logout, user_not_allowed, security_event)
        kind: String,
        /// Target element type
        #[arg(short = 't', long = "type", requires = "id")]
        target_type: Option<String>,
        /// Target element id
        #[arg(long, requires = "target_type")]
        id: Option<u64>,
        /// Acting user, as ID:NAME
        #[arg(short, long)]
        user: Option<String>,
        /// Severity (default depends on the kind)
        #[arg(long)]
        level: Option<String>,
        /// Event fields as a JSON object
        #[arg(short, long)]
        data: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
}

/// Handle a log command
pub fn handle_log_command(storage: &Storage, settings: &Settings, cmd: LogCommands) -> PartLogResult<()> {
    let log = AuditLog::new(&storage.log, &storage.elements);

    match cmd {
        LogCommands::History {
            target_type,
            id,
            order,
            limit,
            offset,
            lines,
        } => {
            let target = parse_target(&target_type, id)?;
            let order = parse_order(order.as_deref(), settings)?;
            let limit = Some(limit.unwrap_or(settings.history_page_size));

            let entries = log.history(target, order, limit, offset)?;
            let total = log.count(&LogQuery::new().target(target))?;
            print_entries(&entries, lines);
            if entries.len() < total {
                println!("Showing {} of {} entries", entries.len(), total);
            }
        }

        LogCommands::Feed {
            target_type,
            kind,
            user,
            after,
            until,
            order,
            limit,
            offset,
            lines,
        } => {
            let mut query = LogQuery::new();
            if let Some(target_type) = target_type {
                query = query.target_type(target_type.parse::<TargetType>()?);
            }
            if let Some(kind) = kind {
                query = query.kind(kind.parse::<EventKind>()?);
            }
            if let Some(user) = user {
                query = query.user(UserId::new(user));
            }
            if let Some(after) = after {
                query = query.after(parse_timestamp(&after)?);
            }
            if let Some(until) = until {
                query = query.until(parse_timestamp(&until)?);
            }
            let query = query
                .order(parse_order(order.as_deref(), settings)?)
                .page(Some(limit.unwrap_or(settings.history_page_size)), offset);

            let entries = log.find(&query)?;
            let total = log.count(&query)?;
            print_entries(&entries, lines);
            if !entries.is_empty() {
                println!("Showing {} of {} entries", entries.len(), total);
            }
        }

        LogCommands::Since {
            target_type,
            id,
            timestamp,
        } => {
            let target = parse_target(&target_type, id)?;
            let entries = log.edits_after(target, parse_timestamp(&timestamp)?)?;
            print_entries(&entries, true);
        }

        LogCommands::Existed {
            target_type,
            id,
            timestamp,
        } => {
            let target = parse_target(&target_type, id)?;
            let at = parse_timestamp(&timestamp)?;
            let existed = log.existed_at(target, at)?;
            println!(
                "{} {} at {}",
                target,
                if existed { "existed" } else { "did not exist" },
                at.to_rfc3339()
            );
        }

        LogCommands::Who { target_type, id } => {
            let target = parse_target(&target_type, id)?;
            let describe = |user: Option<UserRef>| {
                user.map(|u| u.to_string())
                    .unwrap_or_else(|| "(unknown)".to_string())
            };
            println!("Element:     {}", target);
            println!("Created by:  {}", describe(log.creating_user(target)?));
            println!("Last edit:   {}", describe(log.last_editing_user(target)?));
        }

        LogCommands::Show { id } => {
            let entry_id: LogEntryId = id
                .parse()
                .map_err(|e| PartLogError::InvalidArgument(format!("invalid entry id '{}': {}", id, e)))?;
            let entry = storage
                .log
                .get(entry_id)?
                .ok_or_else(|| PartLogError::log_entry_not_found(entry_id.to_string()))?;

            print!("{}", format_entry_details(&entry));
            if let Some(element) = log.resolve_target(&entry)? {
                println!("Currently:   {}", element.name);
            } else if entry.target.is_some() {
                println!("Currently:   (deleted)");
            }
        }

        LogCommands::Record {
            kind,
            target_type,
            id,
            user,
            level,
            data,
            at,
        } => {
            let kind: EventKind = kind.parse()?;
            // Element lifecycle entries are only written alongside the mutation
            if kind.requires_target() {
                return Err(PartLogError::InvalidArgument(format!(
                    "{} entries are recorded by the element commands, not by hand",
                    kind
                )));
            }
            let target = match (target_type, id) {
                (Some(target_type), Some(id)) => Some(parse_target(&target_type, id)?),
                (None, None) => None,
                _ => {
                    return Err(PartLogError::InvalidArgument(
                        "--type and --id must be given together".into(),
                    ))
                }
            };
            let data = match data {
                Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                    PartLogError::InvalidArgument(format!("--data is not valid JSON: {}", e))
                })?,
                None => Value::Null,
            };

            let mut entry = NewLogEntry::new(LogEvent::from_parts(kind, data)?, timestamp_or_now(at.as_deref())?)
                .user(parse_user(user.as_deref())?);
            if let Some(target) = target {
                entry = entry.target(target);
            }
            if let Some(level) = level {
                entry = entry.level(level.parse::<LogLevel>()?);
            }

            let stored = log.record(entry)?;
            println!("Recorded {} ({})", stored.id, stored.kind());
        }
    }

    Ok(())
}

fn parse_order(order: Option<&str>, settings: &Settings) -> PartLogResult<SortOrder> {
    match order {
        Some(order) => order.parse(),
        None => Ok(settings.default_order),
    }
}

fn print_entries(entries: &[LogEntry], lines: bool) {
    if lines {
        print!("{}", format_history_lines(entries));
    } else {
        print!("{}", format_history_table(entries));
    }
}
