//! Element CLI commands
//!
//! Element mutations from the command line. Each one is logged under the
//! user given with `--user`.

use clap::Subcommand;

use super::{parse_fields, parse_target, parse_timestamp, parse_user, timestamp_or_now};
use crate::audit::AuditLog;
use crate::display::{format_element_details, format_element_list};
use crate::error::{PartLogError, PartLogResult};
use crate::models::{ElementId, Target, TargetType};
use crate::services::{ElementService, ElementUpdate, TimeTravel};
use crate::storage::Storage;

/// Element subcommands
#[derive(Subcommand, Debug)]
pub enum ElementCommands {
    /// Create an element
    Create {
        /// Element type (part, category, storage_location, ...)
        target_type: String,
        /// Element name
        name: String,
        /// Use this id instead of the next free one
        #[arg(long)]
        id: Option<u64>,
        /// Field to set, as key=value (repeatable)
        #[arg(short, long = "field")]
        fields: Vec<String>,
        /// Acting user, as ID:NAME
        #[arg(short, long)]
        user: Option<String>,
        /// Time of the change (RFC 3339 or unix seconds, default now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Edit an element
    Edit {
        target_type: String,
        id: u64,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// Field to set, as key=value (repeatable)
        #[arg(short, long = "set")]
        set: Vec<String>,
        /// Field to remove (repeatable)
        #[arg(long = "unset")]
        unset: Vec<String>,
        #[arg(short, long)]
        comment: Option<String>,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Delete an element
    Delete {
        target_type: String,
        id: u64,
        #[arg(short, long)]
        comment: Option<String>,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Delete an element from a collection of its parent
    Unlink {
        parent_type: String,
        parent_id: u64,
        /// Collection name on the parent (e.g. part_lots)
        collection: String,
        child_type: String,
        child_id: u64,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
    /// Show an element, optionally as it was at a point in time
    Show {
        target_type: String,
        id: u64,
        /// Reconstruct the state at this time
        #[arg(long)]
        at: Option<String>,
    },
    /// List elements
    List {
        /// Only elements of this type
        #[arg(short = 't', long = "type")]
        target_type: Option<String>,
    },
    /// Set the stock amount of a part lot
    Stock {
        /// Part lot id
        lot: u64,
        /// New amount
        amount: f64,
        #[arg(short, long)]
        comment: Option<String>,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(long)]
        at: Option<String>,
    },
}

/// Handle an element command
pub fn handle_element_command(storage: &Storage, cmd: ElementCommands) -> PartLogResult<()> {
    let service = ElementService::new(storage);

    match cmd {
        ElementCommands::Create {
            target_type,
            name,
            id,
            fields,
            user,
            at,
        } => {
            let target_type: TargetType = target_type.parse()?;
            let fields = parse_fields(&fields)?;
            let user = parse_user(user.as_deref())?;
            let at = timestamp_or_now(at.as_deref())?;

            let element = match id {
                Some(id) => service.create_with_id(
                    Target::new(target_type, ElementId::new(id)),
                    &name,
                    fields,
                    user,
                    at,
                )?,
                None => service.create(target_type, &name, fields, user, at)?,
            };

            println!("Created {}: {}", element.target, element.name);
        }

        ElementCommands::Edit {
            target_type,
            id,
            name,
            set,
            unset,
            comment,
            user,
            at,
        } => {
            let target = parse_target(&target_type, id)?;
            let update = ElementUpdate {
                name,
                set: parse_fields(&set)?,
                unset,
                comment,
            };

            let outcome = service.edit(
                target,
                update,
                parse_user(user.as_deref())?,
                timestamp_or_now(at.as_deref())?,
            )?;

            match outcome.entry.as_ref().and_then(|e| e.changes()) {
                Some(changes) => {
                    println!("Updated {}:", target);
                    for line in changes.detailed_lines() {
                        println!("  {}", line);
                    }
                }
                None => println!("No changes to {}.", target),
            }
        }

        ElementCommands::Delete {
            target_type,
            id,
            comment,
            user,
            at,
        } => {
            let target = parse_target(&target_type, id)?;
            service.delete(
                target,
                parse_user(user.as_deref())?,
                timestamp_or_now(at.as_deref())?,
                comment,
            )?;
            println!("Deleted {}", target);
        }

        ElementCommands::Unlink {
            parent_type,
            parent_id,
            collection,
            child_type,
            child_id,
            user,
            at,
        } => {
            let parent = parse_target(&parent_type, parent_id)?;
            let child = parse_target(&child_type, child_id)?;
            service.remove_from_collection(
                parent,
                &collection,
                child,
                parse_user(user.as_deref())?,
                timestamp_or_now(at.as_deref())?,
            )?;
            println!("Removed {} from {} of {}", child, collection, parent);
        }

        ElementCommands::Show {
            target_type,
            id,
            at,
        } => {
            let target = parse_target(&target_type, id)?;
            let log = AuditLog::new(&storage.log, &storage.elements);
            let created_by = log.creating_user(target)?;
            let edited_by = log.last_editing_user(target)?;

            match at {
                Some(at) => {
                    let at = parse_timestamp(&at)?;
                    let state = TimeTravel::new(&storage.log, &storage.elements).state_at(target, at)?;
                    match state {
                        Some(element) => {
                            println!("As of {}:", at.to_rfc3339());
                            print!("{}", format_element_details(&element, created_by.as_ref(), None));
                        }
                        None => println!("{} did not exist at {}.", target, at.to_rfc3339()),
                    }
                }
                None => {
                    let element = service
                        .get(target)?
                        .ok_or_else(|| PartLogError::element_not_found(target.to_string()))?;
                    print!(
                        "{}",
                        format_element_details(&element, created_by.as_ref(), edited_by.as_ref())
                    );
                }
            }
        }

        ElementCommands::List { target_type } => {
            let target_type = target_type.map(|t| t.parse::<TargetType>()).transpose()?;
            let elements = service.list(target_type)?;
            print!("{}", format_element_list(&elements));
        }

        ElementCommands::Stock {
            lot,
            amount,
            comment,
            user,
            at,
        } => {
            let target = Target::new(TargetType::PartLot, ElementId::new(lot));
            service.adjust_stock(
                target,
                amount,
                parse_user(user.as_deref())?,
                timestamp_or_now(at.as_deref())?,
                comment,
            )?;
            println!("Stock of {} set to {}", target, amount);
        }
    }

    Ok(())
}
