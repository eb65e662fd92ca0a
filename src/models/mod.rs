//! Core data models for partlog
//!
//! This module contains the identifiers, the target type table, and the tracked
//! element model. Log entry types live in [`crate::audit`].

pub mod element;
pub mod ids;
pub mod target;
pub mod user;

pub use element::{Element, NAME_FIELD};
pub use ids::{ElementId, LogEntryId, UserId};
pub use target::{Target, TargetType, TARGET_TYPE_TABLE, TARGET_TYPE_TABLE_VERSION};
pub use user::UserRef;
