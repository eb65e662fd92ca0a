//! Service layer for partlog
//!
//! Element mutations paired with their log entries, and reconstruction of
//! past element states from the log.

pub mod element;
pub mod time_travel;

pub use element::{EditOutcome, ElementService, ElementUpdate, AMOUNT_FIELD};
pub use time_travel::{revert_edits, TimeTravel};
