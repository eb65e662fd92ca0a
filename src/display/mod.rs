//! Display formatting for terminal output
//!
//! Tables and detail views for log entries and elements.

pub mod element;
pub mod history;

pub use element::{format_element_details, format_element_list};
pub use history::{format_entry_details, format_history_lines, format_history_table, NO_ENTRIES};
