//! Element display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::format_value;
use crate::models::{Element, UserRef};

#[derive(Tabled)]
struct ElementRow {
    #[tabled(rename = "Type")]
    target_type: String,
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Format a list of elements as a table
pub fn format_element_list(elements: &[Element]) -> String {
    if elements.is_empty() {
        return "No elements found.\n".to_string();
    }

    let rows: Vec<ElementRow> = elements
        .iter()
        .map(|e| ElementRow {
            target_type: e.target.target_type.to_string(),
            id: e.target.id.get(),
            name: e.name.clone(),
            fields: e.fields.len(),
            updated: e.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    format!("{}\n", table)
}

/// Format element details, with attribution when known
pub fn format_element_details(
    element: &Element,
    created_by: Option<&UserRef>,
    last_edited_by: Option<&UserRef>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Element:   {}\n", element.target));
    output.push_str(&format!("Name:      {}\n", element.name));
    output.push_str(&format!(
        "Created:   {}{}\n",
        element.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        by(created_by)
    ));
    output.push_str(&format!(
        "Updated:   {}{}\n",
        element.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        by(last_edited_by)
    ));

    if !element.fields.is_empty() {
        output.push_str("Fields:\n");
        for (key, value) in &element.fields {
            output.push_str(&format!("  {}: {}\n", key, format_value(value)));
        }
    }

    output
}

fn by(user: Option<&UserRef>) -> String {
    user.map(|u| format!(" by {}", u.username)).unwrap_or_default()
}
