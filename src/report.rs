//! Deterministic line-oriented report rendering
//!
//! Reports never reorder or silently drop fields: absent optional values are
//! replaced with a fixed placeholder so consumers can rely on positional
//! structure.

use crate::query::{Row, SqlValue};

/// Placeholder for a null or absent subject field
pub const NO_SUBJECT: &str = "(no subject)";
/// Placeholder for a null or absent sender/recipient field
pub const UNKNOWN: &str = "(unknown)";
/// Placeholder for any other null field (timestamps, mailbox URLs)
pub const NULL_FIELD: &str = "(null)";
/// Separator line between record blocks
pub const RECORD_SEPARATOR: &str = "---";

/// Accumulates report lines; rendering joins them with newlines
#[derive(Debug, Default)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn render(self) -> String {
        self.lines.join("\n")
    }
}

/// Render a field value, substituting `placeholder` for null, absent, or
/// empty values
pub fn text_or(value: Option<&SqlValue>, placeholder: &str) -> String {
    match value {
        None | Some(SqlValue::Null) => placeholder.to_owned(),
        Some(SqlValue::Text(text)) if text.is_empty() => placeholder.to_owned(),
        Some(value) => value.to_string(),
    }
}

/// Render a whole row as `{col: value, ...}` in select-list order
///
/// Text values are quoted so empty and whitespace-only strings stay visible
/// in diagnostic samples.
pub fn render_row(row: &Row) -> String {
    let mut out = String::from("{");
    for (index, (name, value)) in row.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push_str(": ");
        match value {
            SqlValue::Text(text) => {
                out.push('"');
                out.push_str(text);
                out.push('"');
            }
            other => out.push_str(&other.to_string()),
        }
    }
    out.push('}');
    out
}
