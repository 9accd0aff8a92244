//! Column-capability matching for schema-adaptive search
//!
//! The envelope database's layout varies across mail client versions, so no
//! table can be assumed to have a fixed shape. Given the live column list of
//! one table, [`TableCapabilities`] records which columns the search engine
//! can actually use. Computed once per table per call, never cached.

/// Marker columns: a table with none of these cannot hold message data and
/// is excluded from blind multi-table search.
pub const MARKER_COLUMNS: [&str; 5] = [
    "subject",
    "sender",
    "date_received",
    "date_sent",
    "message_id",
];

/// Recipient-like columns, in preference order
const RECIPIENT_COLUMNS: [&str; 2] = ["recipients", "to_recipients"];

/// Date columns worth rendering human-readably, in preference order
const READABLE_DATE_COLUMNS: [&str; 2] = ["date_received", "date_sent"];

/// What one table's live column set supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCapabilities {
    has_marker: bool,
    /// Whether a `subject` column is present
    pub has_subject: bool,
    /// Whether a `sender` column is present
    pub has_sender: bool,
    /// First column (catalog order) whose name contains `date`; used as the
    /// filter column. `None` disables date filtering for this table.
    pub date_column: Option<String>,
    /// Preferred recipient-like column, if any
    pub recipient_column: Option<String>,
    /// Preferred date column for human-readable rendering, if any
    pub readable_date_column: Option<String>,
}

impl TableCapabilities {
    /// Compute capabilities from a table's live column names, in catalog order
    pub fn from_columns(names: &[&str]) -> Self {
        let date_column = names
            .iter()
            .find(|name| name.to_lowercase().contains("date"))
            .map(|name| (*name).to_owned());
        let recipient_column = RECIPIENT_COLUMNS
            .iter()
            .find(|candidate| names.contains(candidate))
            .map(|candidate| (*candidate).to_owned());
        let readable_date_column = READABLE_DATE_COLUMNS
            .iter()
            .find(|candidate| names.contains(candidate))
            .map(|candidate| (*candidate).to_owned());

        Self {
            has_marker: names.iter().any(|name| MARKER_COLUMNS.contains(name)),
            has_subject: names.contains(&"subject"),
            has_sender: names.contains(&"sender"),
            date_column,
            recipient_column,
            readable_date_column,
        }
    }

    /// Whether the table plausibly holds message data at all
    pub fn holds_message_data(&self) -> bool {
        self.has_marker
    }

    /// Message-shaped tables get targeted queries; the rest only a capped
    /// diagnostic sample with no predicates.
    pub fn is_message_shaped(&self) -> bool {
        self.has_subject && self.has_sender
    }
}
