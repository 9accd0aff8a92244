//! Tool input DTOs and schema-bearing types
//!
//! Defines the argument structures for the MCP tool contracts. Each type is
//! annotated with `JsonSchema` for automatic schema generation; field doc
//! comments become the schema descriptions clients see.
//!
//! `limit` stays an `Option<i64>` everywhere: the engine clamps missing and
//! non-positive values to its default cap rather than rejecting them at
//! deserialization.

use schemars::JsonSchema;
use serde::Deserialize;

/// Input: `mail_search`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Search query matched against subject and sender; omit to list the
    /// newest messages
    #[serde(default)]
    pub query: Option<String>,
    /// Maximum results (default 10)
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Input: `mail_search_all_tables`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchAllTablesInput {
    /// Date to search for (YYYY-MM-DD)
    #[serde(default)]
    pub date_filter: Option<String>,
    /// Maximum results per table (default 10)
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Input: `mail_find_sent_emails`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FindSentEmailsInput {
    /// Date to search for (YYYY-MM-DD)
    #[serde(default)]
    pub date_filter: Option<String>,
    /// Email address to search for (defaults to the configured primary
    /// address)
    #[serde(default)]
    pub email_address: Option<String>,
    /// Maximum results (default 10)
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Input: `mail_search_by_subject`
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchBySubjectInput {
    /// Subject text to search for
    #[serde(default)]
    pub subject_text: String,
    /// Date to search for (YYYY-MM-DD)
    #[serde(default)]
    pub date_filter: Option<String>,
    /// Maximum results (default 10)
    #[serde(default)]
    pub limit: Option<i64>,
}
