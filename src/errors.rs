//! Structural errors and per-request diagnostics
//!
//! Two tiers. [`AppError`] covers structural failures that abort startup and
//! is never produced while handling a request. [`Diagnostic`] covers
//! per-request outcomes that render into the report text instead of raising:
//! the envelope store is external state, so a missing file, an unknown
//! address, or a locked database are normal operating conditions described
//! to the caller in the result. Diagnostics stay typed internally so callers
//! and tests can distinguish a lookup miss from a query failure without
//! parsing strings; the `Display` output is the exact text the tool result
//! carries.

use std::path::PathBuf;

use thiserror::Error;

/// Startup-time failure (configuration could not be loaded).
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration variable missing, malformed, or unresolvable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Type alias for fallible startup functions
pub type AppResult<T> = Result<T, AppError>;

/// Per-request outcome reported as text rather than raised.
#[derive(Debug, Error)]
pub enum Diagnostic {
    /// The envelope database file does not exist at the configured path
    #[error(
        "Envelope database not found at: {}\nPlease check MAIL_ENVELOPE_MAIL_DIR and MAIL_ENVELOPE_VERSION configuration",
        .path.display()
    )]
    MissingDatabase {
        /// Path that was probed
        path: PathBuf,
    },

    /// A resolver stage produced no rows; the pipeline stopped there
    #[error("{0}")]
    NotFound(String),

    /// A required argument was absent or empty
    #[error("{0}")]
    InvalidRequest(String),

    /// The underlying store rejected or failed a query
    #[error("{context}: {message}")]
    Query {
        /// Stable report marker for the operation (e.g. `Database error`)
        context: &'static str,
        /// Rendered database error
        message: String,
    },
}

impl Diagnostic {
    /// Wrap a database error under the operation's report marker
    pub fn query(context: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Query {
            context,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Diagnostic;

    #[test]
    fn missing_database_names_path_and_config_variables() {
        let diagnostic = Diagnostic::MissingDatabase {
            path: PathBuf::from("/tmp/mail/V10/MailData/Envelope Index"),
        };
        let rendered = diagnostic.to_string();
        assert!(rendered.contains("/tmp/mail/V10/MailData/Envelope Index"));
        assert!(rendered.contains("MAIL_ENVELOPE_MAIL_DIR"));
        assert!(rendered.contains("MAIL_ENVELOPE_VERSION"));
    }

    #[test]
    fn query_diagnostic_carries_operation_marker() {
        let diagnostic = Diagnostic::query("Database search error", "disk I/O error");
        assert_eq!(
            diagnostic.to_string(),
            "Database search error: disk I/O error"
        );
    }
}
