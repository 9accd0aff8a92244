//! Read-only access to the envelope store
//!
//! The envelope database is owned and written by the mail client; this
//! process must never hold a lock on it. Every tool call therefore opens a
//! fresh read-only connection and drops it before returning; connections
//! are never shared or pooled across calls.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::config::EnvelopeConfig;
use crate::errors::Diagnostic;

/// Handle on the envelope database file
///
/// Holds only the resolved path; connection lifetime is scoped to a single
/// call via [`EnvelopeStore::connect`].
#[derive(Debug, Clone)]
pub struct EnvelopeStore {
    db_path: PathBuf,
}

impl EnvelopeStore {
    /// Resolve the store location from configuration
    pub fn new(config: &EnvelopeConfig) -> Self {
        Self {
            db_path: config.envelope_db_path(),
        }
    }

    /// Resolved database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Fail fast when the database file is absent
    ///
    /// Absence is a normal, reported condition. The read-only open below
    /// must never create the file, so it is probed explicitly first.
    pub fn require_exists(&self) -> Result<(), Diagnostic> {
        if self.db_path.exists() {
            Ok(())
        } else {
            Err(Diagnostic::MissingDatabase {
                path: self.db_path.clone(),
            })
        }
    }

    /// Open a fresh read-only connection
    ///
    /// # Errors
    ///
    /// Returns the underlying `rusqlite` error; callers wrap it in the
    /// operation's [`Diagnostic`] marker.
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rusqlite::Connection;

    use super::EnvelopeStore;
    use crate::config::EnvelopeConfig;
    use crate::errors::Diagnostic;

    fn config(mail_dir: &Path) -> EnvelopeConfig {
        EnvelopeConfig {
            mail_dir: mail_dir.to_path_buf(),
            mail_version: "V10".to_owned(),
            envelope_db_name: "Envelope Index".to_owned(),
            primary_address: "me@example.com".to_owned(),
        }
    }

    #[test]
    fn missing_file_reports_missing_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EnvelopeStore::new(&config(dir.path()));
        let err = store.require_exists().expect_err("file must be absent");
        assert!(matches!(err, Diagnostic::MissingDatabase { .. }));
    }

    #[test]
    fn connection_is_read_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("V10").join("MailData");
        std::fs::create_dir_all(&data_dir).expect("create MailData dir");
        let seed = Connection::open(data_dir.join("Envelope Index")).expect("create store");
        seed.execute_batch("CREATE TABLE subjects (ROWID INTEGER PRIMARY KEY, subject TEXT);")
            .expect("seed store");
        drop(seed);

        let store = EnvelopeStore::new(&config(dir.path()));
        store.require_exists().expect("file exists");
        let conn = store.connect().expect("read-only open");
        let err = conn
            .execute("INSERT INTO subjects (subject) VALUES ('x')", [])
            .expect_err("writes must be rejected");
        assert!(err.to_string().contains("readonly"));
    }
}
