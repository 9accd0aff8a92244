//! Configuration for the envelope store location and search defaults
//!
//! All configuration is loaded from environment variables under the
//! `MAIL_ENVELOPE_` prefix, once at startup. The engine receives the loaded
//! value at construction and nothing reads the environment afterwards, so
//! the engine itself stays free of process-wide state.

use std::env;
use std::env::VarError;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Default mail client data version folder
const DEFAULT_MAIL_VERSION: &str = "V10";
/// Default database file name inside the version folder's `MailData`
const DEFAULT_DB_NAME: &str = "Envelope Index";
/// Default address searched by `mail_find_sent_emails` when none is given
const DEFAULT_PRIMARY_ADDRESS: &str = "your.email@example.com";

/// Validated startup configuration
///
/// Resolved once in `main` and handed to the engine at construction.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Mail client data directory (typically `~/Library/Mail`)
    pub mail_dir: PathBuf,
    /// Version folder name under the mail directory (`V10`, `V9`, ...)
    pub mail_version: String,
    /// Envelope database file name
    pub envelope_db_name: String,
    /// Address used by sent-mail search when the caller supplies none
    pub primary_address: String,
}

impl EnvelopeConfig {
    /// Load configuration from `MAIL_ENVELOPE_*` environment variables
    ///
    /// Unset or empty variables fall back to defaults. A missing mail
    /// directory is a warning rather than an error: absence is a normal,
    /// reported condition at request time.
    ///
    /// # Environment Variables
    ///
    /// ```text
    /// MAIL_ENVELOPE_MAIL_DIR=/Users/me/Library/Mail
    /// MAIL_ENVELOPE_VERSION=V10
    /// MAIL_ENVELOPE_DB_NAME=Envelope Index
    /// MAIL_ENVELOPE_PRIMARY_ADDRESS=me@example.com
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a variable holds non-unicode data, or if
    /// the home directory cannot be determined while defaulting the mail
    /// directory.
    pub fn load_from_env() -> AppResult<Self> {
        let mail_dir = match optional_env("MAIL_ENVELOPE_MAIL_DIR")? {
            Some(dir) => PathBuf::from(dir),
            None => default_mail_dir()?,
        };

        let config = Self {
            mail_dir,
            mail_version: optional_env("MAIL_ENVELOPE_VERSION")?
                .unwrap_or_else(|| DEFAULT_MAIL_VERSION.to_owned()),
            envelope_db_name: optional_env("MAIL_ENVELOPE_DB_NAME")?
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_owned()),
            primary_address: optional_env("MAIL_ENVELOPE_PRIMARY_ADDRESS")?
                .unwrap_or_else(|| DEFAULT_PRIMARY_ADDRESS.to_owned()),
        };

        if !config.mail_dir.exists() {
            tracing::warn!("mail directory not found: {}", config.mail_dir.display());
            tracing::warn!("set MAIL_ENVELOPE_MAIL_DIR to the mail client's data directory");
        }

        Ok(config)
    }

    /// Version folder holding the account directories and `MailData`
    pub fn version_dir(&self) -> PathBuf {
        self.mail_dir.join(&self.mail_version)
    }

    /// Full path of the envelope database file
    pub fn envelope_db_path(&self) -> PathBuf {
        self.version_dir()
            .join("MailData")
            .join(&self.envelope_db_name)
    }
}

/// Read an optional environment variable, treating empty values as unset
fn optional_env(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidConfig(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Default mail directory relative to the home directory
fn default_mail_dir() -> AppResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("Library").join("Mail"))
        .ok_or_else(|| {
            AppError::InvalidConfig(
                "home directory could not be determined; set MAIL_ENVELOPE_MAIL_DIR".to_owned(),
            )
        })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::EnvelopeConfig;

    fn config() -> EnvelopeConfig {
        EnvelopeConfig {
            mail_dir: PathBuf::from("/home/user/Library/Mail"),
            mail_version: "V10".to_owned(),
            envelope_db_name: "Envelope Index".to_owned(),
            primary_address: "me@example.com".to_owned(),
        }
    }

    #[test]
    fn envelope_db_path_joins_version_and_mail_data() {
        let path = config().envelope_db_path();
        assert!(path.ends_with("V10/MailData/Envelope Index"));
        assert!(path.starts_with("/home/user/Library/Mail"));
    }

    #[test]
    fn version_dir_is_directly_under_mail_dir() {
        assert_eq!(
            config().version_dir(),
            PathBuf::from("/home/user/Library/Mail/V10")
        );
    }
}
