//! The six tool operations
//!
//! Each operation opens its own short-lived read-only connection, computes
//! one text report, and drops the connection before returning (on every exit
//! path, via scope). Database access blocks the calling task for its
//! duration; the upstream client is a single synchronous caller issuing one
//! request at a time, so no timeout or cancellation is applied.

use rusqlite::Connection;

use crate::capability::TableCapabilities;
use crate::config::EnvelopeConfig;
use crate::errors::Diagnostic;
use crate::query::{self, DateFilter, SelectBuilder};
use crate::report::{self, Report};
use crate::resolver;
use crate::schema;
use crate::store::EnvelopeStore;

/// Report markers for query failures, one per operation
const SEARCH_CONTEXT: &str = "Database error";
const EXAMINE_CONTEXT: &str = "Database examination error";
const SEARCH_ALL_CONTEXT: &str = "Database search error";
const SENT_CONTEXT: &str = "Error finding sent emails";
const SUBJECT_CONTEXT: &str = "Error searching by subject";
const ACCOUNTS_CONTEXT: &str = "Error listing accounts";

/// Rows shown when sampling a table for diagnostics
const SAMPLE_ROW_CAP: i64 = 3;

/// Read-only query engine over the envelope store
///
/// Stateless across calls: the configuration is fixed at construction and
/// the only per-call state is the connection scoped to that call.
#[derive(Debug)]
pub struct EnvelopeIndex {
    config: EnvelopeConfig,
    store: EnvelopeStore,
}

impl EnvelopeIndex {
    pub fn new(config: EnvelopeConfig) -> Self {
        let store = EnvelopeStore::new(&config);
        Self { config, store }
    }

    /// `mail_search`: match subject/sender text in the messages table
    ///
    /// Without a query, lists the newest messages. On normalized layouts
    /// where subject and sender are numeric foreign keys the text match
    /// simply finds nothing; the tool's shape is fixed regardless.
    pub fn search_emails(
        &self,
        query_text: Option<&str>,
        limit: Option<i64>,
    ) -> Result<String, Diagnostic> {
        self.store.require_exists()?;
        let conn = self
            .store
            .connect()
            .map_err(|e| Diagnostic::query(SEARCH_CONTEXT, e))?;
        let cap = query::effective_limit(limit);

        let mut builder = SelectBuilder::new("messages")
            .column("ROWID")
            .column("subject")
            .column("sender")
            .column("datetime(date_received, 'unixepoch') AS date")
            .order_by("date_received DESC")
            .limit(cap);
        if let Some(text) = query_text.filter(|text| !text.is_empty()) {
            builder = builder.predicate(query::like_any(&["subject", "sender"], text));
        }
        let (sql, params) = builder.build();
        let rows = query::fetch_rows(&conn, &sql, &params)
            .map_err(|e| Diagnostic::query(SEARCH_CONTEXT, e))?;

        if rows.is_empty() {
            return Ok("No messages found".to_owned());
        }

        let mut out = Report::new();
        out.line(format!("Found {} messages:", rows.len()));
        out.blank();
        for row in &rows {
            out.line(format!(
                "ID: {}",
                report::text_or(row.get("ROWID"), report::NULL_FIELD)
            ));
            out.line(format!(
                "Subject: {}",
                report::text_or(row.get("subject"), report::NO_SUBJECT)
            ));
            out.line(format!(
                "From: {}",
                report::text_or(row.get("sender"), report::UNKNOWN)
            ));
            out.line(format!(
                "Date: {}",
                report::text_or(row.get("date"), report::NULL_FIELD)
            ));
            out.line(report::RECORD_SEPARATOR);
        }
        Ok(out.render())
    }

    /// `mail_list_accounts`: enumerate account folders in the version dir
    pub fn list_accounts(&self) -> Result<String, Diagnostic> {
        let mut out = Report::new();
        let version_dir = self.config.version_dir();

        if version_dir.exists() {
            out.line(format!(
                "Mail accounts found in {}:",
                self.config.mail_version
            ));
            let entries = std::fs::read_dir(&version_dir)
                .map_err(|e| Diagnostic::query(ACCOUNTS_CONTEXT, e))?;
            let mut names = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| Diagnostic::query(ACCOUNTS_CONTEXT, e))?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
                if is_dir && !name.starts_with('.') {
                    names.push(name);
                }
            }
            names.sort();
            for name in names {
                out.line(format!("  - {name}"));
            }
        } else {
            out.line(format!(
                "No {} mail directory found",
                self.config.mail_version
            ));
            out.line(format!("Searched in: {}", self.config.mail_dir.display()));
            out.line(
                "Try updating MAIL_ENVELOPE_VERSION in configuration (common values: V10, V9, V8)",
            );
        }
        Ok(out.render())
    }

    /// `mail_examine_database`: tables, columns, counts, and samples
    pub fn examine_database(&self) -> Result<String, Diagnostic> {
        self.store.require_exists()?;
        let conn = self
            .store
            .connect()
            .map_err(|e| Diagnostic::query(EXAMINE_CONTEXT, e))?;

        let mut out = Report::new();
        out.line(format!(
            "Examining envelope database at: {}",
            self.store.path().display()
        ));
        out.blank();

        let tables =
            schema::list_tables(&conn).map_err(|e| Diagnostic::query(EXAMINE_CONTEXT, e))?;
        out.line(format!("Found {} tables:", tables.len()));
        for table in &tables {
            out.blank();
            out.line(format!("=== Table: {table} ==="));
            let descriptor =
                schema::describe(&conn, table).map_err(|e| Diagnostic::query(EXAMINE_CONTEXT, e))?;
            out.line("Columns:");
            for column in &descriptor.columns {
                out.line(format!("  - {} ({})", column.name, column.declared_type));
            }
            match descriptor.row_count {
                Some(count) => out.line(format!("Row count: {count}")),
                None => out.line("Row count: Unable to determine"),
            }
            if schema::SAMPLE_TABLES.contains(&table.as_str()) {
                // Sampling is diagnostic only; a failure here must not abort
                // the rest of the report.
                match schema::sample_rows(&conn, table, SAMPLE_ROW_CAP) {
                    Ok(rows) if rows.is_empty() => {}
                    Ok(rows) => {
                        out.line("Sample rows:");
                        for (index, row) in rows.iter().enumerate() {
                            out.line(format!("  Row {}: {}", index + 1, report::render_row(row)));
                        }
                    }
                    Err(error) => out.line(format!("Sample data error: {error}")),
                }
            }
        }

        let views = schema::list_views(&conn).map_err(|e| Diagnostic::query(EXAMINE_CONTEXT, e))?;
        if !views.is_empty() {
            out.blank();
            out.line(format!("Found {} views:", views.len()));
            for view in &views {
                out.line(format!("  - {view}"));
            }
        }
        Ok(out.render())
    }

    /// `mail_search_all_tables`: blind search across every candidate table
    pub fn search_all_tables(
        &self,
        date_filter: Option<&str>,
        limit: Option<i64>,
    ) -> Result<String, Diagnostic> {
        self.store.require_exists()?;
        let conn = self
            .store
            .connect()
            .map_err(|e| Diagnostic::query(SEARCH_ALL_CONTEXT, e))?;
        let cap = query::effective_limit(limit);
        let date = date_filter.map(DateFilter::parse);

        let mut out = Report::new();
        out.line(match date_filter {
            Some(filter) => format!("Searching all tables for emails on {filter}"),
            None => "Searching all tables for emails".to_owned(),
        });
        out.blank();

        let tables =
            schema::list_tables(&conn).map_err(|e| Diagnostic::query(SEARCH_ALL_CONTEXT, e))?;
        for table in &tables {
            // One broken table must not end the sweep over the rest.
            if let Err(error) = search_table(&conn, table, date.as_ref(), cap, &mut out) {
                out.line(format!("Error searching {table}: {error}"));
                out.blank();
            }
        }
        Ok(out.render())
    }

    /// `mail_find_sent_emails`: address → sender ids → messages
    pub fn find_sent_emails(
        &self,
        date_filter: Option<&str>,
        email_address: Option<&str>,
        limit: Option<i64>,
    ) -> Result<String, Diagnostic> {
        let address = match email_address {
            Some(addr) if !addr.trim().is_empty() => addr,
            _ => self.config.primary_address.as_str(),
        };
        self.store.require_exists()?;
        let conn = self
            .store
            .connect()
            .map_err(|e| Diagnostic::query(SENT_CONTEXT, e))?;
        let cap = query::effective_limit(limit);
        let date = date_filter.map(DateFilter::parse);

        let mut out = Report::new();
        out.line(match date_filter {
            Some(filter) => format!("Searching for emails sent by {address} on {filter}"),
            None => format!("Searching for emails sent by {address}"),
        });
        out.blank();

        let address_id = resolver::lookup_address_id(&conn, address)
            .map_err(|e| Diagnostic::query(SENT_CONTEXT, e))?;
        let Some(address_id) = address_id else {
            return Err(Diagnostic::NotFound(format!(
                "Email address {address} not found in addresses table\nTry updating MAIL_ENVELOPE_PRIMARY_ADDRESS in configuration"
            )));
        };
        out.line(format!("Found address ID: {address_id}"));

        let sender_ids = resolver::lookup_sender_ids(&conn, address_id)
            .map_err(|e| Diagnostic::query(SENT_CONTEXT, e))?;
        if sender_ids.is_empty() {
            return Err(Diagnostic::NotFound(format!(
                "No sender records found for address ID {address_id}"
            )));
        }
        out.line(format!("Found sender IDs: {sender_ids:?}"));

        let rows = resolver::sent_messages(&conn, &sender_ids, date.as_ref(), cap)
            .map_err(|e| Diagnostic::query(SENT_CONTEXT, e))?;
        if rows.is_empty() {
            out.line("No sent messages found matching criteria");
            out.line(format!(
                "Note: Check if {address} is correct in configuration"
            ));
        } else {
            out.blank();
            out.line(format!("Found {} sent messages:", rows.len()));
            out.blank();
            for row in &rows {
                out.line(format!(
                    "Message ID: {}",
                    report::text_or(row.get("ROWID"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Subject: {}",
                    report::text_or(row.get("subject"), report::NO_SUBJECT)
                ));
                out.line(format!(
                    "Sent Date: {}",
                    report::text_or(row.get("sent_date"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Received Date: {}",
                    report::text_or(row.get("received_date"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Mailbox: {}",
                    report::text_or(row.get("mailbox_url"), report::NULL_FIELD)
                ));
                if let Some(message_id) = row.integer("ROWID") {
                    let recipients =
                        resolver::recipients_for(&conn, message_id, resolver::MAX_RECIPIENTS)
                            .map_err(|e| Diagnostic::query(SENT_CONTEXT, e))?;
                    if !recipients.is_empty() {
                        out.line(format!("To: {}", recipients.join(", ")));
                    }
                }
                out.line(report::RECORD_SEPARATOR);
            }
        }
        Ok(out.render())
    }

    /// `mail_search_by_subject`: subject text → subject ids → messages
    pub fn search_by_subject(
        &self,
        subject_text: &str,
        date_filter: Option<&str>,
        limit: Option<i64>,
    ) -> Result<String, Diagnostic> {
        if subject_text.is_empty() {
            return Err(Diagnostic::InvalidRequest(
                "Subject text is required".to_owned(),
            ));
        }
        self.store.require_exists()?;
        let conn = self
            .store
            .connect()
            .map_err(|e| Diagnostic::query(SUBJECT_CONTEXT, e))?;
        let cap = query::effective_limit(limit);
        let date = date_filter.map(DateFilter::parse);

        let mut out = Report::new();
        out.line(match date_filter {
            Some(filter) => format!(
                "Searching for emails with subject containing: '{subject_text}' on {filter}"
            ),
            None => format!("Searching for emails with subject containing: '{subject_text}'"),
        });
        out.blank();

        let subjects = resolver::matching_subjects(&conn, subject_text)
            .map_err(|e| Diagnostic::query(SUBJECT_CONTEXT, e))?;
        if subjects.is_empty() {
            return Err(Diagnostic::NotFound(format!(
                "No subjects found containing '{subject_text}'"
            )));
        }
        out.line(format!("Found {} matching subjects:", subjects.len()));
        for subject in &subjects {
            out.line(format!(
                "  Subject ID {}: {}",
                subject.id,
                subject.subject.as_deref().unwrap_or(report::NO_SUBJECT)
            ));
        }
        out.blank();

        let subject_ids: Vec<i64> = subjects.iter().map(|subject| subject.id).collect();
        let rows = resolver::subject_messages(&conn, &subject_ids, date.as_ref(), cap)
            .map_err(|e| Diagnostic::query(SUBJECT_CONTEXT, e))?;
        if rows.is_empty() {
            out.line("No messages found matching criteria");
        } else {
            out.line(format!("Found {} messages:", rows.len()));
            out.blank();
            for row in &rows {
                out.line(format!(
                    "Message ID: {}",
                    report::text_or(row.get("ROWID"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Subject: {}",
                    report::text_or(row.get("subject"), report::NO_SUBJECT)
                ));
                out.line(format!(
                    "Sent Date: {}",
                    report::text_or(row.get("sent_date"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Received Date: {}",
                    report::text_or(row.get("received_date"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "Sender Address: {}",
                    report::text_or(row.get("sender_address"), report::UNKNOWN)
                ));
                out.line(format!(
                    "Mailbox: {}",
                    report::text_or(row.get("mailbox_url"), report::NULL_FIELD)
                ));
                if let Some(message_id) = row.integer("ROWID") {
                    let recipients =
                        resolver::recipients_for(&conn, message_id, resolver::MAX_RECIPIENTS)
                            .map_err(|e| Diagnostic::query(SUBJECT_CONTEXT, e))?;
                    if !recipients.is_empty() {
                        out.line(format!("To: {}", recipients.join(", ")));
                    }
                }
                out.line(report::RECORD_SEPARATOR);
            }
        }
        Ok(out.render())
    }
}

/// Blind-search one table, appending its section to the report
///
/// The capability decision drives everything: tables without marker columns
/// are skipped silently, message-shaped tables get a targeted capped query,
/// and the rest get an unfiltered diagnostic sample.
fn search_table(
    conn: &Connection,
    table: &str,
    date: Option<&DateFilter>,
    cap: i64,
    out: &mut Report,
) -> rusqlite::Result<()> {
    let columns = schema::describe_table(conn, table)?;
    let names: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();
    let caps = TableCapabilities::from_columns(&names);
    if !caps.holds_message_data() {
        return Ok(());
    }

    out.line(format!("=== Searching table: {table} ==="));
    if caps.is_message_shaped() {
        let mut builder = SelectBuilder::new(query::quote_identifier(table))
            .column("ROWID")
            .column(query::quote_identifier("subject"))
            .column(query::quote_identifier("sender"));
        if let Some(recipient) = &caps.recipient_column {
            builder = builder.column(query::quote_identifier(recipient));
        }
        let readable_key = caps
            .readable_date_column
            .as_ref()
            .map(|column| format!("{column}_readable"));
        if let Some(column) = &caps.readable_date_column {
            builder = builder.column(format!(
                "datetime({}, 'unixepoch') AS {}",
                query::quote_identifier(column),
                query::quote_identifier(&format!("{column}_readable")),
            ));
        }
        if let (Some(date), Some(column)) = (date, &caps.date_column) {
            builder = builder.predicate(date.predicate(&query::quote_identifier(column)));
        }
        let (sql, params) = builder.order_by("ROWID DESC").limit(cap).build();
        let rows = query::fetch_rows(conn, &sql, &params)?;

        if rows.is_empty() {
            out.line("No matching messages found");
        } else {
            out.line(format!("Found {} messages:", rows.len()));
            for row in &rows {
                out.line(format!(
                    "  ID: {}",
                    report::text_or(row.get("ROWID"), report::NULL_FIELD)
                ));
                out.line(format!(
                    "  Subject: {}",
                    report::text_or(row.get("subject"), report::NO_SUBJECT)
                ));
                out.line(format!(
                    "  From: {}",
                    report::text_or(row.get("sender"), report::UNKNOWN)
                ));
                if let Some(recipient) = &caps.recipient_column {
                    out.line(format!(
                        "  To: {}",
                        report::text_or(row.get(recipient), report::UNKNOWN)
                    ));
                }
                if let Some(key) = &readable_key {
                    out.line(format!(
                        "  Date: {}",
                        report::text_or(row.get(key), report::NULL_FIELD)
                    ));
                }
                out.line("  ---");
            }
        }
    } else {
        let rows = schema::sample_rows(conn, table, SAMPLE_ROW_CAP)?;
        if !rows.is_empty() {
            out.line("Sample data (first 3 rows):");
            for row in &rows {
                out.line(format!("  {}", report::render_row(row)));
            }
        }
    }
    out.blank();
    Ok(())
}
