//! Multi-stage identity lookups
//!
//! The envelope store normalizes subjects, addresses, and senders into side
//! tables, so the two identity-based searches are fixed pipelines of
//! dependent lookups: address → sender ids → messages, and subject text →
//! subject ids → messages. Each stage runs against the same short-lived
//! connection; an empty intermediate result is the caller's signal to stop
//! the pipeline with a descriptive message.

use rusqlite::{Connection, OptionalExtension, params};

use crate::query::{self, DateFilter, Row, SelectBuilder};

/// Recipient-type code the store uses for "To" recipients
const RECIPIENT_TYPE_TO: i64 = 1;
/// Maximum recipients listed per message block
pub const MAX_RECIPIENTS: i64 = 3;

/// One matching row of the subjects table
#[derive(Debug, Clone)]
pub struct SubjectMatch {
    pub id: i64,
    pub subject: Option<String>,
}

/// Exact-match lookup of an email address row id
pub fn lookup_address_id(conn: &Connection, address: &str) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT ROWID FROM addresses WHERE address = ?",
        [address],
        |row| row.get(0),
    )
    .optional()
}

/// Sender ids mapped to an address row id
pub fn lookup_sender_ids(conn: &Connection, address_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT sender FROM sender_addresses WHERE address = ?")?;
    let ids = stmt
        .query_map([address_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Subject rows whose text contains `text` (case-insensitive)
pub fn matching_subjects(conn: &Connection, text: &str) -> rusqlite::Result<Vec<SubjectMatch>> {
    let mut stmt = conn.prepare("SELECT ROWID, subject FROM subjects WHERE subject LIKE ?")?;
    let pattern = format!("%{text}%");
    let matches = stmt
        .query_map([pattern], |row| {
            Ok(SubjectMatch {
                id: row.get(0)?,
                subject: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(matches)
}

/// Messages sent by any of `sender_ids`, newest first
///
/// Left-joins subjects and mailboxes so display fields resolve in one pass;
/// null foreign keys simply yield null display fields. An empty id set
/// returns no rows without issuing a query.
pub fn sent_messages(
    conn: &Connection,
    sender_ids: &[i64],
    date: Option<&DateFilter>,
    limit: i64,
) -> rusqlite::Result<Vec<Row>> {
    let Some(membership) = query::membership("m.sender", sender_ids) else {
        return Ok(Vec::new());
    };

    let mut builder = SelectBuilder::new("messages m")
        .column("m.ROWID")
        .column("m.message_id")
        .column("s.subject")
        .column("datetime(m.date_sent, 'unixepoch') AS sent_date")
        .column("datetime(m.date_received, 'unixepoch') AS received_date")
        .column("mb.url AS mailbox_url")
        .join("LEFT JOIN subjects s ON m.subject = s.ROWID")
        .join("LEFT JOIN mailboxes mb ON m.mailbox = mb.ROWID")
        .predicate(membership);
    if let Some(date) = date {
        builder = builder.predicate(date.predicate("m.date_sent"));
    }

    let (sql, params) = builder.order_by("m.date_sent DESC").limit(limit).build();
    query::fetch_rows(conn, &sql, &params)
}

/// Messages carrying any of `subject_ids`, newest first
///
/// The date filter applies to either timestamp; sender display addresses
/// resolve through the sender_addresses join. An empty id set returns no
/// rows without issuing a query.
pub fn subject_messages(
    conn: &Connection,
    subject_ids: &[i64],
    date: Option<&DateFilter>,
    limit: i64,
) -> rusqlite::Result<Vec<Row>> {
    let Some(membership) = query::membership("m.subject", subject_ids) else {
        return Ok(Vec::new());
    };

    let mut builder = SelectBuilder::new("messages m")
        .column("m.ROWID")
        .column("m.message_id")
        .column("s.subject")
        .column("datetime(m.date_sent, 'unixepoch') AS sent_date")
        .column("datetime(m.date_received, 'unixepoch') AS received_date")
        .column("mb.url AS mailbox_url")
        .column("m.sender")
        .column("sender_addr.address AS sender_address")
        .join("LEFT JOIN subjects s ON m.subject = s.ROWID")
        .join("LEFT JOIN mailboxes mb ON m.mailbox = mb.ROWID")
        .join("LEFT JOIN sender_addresses sa ON m.sender = sa.sender")
        .join("LEFT JOIN addresses sender_addr ON sa.address = sender_addr.ROWID")
        .predicate(membership);
    if let Some(date) = date {
        builder = builder.predicate(date.predicate_over(&["m.date_sent", "m.date_received"]));
    }

    let (sql, params) = builder
        .order_by("m.date_sent DESC, m.date_received DESC")
        .limit(limit)
        .build();
    query::fetch_rows(conn, &sql, &params)
}

/// Up to [`MAX_RECIPIENTS`] "To" addresses of one message
pub fn recipients_for(conn: &Connection, message_id: i64, limit: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT a.address
         FROM recipients r
         JOIN addresses a ON r.address = a.ROWID
         WHERE r.message = ? AND r.type = ?
         LIMIT ?",
    )?;
    let addresses = stmt
        .query_map(params![message_id, RECIPIENT_TYPE_TO, limit], |row| {
            row.get(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(addresses)
}
