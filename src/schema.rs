//! Live catalog inspection
//!
//! Every inspection reads the catalog fresh; descriptors are ephemeral and
//! never cached or persisted, because the owning mail client may rewrite the
//! database between calls. Inspection is diagnostic: partial failures (a
//! locked table, an unreadable sample) degrade to inline notices instead of
//! aborting mid-report.

use rusqlite::Connection;

use crate::query::{self, Row, SelectBuilder};

/// Tables worth sampling during database examination
pub const SAMPLE_TABLES: [&str; 4] = ["messages", "mailboxes", "subjects", "addresses"];

/// One column of a live table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type from the catalog; may be empty for untyped columns
    pub declared_type: String,
}

/// Ephemeral descriptor of one live table
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: String,
    /// Columns in catalog order
    pub columns: Vec<ColumnInfo>,
    /// `None` when the count could not be determined (e.g. a locked store)
    pub row_count: Option<u64>,
}

/// List table names from the catalog, lexicographically
pub fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    catalog_names(conn, "table")
}

/// List view names from the catalog, lexicographically
pub fn list_views(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    catalog_names(conn, "view")
}

fn catalog_names(conn: &Connection, kind: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = ? ORDER BY name")?;
    let names = stmt
        .query_map([kind], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Live columns of one table, in catalog order
pub fn describe_table(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let sql = format!("PRAGMA table_info({})", query::quote_identifier(table));
    let mut stmt = conn.prepare(&sql)?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Full descriptor for one table
pub fn describe(conn: &Connection, table: &str) -> rusqlite::Result<TableDescriptor> {
    Ok(TableDescriptor {
        name: table.to_owned(),
        columns: describe_table(conn, table)?,
        row_count: row_count(conn, table),
    })
}

/// Row count, or `None` when the store refuses to answer
pub fn row_count(conn: &Connection, table: &str) -> Option<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", query::quote_identifier(table));
    conn.query_row(&sql, [], |row| row.get::<_, u64>(0)).ok()
}

/// Up to `cap` sample rows of one table, with live column names
pub fn sample_rows(conn: &Connection, table: &str, cap: i64) -> rusqlite::Result<Vec<Row>> {
    let (sql, params) = SelectBuilder::new(query::quote_identifier(table))
        .column("*")
        .limit(cap)
        .build();
    query::fetch_rows(conn, &sql, &params)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{describe, describe_table, list_tables, list_views, row_count, sample_rows};

    fn store() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory store");
        conn.execute_batch(
            r#"
            CREATE TABLE subjects (ROWID INTEGER PRIMARY KEY, subject TEXT);
            CREATE TABLE odd_names ("Message-ID Header" TEXT, "last viewed date" INTEGER);
            CREATE TABLE addresses (ROWID INTEGER PRIMARY KEY, address TEXT, comment TEXT);
            INSERT INTO addresses VALUES (1, 'a@b.com', NULL), (2, 'c@d.com', 'work');
            CREATE VIEW recent_addresses AS SELECT address FROM addresses;
            "#,
        )
        .expect("seed store");
        conn
    }

    #[test]
    fn tables_and_views_list_lexicographically() {
        let conn = store();
        assert_eq!(
            list_tables(&conn).expect("tables"),
            vec!["addresses", "odd_names", "subjects"]
        );
        assert_eq!(list_views(&conn).expect("views"), vec!["recent_addresses"]);
    }

    #[test]
    fn describe_table_returns_exotic_columns_in_catalog_order() {
        let conn = store();
        let columns = describe_table(&conn, "odd_names").expect("describe");
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Message-ID Header", "last viewed date"]);
        assert_eq!(columns[0].declared_type, "TEXT");
        assert_eq!(columns[1].declared_type, "INTEGER");
    }

    #[test]
    fn describe_bundles_columns_and_row_count() {
        let conn = store();
        let descriptor = describe(&conn, "addresses").expect("describe");
        assert_eq!(descriptor.name, "addresses");
        assert_eq!(descriptor.columns.len(), 3);
        assert_eq!(descriptor.row_count, Some(2));
    }

    #[test]
    fn row_count_of_unknown_table_is_the_unknown_sentinel() {
        let conn = store();
        assert_eq!(row_count(&conn, "no_such_table"), None);
    }

    #[test]
    fn sample_rows_caps_results_and_keeps_live_column_names() {
        let conn = store();
        let rows = sample_rows(&conn, "addresses", 1).expect("sample");
        assert_eq!(rows.len(), 1);
        let names: Vec<&str> = rows[0].iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ROWID", "address", "comment"]);
    }
}
