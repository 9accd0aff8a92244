//! Parameterized query construction and row fetching
//!
//! All predicate values are bound as SQL parameters, never interpolated
//! into statement text. Identifier text comes either from the live catalog
//! (passed through [`quote_identifier`]) or from fixed engine constants,
//! never from caller input, which closes off injection via identifiers.

use std::fmt;

use chrono::{Local, NaiveDate, TimeZone};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, params_from_iter};

/// Result cap applied when the caller omits a limit or supplies a
/// non-positive one
pub const DEFAULT_LIMIT: i64 = 10;

/// Clamp a caller-supplied limit to a usable cap
pub fn effective_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(n) if n > 0 => n,
        _ => DEFAULT_LIMIT,
    }
}

/// Quote an identifier taken from the live catalog for embedding in SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A parsed date filter
///
/// `Range` is the strict path: the calendar day as a half-open Unix-epoch
/// interval in the local timezone. `Rendered` is the fallback when the input
/// does not parse as `YYYY-MM-DD`: a substring match against the
/// human-readable rendering of the timestamp column. The fallback is looser
/// and can match unintended rows for some inputs; it is preserved
/// deliberately for compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFilter {
    /// Half-open `[start, end)` Unix-epoch range covering one local day
    Range { start: i64, end: i64 },
    /// Substring match against `datetime(col, 'unixepoch')`
    Rendered(String),
}

impl DateFilter {
    /// Parse a caller-supplied date filter, falling back to substring match
    pub fn parse(raw: &str) -> Self {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| {
                let start = local_midnight_epoch(date)?;
                let end = local_midnight_epoch(date.succ_opt()?)?;
                Some(Self::Range { start, end })
            })
            .unwrap_or_else(|| Self::Rendered(raw.to_owned()))
    }

    /// Predicate against a single timestamp column
    pub fn predicate(&self, column: &str) -> Predicate {
        self.predicate_over(&[column])
    }

    /// Predicate OR-applied across several timestamp columns
    ///
    /// Columns must be catalog-derived (already quoted) or fixed engine
    /// expressions.
    pub fn predicate_over(&self, columns: &[&str]) -> Predicate {
        match self {
            Self::Range { start, end } => {
                let sql = columns
                    .iter()
                    .map(|col| format!("({col} >= ? AND {col} < ?)"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                let params = columns
                    .iter()
                    .flat_map(|_| [Value::Integer(*start), Value::Integer(*end)])
                    .collect();
                Predicate { sql, params }
            }
            Self::Rendered(text) => {
                let sql = columns
                    .iter()
                    .map(|col| format!("datetime({col}, 'unixepoch') LIKE ?"))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                let params = columns
                    .iter()
                    .map(|_| Value::Text(format!("%{text}%")))
                    .collect();
                Predicate { sql, params }
            }
        }
    }
}

/// Local midnight of `date` as a Unix epoch
///
/// `None` when the local timezone skips that midnight (DST gap); the caller
/// falls back to the rendered-substring filter in that case.
fn local_midnight_epoch(date: NaiveDate) -> Option<i64> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp())
}

/// One WHERE clause with its bound parameter values
#[derive(Debug, Clone)]
pub struct Predicate {
    /// Clause text with `?` placeholders
    pub sql: String,
    /// Values bound to the placeholders, in order
    pub params: Vec<Value>,
}

/// Substring match OR-combined across text columns
///
/// `LIKE` is case-insensitive for ASCII in SQLite, which is the intended
/// matching behavior here.
pub fn like_any(columns: &[&str], text: &str) -> Predicate {
    let sql = columns
        .iter()
        .map(|col| format!("{col} LIKE ?"))
        .collect::<Vec<_>>()
        .join(" OR ");
    let params = columns
        .iter()
        .map(|_| Value::Text(format!("%{text}%")))
        .collect();
    Predicate { sql, params }
}

/// Membership predicate with one placeholder per identifier
///
/// Returns `None` for an empty identifier list: no query should be issued at
/// all in that case.
pub fn membership(column: &str, ids: &[i64]) -> Option<Predicate> {
    if ids.is_empty() {
        return None;
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    Some(Predicate {
        sql: format!("{column} IN ({placeholders})"),
        params: ids.iter().map(|id| Value::Integer(*id)).collect(),
    })
}

/// Builds a single parameterized SELECT statement
///
/// Predicates are AND-joined, each wrapped in parentheses so OR-combined
/// clauses compose correctly. The LIMIT is bound as a parameter like every
/// other value.
#[derive(Debug)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    joins: Vec<String>,
    predicates: Vec<Predicate>,
    order_by: Option<String>,
    limit: Option<i64>,
}

impl SelectBuilder {
    /// Start a SELECT from `table` (catalog-derived or fixed engine text)
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            predicates: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    /// Add one select expression
    pub fn column(mut self, expr: impl Into<String>) -> Self {
        self.columns.push(expr.into());
        self
    }

    /// Add a join clause (fixed engine text)
    pub fn join(mut self, clause: impl Into<String>) -> Self {
        self.joins.push(clause.into());
        self
    }

    /// Add one AND-joined predicate
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Set the ORDER BY expression
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Cap the result set; bound as a parameter
    pub fn limit(mut self, cap: i64) -> Self {
        self.limit = Some(cap);
        self
    }

    /// Render the statement and collect its parameters in binding order
    pub fn build(self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        for clause in &self.joins {
            sql.push(' ');
            sql.push_str(clause);
        }

        let mut params = Vec::new();
        if !self.predicates.is_empty() {
            let mut clauses = Vec::with_capacity(self.predicates.len());
            for predicate in self.predicates {
                clauses.push(format!("({})", predicate.sql));
                params.extend(predicate.params);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }
        if let Some(cap) = self.limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(cap));
        }

        (sql, params)
    }
}

/// A single fetched value, tagged by storage class
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Byte length only; blob contents are never rendered
    Blob(usize),
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(r) => Self::Real(r),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Self::Blob(b.len()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("(null)"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Text(t) => f.write_str(t),
            Self::Blob(len) => write!(f, "(blob {len} bytes)"),
        }
    }
}

/// One fetched row: an ordered mapping from result column name to value
///
/// Order follows the SELECT column list, so formatters can rely on
/// positional structure without reordering.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(fields: Vec<(String, SqlValue)>) -> Self {
        Self { fields }
    }

    /// Value by result column name
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Integer value by result column name, if present and integral
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(SqlValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Iterate fields in select-list order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Execute a SELECT and fetch all rows with their live column names
pub fn fetch_rows(conn: &Connection, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let mut fields = Vec::with_capacity(columns.len());
            for (index, name) in columns.iter().enumerate() {
                fields.push((name.clone(), SqlValue::from(row.get_ref(index)?)));
            }
            Ok(Row::new(fields))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use rusqlite::types::Value;

    use super::{
        DateFilter, SelectBuilder, SqlValue, effective_limit, fetch_rows, like_any, membership,
        quote_identifier,
    };

    #[test]
    fn missing_or_non_positive_limits_fall_back_to_default() {
        assert_eq!(effective_limit(None), 10);
        assert_eq!(effective_limit(Some(0)), 10);
        assert_eq!(effective_limit(Some(-3)), 10);
        assert_eq!(effective_limit(Some(25)), 25);
    }

    #[test]
    fn quote_identifier_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("plain"), "\"plain\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn valid_date_parses_to_half_open_day_range() {
        match DateFilter::parse("2024-03-01") {
            DateFilter::Range { start, end } => {
                assert!(start < end);
                // One calendar day; allow for DST-shortened or -lengthened days.
                assert!((82_800..=90_000).contains(&(end - start)));
            }
            DateFilter::Rendered(_) => panic!("expected strict range"),
        }
    }

    #[test]
    fn unparseable_date_falls_back_to_rendered_substring() {
        let filter = DateFilter::parse("March 1, 2024");
        assert_eq!(filter, DateFilter::Rendered("March 1, 2024".to_owned()));

        let predicate = filter.predicate("date_sent");
        assert_eq!(predicate.sql, "datetime(date_sent, 'unixepoch') LIKE ?");
        assert_eq!(
            predicate.params,
            vec![Value::Text("%March 1, 2024%".to_owned())]
        );
    }

    #[test]
    fn range_predicate_over_two_columns_binds_both_bounds_twice() {
        let filter = DateFilter::Range {
            start: 100,
            end: 200,
        };
        let predicate = filter.predicate_over(&["m.date_sent", "m.date_received"]);
        assert_eq!(
            predicate.sql,
            "(m.date_sent >= ? AND m.date_sent < ?) OR (m.date_received >= ? AND m.date_received < ?)"
        );
        assert_eq!(predicate.params.len(), 4);
    }

    #[test]
    fn membership_expands_one_placeholder_per_id() {
        let predicate = membership("sender", &[7, 9, 11]).expect("non-empty id list");
        assert_eq!(predicate.sql, "sender IN (?, ?, ?)");
        assert_eq!(predicate.params.len(), 3);
    }

    #[test]
    fn empty_membership_short_circuits() {
        assert!(membership("sender", &[]).is_none());
    }

    #[test]
    fn like_any_or_combines_columns() {
        let predicate = like_any(&["subject", "sender"], "invoice");
        assert_eq!(predicate.sql, "subject LIKE ? OR sender LIKE ?");
        assert_eq!(
            predicate.params,
            vec![
                Value::Text("%invoice%".to_owned()),
                Value::Text("%invoice%".to_owned())
            ]
        );
    }

    #[test]
    fn builder_renders_predicates_order_and_bound_limit() {
        let (sql, params) = SelectBuilder::new("messages")
            .column("ROWID")
            .column("subject")
            .predicate(like_any(&["subject"], "x"))
            .predicate(membership("sender", &[1, 2]).expect("ids"))
            .order_by("ROWID DESC")
            .limit(5)
            .build();
        assert_eq!(
            sql,
            "SELECT ROWID, subject FROM messages WHERE (subject LIKE ?) AND (sender IN (?, ?)) ORDER BY ROWID DESC LIMIT ?"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params.last(), Some(&Value::Integer(5)));
    }

    #[test]
    fn fetch_rows_tags_values_and_preserves_column_order() {
        let conn = Connection::open_in_memory().expect("in-memory store");
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT, score REAL, note TEXT);
             INSERT INTO t VALUES (1, 'alpha', 0.5, NULL);",
        )
        .expect("seed");

        let rows = fetch_rows(&conn, "SELECT id, name, score, note FROM t", &[])
            .expect("fetch succeeds");
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.integer("id"), Some(1));
        assert_eq!(row.get("name"), Some(&SqlValue::Text("alpha".to_owned())));
        assert_eq!(row.get("note"), Some(&SqlValue::Null));
        let order: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["id", "name", "score", "note"]);
    }
}
