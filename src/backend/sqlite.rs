//! SQLite backend.
//!
//! Introspection prepares the statement and reads the compiled column list;
//! the statement is never stepped, so zero-row predicates and side-effect
//! free describes come for free. The prepared handle is finalized when it
//! drops, on success and error paths alike.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, ErrorCode};
use tracing::debug;

use crate::executor::{ExecuteError, ExecuteResult, QueryExecutor};
use crate::introspect::{IntrospectError, IntrospectResult, SchemaIntrospector, SourcePosition};
use crate::model::ColumnDescriptor;
use crate::sql::Dialect;

/// A single SQLite connection used for describing and running queries.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open a database file, waiting up to `timeout` on locked tables.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(timeout)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, e.g. for loading fixtures.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Dialect of every statement this backend prepares.
    pub fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn prepare(&self, sql: &str) -> IntrospectResult<rusqlite::Statement<'_>> {
        let statement = self
            .conn
            .prepare(sql)
            .map_err(|err| prepare_error(sql, err))?;

        if !statement.readonly() {
            return Err(IntrospectError::parse(
                "statement is not a read-only query",
                None,
            ));
        }
        Ok(statement)
    }
}

impl SchemaIntrospector for SqliteBackend {
    fn describe(&self, sql: &str) -> IntrospectResult<Vec<ColumnDescriptor>> {
        let statement = self.prepare(sql)?;

        let columns: Vec<ColumnDescriptor> = (0..statement.column_count())
            .map(|i| ColumnDescriptor::new(statement.column_name(i).ok(), i + 1))
            .collect();

        debug!(columns = columns.len(), "described query on sqlite");
        Ok(columns)
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(Dialect::Sqlite)
    }
}

impl QueryExecutor for SqliteBackend {
    fn fetch_json(&self, sql: &str) -> ExecuteResult<String> {
        let mut statement = self
            .prepare(sql)
            .map_err(|err| ExecuteError::Query(err.to_string()))?;

        let document: Option<String> = statement
            .query_row([], |row| row.get(0))
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => ExecuteError::NullDocument,
                other => ExecuteError::Query(other.to_string()),
            })?;

        document.ok_or(ExecuteError::NullDocument)
    }

    fn dialect(&self) -> Option<Dialect> {
        Some(Dialect::Sqlite)
    }
}

/// Map a prepare failure: input errors reported with an offset and generic
/// SQL errors (syntax, unknown objects) are parse errors, anything else is a
/// backend fault.
fn prepare_error(sql: &str, err: rusqlite::Error) -> IntrospectError {
    match err {
        rusqlite::Error::SqlInputError { msg, offset, .. } => {
            let offset = usize::try_from(offset)
                .ok()
                .or_else(|| near_token_offset(sql, &msg));
            let position = offset.map(|offset| SourcePosition::from_offset(sql, offset));
            IntrospectError::parse(msg, position)
        }
        rusqlite::Error::SqliteFailure(failure, message) if failure.code == ErrorCode::Unknown => {
            let message = message.unwrap_or_else(|| failure.to_string());
            let position = near_token_offset(sql, &message)
                .map(|offset| SourcePosition::from_offset(sql, offset));
            IntrospectError::parse(message, position)
        }
        rusqlite::Error::MultipleStatement => {
            IntrospectError::parse("expected exactly one statement", None)
        }
        other => IntrospectError::Backend(other.to_string()),
    }
}

/// Offset of the token SQLite quotes in `near "<token>": ...` messages.
fn near_token_offset(sql: &str, message: &str) -> Option<usize> {
    static NEAR: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"near "([^"]+)""#).expect("near pattern is valid"));

    let token = NEAR.captures(message)?.get(1)?.as_str();
    sql.find(token)
}
