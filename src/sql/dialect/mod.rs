//! SQL/JSON dialect definitions.
//!
//! Every engine spells JSON generation differently. This module provides a
//! trait-based abstraction over those differences so the rewriter and the
//! aggregator can emit one statement shape for any supported engine:
//!
//! | Construct | Oracle | SQLite | PostgreSQL |
//! |-----------|--------|--------|------------|
//! | Object | `JSON_OBJECT(KEY 'k' VALUE v RETURNING CLOB)` | `json_object('k', v)` | `json_build_object('k', v)` |
//! | Array aggregate | `JSON_ARRAYAGG(o RETURNING CLOB)` | `json_group_array(o)` | `json_agg(o)` |
//! | One-element array | `JSON_ARRAY(e RETURNING CLOB)` | `json_array(e)` | `json_build_array(e)` |
//! | Nested JSON value | `(q) FORMAT JSON` | `json((q))` | `(q)` |
//! | Timestamp literal | `TO_DATE('..', 'YYYY-MM-DD HH24:MI:SS')` | `'..'` | `TIMESTAMP '..'` |
//!
//! # Usage
//!
//! ```ignore
//! use sqljson::sql::dialect::{Dialect, JsonDialect};
//!
//! let dialect = Dialect::Sqlite;
//! let obj = dialect.object(&dialect.object_entry("x", "t.\"x\""));
//! assert_eq!(obj, "json_object('x', t.\"x\")");
//! ```

pub mod helpers;
mod oracle;
mod postgres;
mod sqlite;

pub use oracle::Oracle;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use serde::{Deserialize, Serialize};

/// JSON dialect trait - defines how JSON-producing SQL is rendered.
///
/// Implementations handle engine-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait JsonDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (column, alias).
    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    /// Quote a string literal with `''` escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    /// Format a timestamp literal from canonical `YYYY-MM-DD HH:MM:SS` text.
    fn format_timestamp_literal(&self, timestamp: &str) -> String;

    /// Apply the engine's case folding to an unquoted identifier.
    ///
    /// Used when column names are derived from query text rather than
    /// reported by the engine.
    fn fold_identifier(&self, ident: &str) -> String {
        ident.to_string()
    }

    // =========================================================================
    // JSON Construction
    // =========================================================================

    /// Render one key/value entry of an object constructor.
    fn object_entry(&self, key: &str, value: &str) -> String;

    /// Wrap already-joined entries in an object constructor.
    ///
    /// `entries` may be empty, which must still produce a valid empty object.
    fn object(&self, entries: &str) -> String;

    /// Aggregate one object per row into a single JSON array.
    ///
    /// Zero rows must aggregate to `[]`, not NULL.
    fn array_agg(&self, object: &str) -> String;

    /// Build a one-element JSON array around an expression.
    fn array_of(&self, element: &str) -> String;

    /// Embed the text returned by a JSON-producing scalar subquery as JSON.
    fn nested_json(&self, subquery: &str) -> String;

    /// Table to select from when a statement has no FROM source.
    fn dual_table(&self) -> Option<&'static str> {
        None
    }
}

/// Supported SQL/JSON dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Oracle,
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn JsonDialect {
        match self {
            Dialect::Oracle => &Oracle,
            Dialect::Sqlite => &Sqlite,
            Dialect::Postgres => &Postgres,
        }
    }

    /// The sqlparser dialect used for offline parsing.
    pub fn parser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{GenericDialect, PostgreSqlDialect, SQLiteDialect};

        match self {
            // sqlparser has no Oracle dialect
            Dialect::Oracle => Box::new(GenericDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oracle" | "ora" => Ok(Dialect::Oracle),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(format!(
                "unsupported dialect: {}. Supported: oracle, sqlite, postgres",
                other
            )),
        }
    }
}

// Implement JsonDialect for Dialect enum by delegating to concrete types
impl JsonDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        self.dialect().format_timestamp_literal(timestamp)
    }

    fn fold_identifier(&self, ident: &str) -> String {
        self.dialect().fold_identifier(ident)
    }

    fn object_entry(&self, key: &str, value: &str) -> String {
        self.dialect().object_entry(key, value)
    }

    fn object(&self, entries: &str) -> String {
        self.dialect().object(entries)
    }

    fn array_agg(&self, object: &str) -> String {
        self.dialect().array_agg(object)
    }

    fn array_of(&self, element: &str) -> String {
        self.dialect().array_of(element)
    }

    fn nested_json(&self, subquery: &str) -> String {
        self.dialect().nested_json(subquery)
    }

    fn dual_table(&self) -> Option<&'static str> {
        self.dialect().dual_table()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
