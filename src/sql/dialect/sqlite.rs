//! SQLite SQL/JSON dialect.
//!
//! SQLite (3.38+) ships the JSON functions built in:
//! - `json_object('k', v, ...)`, `json_array(...)`
//! - `json_group_array` aggregates to `[]` over zero rows
//! - JSON text crossing a subquery boundary loses its JSON subtype and must be
//!   re-tagged with `json(...)` before nesting
//! - Column names are reported exactly as written

use super::helpers;
use super::JsonDialect;

/// SQLite SQL/JSON dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl JsonDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        // SQLite stores timestamps as ISO-8601 text
        helpers::quote_string_single(timestamp)
    }

    fn object_entry(&self, key: &str, value: &str) -> String {
        helpers::entry_positional(key, value)
    }

    fn object(&self, entries: &str) -> String {
        helpers::call("json_object", entries)
    }

    fn array_agg(&self, object: &str) -> String {
        helpers::call("json_group_array", object)
    }

    fn array_of(&self, element: &str) -> String {
        helpers::call("json_array", element)
    }

    fn nested_json(&self, subquery: &str) -> String {
        format!("json(({}))", subquery)
    }
}
