//! PostgreSQL SQL/JSON dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Lowercase case folding for unquoted identifiers
//! - `json_build_object` / `json_build_array` variadic builders
//! - `json_agg` yields NULL over zero rows
//! - Scalar subqueries of type `json` nest without re-parsing

use super::helpers;
use super::JsonDialect;

/// PostgreSQL SQL/JSON dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl JsonDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        format!("TIMESTAMP {}", helpers::quote_string_single(timestamp))
    }

    fn fold_identifier(&self, ident: &str) -> String {
        helpers::fold_lower(ident)
    }

    fn object_entry(&self, key: &str, value: &str) -> String {
        helpers::entry_positional(key, value)
    }

    fn object(&self, entries: &str) -> String {
        helpers::call("json_build_object", entries)
    }

    fn array_agg(&self, object: &str) -> String {
        format!("COALESCE(json_agg({}), '[]'::json)", object)
    }

    fn array_of(&self, element: &str) -> String {
        helpers::call("json_build_array", element)
    }

    fn nested_json(&self, subquery: &str) -> String {
        format!("({})", subquery)
    }
}
