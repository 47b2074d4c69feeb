//! Oracle SQL/JSON dialect.
//!
//! Oracle features relevant to JSON generation:
//! - `JSON_OBJECT(KEY 'k' VALUE v, ...)` defaults to VARCHAR2; every
//!   constructor here returns CLOB so wide rows are not truncated
//! - `JSON_ARRAYAGG` yields NULL over zero rows
//! - Nested generated JSON must be marked `FORMAT JSON` when it arrives as text
//! - Unquoted identifiers fold to upper case
//! - Every SELECT needs a FROM clause (`dual`)

use super::helpers;
use super::JsonDialect;

const TIMESTAMP_FORMAT: &str = "YYYY-MM-DD HH24:MI:SS";

/// Oracle SQL/JSON dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl JsonDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        format!(
            "TO_DATE({}, {})",
            helpers::quote_string_single(timestamp),
            helpers::quote_string_single(TIMESTAMP_FORMAT)
        )
    }

    fn fold_identifier(&self, ident: &str) -> String {
        helpers::fold_upper(ident)
    }

    fn object_entry(&self, key: &str, value: &str) -> String {
        format!("KEY {} VALUE {}", helpers::quote_string_single(key), value)
    }

    fn object(&self, entries: &str) -> String {
        if entries.is_empty() {
            return helpers::call("JSON_OBJECT", entries);
        }
        format!("JSON_OBJECT({} RETURNING CLOB)", entries)
    }

    fn array_agg(&self, object: &str) -> String {
        format!(
            "COALESCE(JSON_ARRAYAGG({} RETURNING CLOB), TO_CLOB('[]'))",
            object
        )
    }

    fn array_of(&self, element: &str) -> String {
        format!("JSON_ARRAY({} RETURNING CLOB)", element)
    }

    fn nested_json(&self, subquery: &str) -> String {
        format!("({}) FORMAT JSON", subquery)
    }

    fn dual_table(&self) -> Option<&'static str> {
        Some("dual")
    }
}
