//! Shared helper functions for JSON dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `JsonDialect` trait with minimal duplication.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Oracle, SQLite, Postgres
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Identifier Case Folding
// =============================================================================

/// Fold an unquoted identifier to upper case.
/// Used by: Oracle
pub fn fold_upper(ident: &str) -> String {
    ident.to_uppercase()
}

/// Fold an unquoted identifier to lower case.
/// Used by: Postgres
pub fn fold_lower(ident: &str) -> String {
    ident.to_lowercase()
}

// =============================================================================
// Key/Value Entries
// =============================================================================

/// Positional `'key', value` pair used by function-style object builders.
/// Used by: SQLite (`json_object`), Postgres (`json_build_object`)
pub fn entry_positional(key: &str, value: &str) -> String {
    format!("{}, {}", quote_string_single(key), value)
}

/// Wrap already-joined arguments in a function call.
pub fn call(function: &str, args: &str) -> String {
    format!("{}({})", function, args)
}
