//! Query schema introspection.
//!
//! An introspector reports the ordered output columns of a query without
//! running it. Two implementations ship with the crate:
//!
//! - [`crate::backend::SqliteBackend`] prepares the statement on a live
//!   connection and reads the column metadata of the compiled statement.
//! - [`ParsedIntrospector`] parses the text with sqlparser and derives names
//!   from the SELECT list, for use when no database is reachable.
//!
//! Columns the engine reports without a name are described as `COL_<ordinal>`.

mod parsed;

pub use parsed::ParsedIntrospector;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ColumnDescriptor;
use crate::sql::Dialect;

/// Result type for introspection.
pub type IntrospectResult<T> = Result<T, IntrospectError>;

/// Line/column location inside query text (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    /// Locate a byte offset within `text`.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let prefix = &text[..floor_char_boundary(text, offset)];
        let line = prefix.matches('\n').count() + 1;
        let column = match prefix.rfind('\n') {
            Some(nl) => prefix[nl + 1..].chars().count() + 1,
            None => prefix.chars().count() + 1,
        };
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

fn at_position(position: &Option<SourcePosition>) -> String {
    position.map(|p| format!(" at {}", p)).unwrap_or_default()
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Errors raised while describing a query.
#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    /// The query is malformed or references objects the engine cannot resolve.
    #[error("Query parse error{}: {message}", at_position(.position))]
    QueryParse {
        message: String,
        position: Option<SourcePosition>,
    },

    /// The engine could not be reached or failed for reasons unrelated to the query text.
    #[error("Introspection backend error: {0}")]
    Backend(String),
}

impl IntrospectError {
    pub fn parse(message: impl Into<String>, position: Option<SourcePosition>) -> Self {
        Self::QueryParse {
            message: message.into(),
            position,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::QueryParse { .. })
    }

    /// Build a parse error from a sqlparser error, recovering its location.
    pub fn from_parser(err: sqlparser::parser::ParserError) -> Self {
        static LOCATION: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?:at )?Line: (\d+), Column:? (\d+)").expect("location pattern is valid")
        });

        let message = err.to_string();
        let position = LOCATION.captures(&message).and_then(|caps| {
            Some(SourcePosition {
                line: caps[1].parse().ok()?,
                column: caps[2].parse().ok()?,
            })
        });
        let message = LOCATION.replace(&message, "").trim().to_string();

        Self::QueryParse { message, position }
    }
}

/// Describes the output columns of a query without executing it.
pub trait SchemaIntrospector {
    /// Return the query's columns in SELECT-list order with 1-based ordinals.
    ///
    /// A query with no describable columns yields an empty vector.
    fn describe(&self, sql: &str) -> IntrospectResult<Vec<ColumnDescriptor>>;

    /// Dialect whose naming rules the described columns follow, when fixed
    /// by the engine.
    fn dialect(&self) -> Option<Dialect> {
        None
    }
}

impl<T: SchemaIntrospector + ?Sized> SchemaIntrospector for &T {
    fn describe(&self, sql: &str) -> IntrospectResult<Vec<ColumnDescriptor>> {
        (**self).describe(sql)
    }

    fn dialect(&self) -> Option<Dialect> {
        (**self).dialect()
    }
}

impl<T: SchemaIntrospector + ?Sized> SchemaIntrospector for Box<T> {
    fn describe(&self, sql: &str) -> IntrospectResult<Vec<ColumnDescriptor>> {
        (**self).describe(sql)
    }

    fn dialect(&self) -> Option<Dialect> {
        (**self).dialect()
    }
}
