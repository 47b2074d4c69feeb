//! JSON rewriting of arbitrary queries.
//!
//! [`JsonRewriter::to_json_query`] binds a raw query, describes the bound
//! text, and wraps it so the whole result set comes back as one JSON array
//! of row objects:
//!
//! ```text
//! SELECT <array-agg>(<object>('<name_1>', t."<name_1>", ...)) FROM (<bound>
//! ) t
//! ```
//!
//! The bound text is closed on a line of its own so a trailing `--` comment
//! cannot swallow the wrapper.
//!
//! Keys are the described column names verbatim. When a column had no name,
//! or two names differ only by case, the derived table is renamed
//! positionally through a CTE column list and referenced by internal aliases:
//!
//! ```text
//! WITH t ("c1", "c2") AS (<bound>
//! ) SELECT <array-agg>(<object>('id', t."c1", 'COL_2', t."c2")) FROM t
//! ```
//!
//! Two columns with the same name would produce duplicate keys and are
//! rejected. A query with no columns aggregates the dialect's empty object,
//! so the statement stays valid and yields `[{}, ...]` (one empty object per
//! row).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::binder::bind;
use crate::catalog::CatalogError;
use crate::introspect::{IntrospectError, SchemaIntrospector};
use crate::model::{ColumnDescriptor, ParameterError, ParameterList};
use crate::sql::{Dialect, JsonDialect};

/// Alias of the wrapped query inside the rewritten statement.
const ROW_ALIAS: &str = "t";

/// Errors raised while rewriting queries.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("{0}")]
    Parameter(#[from] ParameterError),

    #[error("{0}")]
    Introspect(#[from] IntrospectError),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("Duplicate output column '{name}' at positions {first} and {second}; alias one of them")]
    DuplicateColumn {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("Dialect mismatch: generating {requested} SQL for a {engine} engine")]
    DialectMismatch { requested: Dialect, engine: Dialect },
}

impl RewriteError {
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Introspect(err) if err.is_parse_error())
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;

/// Rewrites queries into single-value JSON statements.
#[derive(Clone, Copy)]
pub struct JsonRewriter<'a> {
    introspector: &'a dyn SchemaIntrospector,
    dialect: Dialect,
}

impl<'a> JsonRewriter<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector, dialect: Dialect) -> Self {
        Self {
            introspector,
            dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Bind, describe, and rewrite `sql`.
    ///
    /// Nothing is executed; the returned text is handed to a query executor.
    pub fn to_json_query(&self, sql: &str, params: &ParameterList) -> RewriteResult<String> {
        if let Some(engine) = self.introspector.dialect() {
            if engine != self.dialect {
                return Err(RewriteError::DialectMismatch {
                    requested: self.dialect,
                    engine,
                });
            }
        }

        let bound = bind(sql, params, self.dialect);
        let columns = self.introspector.describe(&bound)?;
        let rewritten = self.json_query_for(&bound, &columns)?;

        debug!(
            columns = columns.len(),
            dialect = %self.dialect,
            "rewrote query to JSON"
        );
        Ok(rewritten)
    }

    /// Build the JSON statement for already-bound SQL and its columns.
    pub fn json_query_for(&self, bound: &str, columns: &[ColumnDescriptor]) -> RewriteResult<String> {
        let dialect = self.dialect;
        let body = strip_terminator(bound);
        let positional = needs_positional_names(columns)?;

        let references: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                if positional {
                    positional_alias(i)
                } else {
                    column.name.clone()
                }
            })
            .collect();

        let entries = columns
            .iter()
            .zip(&references)
            .map(|(column, reference)| {
                let value = format!("{}.{}", ROW_ALIAS, dialect.quote_identifier(reference));
                dialect.object_entry(&column.name, &value)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let aggregate = dialect.array_agg(&dialect.object(&entries));

        if positional {
            let names = references
                .iter()
                .map(|reference| dialect.quote_identifier(reference))
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!(
                "WITH {alias} ({names}) AS ({body}\n) SELECT {aggregate} FROM {alias}",
                alias = ROW_ALIAS
            ))
        } else {
            Ok(format!("SELECT {aggregate} FROM ({body}\n) {ROW_ALIAS}"))
        }
    }
}

/// Whether the derived table must be renamed positionally.
///
/// Exact duplicates are an error; names equal up to ASCII case are not
/// distinguishable by quoted reference on every engine.
fn needs_positional_names(columns: &[ColumnDescriptor]) -> RewriteResult<bool> {
    let mut exact: HashMap<&str, usize> = HashMap::new();
    let mut folded: HashSet<String> = HashSet::new();
    let mut positional = false;

    for (i, column) in columns.iter().enumerate() {
        if let Some(&first) = exact.get(column.name.as_str()) {
            return Err(RewriteError::DuplicateColumn {
                name: column.name.clone(),
                first: first + 1,
                second: i + 1,
            });
        }
        exact.insert(&column.name, i);
        positional |= column.synthetic;
        positional |= !folded.insert(column.name.to_ascii_lowercase());
    }
    Ok(positional)
}

/// Internal name of the column at 0-based `index` in the positional form.
fn positional_alias(index: usize) -> String {
    format!("c{}", index + 1)
}

/// Drop trailing whitespace and statement terminators so the text can be
/// nested as a subquery.
fn strip_terminator(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}
