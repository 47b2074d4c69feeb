//! Query execution contract.
//!
//! The engine only produces SQL text. Running it belongs to an executor,
//! which hands back the single JSON text value a rewritten or composite
//! statement yields.

use crate::sql::Dialect;

/// Result type for query execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// Errors raised by a query executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Query returned no JSON document")]
    NullDocument,
}

/// Runs a JSON-producing statement and returns its one text value.
pub trait QueryExecutor {
    /// Execute `sql`, expecting exactly one row with one JSON text column.
    fn fetch_json(&self, sql: &str) -> ExecuteResult<String>;

    /// Dialect the engine executes, when known.
    fn dialect(&self) -> Option<Dialect> {
        None
    }
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for &T {
    fn fetch_json(&self, sql: &str) -> ExecuteResult<String> {
        (**self).fetch_json(sql)
    }

    fn dialect(&self) -> Option<Dialect> {
        (**self).dialect()
    }
}

impl<T: QueryExecutor + ?Sized> QueryExecutor for Box<T> {
    fn fetch_json(&self, sql: &str) -> ExecuteResult<String> {
        (**self).fetch_json(sql)
    }

    fn dialect(&self) -> Option<Dialect> {
        (**self).dialect()
    }
}
