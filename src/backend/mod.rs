//! Database backends.
//!
//! A backend wraps one engine connection and implements both sides of the
//! engine contract: [`crate::introspect::SchemaIntrospector`] for describing
//! queries and [`crate::executor::QueryExecutor`] for running the rewritten
//! statements.

pub mod sqlite;

pub use sqlite::SqliteBackend;
