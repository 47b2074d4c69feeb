//! # sqljson
//!
//! Rewrites parameterized SQL into queries that return their whole result
//! set as one JSON value, and composes several such queries into a single
//! keyed report document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Raw SQL with #P<n># placeholders + parameters     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [binder]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Bound SQL                            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [introspect]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Column descriptors (name, ordinal)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rewrite]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SELECT <json array of row objects> FROM (...)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [aggregate, one per data source]
//! ┌─────────────────────────────────────────────────────────┐
//! │  {"filename": ..., "data": [{"<key>": [...], ...}]}      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never runs SQL itself. Execution, the catalog, rendering, and
//! report storage sit behind the [`executor::QueryExecutor`],
//! [`catalog::Catalog`], [`render::RenderService`], and
//! [`store::ReportStore`] traits; [`report::ReportGenerator`] wires them
//! together.

pub mod aggregate;
pub mod backend;
pub mod binder;
pub mod catalog;
pub mod config;
pub mod executor;
pub mod introspect;
pub mod logging;
pub mod model;
pub mod render;
pub mod report;
pub mod rewrite;
pub mod sql;
pub mod store;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregate::Aggregator;
    pub use crate::backend::SqliteBackend;
    pub use crate::binder::bind;
    pub use crate::catalog::{Catalog, CatalogError, SqliteCatalog};
    pub use crate::dialect::{Dialect, JsonDialect};
    pub use crate::executor::QueryExecutor;
    pub use crate::introspect::{IntrospectError, ParsedIntrospector, SchemaIntrospector};
    pub use crate::model::{
        ColumnDescriptor, DataSource, DataSourceId, ParameterList, ParameterValue, RawParameter,
    };
    pub use crate::rewrite::{JsonRewriter, RewriteError};
}

pub use aggregate::Aggregator;
pub use binder::bind;
pub use dialect::Dialect;
pub use rewrite::JsonRewriter;
