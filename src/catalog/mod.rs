//! Catalog of data sources, reports, and templates.
//!
//! The catalog is read-only from the engine's point of view. One
//! [`Catalog::lookup_datasources`] call is made per aggregation request and
//! nothing it returns is cached.

mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::model::{DataSource, DataSourceId, ReportDefinition, TemplateDefinition, TemplateId};

/// Errors raised by catalog lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown data source(s): {}", join_ids(.0))]
    UnknownDataSource(Vec<DataSourceId>),

    #[error("Unknown report: {0}")]
    UnknownReport(String),

    #[error("Unknown template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("Data sources {first} and {second} share the document key '{key}'")]
    DuplicateKey {
        key: String,
        first: DataSourceId,
        second: DataSourceId,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

fn join_ids(ids: &[DataSourceId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Source of data-source, report, and template definitions.
pub trait Catalog {
    /// Data sources whose id is in `ids`, ordered by id ascending.
    ///
    /// Ids with no registered data source are silently absent from the
    /// result; callers decide whether that is an error.
    fn lookup_datasources(&self, ids: &[DataSourceId]) -> CatalogResult<Vec<DataSource>>;

    /// Template and data sources registered for a report name.
    fn lookup_report(&self, name: &str) -> CatalogResult<ReportDefinition>;

    fn lookup_template(&self, id: TemplateId) -> CatalogResult<TemplateDefinition>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn lookup_datasources(&self, ids: &[DataSourceId]) -> CatalogResult<Vec<DataSource>> {
        (**self).lookup_datasources(ids)
    }

    fn lookup_report(&self, name: &str) -> CatalogResult<ReportDefinition> {
        (**self).lookup_report(name)
    }

    fn lookup_template(&self, id: TemplateId) -> CatalogResult<TemplateDefinition> {
        (**self).lookup_template(id)
    }
}
