//! SQLite-backed catalog.
//!
//! # Schema
//!
//! ```text
//! datasources        (id, source_key, query)
//! templates          (id, output_type, template_query)
//! reports            (name, template_id)
//! report_datasources (report_name, datasource_id)
//! ```
//!
//! Data sources are always returned ordered by id so composite documents are
//! reproducible across runs.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use super::{Catalog, CatalogError, CatalogResult};
use crate::model::{DataSource, DataSourceId, ReportDefinition, TemplateDefinition, TemplateId};

/// Catalog stored in a SQLite configuration database.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open or create the catalog database at `path`.
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(timeout)?;
        let catalog = Self { conn };
        catalog.init()?;
        Ok(catalog)
    }

    /// Open an in-memory catalog (for testing).
    pub fn open_in_memory() -> CatalogResult<Self> {
        let catalog = Self {
            conn: Connection::open_in_memory()?,
        };
        catalog.init()?;
        Ok(catalog)
    }

    fn init(&self) -> CatalogResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS datasources (
                id INTEGER PRIMARY KEY,
                source_key TEXT NOT NULL,
                query TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS templates (
                id INTEGER PRIMARY KEY,
                output_type TEXT NOT NULL,
                template_query TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                name TEXT PRIMARY KEY,
                template_id INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS report_datasources (
                report_name TEXT NOT NULL,
                datasource_id INTEGER NOT NULL,
                PRIMARY KEY (report_name, datasource_id)
            );
            ",
        )?;
        Ok(())
    }

    pub fn register_datasource(&self, source: &DataSource) -> CatalogResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO datasources (id, source_key, query) VALUES (?, ?, ?)",
            params![source.id.0, source.key, source.raw_query],
        )?;
        Ok(())
    }

    pub fn register_template(&self, template: &TemplateDefinition) -> CatalogResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO templates (id, output_type, template_query) VALUES (?, ?, ?)",
            params![
                template.id.0,
                template.output_type,
                template.template_query_text
            ],
        )?;
        Ok(())
    }

    /// Register a report, replacing any previous data-source links.
    pub fn register_report(&self, report: &ReportDefinition) -> CatalogResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO reports (name, template_id) VALUES (?, ?)",
            params![report.name, report.template_id.0],
        )?;
        tx.execute(
            "DELETE FROM report_datasources WHERE report_name = ?",
            params![report.name],
        )?;
        for id in &report.datasource_ids {
            tx.execute(
                "INSERT OR IGNORE INTO report_datasources (report_name, datasource_id) VALUES (?, ?)",
                params![report.name, id.0],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl Catalog for SqliteCatalog {
    fn lookup_datasources(&self, ids: &[DataSourceId]) -> CatalogResult<Vec<DataSource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, source_key, query FROM datasources WHERE id IN ({}) ORDER BY id",
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let sources = stmt
            .query_map(params_from_iter(ids.iter().map(|id| id.0)), |row| {
                Ok(DataSource {
                    id: DataSourceId(row.get(0)?),
                    key: row.get(1)?,
                    raw_query: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(requested = ids.len(), found = sources.len(), "looked up data sources");
        Ok(sources)
    }

    fn lookup_report(&self, name: &str) -> CatalogResult<ReportDefinition> {
        let template_id: i64 = self
            .conn
            .query_row(
                "SELECT template_id FROM reports WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| CatalogError::UnknownReport(name.to_string()))?;

        let mut stmt = self.conn.prepare(
            "SELECT datasource_id FROM report_datasources WHERE report_name = ? ORDER BY datasource_id",
        )?;
        let datasource_ids = stmt
            .query_map(params![name], |row| Ok(DataSourceId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReportDefinition {
            name: name.to_string(),
            template_id: TemplateId(template_id),
            datasource_ids,
        })
    }

    fn lookup_template(&self, id: TemplateId) -> CatalogResult<TemplateDefinition> {
        self.conn
            .query_row(
                "SELECT output_type, template_query FROM templates WHERE id = ?",
                params![id.0],
                |row| {
                    Ok(TemplateDefinition {
                        id,
                        output_type: row.get(0)?,
                        template_query_text: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or(CatalogError::UnknownTemplate(id))
    }
}
