//! Report orchestration.
//!
//! Runs one report end to end:
//!
//! ```text
//! report name ─▶ catalog (report, template)
//!             ─▶ store.create_pending
//!             ─▶ aggregate ─▶ execute ─▶ render (bounded)
//!             ─▶ store.mark_ready | store.mark_failed
//! ```
//!
//! Once a pending record exists, every failure marks it failed before the
//! error is returned, so no record is left pending.

use std::time::Duration;

use tracing::{info, warn};

use crate::aggregate::{Aggregator, DEFAULT_FILENAME_MARKER};
use crate::catalog::{Catalog, CatalogError};
use crate::executor::{ExecuteError, QueryExecutor};
use crate::introspect::SchemaIntrospector;
use crate::model::{ParameterList, ReportDefinition, TemplateDefinition};
use crate::render::{RenderCredentials, RenderError, RenderRequest, RenderService};
use crate::rewrite::{JsonRewriter, RewriteError};
use crate::sql::Dialect;
use crate::store::{RecordId, ReportStore, StoreError};

/// Default upper bound on one render round-trip.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while generating a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// File extension and MIME type derived from a template's output type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pub extension: String,
    pub mime_type: &'static str,
}

impl OutputFormat {
    pub fn from_output_type(output_type: &str) -> Self {
        let extension = output_type.trim().trim_start_matches('.').to_lowercase();
        let mime_type = match extension.as_str() {
            "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xls" => "application/vnd.ms-excel",
            "pdf" => "application/pdf",
            "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "csv" => "text/csv",
            "html" | "htm" => "text/html",
            _ => "application/octet-stream",
        };
        let extension = if extension.is_empty() {
            "bin".to_string()
        } else {
            extension
        };

        Self {
            extension,
            mime_type,
        }
    }

    /// `<report_name>.<extension>`
    pub fn filename(&self, report_name: &str) -> String {
        format!("{}.{}", report_name, self.extension)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReport {
    pub record_id: RecordId,
    pub filename: String,
    pub mime_type: &'static str,
    pub size: usize,
}

/// Runs reports against a catalog, an engine, a render service, and a store.
pub struct ReportGenerator<'a> {
    catalog: &'a dyn Catalog,
    introspector: &'a dyn SchemaIntrospector,
    executor: &'a dyn QueryExecutor,
    renderer: &'a dyn RenderService,
    store: &'a dyn ReportStore,
    dialect: Dialect,
    filename_marker: String,
    credentials: RenderCredentials,
    render_timeout: Duration,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        introspector: &'a dyn SchemaIntrospector,
        executor: &'a dyn QueryExecutor,
        renderer: &'a dyn RenderService,
        store: &'a dyn ReportStore,
    ) -> Self {
        Self {
            catalog,
            introspector,
            executor,
            renderer,
            store,
            dialect: QueryExecutor::dialect(executor).unwrap_or_default(),
            filename_marker: DEFAULT_FILENAME_MARKER.to_string(),
            credentials: RenderCredentials::default(),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Override the generated dialect. It must match the executor's, when
    /// the executor reports one.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_filename_marker(mut self, marker: impl Into<String>) -> Self {
        self.filename_marker = marker.into();
        self
    }

    pub fn with_credentials(mut self, credentials: RenderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Generate `report_name` and store the rendered document.
    pub async fn generate(
        &self,
        report_name: &str,
        params: &ParameterList,
    ) -> ReportResult<GeneratedReport> {
        let report = self.catalog.lookup_report(report_name)?;
        let template = self.catalog.lookup_template(report.template_id)?;
        let format = OutputFormat::from_output_type(&template.output_type);
        let filename = format.filename(&report.name);

        let record_id = self.store.create_pending(&filename, format.mime_type)?;
        info!(report = %report.name, record = %record_id, %filename, "report pending");

        let outcome = match self.produce(&report, &template, &filename, params).await {
            Ok(payload) => {
                let size = payload.len();
                self.store
                    .mark_ready(record_id, payload)
                    .map(|()| size)
                    .map_err(ReportError::from)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(size) => {
                info!(report = %report.name, record = %record_id, size, "report ready");
                Ok(GeneratedReport {
                    record_id,
                    filename,
                    mime_type: format.mime_type,
                    size,
                })
            }
            Err(err) => {
                warn!(report = %report.name, record = %record_id, error = %err, "report failed");
                if let Err(store_err) = self.store.mark_failed(record_id, &err.to_string()) {
                    warn!(record = %record_id, error = %store_err, "could not mark report failed");
                }
                Err(err)
            }
        }
    }

    /// Build the render request for `report_name` without rendering or
    /// storing anything.
    pub fn build_request(
        &self,
        report_name: &str,
        params: &ParameterList,
    ) -> ReportResult<RenderRequest> {
        let report = self.catalog.lookup_report(report_name)?;
        let template = self.catalog.lookup_template(report.template_id)?;
        let filename = OutputFormat::from_output_type(&template.output_type).filename(&report.name);
        self.prepare_request(&report, &template, &filename, params)
    }

    fn prepare_request(
        &self,
        report: &ReportDefinition,
        template: &TemplateDefinition,
        filename: &str,
        params: &ParameterList,
    ) -> ReportResult<RenderRequest> {
        if let Some(engine) = QueryExecutor::dialect(self.executor) {
            if engine != self.dialect {
                return Err(RewriteError::DialectMismatch {
                    requested: self.dialect,
                    engine,
                }
                .into());
            }
        }

        let rewriter = JsonRewriter::new(self.introspector, self.dialect);
        let composite = Aggregator::new(self.catalog, rewriter)
            .with_filename_marker(self.filename_marker.as_str())
            .aggregate(&report.datasource_ids, params)?;
        let document = self.executor.fetch_json(&composite)?;

        Ok(RenderRequest::for_report(
            document,
            template,
            filename,
            &self.credentials,
        ))
    }

    async fn produce(
        &self,
        report: &ReportDefinition,
        template: &TemplateDefinition,
        filename: &str,
        params: &ParameterList,
    ) -> ReportResult<Vec<u8>> {
        let request = self.prepare_request(report, template, filename, params)?;

        let payload = tokio::time::timeout(self.render_timeout, self.renderer.render(&request))
            .await
            .map_err(|_| RenderError::Timeout(self.render_timeout))??;
        Ok(payload)
    }
}
