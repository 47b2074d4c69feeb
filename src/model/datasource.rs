//! Catalog records: data sources, reports, and templates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(pub i64);

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DataSourceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of a render template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub i64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named raw query contributing one keyed section of a composite document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: DataSourceId,
    /// Key as registered; see [`DataSource::json_key`] for the emitted form.
    pub key: String,
    pub raw_query: String,
}

impl DataSource {
    pub fn new(id: i64, key: impl Into<String>, raw_query: impl Into<String>) -> Self {
        Self {
            id: DataSourceId(id),
            key: key.into(),
            raw_query: raw_query.into(),
        }
    }

    /// Key used in the composite JSON document (lower-cased).
    pub fn json_key(&self) -> String {
        self.key.to_lowercase()
    }
}

/// Report-to-template/data-source mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub name: String,
    pub template_id: TemplateId,
    pub datasource_ids: Vec<DataSourceId>,
}

/// Render template registered for a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: TemplateId,
    /// Output document type (e.g. `xlsx`).
    pub output_type: String,
    /// Query text the render service runs to fetch the template body.
    pub template_query_text: String,
}
