//! Request/response types for the render service.

use serde::{Deserialize, Serialize};

use crate::model::TemplateDefinition;

/// Payload format of `data_source`.
pub const DATA_TYPE_JSON: &str = "JSON";

/// Kind of `template_source`: a query the service runs to fetch the template.
pub const TEMPLATE_TYPE_SQL: &str = "SQL";

/// Caller identity presented to the render service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderCredentials {
    pub app_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Request body sent to the render service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Always [`DATA_TYPE_JSON`].
    pub data_type: String,
    /// Composite JSON document text.
    pub data_source: String,
    /// Always [`TEMPLATE_TYPE_SQL`].
    pub template_type: String,
    /// Template lookup query text.
    pub template_source: String,
    pub output_type: String,
    pub output_filename: String,
    pub app_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl RenderRequest {
    /// Build the request for one report run.
    pub fn for_report(
        data_source: impl Into<String>,
        template: &TemplateDefinition,
        output_filename: impl Into<String>,
        credentials: &RenderCredentials,
    ) -> Self {
        Self {
            data_type: DATA_TYPE_JSON.to_string(),
            data_source: data_source.into(),
            template_type: TEMPLATE_TYPE_SQL.to_string(),
            template_source: template.template_query_text.clone(),
            output_type: template.output_type.clone(),
            output_filename: output_filename.into(),
            app_id: credentials.app_id,
            api_key: credentials.api_key.clone(),
        }
    }
}

/// Error body returned by the render service on failure.
///
/// Every field is optional; services differ in what they report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
