//! Domain types shared by the binder, rewriter, and aggregator.

pub mod column;
pub mod datasource;
pub mod parameter;

pub use column::ColumnDescriptor;
pub use datasource::{DataSource, DataSourceId, ReportDefinition, TemplateDefinition, TemplateId};
pub use parameter::{
    render_literal, ParameterError, ParameterList, ParameterResult, ParameterValue, RawParameter,
};
