//! Render-service error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a document.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The service answered with a non-success status.
    #[error("render service error: {message} (status: {status}{})", code_suffix(.code))]
    Service {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("render request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No response within the configured limit.
    #[error("render request timed out after {0:?}")]
    Timeout(Duration),

    /// The service is not usable with the current configuration.
    #[error("render service misconfigured: {0}")]
    Config(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref()
        .map(|code| format!(", code: {}", code))
        .unwrap_or_default()
}

impl RenderError {
    pub fn service(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code,
            message: message.into(),
        }
    }
}
