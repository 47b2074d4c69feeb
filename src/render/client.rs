//! HTTP client for the render service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::error::{RenderError, RenderResult};
use super::protocol::{RenderRequest, ServiceErrorBody};
use super::RenderService;

/// Render service reached over HTTP.
///
/// The request is POSTed as JSON to the configured endpoint; a success
/// status returns the document bytes, anything else becomes
/// [`RenderError::Service`] with the status and error body passed through.
pub struct HttpRenderService {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRenderService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> RenderResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(RenderError::Config("render endpoint is not set".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a service error from a non-success response.
    pub fn error_from_response(status: u16, body: &[u8]) -> RenderError {
        match serde_json::from_slice::<ServiceErrorBody>(body) {
            Ok(ServiceErrorBody {
                code,
                message: Some(message),
            }) => RenderError::service(status, code, message),
            Ok(ServiceErrorBody { code, message: None }) => {
                RenderError::service(status, code, "no error message")
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                let message = if text.is_empty() {
                    "no error message".to_string()
                } else {
                    text
                };
                RenderError::service(status, None, message)
            }
        }
    }
}

#[async_trait]
impl RenderService for HttpRenderService {
    async fn render(&self, request: &RenderRequest) -> RenderResult<Vec<u8>> {
        debug!(
            endpoint = %self.endpoint,
            output = %request.output_filename,
            "sending render request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| self.classify(err))?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            warn!(status = status.as_u16(), "render service rejected request");
            Err(Self::error_from_response(status.as_u16(), &body))
        }
    }
}

impl HttpRenderService {
    fn classify(&self, err: reqwest::Error) -> RenderError {
        if err.is_timeout() {
            RenderError::Timeout(self.timeout)
        } else {
            RenderError::Http(err)
        }
    }
}
