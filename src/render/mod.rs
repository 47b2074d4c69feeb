//! Render service contract.
//!
//! The render service turns a composite JSON document plus a template into a
//! binary document. The engine only builds the request and hands back the
//! bytes; the service itself lives elsewhere.
//!
//! ```text
//! RenderRequest ──POST (JSON)──▶ render service ──▶ document bytes
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::HttpRenderService;
pub use error::{RenderError, RenderResult};
pub use protocol::{RenderCredentials, RenderRequest};

use async_trait::async_trait;

/// Something that can render a document.
#[async_trait]
pub trait RenderService: Send + Sync {
    /// Render `request`, returning the document payload.
    async fn render(&self, request: &RenderRequest) -> RenderResult<Vec<u8>>;
}
