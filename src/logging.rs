//! Logging setup, powered by tracing-subscriber.
//!
//! Library code only emits `tracing` events; the binary installs a
//! subscriber here. Output goes to stderr so generated SQL on stdout stays
//! pipeable.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, LoggingSettings};

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid tracing filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

/// Build the filter from the configured level plus overrides for noisy
/// dependencies. `RUST_LOG` replaces all of it when set.
pub fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut directives = vec![level.to_string()];

    let noisy: &[(&str, &str)] = &[
        ("sqlparser", "warn"),
        ("reqwest", "warn"),
        ("hyper", "warn"),
        ("hyper_util", "warn"),
        ("rustls", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter = directives.join(",");
    EnvFilter::try_new(&filter).map_err(|e| LoggingError::InvalidFilter {
        filter,
        message: e.to_string(),
    })
}

/// Install the global subscriber.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = build_env_filter(&settings.level)?;

    let layer = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
