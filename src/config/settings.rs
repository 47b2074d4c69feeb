//! TOML-based configuration for sqljson.
//!
//! Supports a config file (sqljson.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [engine]
//! dialect = "oracle"
//! filename_marker = "report"
//!
//! [catalog]
//! path = "./catalog.db"
//! timeout_ms = 5000
//!
//! [introspection]
//! mode = "live"            # live | parsed
//! database = "./data.db"
//! timeout_ms = 5000
//!
//! [render]
//! endpoint = "${RENDER_ENDPOINT}"
//! app_id = 1
//! api_key = "${RENDER_API_KEY}"
//! timeout_secs = 60
//!
//! [logging]
//! level = "info"
//! format = "compact"       # compact | json
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::DEFAULT_FILENAME_MARKER;
use crate::render::RenderCredentials;
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub catalog: CatalogSettings,
    pub introspection: IntrospectionSettings,
    pub render: RenderSettings,
    pub logging: LoggingSettings,
}

/// SQL generation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Target engine for generated SQL.
    pub dialect: Dialect,

    /// Value of the `filename` field in composite documents.
    pub filename_marker: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            filename_marker: DEFAULT_FILENAME_MARKER.to_string(),
        }
    }
}

/// Catalog database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path to the SQLite catalog (supports ${ENV_VAR} expansion).
    pub path: String,

    /// Busy timeout for catalog lookups, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: "./catalog.db".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl CatalogSettings {
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.path).map(PathBuf::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How queries are described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntrospectionMode {
    /// Prepare the query on a live database.
    #[default]
    Live,
    /// Derive columns from the query text alone.
    Parsed,
}

/// Introspection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntrospectionSettings {
    pub mode: IntrospectionMode,

    /// Database to prepare queries against in `live` mode.
    pub database: Option<String>,

    /// Busy timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for IntrospectionSettings {
    fn default() -> Self {
        Self {
            mode: IntrospectionMode::Live,
            database: None,
            timeout_ms: 5000,
        }
    }
}

impl IntrospectionSettings {
    /// The live database path, expanded.
    pub fn resolved_database(&self) -> Result<PathBuf, SettingsError> {
        let database = self.database.as_deref().ok_or_else(|| {
            SettingsError::InvalidConfig(
                "introspection.database is required in live mode".to_string(),
            )
        })?;
        expand_env_vars(database).map(PathBuf::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Render service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Service URL (supports ${ENV_VAR} expansion).
    pub endpoint: Option<String>,

    /// Application id presented to the service.
    pub app_id: i64,

    /// Optional API key (supports ${ENV_VAR} expansion).
    pub api_key: Option<String>,

    /// Upper bound on one render round-trip, in seconds.
    pub timeout_secs: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            app_id: 0,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl RenderSettings {
    pub fn resolved_endpoint(&self) -> Result<String, SettingsError> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            SettingsError::InvalidConfig("render.endpoint is not set".to_string())
        })?;
        expand_env_vars(endpoint)
    }

    /// Caller identity with the API key expanded.
    pub fn credentials(&self) -> Result<RenderCredentials, SettingsError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(expand_env_vars)
            .transpose()?
            .filter(|key| !key.is_empty());

        Ok(RenderCredentials {
            app_id: self.app_id,
            api_key,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter level (`RUST_LOG` wins when set).
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SQLJSON_CONFIG`
    /// 2. `./sqljson.toml`
    /// 3. `~/.config/sqljson/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SQLJSON_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sqljson.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sqljson").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
