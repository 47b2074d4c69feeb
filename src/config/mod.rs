//! Configuration module for sqljson.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CatalogSettings, EngineSettings, IntrospectionMode, IntrospectionSettings,
    LogFormat, LoggingSettings, RenderSettings, Settings, SettingsError,
};
