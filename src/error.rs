// Error types
//
// Configuration and theme resolution errors are fatal and abort engine
// creation. Per-file remote errors never show up here: they are
// reported as `ops::Outcome::Failed` and the sync carries on.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Invalid or incomplete settings, detected before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing API key: set `api_key` in the config file, THEMESYNC_API_KEY or --api-key")]
    MissingApiKey,

    #[error("Missing password: set `password` in the config file, THEMESYNC_PASSWORD or --password")]
    MissingPassword,

    #[error("Missing host: set `host` in the config file, THEMESYNC_HOST or --host")]
    MissingHost,

    /// Theme id that is neither numeric nor the interactive keyword
    #[error("Invalid theme id '{0}': expected a numeric id or 'ttyl'")]
    InvalidThemeId(String),
}

/// Failures while binding the engine to a remote theme
#[derive(Error, Debug, Clone)]
pub enum ThemeError {
    #[error("Could not list themes: {0}")]
    ListFailed(ApiError),

    #[error("Theme list response did not contain any themes collection")]
    MissingThemes,

    #[error("Invalid theme id {0}: no such theme in the shop")]
    NotFound(u64),

    #[error("Theme selection failed: {0}")]
    Selection(String),
}

/// Errors surfaced by the reconciliation engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to resolve base path '{path}': {source}")]
    BasePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Event content delivered as an open stream instead of bytes
    #[error("Streaming not supported: {path}")]
    StreamingNotSupported { path: PathBuf },

    /// Deploy without a theme id or the legacy store: nothing would be written
    #[error("No theme id configured and legacy assets disabled: a deploy would upload nothing")]
    NothingToDeploy,
}
