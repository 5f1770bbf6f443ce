//! Error types shared by the library.
//!
//! Binaries wrap these in `anyhow` at the edges; library code returns them
//! directly so callers can tell an absent config from a broken one.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading, writing or validating the JSON documents on disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error accessing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Cannot serialize configuration data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("Unsupported target version: {0}")]
    UnsupportedVersion(String),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the underlying failure was a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

/// Bad user input to a slash command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("Too many arguments")]
    TooManyArguments,

    #[error("Invalid Slack webhook URL format")]
    InvalidWebhookUrl,
}

/// Reasons a hook invocation ends with a non-zero exit.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Invalid JSON input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid hook event: {0}")]
    WrongEvent(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to send webhook: {0}")]
    Network(String),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
