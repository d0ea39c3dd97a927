//! Error types
//!
//! Generation failures never leave the track adapter (it degrades to the
//! procedural road instead); they are typed here so the adapter can log
//! and branch on them explicitly.

use thiserror::Error;

/// Failure talking to the text-generation service.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Request never produced an HTTP response.
    #[error("transport error ({kind}): {message}")]
    Transport { kind: &'static str, message: String },

    /// Service answered with a non-2xx status.
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// Response body was not the expected envelope.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No service configured (offline mode or missing key).
    #[error("generation service unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Short machine-readable classification for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { kind, .. } => *kind,
            Self::Status(status) => match status {
                401 | 403 => "auth_error",
                404 => "not_found",
                429 => "rate_limit",
                500..=599 => "server_error",
                _ => "http_error",
            },
            Self::Malformed(_) => "malformed",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// Failure loading or saving a JSON settings/score file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for the binary.
#[derive(Debug, Error)]
pub enum RacerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("failed to start {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    Thread(&'static str),
}
