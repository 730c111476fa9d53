//! Error types for sectorwise.
//!
//! Library crates use [`SectorwiseError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! A missing Topic is *not* an error: point lookups return
//! `Option::None` for unknown sectors.

use std::path::PathBuf;

/// Top-level error type for all sectorwise operations.
#[derive(Debug, thiserror::Error)]
pub enum SectorwiseError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network or timeout failure talking to an upstream source.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream payload that is not JSON or does not match the expected schema.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SectorwiseError>;

impl SectorwiseError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-response error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SectorwiseError::config("missing api_url");
        assert_eq!(err.to_string(), "config error: missing api_url");

        let err = SectorwiseError::malformed("expected JSON array of resources");
        assert!(err.to_string().contains("expected JSON array"));

        let err = SectorwiseError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
