use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the puml-gen library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The diagram source file does not exist.
    #[error("Diagram source '{path}' not found. Pass the path to a .puml file or create the default one.")]
    MissingInput {
        /// Path that was checked
        path: PathBuf,
    },

    /// The requested output format is not supported.
    #[error("Unsupported output format '{format}'. Supported formats: {supported}")]
    UnsupportedFormat {
        /// The rejected format tag
        format: String,
        /// Comma-separated list of supported tags
        supported: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// A single HTTP attempt failed (timeout, connection error, non-2xx status).
    #[error("Request to '{url}' failed: {message}")]
    Transport {
        /// The URL that was requested
        url: String,
        /// Error message
        message: String,
    },

    /// The response body does not match the expected format signature.
    #[error("Response from '{url}' is not valid {format}: got {preview}")]
    InvalidResponse {
        /// The URL that was requested
        url: String,
        /// The format whose signature check failed
        format: String,
        /// Hex+ASCII preview of the first response bytes
        preview: String,
    },

    /// Every encoding method × mirror combination failed for a format.
    #[error("All {count} attempts to render '{format}' failed")]
    AllAttemptsFailed {
        /// The format that could not be rendered
        format: String,
        /// Number of attempts made
        count: usize,
        /// The per-attempt errors, in the order they were tried
        attempts: Vec<Error>,
    },

    /// An encoded token could not be decoded back to diagram bytes.
    #[error("Invalid encoded token: {message}")]
    InvalidToken {
        /// Error message
        message: String,
    },

    /// The process was interrupted by the user.
    #[error("Interrupted")]
    Interrupted,

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::Interrupted {
            return Self::Interrupted;
        }
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a missing input error.
    #[must_use]
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid token error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a transport error for a failed HTTP attempt.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    #[must_use]
    pub fn invalid_response(
        url: impl Into<String>,
        format: impl Into<String>,
        preview: impl Into<String>,
    ) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            format: format.into(),
            preview: preview.into(),
        }
    }

    /// Combines the per-attempt errors of an exhausted strategy list.
    #[must_use]
    pub fn all_attempts_failed(format: impl Into<String>, attempts: Vec<Self>) -> Self {
        let count = attempts.len();
        Self::AllAttemptsFailed {
            format: format.into(),
            count,
            attempts,
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Returns true if another strategy may still succeed after this error.
    ///
    /// Transport failures and signature mismatches are recoverable by moving
    /// on to the next mirror or encoding method; everything else is fatal.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::InvalidResponse { .. })
    }
}

// Conversion implementations for convenient error handling
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
