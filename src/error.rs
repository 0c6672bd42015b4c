// src/error.rs

//! Unified error handling for the harvester.
//!
//! Two layers of errors exist:
//! - [`AppError`]: fatal errors that abort a job (missing credential, missing
//!   input file, I/O, configuration).
//! - [`FetchError`]: per-unit failures (one query, one page). These are caught
//!   at the unit boundary, logged and counted; the batch continues.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential file absent, unreadable or empty
    #[error("Missing credential: {} ({reason})", .path.display())]
    MissingCredential { path: PathBuf, reason: String },

    /// Input table does not exist
    #[error("Missing input file: {}", .0.display())]
    MissingInputFile(PathBuf),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Some units could not be harvested and the job was configured to fail on that
    #[error("Incomplete harvest for {job}: {missing} of {total} units missing")]
    IncompleteHarvest {
        job: String,
        missing: usize,
        total: usize,
    },
}

impl AppError {
    /// Create a missing credential error.
    pub fn missing_credential(path: impl AsRef<Path>, reason: impl fmt::Display) -> Self {
        Self::MissingCredential {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Failure of a single fetch unit (one query attempt or one page).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection failure, timeout or body read failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status (after transport retries, if any)
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Body was not valid JSON/HTML or did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Well-formed error status reported by the remote service
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
}

impl FetchError {
    /// Create a malformed response error.
    pub fn malformed(message: impl fmt::Display) -> Self {
        Self::MalformedResponse(message.to_string())
    }

    /// Create an API error from a remote status code and message.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Diagnostic category of this failure.
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network(_) | Self::Status(_) => FetchErrorKind::Network,
            Self::MalformedResponse(_) => FetchErrorKind::MalformedResponse,
            Self::Api { .. } => FetchErrorKind::Api,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        // Request URLs may carry API keys.
        let error = error.without_url();
        match error.status() {
            Some(status) => Self::Status(status.as_u16()),
            None if error.is_decode() => Self::MalformedResponse(error.to_string()),
            None => Self::Network(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedResponse(error.to_string())
    }
}

/// Category used when counting failures in harvest statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FetchErrorKind {
    Network,
    MalformedResponse,
    Api,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::MalformedResponse => "malformed_response",
            Self::Api => "api_error",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        assert_eq!(FetchError::Status(503).kind(), FetchErrorKind::Network);
        assert_eq!(
            FetchError::Network("reset".into()).kind(),
            FetchErrorKind::Network
        );
        assert_eq!(
            FetchError::malformed("eof").kind(),
            FetchErrorKind::MalformedResponse
        );
        assert_eq!(
            FetchError::api("INVALID_KEY", "bad key").kind(),
            FetchErrorKind::Api
        );
    }

    #[test]
    fn test_serde_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(matches!(
            FetchError::from(err),
            FetchError::MalformedResponse(_)
        ));
    }

    #[test]
    fn test_missing_credential_message() {
        let err = AppError::missing_credential("key.txt", "file is empty");
        assert_eq!(
            err.to_string(),
            "Missing credential: key.txt (file is empty)"
        );
    }
}
