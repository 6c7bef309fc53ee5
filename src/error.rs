// src/error.rs

//! Unified error handling for the exposure monitor.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search results for a keyword could not be fetched
    #[error("Fetch failed for '{keyword}': {message}")]
    Fetch { keyword: String, message: String },

    /// The record store cannot be read or written
    #[error("Persistence unavailable ({context}): {message}")]
    Persistence { context: String, message: String },
}

impl AppError {
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

    /// Create a fetch error for a keyword.
    pub fn fetch(keyword: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            keyword: keyword.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error with context.
    pub fn persistence(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// Fetch failures only degrade one keyword; everything touching the
    /// record store or the configuration stops the batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Fetch { .. } | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_are_recoverable() {
        assert!(!AppError::fetch("kw", "timeout").is_fatal());
    }

    #[test]
    fn persistence_errors_are_fatal() {
        let err = AppError::persistence("records.json", "permission denied");
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Persistence unavailable (records.json): permission denied"
        );
    }
}
