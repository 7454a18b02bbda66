//! Error type definitions for Theta Bot
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps soft, per-item failures
//! apart from the ones that abort a scrape cycle.

use thiserror::Error;

/// Top-level application error type
///
/// Anything that reaches this type aborts the current cycle; the scheduler
/// logs it and tries again on the next tick.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Chat surface errors
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Stored values that cannot be decoded back into their model
    #[error("Decode failed: {field} - {message}")]
    DecodeFailed { field: String, message: String },
}

/// Source handling specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Transport-level failures (DNS, refused connections, TLS)
    #[error("Connection failed: {url} - {message}")]
    Connection { url: String, message: String },

    /// Non-success HTTP responses from a document host
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },
}

/// Zero-shot classification API errors
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The hosted model is cold and still loading (HTTP 503)
    #[error("Model is loading")]
    ModelLoading,

    /// The API asked us to slow down (HTTP 429)
    #[error("Rate limited - retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Any other non-success status
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Transport-level failures
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not match any known shape
    #[error("Unexpected response: {message}")]
    Decode { message: String },
}

/// Chat surface errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// Credentials were rejected (HTTP 401/403)
    #[error("Chat authentication failed: {status}")]
    Unauthorized { status: u16 },

    /// The chat surface is throttling us (HTTP 429)
    #[error("Chat rate limited - retry after {retry_after_ms} ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-success status
    #[error("Chat HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Transport-level failures
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl AppError {
    /// Whether this error means the chat surface refused our credentials
    pub fn is_chat_auth_failure(&self) -> bool {
        matches!(self, AppError::Chat(ChatError::Unauthorized { .. }))
    }
}

impl RepositoryError {
    /// Create a decode failed error
    pub fn decode_failed<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::DecodeFailed {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Classify a `reqwest` failure for the document at `url`
    pub fn from_request(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(url)
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            Self::Connection {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
