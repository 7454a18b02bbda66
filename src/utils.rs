//! Utility functions for Theta Bot
//!
//! - `utils::backoff` for retry delays against rate-limited APIs
//! - `utils::datetime` for timestamp storage and parsing

pub mod backoff;
pub mod datetime;

pub use backoff::BackoffPolicy;
pub use datetime::DateTimeParser;
