//! Centralized error handling for Theta Bot
//!
//! Errors are grouped by the layer that raises them. Soft failures (a source
//! that cannot be fetched, a classification call that fails) are converted to
//! empty or absent values at their own boundary and never reach the cycle;
//! the types here carry what is left: storage and chat failures that abort a
//! cycle, plus the detail logged for the soft ones.
//!
//! # Usage
//!
//! ```rust
//! use thetabot::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Classifier Results
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Convenience type alias for Chat Results
pub type ChatResult<T> = Result<T, ChatError>;
