//! Global error handling for wixgen
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use thiserror::Error;

/// Global error type for wixgen operations
#[derive(Error, Debug)]
pub enum WixGenError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Interactive prompt errors (cancelled, no terminal, ...)
    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// Source directory missing or not a directory
    #[error("Invalid source directory: {0}")]
    InvalidSource(String),

    /// No source directory given and nothing to fall back on
    #[error("Missing settings: {0}")]
    MissingSettings(String),

    /// Settings record errors
    #[error("Settings error: {0}")]
    Settings(String),

    /// Writer errors
    #[error("Writer error: {0}")]
    Writer(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for wixgen operations
pub type Result<T> = std::result::Result<T, WixGenError>;

/// Creates a WixGenError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::WixGenError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            WixGenError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

impl WixGenError {
    /// Whether the error is an operator mistake (bad input) rather than an
    /// environment failure
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSource(_) | Self::MissingSettings(_) | Self::InvalidArgument(_)
        )
    }
}
