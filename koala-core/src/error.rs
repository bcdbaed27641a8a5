//! Error types for koala-core
//!
//! Tracking itself is infallible. These errors come from loading
//! configuration, setting up logging, and the HTTP client.

use thiserror::Error;

/// Main error type for the koala-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Koala endpoint error
    #[error("client error: {0}")]
    Client(String),
}

/// Result type alias for koala-core
pub type Result<T> = std::result::Result<T, Error>;
