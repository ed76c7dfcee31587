//! Startup error handling.
//!
//! Store operations never fail on backend errors (they record a message
//! instead). The errors collected here are the ones that stop the
//! application from being assembled at all.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Durable storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// HTTP client could not be built.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// Configured token could not be seeded.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
