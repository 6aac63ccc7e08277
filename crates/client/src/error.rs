//! Unified error type for callers that drive the whole client.
//!
//! Each module keeps its own error enum; `Error` wraps them so a front end
//! (the CLI, a UI shell) can return a single `Result<T>` from its handlers.

use thiserror::Error;

use levelup_core::{EmailError, InvalidLoginPayload, ProductCodeError};

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout step failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Login response lacked a token or user.
    #[error(transparent)]
    Login(#[from] InvalidLoginPayload),

    /// Malformed email input.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// Malformed product code input.
    #[error("Invalid product code: {0}")]
    ProductCode(#[from] ProductCodeError),

    /// The operation requires a logged-in user.
    #[error("Not logged in")]
    NotLoggedIn,
}

/// Result alias for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
