//! REST client for the LevelUp backend.
//!
//! Covers the three endpoint groups the storefront consumes:
//!
//! - auth: register and login (`/api/auth/*`)
//! - catalog: product list and detail (`/api/productos`)
//! - users: admin CRUD plus the points adjustment endpoint (`/api/usuarios`)
//!
//! Requests carry `Authorization: Bearer <token>` when the client was built
//! with a token. Nothing is retried; errors go back to the caller, which is
//! expected to show them to the user.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{LoginRequest, UserDraft};

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected schema.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configured base URL cannot carry a path.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Login rejected (unknown email or wrong password).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration rejected because the email is already in use.
    #[error("an account with email {0} already exists")]
    EmailTaken(String),

    /// Missing or rejected bearer token.
    #[error("not authenticated")]
    Unauthorized,

    /// Token is valid but lacks the required role.
    #[error("not allowed: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend rejected the input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or backend message.
        message: String,
    },
}

impl ApiError {
    /// HTTP status associated with this error, if it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::EmailTaken(_) => Some(409),
            Self::BadRequest(_) => Some(400),
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidBaseUrl(_) | Self::InvalidCredentials => None,
        }
    }
}
