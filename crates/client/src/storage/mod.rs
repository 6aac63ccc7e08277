//! Durable key-value storage for the session/cart store.
//!
//! The store only needs string keys mapped to string values, with the values
//! holding JSON for structured entries. Two backends are provided:
//!
//! - [`MemoryStorage`] - process-local, for tests and throwaway sessions
//! - [`FileStorage`] - a single JSON file that survives restarts
//!
//! Any type implementing [`KeyValueStorage`] can be injected instead.

mod file;
mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage keys used by the session/cart store.
pub mod keys {
    /// JSON array of cart lines.
    pub const CART: &str = "cart";

    /// JSON user record of the logged-in user.
    pub const USER: &str = "usuario";

    /// Opaque bearer token.
    pub const TOKEN: &str = "token";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file itself is not a valid key-value document.
    #[error("storage document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A stored value did not decode into the expected shape.
    #[error("stored value for {key:?} is malformed: {source}")]
    Parse {
        /// Key whose value failed to decode.
        key: &'static str,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

/// String-valued key-value storage.
///
/// Methods take `&self`; implementations use interior mutability so that a
/// storage handle can be shared (e.g. through [`Arc`]) between the store and
/// whoever else needs to observe it.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
