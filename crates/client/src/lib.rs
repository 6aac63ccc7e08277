//! LevelUp storefront client.
//!
//! This crate holds everything a storefront front end needs besides its
//! views: the session/cart store with durable storage, the REST client for
//! the backend, and the checkout flow that ties the two together through
//! loyalty points.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use levelup_client::{ApiClient, ClientConfig, FileStorage, SessionCartStore};
//!
//! # async fn run() -> levelup_client::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//! let mut store = SessionCartStore::initialize(Arc::new(FileStorage::new(&config.storage_path)));
//!
//! let _sub = store.subscribe(|event| tracing::debug!(?event, "store changed"));
//! for product in api.list_products().await?.iter().take(1) {
//!     store.add_to_cart(product);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;

pub use api::{ApiClient, ApiError, UserDraft};
pub use checkout::{Checkout, CheckoutError, PointsOutcome, Quote, Receipt};
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, Result};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};
pub use store::{SessionCartStore, StoreEvent, Subscription};
