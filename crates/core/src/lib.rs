//! LevelUp Core - Shared domain types.
//!
//! This crate provides the types every LevelUp component agrees on:
//! - `client` - Session/cart store, durable storage, and the REST client
//! - `cli` - Command-line storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage
//! access, no HTTP clients. Cart arithmetic and session transitions live here
//! so they can be tested without any backend.
//!
//! # Modules
//!
//! - [`types`] - Emails, product codes, prices, roles, users, products,
//!   cart lines and sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
