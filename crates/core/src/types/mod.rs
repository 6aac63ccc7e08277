//! Core types for LevelUp.
//!
//! This module provides type-safe wrappers for the storefront's domain.

pub mod cart;
pub mod code;
pub mod email;
pub mod price;
pub mod product;
pub mod role;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use code::{ProductCode, ProductCodeError};
pub use email::{Email, EmailError};
pub use price::Price;
pub use product::Product;
pub use role::Role;
pub use session::{AuthPayload, InvalidLoginPayload, Session, SessionState};
pub use user::UserRecord;
