//! Subcommand implementations.
//!
//! Every command runs against one [`Context`]: the API client plus the
//! session/cart store opened over the configured storage file, so the cart
//! and login survive between invocations.

#![allow(clippy::print_stdout)]

pub mod auth;
pub mod cart;
pub mod products;
pub mod users;

use levelup_client::{ApiClient, ClientConfig, Error, FileStorage, SessionCartStore};
use levelup_core::{Cart, UserRecord};

/// Shared state for a single CLI invocation.
pub struct Context {
    api: ApiClient,
    store: SessionCartStore<FileStorage>,
}

impl Context {
    /// Open storage and build the API client.
    pub fn open(config: &ClientConfig) -> levelup_client::Result<Self> {
        let api = ApiClient::new(config)?;
        let store = SessionCartStore::initialize(FileStorage::new(&config.storage_path));
        tracing::debug!(path = %config.storage_path.display(), "Opened local storage");
        Ok(Self { api, store })
    }

    /// Client carrying the session token, if any.
    fn api(&self) -> ApiClient {
        self.api.for_session(self.store.session())
    }

    /// Token of the logged-in user.
    fn token(&self) -> levelup_client::Result<String> {
        self.store
            .session()
            .token()
            .map(str::to_owned)
            .ok_or(Error::NotLoggedIn)
    }
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart {
        println!(
            "{:<10} {:<40} {:>3} x {:>10} = {:>10}",
            line.code,
            line.name,
            line.quantity,
            line.price.to_string(),
            line.line_total().to_string()
        );
    }
    println!(
        "{} item(s), subtotal {}",
        cart.item_count(),
        cart.subtotal()
    );
}

fn print_user(user: &UserRecord) {
    println!("{} <{}>", full_name(user), user.email);
    println!("  role:          {}", user.role);
    println!("  level:         {}", user.level);
    println!("  points:        {}", user.points);
    if let Some(code) = &user.referral_code {
        println!("  referral code: {code}");
    }
}

fn full_name(user: &UserRecord) -> String {
    match (&user.first_name, &user.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        _ => user.display_name().to_owned(),
    }
}
