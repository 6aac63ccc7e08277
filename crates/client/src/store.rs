//! Session and cart state container.
//!
//! [`SessionCartStore`] is the single authority for the cart contents and
//! the authentication session of one client. It is constructed explicitly
//! over an injected [`KeyValueStorage`] and handed to whatever needs it;
//! there is no global instance.
//!
//! Every mutation is synchronous: it updates memory, writes the affected
//! entries through to storage, and then notifies subscribers before
//! returning. Storage read problems never surface to callers - malformed
//! entries are logged and treated as absent. Storage write problems are
//! logged and the in-memory state stays authoritative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use levelup_core::{AuthPayload, Cart, InvalidLoginPayload, Product, ProductCode, Session};

use crate::storage::{KeyValueStorage, StorageError, keys};

/// What changed in the store.
///
/// Observers are expected to re-read whatever they display; the event only
/// narrows down which part of the store to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// Cart contents changed.
    CartChanged,
    /// The session was established, refreshed, or cleared.
    SessionChanged,
    /// State was re-read from storage after an outside write.
    Reloaded,
}

type Listener = Arc<dyn Fn(StoreEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by [`SessionCartStore::subscribe`].
///
/// The listener stays registered for as long as the handle is alive.
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) removes it.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Holds the cart and the session, persists both, and notifies observers.
pub struct SessionCartStore<S> {
    storage: S,
    cart: Cart,
    session: Session,
    listeners: Arc<Mutex<Listeners>>,
}

impl<S: KeyValueStorage> SessionCartStore<S> {
    /// Build the store from whatever `storage` holds.
    ///
    /// Missing entries yield an empty cart and an unauthenticated session.
    /// Malformed entries are logged and treated as missing.
    pub fn initialize(storage: S) -> Self {
        let cart = read_cart(&storage);
        let session = read_session(&storage);

        tracing::debug!(
            lines = cart.len(),
            authenticated = session.is_authenticated(),
            "Session/cart store initialized"
        );

        Self {
            storage,
            cart,
            session,
            listeners: Arc::default(),
        }
    }

    /// Current cart contents.
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Current session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Whether a token is held.
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// The injected storage backend.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of `product` to the cart.
    pub fn add_to_cart(&mut self, product: &Product) -> &Cart {
        self.cart.add(product);
        tracing::debug!(code = %product.code, items = self.cart.item_count(), "Added to cart");
        self.persist_cart();
        self.notify(StoreEvent::CartChanged);
        &self.cart
    }

    /// Remove `quantity` units of `code`, deleting the line when it runs out.
    ///
    /// Unknown codes leave the cart (and storage) untouched.
    pub fn remove_from_cart(&mut self, code: &ProductCode, quantity: u32) -> &Cart {
        if self.cart.remove(code, quantity) {
            tracing::debug!(%code, quantity, items = self.cart.item_count(), "Removed from cart");
            self.persist_cart();
            self.notify(StoreEvent::CartChanged);
        }
        &self.cart
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) -> &Cart {
        let changed = self.cart.clear();
        self.persist_cart();
        if changed {
            tracing::debug!("Cart cleared");
            self.notify(StoreEvent::CartChanged);
        }
        &self.cart
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Establish (or refresh) the session from a login response.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLoginPayload`] if the token or the user record is
    /// missing. Nothing is changed or persisted in that case.
    pub fn login(&mut self, payload: AuthPayload) -> Result<(), InvalidLoginPayload> {
        if let Err(e) = self.session.authenticate(payload) {
            tracing::warn!(
                has_token = e.has_token,
                has_user = e.has_user,
                "Rejected login: payload is incomplete"
            );
            return Err(e);
        }

        if let Some(user) = self.session.user() {
            write_json(&self.storage, keys::USER, user);
            tracing::info!(email = %user.email, role = %user.role, "User logged in");
        }
        if let Some(token) = self.session.token() {
            write_raw(&self.storage, keys::TOKEN, token);
        }

        self.notify(StoreEvent::SessionChanged);
        Ok(())
    }

    /// Drop the session and its persisted entries. The cart is kept.
    pub fn logout(&mut self) {
        let changed = self.session.clear();
        remove_key(&self.storage, keys::USER);
        remove_key(&self.storage, keys::TOKEN);
        if changed {
            tracing::info!("User logged out");
            self.notify(StoreEvent::SessionChanged);
        }
    }

    // =========================================================================
    // Synchronization
    // =========================================================================

    /// Re-read cart and session from storage.
    ///
    /// Used when another process sharing the storage may have written to it.
    /// Storage wins: whatever it holds replaces the in-memory state.
    /// Subscribers get [`StoreEvent::Reloaded`] if anything changed.
    pub fn reload(&mut self) -> bool {
        let cart = read_cart(&self.storage);
        let session = read_session(&self.storage);
        let changed = cart != self.cart || session != self.session;

        self.cart = cart;
        self.session = session;

        if changed {
            tracing::debug!("Store reloaded from storage");
            self.notify(StoreEvent::Reloaded);
        }
        changed
    }

    /// Register `listener` to be called synchronously after every change.
    ///
    /// Listeners run on the mutating thread, after storage has been written,
    /// in registration order. They must not call back into the store.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(StoreEvent) + Send + Sync + 'static,
    {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    fn notify(&self, event: StoreEvent) {
        // Snapshot so a listener dropping its own Subscription cannot deadlock.
        let snapshot: Vec<Listener> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn persist_cart(&self) {
        write_json(&self.storage, keys::CART, &self.cart);
    }
}

impl<S> std::fmt::Debug for SessionCartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCartStore")
            .field("cart", &self.cart)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Storage helpers
// =============================================================================

fn read_cart(storage: &impl KeyValueStorage) -> Cart {
    read_json(storage, keys::CART).unwrap_or_default()
}

fn read_session(storage: &impl KeyValueStorage) -> Session {
    let user = read_json(storage, keys::USER);
    let token = read_raw(storage, keys::TOKEN);
    Session::restore(user, token)
}

fn read_raw(storage: &impl KeyValueStorage, key: &'static str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read from storage, treating as absent");
            None
        }
    }
}

fn read_json<T: DeserializeOwned>(storage: &impl KeyValueStorage, key: &'static str) -> Option<T> {
    let raw = read_raw(storage, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(source) => {
            let e = StorageError::Parse { key, source };
            tracing::warn!(error = %e, "Discarding malformed stored value");
            None
        }
    }
}

fn write_raw(storage: &impl KeyValueStorage, key: &'static str, value: &str) {
    if let Err(e) = storage.set(key, value) {
        tracing::error!(key, error = %e, "Failed to persist to storage");
    }
}

fn write_json<T: Serialize + ?Sized>(storage: &impl KeyValueStorage, key: &'static str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => write_raw(storage, key, &json),
        Err(e) => tracing::error!(key, error = %e, "Failed to encode value for storage"),
    }
}

fn remove_key(storage: &impl KeyValueStorage, key: &'static str) {
    if let Err(e) = storage.remove(key) {
        tracing::error!(key, error = %e, "Failed to remove from storage");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use levelup_core::{Email, Price, SessionState, UserRecord};

    use super::*;
    use crate::storage::MemoryStorage;

    fn product(code: &str, price: i64) -> Product {
        Product {
            code: ProductCode::parse(code).unwrap(),
            name: format!("Product {code}"),
            price: Price::from_pesos(price),
            image: Some(format!("/img/{code}.png")),
            description: None,
            rating: 4.0,
            reviews: 12,
        }
    }

    fn code(s: &str) -> ProductCode {
        ProductCode::parse(s).unwrap()
    }

    fn user(points: u32) -> UserRecord {
        let mut user = UserRecord::new(Email::parse("x@x.com").unwrap());
        user.points = points;
        user
    }

    fn store() -> (Arc<MemoryStorage>, SessionCartStore<Arc<MemoryStorage>>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionCartStore::initialize(Arc::clone(&storage));
        (storage, store)
    }

    fn counter<S: KeyValueStorage>(
        store: &SessionCartStore<S>,
        wanted: StoreEvent,
    ) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sub = store.subscribe(move |event| {
            if event == wanted {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        (count, sub)
    }

    #[test]
    fn test_initialize_from_empty_storage() {
        let (_, store) = store();
        assert!(store.cart().is_empty());
        assert_eq!(store.session().state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_initialize_fails_open_on_malformed_entries() {
        let storage = MemoryStorage::with_entries([
            (keys::CART, "{oops"),
            (keys::USER, "[1,2,3]"),
            (keys::TOKEN, ""),
        ]);
        let store = SessionCartStore::initialize(storage);
        assert!(store.cart().is_empty());
        assert!(!store.is_authenticated());
        assert!(store.session().user().is_none());
    }

    #[test]
    fn test_cart_walkthrough_persists_each_step() {
        let (storage, mut store) = store();
        let a = product("A", 1000);

        store.add_to_cart(&a);
        store.add_to_cart(&a);
        assert_eq!(store.cart().line(&code("A")).unwrap().quantity, 2);

        store.remove_from_cart(&code("A"), 1);
        let persisted: Cart = serde_json::from_str(&storage.get(keys::CART).unwrap().unwrap()).unwrap();
        assert_eq!(&persisted, store.cart());
        assert_eq!(persisted.line(&code("A")).unwrap().quantity, 1);

        store.remove_from_cart(&code("A"), 1);
        assert!(store.cart().is_empty());
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_remove_unknown_code_does_not_persist_or_notify() {
        let (storage, mut store) = store();
        let (count, _sub) = counter(&store, StoreEvent::CartChanged);

        store.remove_from_cart(&code("Z"), 1);
        assert!(!storage.contains_key(keys::CART));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_cart_twice_matches_once() {
        let (storage, mut store) = store();
        store.add_to_cart(&product("A", 1000));

        store.clear_cart();
        let once = (store.cart().clone(), storage.get(keys::CART).unwrap());
        store.clear_cart();
        let twice = (store.cart().clone(), storage.get(keys::CART).unwrap());
        assert_eq!(once, twice);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn test_login_then_logout() {
        let (storage, mut store) = store();
        store.add_to_cart(&product("A", 1000));

        store.login(AuthPayload::new("t1", user(0))).unwrap();
        assert_eq!(store.session().state(), SessionState::Authenticated);
        assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("t1"));
        assert!(storage.contains_key(keys::USER));

        store.logout();
        assert_eq!(store.session().state(), SessionState::Unauthenticated);
        assert!(!storage.contains_key(keys::USER));
        assert!(!storage.contains_key(keys::TOKEN));
        // cart survives logout
        assert_eq!(store.cart().item_count(), 1);
    }

    #[test]
    fn test_incomplete_login_changes_nothing() {
        let (storage, mut store) = store();
        let (count, _sub) = counter(&store, StoreEvent::SessionChanged);

        let err = store.login(AuthPayload::default()).unwrap_err();
        assert!(!err.has_token && !err.has_user);
        assert!(!store.is_authenticated());
        assert!(storage.is_empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_relogin_refreshes_user() {
        let (storage, mut store) = store();
        store.login(AuthPayload::new("t1", user(0))).unwrap();
        store.login(AuthPayload::new("t1", user(750))).unwrap();

        assert_eq!(store.session().user().unwrap().points, 750);
        let persisted: UserRecord =
            serde_json::from_str(&storage.get(keys::USER).unwrap().unwrap()).unwrap();
        assert_eq!(persisted.points, 750);
    }

    #[test]
    fn test_round_trip_through_storage() {
        let (storage, mut store) = store();
        store.add_to_cart(&product("A", 1000));
        store.add_to_cart(&product("B", 2500));
        store.add_to_cart(&product("A", 1000));
        store.login(AuthPayload::new("t1", user(40))).unwrap();

        let reopened = SessionCartStore::initialize(Arc::clone(&storage));
        assert_eq!(reopened.cart(), store.cart());
        assert_eq!(reopened.session(), store.session());
        assert_eq!(
            serde_json::to_string(reopened.cart()).unwrap(),
            serde_json::to_string(store.cart()).unwrap()
        );
        assert_eq!(
            serde_json::to_string(reopened.session().user().unwrap()).unwrap(),
            serde_json::to_string(store.session().user().unwrap()).unwrap()
        );
    }

    #[test]
    fn test_subscribers_see_every_change_until_dropped() {
        let (_, mut store) = store();
        let (carts, cart_sub) = counter(&store, StoreEvent::CartChanged);
        let (sessions, _session_sub) = counter(&store, StoreEvent::SessionChanged);
        assert_eq!(store.subscriber_count(), 2);

        store.add_to_cart(&product("A", 1));
        store.clear_cart();
        store.clear_cart();
        store.login(AuthPayload::new("t1", user(0))).unwrap();
        store.logout();
        store.logout();
        assert_eq!(carts.load(Ordering::SeqCst), 2);
        assert_eq!(sessions.load(Ordering::SeqCst), 2);

        cart_sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 1);
        store.add_to_cart(&product("A", 1));
        assert_eq!(carts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reload_adopts_outside_writes() {
        let (storage, mut store) = store();
        let (reloads, _sub) = counter(&store, StoreEvent::Reloaded);

        // Another client sharing the storage logs in and fills a cart.
        let mut other = SessionCartStore::initialize(Arc::clone(&storage));
        other.add_to_cart(&product("B", 500));
        other.login(AuthPayload::new("t2", user(5))).unwrap();

        assert!(store.reload());
        assert_eq!(store.session().token(), Some("t2"));
        assert_eq!(store.cart().item_count(), 1);
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        assert!(!store.reload());
        assert_eq!(reloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_token_without_user_counts_as_authenticated() {
        let storage = MemoryStorage::with_entries([(keys::TOKEN, "t1"), (keys::USER, "garbage")]);
        let store = SessionCartStore::initialize(storage);
        assert!(store.is_authenticated());
        assert!(store.session().user().is_none());
    }
}
