//! Integration tests for the LevelUp client.
//!
//! The tests run the real [`ApiClient`] and [`SessionCartStore`] against
//! [`MockBackend`], an in-process axum server that speaks the backend's
//! wire format (Spanish field names, `{"mensaje": ...}` errors, bearer
//! tokens). Nothing outside the test process is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p levelup-integration-tests
//! ```
//!
//! [`SessionCartStore`]: levelup_client::SessionCartStore

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use levelup_client::ApiClient;

/// Seeded administrator account.
pub const ADMIN_EMAIL: &str = "admin@levelup.cl";
/// Password of [`ADMIN_EMAIL`].
pub const ADMIN_PASSWORD: &str = "admin123";

struct Account {
    user: Value,
    password: String,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<String, Account>,
    tokens: HashMap<String, String>,
    products: Vec<Value>,
    next_id: u64,
}

#[derive(Default)]
struct BackendState {
    inner: Mutex<Inner>,
    fail_points: AtomicBool,
    points_calls: AtomicUsize,
}

impl BackendState {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Shared = Arc<BackendState>;

/// In-process fake of the LevelUp REST backend.
///
/// Stopped when dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend with the demo catalog and one admin account.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Shared::default();
        {
            let mut inner = state.lock();
            inner.products = demo_catalog();
            insert_account(
                &mut inner,
                json!({
                    "email": ADMIN_EMAIL,
                    "nombre": "Admin",
                    "apellidos": "LevelUp",
                    "role": "ADMIN",
                    "points": 0,
                    "level": 1,
                    "myReferralCode": "ADMIN-0000"
                }),
                ADMIN_PASSWORD,
            );
        }

        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/productos", get(list_products))
            .route("/api/productos/{code}", get(get_product))
            .route("/api/usuarios", get(list_users))
            .route("/api/usuarios/me/sumar-puntos", post(adjust_points))
            .route("/api/usuarios/{email}", put(update_user).delete(delete_user))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Root URL of the backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock backend URL is valid")
    }

    /// An anonymous client pointed at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        ApiClient::with_base_url(self.base_url(), Duration::from_secs(5))
            .expect("Failed to create API client")
    }

    /// Add a customer account with the given password and balance.
    pub fn seed_user(&self, email: &str, password: &str, points: u32) {
        let mut inner = self.state.lock();
        insert_account(
            &mut inner,
            json!({
                "email": email,
                "nombre": "Test",
                "apellidos": "Customer",
                "role": "USER",
                "points": points,
                "level": 1,
                "myReferralCode": "TEST-0001"
            }),
            password,
        );
    }

    /// Stored user as the backend would return it.
    #[must_use]
    pub fn user(&self, email: &str) -> Option<Value> {
        self.state.lock().users.get(email).map(|a| a.user.clone())
    }

    /// Make the points endpoint answer 500 until turned off again.
    pub fn fail_points(&self, fail: bool) {
        self.state.fail_points.store(fail, Ordering::SeqCst);
    }

    /// Number of requests the points endpoint has received.
    #[must_use]
    pub fn points_calls(&self) -> usize {
        self.state.points_calls.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn error(status: StatusCode, mensaje: &str) -> Response {
    (status, Json(json!({ "mensaje": mensaje }))).into_response()
}

fn insert_account(inner: &mut Inner, user: Value, password: &str) {
    let email = user["email"].as_str().unwrap_or_default().to_owned();
    inner.users.insert(
        email,
        Account {
            user,
            password: password.to_owned(),
        },
    );
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Email of the caller, or the error response to send.
fn caller(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    let token = bearer(headers).ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token requerido"))?;
    state
        .lock()
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido"))
}

fn require_admin(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    let email = caller(state, headers)?;
    let inner = state.lock();
    let is_admin = inner
        .users
        .get(&email)
        .is_some_and(|a| a.user["role"] == "ADMIN");
    if is_admin {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, "Requiere rol ADMIN"))
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let text = |key: &str| body[key].as_str().map(str::to_owned).filter(|s| !s.is_empty());
    let (Some(email), Some(password), Some(nombre)) =
        (text("email"), text("password"), text("nombre"))
    else {
        return error(StatusCode::BAD_REQUEST, "Faltan datos obligatorios");
    };

    let mut inner = state.lock();
    if inner.users.contains_key(&email) {
        return error(StatusCode::CONFLICT, "El email ya está registrado");
    }
    inner.next_id += 1;

    let mut user = body.clone();
    if let Some(fields) = user.as_object_mut() {
        fields.remove("password");
        fields.remove("referralCode");
        fields.entry("role").or_insert_with(|| json!("USER"));
        fields.insert("points".to_owned(), json!(0));
        fields.insert("level".to_owned(), json!(1));
        let prefix: String = nombre.to_uppercase().chars().take(3).collect();
        fields.insert(
            "myReferralCode".to_owned(),
            json!(format!("{prefix}-{:04}", inner.next_id)),
        );
    }
    insert_account(&mut inner, user.clone(), &password);
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut inner = state.lock();
    let Some(account) = inner.users.get(email) else {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    if account.password != password {
        return error(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    }
    let user = account.user.clone();

    inner.next_id += 1;
    let token = format!("tok-{}", inner.next_id);
    inner.tokens.insert(token.clone(), email.to_owned());
    Json(json!({ "token": token, "usuario": user })).into_response()
}

async fn list_products(State(state): State<Shared>) -> Response {
    Json(Value::Array(state.lock().products.clone())).into_response()
}

async fn get_product(State(state): State<Shared>, Path(code): Path<String>) -> Response {
    let inner = state.lock();
    inner
        .products
        .iter()
        .find(|p| p["code"] == code.as_str())
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Producto no encontrado"),
            |p| Json(p.clone()).into_response(),
        )
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let users: Vec<Value> = state.lock().users.values().map(|a| a.user.clone()).collect();
    Json(users).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let mut inner = state.lock();
    let Some(account) = inner.users.get_mut(&email) else {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    if let Some(password) = body["password"].as_str() {
        password.clone_into(&mut account.password);
    }
    if let (Some(stored), Some(changes)) = (account.user.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            if key != "password" && key != "email" {
                stored.insert(key.clone(), value.clone());
            }
        }
    }
    Json(account.user.clone()).into_response()
}

async fn delete_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let mut inner = state.lock();
    if inner.users.remove(&email).is_none() {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    }
    inner.tokens.retain(|_, owner| *owner != email);
    StatusCode::NO_CONTENT.into_response()
}

async fn adjust_points(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(delta): Json<i64>,
) -> Response {
    state.points_calls.fetch_add(1, Ordering::SeqCst);
    let email = match caller(&state, &headers) {
        Ok(email) => email,
        Err(response) => return response,
    };
    if state.fail_points.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno");
    }

    let mut inner = state.lock();
    let Some(account) = inner.users.get_mut(&email) else {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    let balance = account.user["points"].as_i64().unwrap_or_default() + delta;
    if balance < 0 {
        return error(StatusCode::BAD_REQUEST, "Puntos insuficientes");
    }
    account.user["points"] = json!(balance);
    Json(account.user.clone()).into_response()
}

fn demo_catalog() -> Vec<Value> {
    vec![
        json!({
            "code": "JM001",
            "name": "Catan",
            "price": 29990,
            "image": "/img/catan.png",
            "description": "Juego de estrategia para 3-4 jugadores.",
            "rating": 4.5,
            "reviews": 120
        }),
        json!({
            "code": "AC002",
            "name": "Control Xbox Series X",
            "price": 59990,
            "image": "/img/xbox-controller.png",
            "rating": 4.8,
            "reviews": 340
        }),
        json!({
            "code": "MS001",
            "name": "Mouse Gamer Logitech G502",
            "price": 49990.0
        }),
    ]
}
