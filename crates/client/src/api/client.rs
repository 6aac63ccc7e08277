//! HTTP client for the backend endpoints.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use levelup_core::{AuthPayload, Email, Product, ProductCode, Session, UserRecord};

use super::{ApiError, LoginRequest, UserDraft};
use crate::config::ClientConfig;

/// Typed client for the LevelUp REST backend.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ApiClient {
    /// Create an anonymous client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot carry a path.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.api_base_url.clone(), config.http_timeout)
    }

    /// Create an anonymous client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot carry a path.
    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// A copy of this client that sends `token` as a bearer token.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
            ..self.clone()
        }
    }

    /// A copy of this client authenticated as `session`, or anonymous if the
    /// session holds no token.
    #[must_use]
    pub fn for_session(&self, session: &Session) -> Self {
        session.token().map_or_else(
            || Self {
                token: None,
                ..self.clone()
            },
            |token| self.with_token(token),
        )
    }

    /// Whether requests carry a bearer token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Backend root URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Register a new account. The backend does not log the user in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::EmailTaken` on 409, `ApiError::BadRequest` on 400.
    #[instrument(skip(self, draft), fields(email = %draft.email))]
    pub async fn register(&self, draft: &UserDraft) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["api", "auth", "register"])?;
        let response = self.request(reqwest::Method::POST, url).json(draft).send().await?;
        match check(response).await {
            Ok(response) => decode(response).await,
            Err(ApiError::Api { status: 409, .. }) => {
                Err(ApiError::EmailTaken(draft.email.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Log in with email and password.
    ///
    /// The returned payload is not validated here; hand it to
    /// `SessionCartStore::login`, which rejects incomplete payloads.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCredentials` on 401 or 404.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthPayload, ApiError> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        let body = LoginRequest { email, password };
        let response = self.request(reqwest::Method::POST, url).json(&body).send().await?;
        match check(response).await {
            Ok(response) => decode(response).await,
            Err(ApiError::Unauthorized | ApiError::NotFound(_)) => Err(ApiError::InvalidCredentials),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List the product catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&["api", "productos"])?;
        self.get_json(url).await
    }

    /// Fetch one product by code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the code is unknown.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn get_product(&self, code: &ProductCode) -> Result<Product, ApiError> {
        let url = self.endpoint(&["api", "productos", code.as_str()])?;
        self.get_json(url).await.map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::NotFound(format!("product {code}")),
            e => e,
        })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// List all users (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized`/`Forbidden` without an admin token.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ApiError> {
        let url = self.endpoint(&["api", "usuarios"])?;
        self.get_json(url).await
    }

    /// Create a user (admin). Goes through the registration endpoint, which
    /// assigns the starting points and referral code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::EmailTaken` if the email is in use.
    pub async fn create_user(&self, draft: &UserDraft) -> Result<UserRecord, ApiError> {
        self.register(draft).await
    }

    /// Replace the user addressed by `email` (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such user exists.
    #[instrument(skip(self, draft), fields(email = %email))]
    pub async fn update_user(
        &self,
        email: &Email,
        draft: &UserDraft,
    ) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["api", "usuarios", email.as_str()])?;
        let response = self.request(reqwest::Method::PUT, url).json(draft).send().await?;
        decode(check(response).await?).await
    }

    /// Delete the user addressed by `email` (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no such user exists.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn delete_user(&self, email: &Email) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "usuarios", email.as_str()])?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        check(response).await?;
        Ok(())
    }

    /// Add `delta` points (negative to spend) to the logged-in user.
    ///
    /// Returns the updated user record, which should be installed into the
    /// session with `SessionCartStore::login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` without a token and
    /// `ApiError::BadRequest` if the balance would go negative.
    #[instrument(skip(self))]
    pub async fn adjust_points(&self, delta: i64) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["api", "usuarios", "me", "sumar-puntos"])?;
        let response = self.request(reqwest::Method::POST, url).json(&delta).send().await?;
        decode(check(response).await?).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.request(reqwest::Method::GET, url).send().await?;
        decode(check(response).await?).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Map non-success statuses to `ApiError`.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = backend_message(&body);
    tracing::debug!(status = status.as_u16(), %message, "Backend returned an error");

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// The backend reports errors as `{"mensaje": "..."}`; fall back to the raw body.
fn backend_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["mensaje", "message", "error"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
