//! Integration tests for the REST client against the mock backend.

use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::Value;

use levelup_client::{ApiError, UserDraft};
use levelup_core::{Email, Price, ProductCode, Role};
use levelup_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, MockBackend};

fn email(s: &str) -> Email {
    Email::parse(s).expect("valid email")
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn draft(address: &str) -> UserDraft {
    UserDraft::new(email(address), "Ana", "Pérez", secret("s3cret"))
}

async fn admin_token(backend: &MockBackend) -> String {
    backend
        .api()
        .login(&email(ADMIN_EMAIL), &secret(ADMIN_PASSWORD))
        .await
        .expect("admin login")
        .token
        .expect("token in payload")
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_list_products_decodes_catalog() {
    let backend = MockBackend::start().await;
    let products = backend.api().list_products().await.expect("catalog");

    assert_eq!(products.len(), 3);
    let mouse = products
        .iter()
        .find(|p| p.code.as_str() == "MS001")
        .expect("mouse in catalog");
    assert_eq!(mouse.price, Price::from_pesos(49_990));
    assert_eq!(mouse.reviews, 0);
    assert!(mouse.image.is_none());
}

#[tokio::test]
async fn test_get_product_by_code() {
    let backend = MockBackend::start().await;
    let api = backend.api();

    let catan = api
        .get_product(&ProductCode::parse("JM001").expect("code"))
        .await
        .expect("product");
    assert_eq!(catan.name, "Catan");
    assert_eq!(catan.stars(), "★★★★☆");

    let missing = api
        .get_product(&ProductCode::parse("NOPE").expect("code"))
        .await
        .expect_err("unknown code");
    assert!(matches!(missing, ApiError::NotFound(_)));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let backend = MockBackend::start().await;
    let api = backend.api();

    let mut new_user = draft("ana@duoc.cl");
    new_user.referred_by = Some("ADMIN-0000".to_owned());
    let created = api.register(&new_user).await.expect("register");
    assert_eq!(created.email.as_str(), "ana@duoc.cl");
    assert_eq!(created.first_name.as_deref(), Some("Ana"));
    assert_eq!(created.role, Role::User);
    assert_eq!(created.level, 1);
    assert!(created.referral_code.is_some());

    let stored = backend.user("ana@duoc.cl").expect("stored");
    assert!(stored.get("password").is_none());

    let payload = api
        .login(&email("ana@duoc.cl"), &secret("s3cret"))
        .await
        .expect("login");
    assert!(payload.token.is_some());
    assert_eq!(payload.user.expect("user").email, created.email);
}

#[tokio::test]
async fn test_register_rejects_duplicate_and_incomplete() {
    let backend = MockBackend::start().await;
    let api = backend.api();

    let taken = api.register(&draft(ADMIN_EMAIL)).await.expect_err("taken");
    assert!(matches!(taken, ApiError::EmailTaken(e) if e == ADMIN_EMAIL));

    let mut nameless = draft("x@duoc.cl");
    nameless.first_name = String::new();
    let bad = api.register(&nameless).await.expect_err("incomplete");
    assert!(matches!(bad, ApiError::BadRequest(m) if m == "Faltan datos obligatorios"));
}

#[tokio::test]
async fn test_login_failures_are_invalid_credentials() {
    let backend = MockBackend::start().await;
    let api = backend.api();

    let wrong_password = api
        .login(&email(ADMIN_EMAIL), &secret("wrong"))
        .await
        .expect_err("wrong password");
    assert!(matches!(wrong_password, ApiError::InvalidCredentials));

    let unknown = api
        .login(&email("ghost@duoc.cl"), &secret("x"))
        .await
        .expect_err("unknown user");
    assert!(matches!(unknown, ApiError::InvalidCredentials));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_list_users_requires_admin() {
    let backend = MockBackend::start().await;
    backend.seed_user("cliente@duoc.cl", "pw", 0);
    let api = backend.api();

    let anonymous = api.list_users().await.expect_err("anonymous");
    assert!(matches!(anonymous, ApiError::Unauthorized));

    let customer = api
        .login(&email("cliente@duoc.cl"), &secret("pw"))
        .await
        .expect("login")
        .token
        .expect("token");
    let forbidden = api
        .with_token(customer)
        .list_users()
        .await
        .expect_err("customer");
    assert!(matches!(forbidden, ApiError::Forbidden(_)));

    let users = api
        .with_token(admin_token(&backend).await)
        .list_users()
        .await
        .expect("admin");
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.is_admin()));
}

#[tokio::test]
async fn test_admin_update_and_delete() {
    let backend = MockBackend::start().await;
    backend.seed_user("cliente@duoc.cl", "pw", 10);
    let admin = backend.api().with_token(admin_token(&backend).await);
    let target = email("cliente@duoc.cl");

    let users = admin.list_users().await.expect("users");
    let record = users.iter().find(|u| u.email == target).expect("seeded");
    let mut changes = UserDraft::from_record(record);
    changes.points = Some(1200);
    changes.level = Some(3);
    changes.region = Some("Metropolitana".to_owned());

    let updated = admin.update_user(&target, &changes).await.expect("update");
    assert_eq!(updated.points, 1200);
    assert_eq!(updated.level, 3);
    assert_eq!(updated.region.as_deref(), Some("Metropolitana"));
    assert_eq!(updated.first_name.as_deref(), Some("Test"));

    admin.delete_user(&target).await.expect("delete");
    let again = admin.delete_user(&target).await.expect_err("already gone");
    assert!(matches!(again, ApiError::NotFound(_)));
    assert!(backend.user("cliente@duoc.cl").is_none());
}

#[tokio::test]
async fn test_adjust_points() {
    let backend = MockBackend::start().await;
    backend.seed_user("cliente@duoc.cl", "pw", 100);
    let api = backend.api();
    let token = api
        .login(&email("cliente@duoc.cl"), &secret("pw"))
        .await
        .expect("login")
        .token
        .expect("token");
    let api = api.with_token(token);

    let credited = api.adjust_points(25).await.expect("credit");
    assert_eq!(credited.points, 125);

    let overdraft = api.adjust_points(-500).await.expect_err("overdraft");
    assert!(matches!(overdraft, ApiError::BadRequest(_)));
    assert_eq!(backend.user("cliente@duoc.cl").expect("user")["points"], 125);

    let anonymous = backend.api().adjust_points(1).await.expect_err("no token");
    assert!(matches!(anonymous, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_errors_use_backend_message_shape() {
    let backend = MockBackend::start().await;
    let url = backend.base_url().join("api/usuarios").expect("url");

    let resp = reqwest::get(url).await.expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("json body");
    assert!(body["mensaje"].is_string());
}
