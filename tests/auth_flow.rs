//! Router-level tests: registration, login, and the authentication filter
//! driven through the full middleware stack with an in-memory user store.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use blog_auth::app::{build_router, build_state};
use blog_auth::config::Config;
use blog_auth::repos::{InMemoryUserStore, UserStore};
use blog_auth::services::auth::BcryptHasher;
use blog_auth::state::AppState;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET_B64: &str = "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=";

struct TestApp {
    router: Router,
    state: AppState,
    store: InMemoryUserStore,
}

fn test_app(expiration_ms: u64, prefix: Option<&str>) -> TestApp {
    let prefix = prefix.map(str::to_string);
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET_B64.to_string()),
        "JWT_EXPIRATION_MS" => Some(expiration_ms.to_string()),
        "JWT_TOKEN_PREFIX" => prefix.clone(),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap();

    let store = InMemoryUserStore::new();
    let state = build_state(
        &config,
        Arc::new(store.clone()),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
    )
    .unwrap();
    let router = build_router(state.clone(), &config);

    TestApp {
        router,
        state,
        store,
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &TestApp, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/api/auth/register",
            json!({"username": username, "password": password}),
        ),
    )
    .await
}

async fn login_token(app: &TestApp, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/auth/login",
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

fn assert_unauthorized(status: StatusCode, body: &Value, path: &str) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Authentication Required");
    assert_eq!(body["path"], path);
    assert!(body["message"].as_str().unwrap().starts_with("Unauthorized: "));
}

#[tokio::test]
async fn protected_route_without_header_is_401_with_path() {
    let app = test_app(60_000, None);

    let (status, body) = send(&app, get("/api/v1/me", None)).await;
    assert_unauthorized(status, &body, "/api/v1/me");

    let (status, body) = send(&app, get("/", None)).await;
    assert_unauthorized(status, &body, "/");
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app(60_000, None);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_reach_protected_routes() {
    let app = test_app(60_000, None);

    let (status, body) = register(&app, "alice", "correct horse").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["USER"]));
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"username": "alice", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["type"], "Bearer");
    let token = body["token"].as_str().unwrap();

    let auth = format!("Bearer {token}");
    let (status, body) = send(&app, get("/api/v1/me", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "alice", "authorities": ["USER"]}));

    let (status, body) = send(&app, get("/", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["alice"]));
}

#[tokio::test]
async fn legacy_paths_behave_like_api_auth() {
    let app = test_app(60_000, None);

    let (status, _) = send(
        &app,
        post_json("/register", json!({"username": "bob", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        post_json("/login", json!({"username": "bob", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_user_get_the_same_401() {
    let app = test_app(60_000, None);
    register(&app, "alice", "correct horse").await;

    let (status, wrong) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"username": "alice", "password": "battery staple"}),
        ),
    )
    .await;
    assert_unauthorized(status, &wrong, "/api/auth/login");
    assert_eq!(wrong["message"], "Unauthorized: Bad credentials");
    assert!(wrong.get("token").is_none());

    let (status, unknown) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"username": "mallory", "password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn duplicate_registration_is_409() {
    let app = test_app(60_000, None);
    register(&app, "alice", "pw").await;

    let (status, body) = register(&app, "alice", "other").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate Key Error");
    assert_eq!(body["message"], "Username or email already exists");
}

#[tokio::test]
async fn blank_registration_is_400() {
    let app = test_app(60_000, None);

    let (status, body) = register(&app, "  ", "pw").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Failed");
}

#[tokio::test]
async fn client_supplied_roles_are_ignored() {
    let app = test_app(60_000, None);

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            json!({"username": "eve", "password": "pw", "roles": ["ADMIN"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["roles"], json!(["USER"]));
}

#[tokio::test]
async fn tampered_token_is_401() {
    let app = test_app(60_000, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let (status, body) = send(&app, get("/api/v1/me", Some(&format!("Bearer {tampered}")))).await;
    assert_unauthorized(status, &body, "/api/v1/me");
}

#[tokio::test]
async fn garbage_token_and_other_schemes_are_401() {
    let app = test_app(60_000, None);

    for value in ["Bearer not-a-token", "Bearer ", "Basic YWxpY2U6cHc=", "alice"] {
        let (status, body) = send(&app, get("/api/v1/me", Some(value))).await;
        assert_unauthorized(status, &body, "/api/v1/me");
    }
}

#[tokio::test]
async fn expired_token_is_401() {
    let app = test_app(0, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;

    let (status, body) = send(&app, get("/api/v1/me", Some(&format!("Bearer {token}")))).await;
    assert_unauthorized(status, &body, "/api/v1/me");
}

#[tokio::test]
async fn token_expires_after_its_ttl() {
    let app = test_app(1_000, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;
    let auth = format!("Bearer {token}");

    let (status, _) = send(&app, get("/api/v1/me", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let (status, body) = send(&app, get("/api/v1/me", Some(&auth))).await;
    assert_unauthorized(status, &body, "/api/v1/me");
}

#[tokio::test]
async fn token_for_missing_account_is_401() {
    let app = test_app(60_000, None);
    let token = app
        .state
        .tokens
        .generate("ghost", Utc::now(), Duration::from_secs(60))
        .unwrap();

    let (status, body) = send(&app, get("/api/v1/me", Some(&format!("Bearer {token}")))).await;
    assert_unauthorized(status, &body, "/api/v1/me");
}

#[tokio::test]
async fn role_changes_apply_on_next_request() {
    let app = test_app(60_000, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;
    let auth = format!("Bearer {token}");

    let mut user = app.store.find_by_username("alice").await.unwrap().unwrap();
    user.roles.push(" ADMIN ".to_string());
    app.store.save(&user).await.unwrap();

    let (status, body) = send(&app, get("/api/v1/me", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authorities"], json!(["ADMIN", "USER"]));
}

#[tokio::test]
async fn custom_token_prefix() {
    let app = test_app(60_000, Some("Token"));
    register(&app, "alice", "pw").await;

    let (_, body) = send(
        &app,
        post_json("/api/auth/login", json!({"username": "alice", "password": "pw"})),
    )
    .await;
    assert_eq!(body["type"], "Token");
    let token = body["token"].as_str().unwrap();

    let (status, _) = send(&app, get("/api/v1/me", Some(&format!("Token {token}")))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/v1/me", Some(&format!("Bearer {token}")))).await;
    assert_unauthorized(status, &body, "/api/v1/me");
}

#[tokio::test]
async fn unknown_route_is_401_anonymous_and_404_authenticated() {
    let app = test_app(60_000, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;

    let (status, body) = send(&app, get("/nope", None)).await;
    assert_unauthorized(status, &body, "/nope");

    let (status, _) = send(&app, get("/nope", Some(&format!("Bearer {token}")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = test_app(60_000, None);

    let res = app.router.clone().oneshot(get("/health", None)).await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

fn request(method: &str, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn wrong_method_on_public_route_is_405_envelope() {
    let app = test_app(60_000, None);

    let (status, body) = send(&app, get("/api/auth/login", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);
    assert_eq!(body["error"], "Method Not Allowed");
    assert_eq!(
        body["message"],
        "This HTTP method is not supported for this endpoint"
    );
}

#[tokio::test]
async fn wrong_method_on_protected_route_needs_authentication_first() {
    let app = test_app(60_000, None);
    register(&app, "alice", "pw").await;
    let token = login_token(&app, "alice", "pw").await;
    let auth = format!("Bearer {token}");

    let (status, body) = send(&app, request("DELETE", "/api/v1/me", None)).await;
    assert_unauthorized(status, &body, "/api/v1/me");

    let (status, body) = send(&app, request("DELETE", "/api/v1/me", Some(&auth))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method Not Allowed");

    let (status, body) = send(&app, request("POST", "/", Some(&auth))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);
}
