// End-to-end scenarios against the full router with an in-memory store.

use std::sync::Arc;

use api_lib::adapters::MemoryAdapter;
use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-0123456789";

fn app_with(store: Arc<MemoryAdapter>) -> Router {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "TOKEN_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })
    .unwrap();
    let state = Arc::new(AppState::new(Arc::new(config), store));
    build_router(state).unwrap()
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)))
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

struct Reply {
    status: StatusCode,
    www_authenticate: Option<String>,
    body: Value,
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let www_authenticate = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        www_authenticate,
        body,
    }
}

async fn register(app: &Router, email: &str, password: &str) -> Reply {
    send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": email, "password": password, "first_name": "Ada" })),
    )
    .await
}

#[tokio::test]
async fn register_fetch_token_and_read_heatmap() {
    let store = Arc::new(MemoryAdapter::new());
    let app = app_with(store.clone());

    let registered = register(&app, "a@b.com", "secret").await;
    assert_eq!(registered.status, StatusCode::CREATED);
    let first_token = registered.body["token"].as_str().unwrap().to_string();

    let profile = send(&app, Method::GET, "/profile", Some(bearer(&first_token)), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["email"], "a@b.com");
    assert_eq!(profile.body["first_name"], "Ada");
    assert_eq!(profile.body["last_name"], Value::Null);
    assert_eq!(profile.body["heatmap"], json!([]));

    let issued = send(&app, Method::GET, "/token", Some(basic("a@b.com", "secret")), None).await;
    assert_eq!(issued.status, StatusCode::OK);
    let fresh_token = issued.body["token"].as_str().unwrap().to_string();

    let profile = send(&app, Method::GET, "/profile", Some(bearer(&fresh_token)), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["heatmap"].as_array().unwrap().len(), 1);

    // Authenticating alone does not count as a login; only issuance does.
    let account_id = 1;
    assert_eq!(store.login_event_count(account_id).await, 1);
}

#[tokio::test]
async fn second_token_on_the_same_day_keeps_one_heatmap_entry() {
    let store = Arc::new(MemoryAdapter::new());
    let app = app_with(store.clone());
    register(&app, "a@b.com", "secret").await;

    for _ in 0..2 {
        let issued = send(&app, Method::GET, "/token", Some(basic("a@b.com", "secret")), None).await;
        assert_eq!(issued.status, StatusCode::OK);
    }

    let profile = send(&app, Method::GET, "/profile", Some(basic("a@b.com", "secret")), None).await;
    assert_eq!(profile.body["heatmap"].as_array().unwrap().len(), 1);
    assert_eq!(store.login_event_count(1).await, 2);
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_a_new_account() {
    let store = Arc::new(MemoryAdapter::new());
    let app = app_with(store.clone());

    assert_eq!(register(&app, "a@b.com", "secret").await.status, StatusCode::CREATED);

    let again = register(&app, "a@b.com", "different").await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], "email is already registered");
    assert_eq!(store.account_count().await, 1);
}

#[tokio::test]
async fn missing_or_malformed_fields_are_client_errors() {
    let app = app_with(Arc::new(MemoryAdapter::new()));

    let no_password = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": "a@b.com" })),
    )
    .await;
    assert_eq!(no_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_password.body["error"], "password is required");

    let wrong_type = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": 5, "password": "secret" })),
    )
    .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_credential() {
    let app = app_with(Arc::new(MemoryAdapter::new()));

    for uri in ["/token", "/profile"] {
        let reply = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.www_authenticate.as_deref(), Some("Basic realm=\"grocery\""));
        assert_eq!(reply.body["error"], "authentication failed");
    }
}

#[tokio::test]
async fn failures_do_not_reveal_which_factor_was_wrong() {
    let app = app_with(Arc::new(MemoryAdapter::new()));
    register(&app, "a@b.com", "secret").await;

    let wrong_password = send(&app, Method::GET, "/token", Some(basic("a@b.com", "nope")), None).await;
    let unknown_email = send(&app, Method::GET, "/token", Some(basic("x@y.com", "secret")), None).await;
    let forged_token = send(&app, Method::GET, "/token", Some(bearer("e30.AAAA")), None).await;

    for reply in [&wrong_password, &unknown_email, &forged_token] {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, wrong_password.body);
    }
}

#[tokio::test]
async fn token_is_accepted_in_the_basic_username_slot() {
    let app = app_with(Arc::new(MemoryAdapter::new()));
    let token = register(&app, "a@b.com", "secret").await.body["token"]
        .as_str()
        .unwrap()
        .to_string();

    let reply = send(&app, Method::GET, "/profile", Some(basic(&token, "")), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["email"], "a@b.com");
}

#[tokio::test]
async fn token_of_a_deleted_account_is_rejected() {
    let store = Arc::new(MemoryAdapter::new());
    let app = app_with(store.clone());
    let token = register(&app, "a@b.com", "secret").await.body["token"]
        .as_str()
        .unwrap()
        .to_string();

    store.delete_account(1).await.unwrap();

    let reply = send(&app, Method::GET, "/profile", Some(bearer(&token)), None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_replaces_the_accepted_password() {
    let app = app_with(Arc::new(MemoryAdapter::new()));
    let token = register(&app, "a@b.com", "secret").await.body["token"]
        .as_str()
        .unwrap()
        .to_string();

    let refused = send(
        &app,
        Method::PUT,
        "/password",
        Some(bearer(&token)),
        Some(json!({ "current_password": "wrong", "new_password": "better" })),
    )
    .await;
    assert_eq!(refused.status, StatusCode::UNAUTHORIZED);

    let missing = send(
        &app,
        Method::PUT,
        "/password",
        Some(bearer(&token)),
        Some(json!({ "current_password": "secret" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let changed = send(
        &app,
        Method::PUT,
        "/password",
        Some(bearer(&token)),
        Some(json!({ "current_password": "secret", "new_password": "better" })),
    )
    .await;
    assert_eq!(changed.status, StatusCode::NO_CONTENT);

    let old = send(&app, Method::GET, "/token", Some(basic("a@b.com", "secret")), None).await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    let new = send(&app, Method::GET, "/token", Some(basic("a@b.com", "better")), None).await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn health_check_is_public() {
    let app = app_with(Arc::new(MemoryAdapter::new()));
    let reply = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "status": "ok" }));
}
