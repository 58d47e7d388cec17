use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chiron::{config::Config, db, routes::create_router, schema::users, AppState};
use diesel::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Create a test app over a fresh in-memory database.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (Router, Arc<AppState>) {
    let pool = db::connect(&config.database_url, config.database_pool_size)
        .expect("Failed to create in-memory database");
    let state = Arc::new(AppState::new(config, pool));
    (create_router(state.clone()), state)
}

/// Send a request and return status, headers and decoded JSON body
/// (`Value::Null` for an empty body).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, value)
}

#[allow(dead_code)]
pub const PASSWORD: &str = "pass1234";

/// Register a user; `phone` is optional.
#[allow(dead_code)]
pub async fn register(app: &Router, username: &str, is_doctor: bool, phone: Option<&str>) {
    let (status, _, body) = send(
        app,
        "POST",
        "/user/",
        None,
        Some(json!({
            "username": username,
            "password": PASSWORD,
            "confirm_password": PASSWORD,
            "email": "",
            "first_name": "first",
            "last_name": "last",
            "phone": phone.unwrap_or(""),
            "is_doctor": is_doctor,
            "is_patient": !is_doctor,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
}

#[allow(dead_code)]
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, _, body) = send(
        app,
        "POST",
        "/user/login/",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Register and log in, returning the access token.
#[allow(dead_code)]
pub async fn signup(app: &Router, username: &str, is_doctor: bool, phone: Option<&str>) -> String {
    register(app, username, is_doctor, phone).await;
    login(app, username, PASSWORD).await
}

/// Flip account flags directly in the database; no endpoint does this.
#[allow(dead_code)]
pub fn set_account_flags(state: &AppState, username: &str, is_active: bool, is_staff: bool) {
    let mut conn = state.conn().unwrap();
    let updated = diesel::update(users::table.filter(users::username.eq(username)))
        .set((users::is_active.eq(is_active), users::is_staff.eq(is_staff)))
        .execute(&mut conn)
        .unwrap();
    assert_eq!(updated, 1, "no such user: {username}");
}
