//! Router assembly.

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{appointment_handlers, auth_handlers, user_handlers};
use crate::AppState;

/// API root listing the two resources.
async fn api_root(headers: HeaderMap) -> Json<Value> {
    let base = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|host| format!("http://{host}"))
        .unwrap_or_default();

    Json(json!({
        "user": format!("{base}/user/"),
        "appointment": format!("{base}/appointment/"),
    }))
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let user_routes: Router<Arc<AppState>> = Router::new()
        .route("/user/", post(auth_handlers::register))
        .route("/user/login/", post(auth_handlers::login))
        .route("/user/logout/", post(auth_handlers::logout))
        .route("/user/cpw/", post(auth_handlers::change_password))
        .route("/user/drs/", get(user_handlers::doctors))
        .route(
            "/user/me/",
            get(user_handlers::me)
                .put(user_handlers::update_me)
                .patch(user_handlers::update_me),
        )
        .route(
            "/user/:username/",
            get(user_handlers::retrieve)
                .put(user_handlers::update)
                .patch(user_handlers::update),
        );

    let appointment_routes: Router<Arc<AppState>> = Router::new()
        .route(
            "/appointment/",
            get(appointment_handlers::list).post(appointment_handlers::create),
        )
        .route(
            "/appointment/:id/",
            get(appointment_handlers::retrieve)
                .put(appointment_handlers::update)
                .patch(appointment_handlers::partial_update)
                .delete(appointment_handlers::destroy),
        )
        .route("/appointment/:id/approve/", post(appointment_handlers::approve))
        .route("/appointment/:id/reject/", post(appointment_handlers::reject))
        .route("/appointment/:id/visit/", get(appointment_handlers::visit));

    Router::new()
        .route("/", get(api_root))
        .merge(user_routes)
        .merge(appointment_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any)
                .expose_headers([header::CONTENT_TYPE]),
        )
        .with_state(state)
}
