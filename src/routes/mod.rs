//! Route definitions for the dashboard API.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::services::avatar::PUBLIC_PREFIX;
use crate::AppState;

/// CORS for the browser client: listed origins only, with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", get(auth::refresh))
        .route("/logout", post(auth::logout));

    let user_routes = Router::new()
        .route("/", get(users::list))
        .route("/me", get(users::me).put(users::update_me))
        .route("/me/avatar", post(users::upload_avatar))
        .route("/admin/users", get(users::list_all))
        .route("/{id}", patch(users::update));

    let dashboard_routes = Router::new()
        .route("/summary", get(dashboard::summary))
        .route("/trends", get(dashboard::trends))
        .route("/roles", get(dashboard::roles))
        .route("/recent-users", get(dashboard::recent_users));

    Router::new()
        .route("/", get(health::root))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/v1/auth", auth_routes)
        .nest("/v1/users", user_routes)
        .nest("/v1/dashboard", dashboard_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
        .fallback(health::not_found)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}
