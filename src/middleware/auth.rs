//! JWT session extractor and session cookie helpers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use mongodb::bson::oid::ObjectId;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user::UserRole;
use crate::services::auth as auth_service;
use crate::AppState;

/// Authenticated user extracted from the session cookie or a Bearer token.
///
/// Use as an Axum extractor in handlers that require authentication:
/// ```ignore
/// async fn handler(current_user: CurrentUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: ObjectId,
    pub email: String,
    pub role: UserRole,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.cookie_name)
            .ok_or(AppError::Unauthorized)?;

        let claims = auth_service::validate_token(&token, &state.config.jwt_secret)
            .inspect_err(|_| tracing::debug!("Rejected request with invalid session token"))?;

        Ok(CurrentUser {
            id: claims.user_id()?,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// The session token: the named cookie first, then an `Authorization: Bearer` header.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// HttpOnly session cookie carrying `token`, scoped per the environment's policy.
pub fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure())
        .same_site(config.cookie_same_site())
        .max_age(time::Duration::seconds(config.jwt_expiry_secs))
        .build();
    if let Some(domain) = &config.cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Cookie matching [`session_cookie`]'s path and domain, for removal.
pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .build();
    if let Some(domain) = &config.cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}
