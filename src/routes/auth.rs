//! Authentication routes: register, login, refresh, logout.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::{self as session, CurrentUser};
use crate::middleware::validated::ValidJson;
use crate::models::user::{LoginRequest, RegisterUser, UserResponse};
use crate::services::auth as auth_service;
use crate::services::user as user_service;
use crate::AppState;

/// Token plus the user it was issued for.
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub message: &'static str,
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub message: &'static str,
    pub token: String,
}

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<RegisterUser>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<AuthPayload>>), AppError> {
    body.validate()?;

    let (user, token) = auth_service::register(
        &state.db,
        &body,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .await?;

    let jar = jar.add(session::session_cookie(&state.config, token.clone()));
    Ok((
        StatusCode::CREATED,
        jar,
        ApiResponse::success(AuthPayload {
            message: "Registered successfully",
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<AuthPayload>>), AppError> {
    body.validate()?;

    let (user, token) = auth_service::login(
        &state.db,
        &body.email,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .await?;

    let jar = jar.add(session::session_cookie(&state.config, token.clone()));
    Ok((
        jar,
        ApiResponse::success(AuthPayload {
            message: "Logged in",
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// GET /v1/auth/refresh — reissue the session token from the current user's record.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    current_user: CurrentUser,
) -> Result<(CookieJar, Json<ApiResponse<TokenPayload>>), AppError> {
    let token = auth_service::refresh_token(
        &state.db,
        current_user.id,
        &state.config.jwt_secret,
        state.config.jwt_expiry_secs,
    )
    .await?;

    let jar = jar.add(session::session_cookie(&state.config, token.clone()));
    Ok((
        jar,
        ApiResponse::success(TokenPayload {
            message: "Token refreshed",
            token,
        }),
    ))
}

/// POST /v1/auth/logout — clears the session cookie; works without a valid session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<&'static str>>) {
    let claims = jar
        .get(&state.config.cookie_name)
        .and_then(|c| auth_service::validate_token(c.value(), &state.config.jwt_secret).ok());

    if let Some(id) = claims.and_then(|c| c.user_id().ok()) {
        if let Err(e) = user_service::record_logout(&state.db, id).await {
            tracing::warn!(error = %e, user_id = %id, "Failed to record logout");
        }
    }

    let jar = jar.remove(session::removal_cookie(&state.config));
    (jar, ApiResponse::success("Logged out"))
}
