//! User routes: own profile, avatar upload and admin management.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::rbac::RequireAdmin;
use crate::middleware::validated::{ValidJson, ValidQuery};
use crate::models::filter::UserFilter;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user::{AdminUpdateUser, UpdateProfile, UserResponse};
use crate::services::avatar;
use crate::services::user as user_service;
use crate::AppState;

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "avatar";

#[derive(Debug, Serialize)]
pub struct ProfilePayload {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct AvatarPayload {
    pub message: &'static str,
    pub url: String,
    pub user: UserResponse,
}

/// GET /v1/users/me
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user_service::find_by_object_id(&state.db, current_user.id).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}

/// PUT /v1/users/me — update first/last name, avatar URL and bio.
pub async fn update_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidJson(body): ValidJson<UpdateProfile>,
) -> Result<Json<ApiResponse<ProfilePayload>>, AppError> {
    let user = user_service::update_profile(&state.db, current_user.id, &body).await?;
    Ok(ApiResponse::success(ProfilePayload {
        message: "Profile updated",
        user: UserResponse::from(user),
    }))
}

/// POST /v1/users/me/avatar — multipart upload of the `avatar` file field.
pub async fn upload_avatar(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AvatarPayload>>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if avatar::allowed_extension(&file_name).is_none() {
            return Err(AppError::Validation("Invalid file type".to_string()));
        }

        let bytes = field.bytes().await?;
        let url = avatar::save(&state.config.upload_dir, &file_name, &bytes).await?;
        let user = user_service::set_avatar(&state.db, current_user.id, &url).await?;

        tracing::info!(user_id = %current_user.id, url = %url, "Avatar uploaded");
        return Ok(ApiResponse::success(AvatarPayload {
            message: "Avatar uploaded",
            url,
            user: UserResponse::from(user),
        }));
    }

    Err(AppError::Validation("No avatar provided".to_string()))
}

/// GET /v1/users/admin/users — newest 200 users (admin).
pub async fn list_all(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, AppError> {
    let users = user_service::list_users(&state.db).await?;
    Ok(ApiResponse::success(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

/// GET /v1/users — filtered, paginated listing (admin).
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidQuery(pagination): ValidQuery<Pagination>,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<ApiResponse<PagedResult<UserResponse>>>, AppError> {
    let page = user_service::list_paginated(&state.db, &filter, &pagination).await?;
    Ok(ApiResponse::success(page.map(UserResponse::from)))
}

/// PATCH /v1/users/{id} — change role and/or status (admin).
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<AdminUpdateUser>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user_service::update_role_status(&state.db, &id, &body).await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, role = ?body.role, status = ?body.status, "User updated by admin");
    Ok(ApiResponse::success(UserResponse::from(user)))
}
