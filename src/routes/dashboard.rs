//! Dashboard routes: filtered user metrics for the overview page.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::middleware::validated::ValidQuery;
use crate::models::filter::UserFilter;
use crate::models::user::RecentUserResponse;
use crate::services::dashboard::{
    self, RecentQuery, RoleBreakdown, SummaryMetrics, TrendPoint, TrendQuery,
};
use crate::AppState;

/// GET /v1/dashboard/summary — total and recent user counts.
pub async fn summary(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<ApiResponse<SummaryMetrics>>, AppError> {
    let summary = dashboard::summary(&state.db, &filter).await?;
    Ok(ApiResponse::success(summary))
}

/// GET /v1/dashboard/trends — daily signup counts.
pub async fn trends(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidQuery(query): ValidQuery<TrendQuery>,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<ApiResponse<Vec<TrendPoint>>>, AppError> {
    let days = query.days()?;
    let trends = dashboard::trends(&state.db, &filter, days).await?;
    Ok(ApiResponse::success(trends))
}

/// GET /v1/dashboard/roles — user counts per role.
pub async fn roles(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<ApiResponse<RoleBreakdown>>, AppError> {
    let roles = dashboard::role_breakdown(&state.db, &filter).await?;
    Ok(ApiResponse::success(roles))
}

/// GET /v1/dashboard/recent-users — newest signups.
pub async fn recent_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidQuery(query): ValidQuery<RecentQuery>,
    ValidQuery(filter): ValidQuery<UserFilter>,
) -> Result<Json<ApiResponse<Vec<RecentUserResponse>>>, AppError> {
    let users = dashboard::recent_users(&state.db, &filter, query.limit()).await?;
    Ok(ApiResponse::success(users))
}
