//! Dashboard metrics computed with aggregation pipelines over the users collection.
//!
//! Every call reads the collection live; nothing is cached between requests.

use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::errors::AppError;
use crate::models::filter::UserFilter;
use crate::models::user::{RecentUser, RecentUserResponse, UserRole};

/// Window of the summary's "recent" count when no `from` is given.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Trend window when neither `from` nor `to` is given.
const DEFAULT_TREND_DAYS: i64 = 30;

const MAX_TREND_DAYS: i64 = 3650;

const DEFAULT_RECENT_USERS: i64 = 8;

const MAX_RECENT_USERS: i64 = 50;

/// Headline counts for the overview cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    #[serde(rename = "totalUsers")]
    pub total_users: u64,
    #[serde(rename = "last7Days")]
    pub last_7_days: u64,
}

/// Signups on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(alias = "_id")]
    pub date: String,
    pub count: i64,
}

/// User counts per role. Always carries all three roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleBreakdown {
    pub admin: i64,
    pub teacher: i64,
    pub user: i64,
}

impl RoleBreakdown {
    pub fn add(&mut self, role: UserRole, count: i64) {
        match role {
            UserRole::Admin => self.admin += count,
            UserRole::Teacher => self.teacher += count,
            UserRole::User => self.user += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.admin + self.teacher + self.user
    }
}

/// `$group` output row of the role pipeline.
#[derive(Debug, Deserialize)]
struct RoleRow {
    #[serde(rename = "_id")]
    role: Option<String>,
    count: i64,
}

/// Query parameters of the trends endpoint besides the filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}

impl TrendQuery {
    pub fn days(&self) -> Result<i64, AppError> {
        match self.days {
            None => Ok(DEFAULT_TREND_DAYS),
            Some(days) if (1..=MAX_TREND_DAYS).contains(&days) => Ok(days),
            Some(days) => Err(AppError::Validation(format!(
                "days must be between 1 and {MAX_TREND_DAYS}, got {days}"
            ))),
        }
    }
}

/// Query parameters of the recent-users feed besides the filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_RECENT_USERS)
            .clamp(1, MAX_RECENT_USERS)
    }
}

/// Filter for the "recent" count: the requested range, or the last seven days up to `now`.
pub fn recent_window(filter: &UserFilter, now: DateTime<Utc>) -> UserFilter {
    UserFilter {
        from: filter
            .from
            .or_else(|| Some(now - Duration::days(RECENT_WINDOW_DAYS))),
        to: filter.to.or(Some(now)),
        ..filter.clone()
    }
}

/// Filter for the trend series: an explicit range wins, otherwise the last `days` days.
pub fn trend_window(filter: &UserFilter, days: i64, now: DateTime<Utc>) -> UserFilter {
    if filter.has_range() {
        return filter.clone();
    }
    UserFilter {
        from: Some(now - Duration::days(days)),
        ..filter.clone()
    }
}

/// match → group by UTC day → sort ascending.
pub fn trend_pipeline(filter: &UserFilter) -> Vec<Document> {
    vec![
        doc! { "$match": filter.to_match() },
        doc! {
            "$group": {
                "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$createdAt" } },
                "count": { "$sum": 1 },
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// match → group by role. Documents without a role count as the default role.
pub fn role_pipeline(filter: &UserFilter) -> Vec<Document> {
    let default_role = UserRole::default().as_str();
    vec![
        doc! { "$match": filter.to_match() },
        doc! {
            "$group": {
                "_id": { "$ifNull": ["$role", default_role] },
                "count": { "$sum": 1 },
            }
        },
    ]
}

fn decode<T: for<'de> Deserialize<'de>>(document: Document) -> Result<T, AppError> {
    bson::from_document(document)
        .map_err(|e| AppError::Internal(format!("Unexpected aggregation row: {e}")))
}

/// Fold role rows into the fixed three-role mapping.
///
/// A missing role reads as the default role, as it does when a user document
/// is loaded. Unrecognised role strings are dropped.
fn breakdown_from_rows(rows: Vec<RoleRow>) -> RoleBreakdown {
    let mut breakdown = RoleBreakdown::default();
    for row in rows {
        match row.role.as_deref().map(str::parse::<UserRole>) {
            None => breakdown.add(UserRole::default(), row.count),
            Some(Ok(role)) => breakdown.add(role, row.count),
            Some(Err(_)) => {
                tracing::warn!(role = ?row.role, count = row.count, "Ignoring users with unknown role")
            }
        }
    }
    breakdown
}

/// Total users for the role/search restriction, and how many of them fall in the recent window.
pub async fn summary(db: &Database, filter: &UserFilter) -> Result<SummaryMetrics, AppError> {
    let users = db::users(db);
    let total_match = filter.without_range().to_match();
    let recent_match = recent_window(filter, Utc::now()).to_match();

    let (total_users, last_7_days) = tokio::try_join!(
        async { users.count_documents(total_match).await },
        async { users.count_documents(recent_match).await },
    )?;

    Ok(SummaryMetrics {
        total_users,
        last_7_days,
    })
}

/// Daily signup counts, ascending by day, without zero-filled gaps.
pub async fn trends(
    db: &Database,
    filter: &UserFilter,
    days: i64,
) -> Result<Vec<TrendPoint>, AppError> {
    let window = trend_window(filter, days, Utc::now());
    let rows: Vec<Document> = db::users(db)
        .aggregate(trend_pipeline(&window))
        .await?
        .try_collect()
        .await?;

    rows.into_iter().map(decode::<TrendPoint>).collect()
}

pub async fn role_breakdown(db: &Database, filter: &UserFilter) -> Result<RoleBreakdown, AppError> {
    let rows: Vec<Document> = db::users(db)
        .aggregate(role_pipeline(filter))
        .await?
        .try_collect()
        .await?;

    let rows = rows
        .into_iter()
        .map(decode::<RoleRow>)
        .collect::<Result<Vec<_>, _>>()?;
    let breakdown = breakdown_from_rows(rows);
    tracing::debug!(total = breakdown.total(), "Role breakdown computed");
    Ok(breakdown)
}

/// Newest matching users, projected to the fields the feed shows.
pub async fn recent_users(
    db: &Database,
    filter: &UserFilter,
    limit: i64,
) -> Result<Vec<RecentUserResponse>, AppError> {
    let cursor = db::users(db)
        .clone_with_type::<RecentUser>()
        .find(filter.to_match())
        .projection(RecentUser::projection())
        .sort(doc! { "createdAt": -1 })
        .limit(limit)
        .await?;
    let users: Vec<RecentUser> = cursor.try_collect().await?;
    Ok(users.into_iter().map(RecentUserResponse::from).collect())
}
