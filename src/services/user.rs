//! User persistence: lookups, profile updates and admin listings.

use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Database;

use crate::db;
use crate::errors::AppError;
use crate::models::filter::UserFilter;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user::{AdminUpdateUser, UpdateProfile, User};

/// Upper bound for the unpaginated admin listing.
const ADMIN_LIST_LIMIT: i64 = 200;

/// MongoDB server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

fn parse_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::NotFound("User not found".to_string()))
}

/// Insert a new user and return it with its generated id.
pub async fn create(db: &Database, mut user: User) -> Result<User, AppError> {
    let result = db::users(db).insert_one(&user).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    user.id = result.inserted_id.as_object_id();
    Ok(user)
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, AppError> {
    Ok(db::users(db).find_one(doc! { "email": email }).await?)
}

pub async fn find_by_object_id(db: &Database, id: ObjectId) -> Result<User, AppError> {
    db::users(db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Apply self-service profile changes and return the updated user.
pub async fn update_profile(
    db: &Database,
    id: ObjectId,
    changes: &UpdateProfile,
) -> Result<User, AppError> {
    let current = find_by_object_id(db, id).await?;
    if changes.is_empty() {
        return Ok(current);
    }

    db::users(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": changes.set_document(&current.email) },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Point the user's avatar at an uploaded file.
pub async fn set_avatar(db: &Database, id: ObjectId, url: &str) -> Result<User, AppError> {
    let changes = UpdateProfile {
        avatar: Some(url.to_string()),
        ..Default::default()
    };
    update_profile(db, id, &changes).await
}

/// Stamp a successful login on the user's presence block.
pub async fn record_login(db: &Database, id: ObjectId) -> Result<(), AppError> {
    let now = bson::DateTime::now();
    db::users(db)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "status.lastLoginAt": now, "lastSeen": now } },
        )
        .await?;
    Ok(())
}

pub async fn record_logout(db: &Database, id: ObjectId) -> Result<(), AppError> {
    db::users(db)
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "status.lastLogoutAt": bson::DateTime::now() } },
        )
        .await?;
    Ok(())
}

/// Newest users first, capped at 200.
pub async fn list_users(db: &Database) -> Result<Vec<User>, AppError> {
    let cursor = db::users(db)
        .find(doc! {})
        .sort(doc! { "createdAt": -1 })
        .limit(ADMIN_LIST_LIMIT)
        .await?;
    Ok(cursor.try_collect().await?)
}

/// Filtered listing sorted by creation time descending.
pub async fn list_paginated(
    db: &Database,
    filter: &UserFilter,
    pagination: &Pagination,
) -> Result<PagedResult<User>, AppError> {
    let users = db::users(db);
    let matcher = filter.to_match();

    let page = async {
        let cursor = users
            .find(matcher.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(pagination.offset())
            .limit(pagination.limit())
            .await?;
        cursor.try_collect::<Vec<User>>().await
    };
    let total = async { users.count_documents(matcher.clone()).await };

    let (items, total) = tokio::try_join!(page, total)?;
    let total = i64::try_from(total).unwrap_or(i64::MAX);

    Ok(PagedResult::new(items, total, pagination))
}

/// Admin change of role and/or active status.
pub async fn update_role_status(
    db: &Database,
    id: &str,
    changes: &AdminUpdateUser,
) -> Result<User, AppError> {
    let id = parse_id(id)?;
    db::users(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes.set_document() })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn count(db: &Database) -> Result<u64, AppError> {
    Ok(db::users(db).count_documents(doc! {}).await?)
}
