//! User document, role enum and the DTOs exchanged over the API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Avatar assigned to accounts that never uploaded one.
pub const DEFAULT_AVATAR: &str = "https://avatar.iran.liara.run/public/boy";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
            UserRole::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "teacher" => Ok(UserRole::Teacher),
            "user" => Ok(UserRole::User),
            other => Err(format!(
                "unknown role '{other}', expected one of: admin, teacher, user"
            )),
        }
    }
}

/// Presence information embedded in every user document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    #[serde(default)]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<bson::DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_logout_at: Option<bson::DateTime>,
}

/// Full user document as stored in MongoDB (includes password_hash — never serialize to API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Derived from first name and email; stored so that search can match it.
    #[serde(default)]
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub onboard: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

fn default_avatar() -> String {
    DEFAULT_AVATAR.to_string()
}

/// `username` is the first name followed by the first five characters of the email.
pub fn derive_username(first_name: &str, email: &str) -> String {
    let prefix: String = email.chars().take(5).collect();
    format!("{first_name}{prefix}").trim().to_string()
}

impl User {
    /// Build a fresh, verified account with the default role.
    pub fn new(first_name: &str, last_name: &str, email: &str, password_hash: String) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: None,
            avatar: default_avatar(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            username: derive_username(first_name, email),
            email: email.to_string(),
            password_hash,
            bio: String::new(),
            onboard: false,
            verified: true,
            role: UserRole::User,
            status: UserStatus::default(),
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Presence block of [`UserResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub status: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_logout_at: Option<DateTime<Utc>>,
}

/// User response DTO — excludes password_hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub avatar: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub onboard: bool,
    pub verified: bool,
    pub role: UserRole,
    pub status: UserStatusResponse,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        let full_name = u.full_name();
        Self {
            id: u.id.map(|id| id.to_hex()).unwrap_or_default(),
            avatar: u.avatar,
            first_name: u.first_name,
            last_name: u.last_name,
            full_name,
            username: u.username,
            email: u.email,
            bio: u.bio,
            onboard: u.onboard,
            verified: u.verified,
            role: u.role,
            status: UserStatusResponse {
                status: u.status.status,
                last_login_at: u.status.last_login_at.map(|d| d.to_chrono()),
                last_logout_at: u.status.last_logout_at.map(|d| d.to_chrono()),
            },
            last_seen: u.last_seen.map(|d| d.to_chrono()),
            created_at: u.created_at.to_chrono(),
            updated_at: u.updated_at.to_chrono(),
        }
    }
}

/// Projection of a user shown in the dashboard "recent users" feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_avatar")]
    pub avatar: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: bson::DateTime,
}

impl RecentUser {
    /// Fields fetched for the feed.
    pub fn projection() -> Document {
        doc! {
            "email": 1,
            "firstName": 1,
            "lastName": 1,
            "avatar": 1,
            "role": 1,
            "createdAt": 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<RecentUser> for RecentUserResponse {
    fn from(u: RecentUser) -> Self {
        Self {
            id: u.id.to_hex(),
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            avatar: u.avatar,
            role: u.role,
            created_at: u.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Self-service profile changes. Unknown fields are ignored, so only these
/// four can ever be written through `PUT /v1/users/me`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.avatar.is_none()
            && self.bio.is_none()
    }

    /// `$set` payload for the present fields. `email` is needed to re-derive
    /// the username when the first name changes.
    pub fn set_document(&self, email: &str) -> Document {
        let mut set = Document::new();
        if let Some(first_name) = &self.first_name {
            set.insert("firstName", first_name.as_str());
            set.insert("username", derive_username(first_name, email));
        }
        if let Some(last_name) = &self.last_name {
            set.insert("lastName", last_name.as_str());
        }
        if let Some(avatar) = &self.avatar {
            set.insert("avatar", avatar.as_str());
        }
        if let Some(bio) = &self.bio {
            set.insert("bio", bio.as_str());
        }
        set.insert("updatedAt", bson::DateTime::now());
        set
    }
}

/// Admin-only changes to role and active status.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminUpdateUser {
    pub role: Option<UserRole>,
    pub status: Option<bool>,
}

impl AdminUpdateUser {
    pub fn set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(role) = self.role {
            set.insert("role", role.as_str());
        }
        if let Some(status) = self.status {
            set.insert("status.status", status);
        }
        set.insert("updatedAt", bson::DateTime::now());
        set
    }
}
