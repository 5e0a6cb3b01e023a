//! Authentication service: password hashing, JWT, registration and login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::{RegisterUser, User, UserRole};
use crate::services::user as user_service;

/// JWT claims carried by the session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Hex object id of the user.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

/// Hash a plaintext password with argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Sign a session token for `user`.
pub fn issue_token(user: &User, jwt_secret: &str, expiry_secs: i64) -> Result<String, AppError> {
    let id = user
        .id
        .ok_or_else(|| AppError::Internal("Cannot issue a token for an unsaved user".to_string()))?;
    let now = Utc::now();
    let claims = Claims {
        sub: id.to_hex(),
        email: user.email.clone(),
        role: user.role,
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Create an account and sign its first token.
pub async fn register(
    db: &Database,
    input: &RegisterUser,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<(User, String), AppError> {
    if user_service::find_by_email(db, &input.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&input.password)?;
    let user = User::new(
        input.first_name.as_deref().unwrap_or_default(),
        input.last_name.as_deref().unwrap_or_default(),
        &input.email,
        password_hash,
    );
    let user = user_service::create(db, user).await?;
    let token = issue_token(&user, jwt_secret, expiry_secs)?;

    tracing::info!(user_id = %user.id.map(|id| id.to_hex()).unwrap_or_default(), "User registered");
    Ok((user, token))
}

/// Authenticate by email and password, returning the user and a fresh token.
pub async fn login(
    db: &Database,
    email: &str,
    password: &str,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<(User, String), AppError> {
    let user = user_service::find_by_email(db, email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::debug!(email = %email, "Rejected login: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let id = user
        .id
        .ok_or_else(|| AppError::Internal("Stored user without _id".to_string()))?;
    user_service::record_login(db, id).await?;

    let token = issue_token(&user, jwt_secret, expiry_secs)?;
    Ok((user, token))
}

/// Re-read the user behind a valid token and sign a replacement.
pub async fn refresh_token(
    db: &Database,
    user_id: ObjectId,
    jwt_secret: &str,
    expiry_secs: i64,
) -> Result<String, AppError> {
    let user = user_service::find_by_object_id(db, user_id).await?;
    issue_token(&user, jwt_secret, expiry_secs)
}
