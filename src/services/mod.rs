//! Business logic services.

pub mod auth;
pub mod avatar;
pub mod dashboard;
pub mod user;
