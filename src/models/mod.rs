//! Document models and DTOs.

pub mod filter;
pub mod pagination;
pub mod user;
