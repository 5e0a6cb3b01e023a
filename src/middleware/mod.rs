//! Request extractors: authentication, role checks and validated input.

pub mod auth;
pub mod rbac;
pub mod validated;
