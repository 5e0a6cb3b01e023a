//! `Query` and `Json` extractors whose rejections use the API error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// Query-string extractor; malformed parameters become `400 VALIDATION_ERROR`
/// before the handler runs.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

/// JSON body extractor with the same rejection mapping.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);
