//! Request extractors whose rejections use the API error envelope.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with rejections rendered as `AppError`.
///
/// A body that is missing, not JSON, or does not match the target type is a
/// 400 `VALIDATION_ERROR`, like any other bad input.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
