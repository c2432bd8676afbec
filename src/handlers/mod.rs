//! HTTP handlers

use axum::extract::FromRequest;

use crate::AppError;

pub mod health;
pub mod predict;
pub mod model;

/// `Json` extractor whose rejections render as `{error, status}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
