use axum::extract::FromRequest;

use crate::error::ApiError;

pub mod lessons;
pub mod srs;

/// JSON request body whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
