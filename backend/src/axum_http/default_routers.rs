use axum::response::IntoResponse;
use tracing::info;

use crate::axum_http::error_responses::{ApiResponse, AppError};

pub async fn not_found() -> impl IntoResponse {
    info!("backend router: not_found handler invoked");
    AppError::NotFound
}

pub async fn health_check() -> impl IntoResponse {
    ApiResponse::ok("OK")
}
