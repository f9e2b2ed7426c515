use axum::response::{IntoResponse, Response};

use super::AppError;

/// Handler for 404 Not Found errors.
///
/// Used as the router fallback; the normalizer turns it into the standard
/// envelope with the request path attached.
pub async fn not_found() -> Response {
    AppError::NotFound("The requested resource was not found".to_string()).into_response()
}
