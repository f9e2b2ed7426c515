pub mod envelope;
pub mod handlers;
pub mod responses;

pub use envelope::{normalize_errors, NormalizerConfig};

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Error as UuidError;
use validator::ValidationErrors;

/// Failure category reported to clients in the error envelope.
///
/// - `database-error`: the failure originated in the persistence layer
/// - `http-error`: a structured failure with an explicit HTTP status
/// - `default-error`: anything else (unclassified internal failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    HttpError,
    DatabaseError,
    DefaultError,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::HttpError => "http-error",
            ErrorCategory::DatabaseError => "database-error",
            ErrorCategory::DefaultError => "default-error",
        }
    }
}

/// Uniform JSON envelope returned for every failed request.
///
/// # JSON Example
///
/// ```json
/// {
///   "statusCode": 404,
///   "type": "http-error",
///   "message": "User 0193... not found",
///   "timestamp": "2025-01-01T00:00:00Z",
///   "path": "/api/users/0193..."
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// HTTP status code of the failure
    pub status_code: u16,
    /// Failure category tag
    #[serde(rename = "type")]
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// ISO-8601 timestamp of when the failure was rendered
    pub timestamp: String,
    /// Request path that produced the failure
    pub path: String,
    /// Structured failure data (validation field errors etc.).
    /// Only emitted in development; suppressed in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Classified failure carried through response extensions so the
/// [`normalize_errors`] middleware can render the final envelope with the
/// request path attached.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub status: StatusCode,
    pub category: ErrorCategory,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
///
/// Every variant carries an explicit classification, so the boundary
/// normalizer never has to guess from an opaque error object.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query extraction error: {0}")]
    QueryExtractorRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("UUID error: {0}")]
    UuidError(#[from] UuidError),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Classify the error into status/category/message/details.
    fn into_context(self) -> ErrorContext {
        match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!("JSON extraction error: {:?}", e);
                ErrorContext {
                    status: e.status(),
                    category: ErrorCategory::HttpError,
                    message: e.body_text(),
                    details: None,
                }
            }
            AppError::QueryExtractorRejection(e) => {
                tracing::warn!("Query extraction error: {:?}", e);
                ErrorContext {
                    status: e.status(),
                    category: ErrorCategory::HttpError,
                    message: e.body_text(),
                    details: None,
                }
            }
            AppError::ValidationError(e) => {
                tracing::info!("Validation error: {:?}", e);
                ErrorContext {
                    status: StatusCode::BAD_REQUEST,
                    category: ErrorCategory::HttpError,
                    message: "Request validation failed".to_string(),
                    details: serde_json::to_value(&e).ok(),
                }
            }
            AppError::UuidError(e) => {
                tracing::warn!("UUID error: {:?}", e);
                ErrorContext {
                    status: StatusCode::BAD_REQUEST,
                    category: ErrorCategory::HttpError,
                    message: "Invalid UUID format".to_string(),
                    details: None,
                }
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                ErrorContext {
                    status: StatusCode::BAD_REQUEST,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                ErrorContext {
                    status: StatusCode::UNAUTHORIZED,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                ErrorContext {
                    status: StatusCode::FORBIDDEN,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::NotFound(msg) => {
                tracing::info!("Not found: {}", msg);
                ErrorContext {
                    status: StatusCode::NOT_FOUND,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                ErrorContext {
                    status: StatusCode::CONFLICT,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::info!("Unprocessable entity: {}", msg);
                ErrorContext {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ErrorContext {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    category: ErrorCategory::DatabaseError,
                    message: msg,
                    details: None,
                }
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                ErrorContext {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    category: ErrorCategory::DefaultError,
                    message: msg,
                    details: None,
                }
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                ErrorContext {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    category: ErrorCategory::HttpError,
                    message: msg,
                    details: None,
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let context = self.into_context();

        // Render a complete envelope immediately so the response is valid even
        // without the normalizer layer (unit tests, bare routers). The
        // normalizer rewrites it with the request path and detail policy.
        let body = Json(ErrorEnvelope {
            status_code: context.status.as_u16(),
            category: context.category,
            message: context.message.clone(),
            timestamp: Utc::now().to_rfc3339(),
            path: String::new(),
            details: context.details.clone(),
        });

        let mut response = (context.status, body).into_response();
        response.extensions_mut().insert(context);
        response
    }
}
