//! Global error normalization middleware.
//!
//! Every failure produced anywhere in the request pipeline (guards, handlers,
//! the 404 fallback) is rendered by [`AppError::into_response`], which tags
//! the response with an [`ErrorContext`] extension. This middleware is the
//! single place the client-visible envelope is finalized: it attaches the
//! request path and timestamp, and applies the detail-exposure policy.
//!
//! Responses without an `ErrorContext` pass through untouched, so a body that
//! has already been rendered is never overwritten.

use super::{ErrorContext, ErrorEnvelope};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use core_config::Environment;

/// Policy knobs for the error normalizer.
#[derive(Clone, Debug)]
pub struct NormalizerConfig {
    /// Whether `details` (raw failure data) is included in envelopes.
    /// Enabled in development, disabled in production to avoid leaking
    /// internal state to clients.
    pub expose_details: bool,
}

impl NormalizerConfig {
    pub fn from_environment(environment: &Environment) -> Self {
        Self {
            expose_details: environment.is_development(),
        }
    }
}

/// Rewrite classified error responses into the uniform envelope.
///
/// Layer with `axum::middleware::from_fn_with_state`; `create_router` does
/// this for the whole application.
pub async fn normalize_errors(
    State(config): State<NormalizerConfig>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let Some(context) = response.extensions_mut().remove::<ErrorContext>() else {
        return response;
    };

    let envelope = ErrorEnvelope {
        status_code: context.status.as_u16(),
        category: context.category,
        message: context.message,
        timestamp: Utc::now().to_rfc3339(),
        path,
        details: if config.expose_details {
            context.details
        } else {
            None
        },
    };

    match serde_json::to_vec(&envelope) {
        Ok(body) => Response::builder()
            .status(context.status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|e| fallback_response(&e)),
        Err(e) => fallback_response(&e),
    }
}

/// Last-resort response when envelope construction itself fails.
/// A minimal 500 is always produced, never a silent no-op.
fn fallback_response(error: &dyn std::fmt::Display) -> Response {
    tracing::error!("Failed to render error envelope: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use axum::{body::to_bytes, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn db_failure() -> Result<&'static str, AppError> {
        Err(AppError::Database("connection reset by peer".to_string()))
    }

    async fn missing_user() -> Result<&'static str, AppError> {
        Err(AppError::NotFound("User 42 not found".to_string()))
    }

    async fn ok_handler() -> &'static str {
        "ok"
    }

    fn app(expose_details: bool) -> Router {
        Router::new()
            .route("/boom", get(db_failure))
            .route("/missing", get(missing_user))
            .route("/ok", get(ok_handler))
            .layer(middleware::from_fn_with_state(
                NormalizerConfig { expose_details },
                normalize_errors,
            ))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_database_failure_envelope() {
        let response = app(false)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/boom")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["type"], "database-error");
        assert_eq!(json["path"], "/boom");
        assert!(!json["message"].as_str().unwrap().is_empty());
        assert!(!json["timestamp"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_envelope_has_path_and_type() {
        let response = app(false)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["type"], "http-error");
        assert_eq!(json["path"], "/missing");
        assert!(json["message"].as_str().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn test_successful_response_passes_through() {
        let response = app(false)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_details_suppressed_in_production_mode() {
        async fn invalid() -> Result<&'static str, AppError> {
            let mut errors = validator::ValidationErrors::new();
            errors.add("email", validator::ValidationError::new("email"));
            Err(AppError::ValidationError(errors))
        }

        for (expose, expect_details) in [(true, true), (false, false)] {
            let router = Router::new().route("/invalid", get(invalid)).layer(
                middleware::from_fn_with_state(
                    NormalizerConfig {
                        expose_details: expose,
                    },
                    normalize_errors,
                ),
            );

            let response = router
                .oneshot(
                    axum::http::Request::builder()
                        .uri("/invalid")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let json = body_json(response).await;
            assert_eq!(json["statusCode"], 400);
            assert_eq!(json.get("details").is_some(), expect_details);
        }
    }
}
