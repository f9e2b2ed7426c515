//! Query-string extractor whose rejections are standard error envelopes.

use crate::errors::AppError;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

/// Query-string extractor.
///
/// Behaves like [`axum::extract::Query`], but rejections are [`AppError`]s,
/// so a malformed query string (e.g. `?page=abc` for a numeric field)
/// surfaces as a standard error envelope instead of a plain-text response.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::QueryParams;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Pagination {
///     page: i64,
/// }
///
/// async fn list(QueryParams(pagination): QueryParams<Pagination>) { /* ... */ }
/// ```
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorContext;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Pagination {
        page: i64,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            get(|QueryParams(p): QueryParams<Pagination>| async move { p.page.to_string() }),
        )
    }

    #[tokio::test]
    async fn test_valid_query_passes_through() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/?page=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_query_carries_error_context() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/?page=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        // The normalizer relies on this extension to rewrite the envelope
        assert!(response.extensions().get::<ErrorContext>().is_some());
    }
}
