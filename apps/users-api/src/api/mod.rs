//! API routes module
//!
//! Routes declare whether they are public or protected right here, at
//! registration time: protected routers get the JWT guard layered on before
//! they are nested, so a handler can never be wired up with the wrong
//! exposure by accident.

pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new()
        // Protected: every /users endpoint requires a valid JWT
        .nest("/users", users::router(state))
        // Public: readiness probes carry no credentials
        .merge(health::router(state.clone()))
}
