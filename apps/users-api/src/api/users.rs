//! Users API routes
//!
//! This module wires up the users domain to HTTP routes and marks them as
//! protected by layering the JWT guard.

use axum::{Router, middleware};
use axum_helpers::jwt_auth_middleware;
use domain_users::{MongoUserRepository, UserService, handlers};

use crate::state::AppState;

/// Create the users router, guarded by JWT authentication
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoUserRepository::new(state.db.clone());

    // Create the service
    let service = UserService::new(repository);

    // The domain router with the auth guard layered on: requests without a
    // valid token are rejected before any handler runs
    handlers::router(service).layer(middleware::from_fn_with_state(
        state.auth.clone(),
        jwt_auth_middleware,
    ))
}
