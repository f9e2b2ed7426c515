//! JWT bearer authentication.
//!
//! Routes are public by default; protecting a router is an explicit decision
//! made at registration time by layering [`jwt_auth_middleware`]:
//!
//! ```ignore
//! let protected = domain_router.layer(axum::middleware::from_fn_with_state(
//!     auth.clone(),
//!     jwt_auth_middleware,
//! ));
//! ```

mod config;
mod jwt;
mod middleware;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims, ACCESS_TOKEN_TTL};
pub use middleware::jwt_auth_middleware;
