use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::UserResult;
use crate::models::{User, UserPatch};

/// Repository trait for User persistence
///
/// This trait defines the data access interface for users.
/// Implementations can use different storage backends (MongoDB, etc.)
///
/// "Active" always means `deleted_at` is null; soft-deleted users are
/// invisible to every method except [`soft_delete`](UserRepository::soft_delete)
/// itself, which refuses to touch them a second time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user document
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Get an active user by ID
    async fn find_active_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// List active users, optionally filtered by a case-insensitive name
    /// substring, newest first
    async fn find_active(
        &self,
        name: Option<String>,
        skip: u64,
        limit: i64,
    ) -> UserResult<Vec<User>>;

    /// Count active users matching the same filter as `find_active`
    async fn count_active(&self, name: Option<String>) -> UserResult<u64>;

    /// Apply a patch to an active user, returning the updated document.
    /// `None` means no active user with that ID exists.
    async fn update_active(&self, id: Uuid, patch: UserPatch) -> UserResult<Option<User>>;

    /// Stamp `deleted_at` on an active user, returning the retired document.
    /// `None` means no active user with that ID exists (including users
    /// already soft-deleted).
    async fn soft_delete(&self, id: Uuid, deleted_at: DateTime<Utc>) -> UserResult<Option<User>>;

    /// Get an active user by exact email
    async fn find_active_by_email(&self, email: String) -> UserResult<Option<User>>;
}
