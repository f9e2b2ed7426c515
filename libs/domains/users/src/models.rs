use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// User entity - represents a user document stored in MongoDB.
///
/// `deleted_at` implements soft deletion: `None` means the user is active,
/// `Some(_)` means the user is retired and invisible to every read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Email address, unique among active users
    pub email: String,
    /// Argon2 password hash, never exposed through the API
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, unset until the first update
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// Plaintext password, hashed before storage
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// DTO for updating an existing user; every field is optional
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}

/// Resolved field changes handed to the repository.
///
/// Built by the service from an [`UpdateUser`]: the plaintext password has
/// already been hashed and the update timestamp stamped.
#[derive(Debug, Clone)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, omits the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Populated only on the response to a delete request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,
    /// Results per page (capped at 100)
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            name: None,
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

/// One page of user results with pagination metadata
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub results: Vec<UserResponse>,
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: u64,
}
