//! User Service - Business logic layer

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, UpdateUser, User, UserPage, UserPatch, UserResponse};
use crate::repository::UserRepository;

/// Hard cap on page size, regardless of what the client asks for
const MAX_PAGE_SIZE: i64 = 100;

/// User service providing business logic operations
///
/// The service layer handles validation, password hashing, email uniqueness,
/// and pagination math, and orchestrates repository operations.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user
    #[instrument(skip(self, input), fields(user_email = %input.email))]
    pub async fn create(&self, input: CreateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        // Application-level check for a friendly error; the unique partial
        // index on email is the real guarantee under concurrency
        if self
            .repository
            .find_active_by_email(input.email.clone())
            .await?
            .is_some()
        {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(input.name, input.email, password_hash);

        self.repository.insert(user).await
    }

    /// Get an active user by ID
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .find_active_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Get an active user by email
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: String) -> UserResult<User> {
        self.repository
            .find_active_by_email(email.clone())
            .await?
            .ok_or(UserError::EmailNotFound(email))
    }

    /// List active users, one page at a time.
    ///
    /// Out-of-range inputs are clamped rather than rejected: pages below 1
    /// become page 1, page sizes are forced into `1..=100`. A page past the
    /// end yields an empty result set with the real `total_pages`.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        page: i64,
        page_size: i64,
        name: Option<String>,
    ) -> UserResult<UserPage> {
        let current_page = page.max(1);
        let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
        // Saturate rather than overflow for absurd page numbers; such pages
        // are far past the end and yield an empty result set either way
        let skip = (current_page - 1).saturating_mul(per_page) as u64;

        let users = self
            .repository
            .find_active(name.clone(), skip, per_page)
            .await?;
        let total = self.repository.count_active(name).await?;
        let total_pages = total.div_ceil(per_page as u64);

        Ok(UserPage {
            results: users.into_iter().map(UserResponse::from).collect(),
            current_page,
            per_page,
            total_pages,
        })
    }

    /// Update an active user
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        if input.is_empty() {
            return Err(UserError::Validation(
                "At least one field must be provided".to_string(),
            ));
        }

        // Reject an email already held by a different active user
        if let Some(ref email) = input.email {
            if let Some(existing) = self.repository.find_active_by_email(email.clone()).await? {
                if existing.id != id {
                    return Err(UserError::DuplicateEmail(email.clone()));
                }
            }
        }

        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        let patch = UserPatch {
            name: input.name,
            email: input.email,
            password_hash,
            updated_at: Utc::now(),
        };

        self.repository
            .update_active(id, patch)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Soft-delete an active user, returning the retired record.
    ///
    /// Deleting a user twice fails with NotFound: the first deletion removed
    /// it from the active set.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .soft_delete(id, Utc::now())
            .await?
            .ok_or(UserError::NotFound(id))
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;

    fn sample_create() -> CreateUser {
        CreateUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "correct horse battery".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active_by_email().returning(|_| Ok(None));
        repo.expect_insert().returning(Ok);

        let service = UserService::new(repo);
        let user = service.create(sample_create()).await.unwrap();

        assert_ne!(user.password_hash, "correct horse battery");
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(user.is_active());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active_by_email().returning(|email| {
            Ok(Some(User::new(
                "Existing".to_string(),
                email,
                "$argon2id$...".to_string(),
            )))
        });

        let service = UserService::new(repo);
        let err = service.create(sample_create()).await.unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let service = UserService::new(MockUserRepository::new());
        let err = service
            .create(CreateUser {
                email: "not-an-email".to_string(),
                ..sample_create()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_find_by_id_missing_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active_by_id().returning(|_| Ok(None));

        let service = UserService::new(repo);
        let id = Uuid::now_v7();
        let err = service.find_by_id(id).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_find_all_clamps_page_and_size() {
        let mut repo = MockUserRepository::new();
        // page 0 / size -5 must reach the repository as skip 0 / limit 1
        repo.expect_find_active()
            .withf(|name, skip, limit| name.is_none() && *skip == 0 && *limit == 1)
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count_active().returning(|_| Ok(5));

        let service = UserService::new(repo);
        let page = service.find_all(0, -5, None).await.unwrap();

        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.total_pages, 5);
    }

    #[tokio::test]
    async fn test_find_all_huge_page_saturates_skip() {
        let mut repo = MockUserRepository::new();
        // (i64::MAX - 1) * 2 saturates instead of overflowing
        repo.expect_find_active()
            .withf(|_, skip, limit| *skip == i64::MAX as u64 && *limit == 2)
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count_active().returning(|_| Ok(3));

        let service = UserService::new(repo);
        let page = service.find_all(i64::MAX, 2, None).await.unwrap();

        assert!(page.results.is_empty());
        assert_eq!(page.current_page, i64::MAX);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_find_all_caps_page_size() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active()
            .withf(|_, _, limit| *limit == 100)
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count_active().returning(|_| Ok(0));

        let service = UserService::new(repo);
        let page = service.find_all(1, 5000, None).await.unwrap();

        assert_eq!(page.per_page, 100);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_find_all_rounds_total_pages_up() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active()
            .withf(|_, skip, limit| *skip == 10 && *limit == 10)
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count_active().returning(|_| Ok(25));

        let service = UserService::new(repo);
        let page = service.find_all(2, 10, None).await.unwrap();

        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_patch() {
        let service = UserService::new(MockUserRepository::new());
        let err = service
            .update(Uuid::now_v7(), UpdateUser::default())
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_email_of_other_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_active_by_email().returning(|email| {
            Ok(Some(User::new(
                "Other".to_string(),
                email,
                "$argon2id$...".to_string(),
            )))
        });

        let service = UserService::new(repo);
        let err = service
            .update(
                Uuid::now_v7(),
                UpdateUser {
                    email: Some("taken@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn test_update_allows_keeping_own_email() {
        let id = Uuid::now_v7();
        let mut owner = User::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "$argon2id$...".to_string(),
        );
        owner.id = id;

        let mut repo = MockUserRepository::new();
        let found = owner.clone();
        repo.expect_find_active_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_update_active()
            .returning(move |_, patch| {
                let mut updated = owner.clone();
                updated.updated_at = Some(patch.updated_at);
                Ok(Some(updated))
            });

        let service = UserService::new(repo);
        let updated = service
            .update(
                id,
                UpdateUser {
                    email: Some("alice@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_soft_delete().returning(|_, _| Ok(None));

        let service = UserService::new(repo);
        let err = service.remove(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound(_)));
    }
}
