//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, to_bson},
    options::{IndexOptions, ReturnDocument},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserPatch};
use crate::repository::UserRepository;

const COLLECTION_NAME: &str = "users";

/// MongoDB server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository
    ///
    /// # Arguments
    /// * `db` - MongoDB database instance
    ///
    /// # Example
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let db = client.database("mydb");
    /// let repo = MongoUserRepository::new(db);
    /// ```
    pub fn new(db: Database) -> Self {
        let collection = db.collection::<User>(COLLECTION_NAME);
        Self { collection }
    }

    /// Create a new MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Build the filter shared by every read/update path.
    ///
    /// `deleted_at: null` matches both an explicit null and a missing field,
    /// so documents written before the soft-delete column existed stay
    /// visible.
    fn active_filter(name: Option<&str>) -> Document {
        let mut filter = doc! { "deleted_at": Bson::Null };

        if let Some(name) = name {
            filter.insert("name", doc! { "$regex": name, "$options": "i" });
        }

        filter
    }

    fn active_by_id(id: Uuid) -> Document {
        let mut filter = Self::active_filter(None);
        filter.insert("_id", to_bson(&id).unwrap_or(Bson::Null));
        filter
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        use mongodb::error::{ErrorKind, WriteFailure};
        match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
            ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
            _ => false,
        }
    }
}

/// Create the indexes the users collection relies on.
///
/// Email uniqueness only applies to active documents: the index is partial
/// over `deleted_at: null`, so a retired user's email can be registered
/// again. Partial indexes do not support `$eq: null`, hence the `$type`
/// expression; active documents always carry an explicit null.
pub async fn init_indexes(db: &Database) -> UserResult<()> {
    let collection = db.collection::<User>(COLLECTION_NAME);

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(doc! { "deleted_at": { "$type": "null" } })
                .build(),
        )
        .build();

    collection.create_index(email_index).await?;
    tracing::info!("User indexes created");
    Ok(())
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> UserResult<User> {
        self.collection.insert_one(&user).await.map_err(|e| {
            if Self::is_duplicate_key(&e) {
                UserError::DuplicateEmail(user.email.clone())
            } else {
                e.into()
            }
        })?;

        tracing::info!(user_id = %user.id, "User created successfully");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_active_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let user = self.collection.find_one(Self::active_by_id(id)).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        name: Option<String>,
        skip: u64,
        limit: i64,
    ) -> UserResult<Vec<User>> {
        use futures_util::TryStreamExt;

        let filter = Self::active_filter(name.as_deref());

        let options = mongodb::options::FindOptions::builder()
            .limit(limit)
            .skip(skip)
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn count_active(&self, name: Option<String>) -> UserResult<u64> {
        let filter = Self::active_filter(name.as_deref());
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    #[instrument(skip(self, patch))]
    async fn update_active(&self, id: Uuid, patch: UserPatch) -> UserResult<Option<User>> {
        let mut set = doc! {
            "updated_at": to_bson(&patch.updated_at).unwrap_or(Bson::Null),
        };
        if let Some(name) = &patch.name {
            set.insert("name", name);
        }
        if let Some(email) = &patch.email {
            set.insert("email", email);
        }
        if let Some(password_hash) = &patch.password_hash {
            set.insert("password_hash", password_hash);
        }

        let updated = self
            .collection
            .find_one_and_update(Self::active_by_id(id), doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| {
                if Self::is_duplicate_key(&e) {
                    match patch.email {
                        Some(email) => UserError::DuplicateEmail(email),
                        None => e.into(),
                    }
                } else {
                    e.into()
                }
            })?;

        if updated.is_some() {
            tracing::info!(user_id = %id, "User updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: Uuid, deleted_at: DateTime<Utc>) -> UserResult<Option<User>> {
        // The active filter makes this a no-op for already-deleted users, so
        // the original deletion timestamp is never overwritten
        let retired = self
            .collection
            .find_one_and_update(
                Self::active_by_id(id),
                doc! { "$set": { "deleted_at": to_bson(&deleted_at).unwrap_or(Bson::Null) } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if retired.is_some() {
            tracing::info!(user_id = %id, "User soft-deleted");
        }
        Ok(retired)
    }

    #[instrument(skip(self))]
    async fn find_active_by_email(&self, email: String) -> UserResult<Option<User>> {
        let mut filter = Self::active_filter(None);
        filter.insert("email", email);
        let user = self.collection.find_one(filter).await?;
        Ok(user)
    }
}
