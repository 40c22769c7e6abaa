mod postgres;
mod sqlite;

use async_trait::async_trait;

use crate::profile::LinkedProfile;
use crate::storage::data_store::{
    DataStore, DataStoreConfig, DataStoreKind, PostgresDataStore, SqliteDataStore,
};
use crate::storage::errors::StoreError;
use crate::storage::traits::IdentityStore;
use crate::userdb::{LocalUser, UserSearchField};

use postgres::*;
use sqlite::*;

/// [`IdentityStore`] backed by SQLite or PostgreSQL through `sqlx`.
///
/// The `(provider, identifier)` uniqueness is a table constraint, so racing
/// writers are caught by the database rather than by this process.
pub struct SqlStore {
    store: Box<dyn DataStore>,
}

impl SqlStore {
    pub fn new(store: Box<dyn DataStore>) -> Self {
        Self { store }
    }

    pub fn from_config(config: &DataStoreConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config.connect()?))
    }

    pub fn from_sqlite_pool(pool: sqlx::SqlitePool) -> Self {
        Self::new(Box::new(SqliteDataStore { pool }))
    }

    pub fn from_postgres_pool(pool: sqlx::PgPool) -> Self {
        Self::new(Box::new(PostgresDataStore { pool }))
    }

    pub fn kind(&self) -> DataStoreKind {
        self.store.kind()
    }

    /// Create the tables if needed and check their schema
    pub async fn init(&self) -> Result<(), StoreError> {
        tracing::debug!(store_type = ?self.kind(), "Creating identity tables");
        match (self.store.as_sqlite(), self.store.as_postgres()) {
            (Some(pool), _) => {
                create_tables_sqlite(pool).await?;
                validate_tables_sqlite(pool).await
            }
            (_, Some(pool)) => {
                create_tables_postgres(pool).await?;
                validate_tables_postgres(pool).await
            }
            _ => Err(unsupported()),
        }
    }
}

fn unsupported() -> StoreError {
    StoreError::Storage("Unsupported database type".to_string())
}

#[async_trait]
impl IdentityStore for SqlStore {
    #[tracing::instrument(skip(self), fields(user_field = %field))]
    async fn find_user_by(&self, field: UserSearchField) -> Result<Option<LocalUser>, StoreError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            find_user_by_field_sqlite(pool, &field).await
        } else if let Some(pool) = self.store.as_postgres() {
            find_user_by_field_postgres(pool, &field).await
        } else {
            Err(unsupported())
        };

        match &result {
            Ok(found) => tracing::debug!(found = found.is_some(), "User lookup completed"),
            Err(e) => tracing::error!(error = %e, "User lookup failed"),
        }

        result
    }

    #[tracing::instrument(skip(self))]
    async fn get_linked_profile(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError> {
        if let Some(pool) = self.store.as_sqlite() {
            get_linked_profile_sqlite(pool, provider, identifier).await
        } else if let Some(pool) = self.store.as_postgres() {
            get_linked_profile_postgres(pool, provider, identifier).await
        } else {
            Err(unsupported())
        }
    }

    async fn list_linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, StoreError> {
        if let Some(pool) = self.store.as_sqlite() {
            list_linked_profiles_sqlite(pool, user_id).await
        } else if let Some(pool) = self.store.as_postgres() {
            list_linked_profiles_postgres(pool, user_id).await
        } else {
            Err(unsupported())
        }
    }

    #[tracing::instrument(skip(self, profile), fields(provider = %profile.provider, user_id = %profile.user_id))]
    async fn insert_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            insert_linked_profile_sqlite(pool, profile).await
        } else if let Some(pool) = self.store.as_postgres() {
            insert_linked_profile_postgres(pool, profile).await
        } else {
            Err(unsupported())
        };

        if let Ok(stored) = &result {
            tracing::info!(profile_id = %stored.id, "Linked profile inserted");
        }
        result
    }

    #[tracing::instrument(skip(self, user, profile), fields(user_id = %user.id, provider = %profile.provider))]
    async fn insert_user_with_profile(
        &self,
        user: LocalUser,
        profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError> {
        let result = if let Some(pool) = self.store.as_sqlite() {
            insert_user_with_profile_sqlite(pool, user, profile).await
        } else if let Some(pool) = self.store.as_postgres() {
            insert_user_with_profile_postgres(pool, user, profile).await
        } else {
            Err(unsupported())
        };

        if let Ok((user, profile)) = &result {
            tracing::info!(
                sequence_number = user.sequence_number,
                profile_id = %profile.id,
                "User and linked profile inserted"
            );
        }
        result
    }

    #[tracing::instrument(skip(self, profile), fields(provider = %profile.provider))]
    async fn update_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        if let Some(pool) = self.store.as_sqlite() {
            update_linked_profile_sqlite(pool, profile).await
        } else if let Some(pool) = self.store.as_postgres() {
            update_linked_profile_postgres(pool, profile).await
        } else {
            Err(unsupported())
        }
    }
}
