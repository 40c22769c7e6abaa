use async_trait::async_trait;

use crate::profile::LinkedProfile;
use crate::userdb::{LocalUser, UserSearchField};

use super::errors::StoreError;

/// Persistence for local users and their linked profiles.
///
/// Implementations must reject a second profile with the same
/// `(provider, identifier)` by returning [`StoreError::Conflict`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<LocalUser>, StoreError> {
        self.find_user_by(UserSearchField::Id(id.to_string())).await
    }

    /// Oldest user matching the field exactly
    async fn find_user_by(&self, field: UserSearchField) -> Result<Option<LocalUser>, StoreError>;

    async fn get_linked_profile(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError>;

    async fn list_linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, StoreError>;

    /// Insert a profile for a user that already exists
    async fn insert_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError>;

    /// Insert a new user and its first profile atomically.
    ///
    /// On conflict nothing is written.
    async fn insert_user_with_profile(
        &self,
        user: LocalUser,
        profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError>;

    /// Refresh the copied data of an existing profile
    async fn update_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError>;
}
