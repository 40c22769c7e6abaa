use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::profile::LinkedProfile;
use crate::userdb::{LocalUser, UserSearchField};

use super::errors::StoreError;
use super::traits::IdentityStore;

#[derive(Default)]
struct Tables {
    users: HashMap<String, LocalUser>,
    profiles: HashMap<(String, String), LinkedProfile>,
    last_sequence_number: i64,
}

impl Tables {
    fn insert_user(&mut self, mut user: LocalUser) -> Result<LocalUser, StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user id {} exists", user.id)));
        }
        self.last_sequence_number += 1;
        user.sequence_number = Some(self.last_sequence_number);
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn check_profile_insert(&self, profile: &LinkedProfile) -> Result<(), StoreError> {
        let key = (profile.provider.clone(), profile.identifier.clone());
        if self.profiles.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "profile {}/{} is already linked",
                profile.provider, profile.identifier
            )));
        }
        if self.profiles.values().any(|p| p.id == profile.id) {
            return Err(StoreError::Conflict(format!(
                "profile id {} exists",
                profile.id
            )));
        }
        Ok(())
    }
}

/// Keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory identity store");
        Self::default()
    }

    /// Number of users and linked profiles currently stored
    pub async fn counts(&self) -> (usize, usize) {
        let tables = self.tables.lock().await;
        (tables.users.len(), tables.profiles.len())
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user_by(&self, field: UserSearchField) -> Result<Option<LocalUser>, StoreError> {
        let tables = self.tables.lock().await;
        let found = match &field {
            UserSearchField::Id(id) => tables.users.get(id).cloned(),
            UserSearchField::Email(email) => tables
                .users
                .values()
                .filter(|u| u.email.as_deref() == Some(email.as_str()))
                .min_by_key(|u| u.sequence_number)
                .cloned(),
            UserSearchField::Account(account) => tables
                .users
                .values()
                .filter(|u| &u.account == account)
                .min_by_key(|u| u.sequence_number)
                .cloned(),
        };
        Ok(found)
    }

    async fn get_linked_profile(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .get(&(provider.to_string(), identifier.to_string()))
            .cloned())
    }

    async fn list_linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, StoreError> {
        let tables = self.tables.lock().await;
        let mut profiles: Vec<LinkedProfile> = tables
            .profiles
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn insert_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&profile.user_id) {
            return Err(StoreError::InvalidData(format!(
                "owner {} does not exist",
                profile.user_id
            )));
        }
        tables.check_profile_insert(&profile)?;
        let key = (profile.provider.clone(), profile.identifier.clone());
        tables.profiles.insert(key, profile.clone());
        Ok(profile)
    }

    async fn insert_user_with_profile(
        &self,
        user: LocalUser,
        profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError> {
        let mut tables = self.tables.lock().await;
        if profile.user_id != user.id {
            return Err(StoreError::InvalidData(format!(
                "profile owner {} does not match user {}",
                profile.user_id, user.id
            )));
        }
        // Check the profile first so a conflict leaves no user behind
        tables.check_profile_insert(&profile)?;
        let user = tables.insert_user(user)?;
        let key = (profile.provider.clone(), profile.identifier.clone());
        tables.profiles.insert(key, profile.clone());
        Ok((user, profile))
    }

    async fn update_linked_profile(
        &self,
        mut profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        let mut tables = self.tables.lock().await;
        let key = (profile.provider.clone(), profile.identifier.clone());
        let stored = tables.profiles.get_mut(&key).ok_or_else(|| {
            StoreError::NotFound(format!(
                "profile {}/{}",
                profile.provider, profile.identifier
            ))
        })?;

        profile.id = stored.id.clone();
        profile.user_id = stored.user_id.clone();
        profile.created_at = stored.created_at;
        profile.updated_at = Utc::now();
        *stored = profile.clone();
        Ok(profile)
    }
}
