//! Shared helpers for unit tests across the crate
//!
//! Stores that misbehave on purpose live here so the linker and the login
//! flow can be driven into their conflict and failure branches.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

use crate::capability::{ProviderClient, ProviderError, SessionError, SessionLogin};
use crate::profile::{LinkedProfile, ThirdPartyProfile};
use crate::storage::{DataStoreConfig, DataStoreKind, IdentityStore, MemoryStore, SqlStore, StoreError};
use crate::userdb::{LocalUser, UserSearchField};

/// Fresh, initialized SQLite store living only in memory
pub(crate) async fn sqlite_memory_store() -> SqlStore {
    let config = DataStoreConfig::new(DataStoreKind::Sqlite, "sqlite::memory:");
    let store = SqlStore::from_config(&config).expect("sqlite pool should open");
    store.init().await.expect("tables should be created");
    store
}

/// Delegates to `inner`, but holds the first `parties` lookups that find no
/// linked profile at a barrier until all of them have looked.
pub(crate) struct RaceStore {
    inner: Arc<dyn IdentityStore>,
    barrier: Barrier,
    parties: usize,
    misses: AtomicUsize,
}

impl RaceStore {
    pub(crate) fn new(inner: Arc<dyn IdentityStore>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            misses: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityStore for RaceStore {
    async fn find_user_by(&self, field: UserSearchField) -> Result<Option<LocalUser>, StoreError> {
        self.inner.find_user_by(field).await
    }

    async fn get_linked_profile(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError> {
        let found = self.inner.get_linked_profile(provider, identifier).await?;
        if found.is_none() && self.misses.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn list_linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, StoreError> {
        self.inner.list_linked_profiles(user_id).await
    }

    async fn insert_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        self.inner.insert_linked_profile(profile).await
    }

    async fn insert_user_with_profile(
        &self,
        user: LocalUser,
        profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError> {
        self.inner.insert_user_with_profile(user, profile).await
    }

    async fn update_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        self.inner.update_linked_profile(profile).await
    }
}

/// Empty store that rejects every insert as a duplicate
pub(crate) struct ConflictStore {
    inner: MemoryStore,
}

impl ConflictStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
        }
    }
}

#[async_trait]
impl IdentityStore for ConflictStore {
    async fn find_user_by(&self, field: UserSearchField) -> Result<Option<LocalUser>, StoreError> {
        self.inner.find_user_by(field).await
    }

    async fn get_linked_profile(
        &self,
        provider: &str,
        identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError> {
        self.inner.get_linked_profile(provider, identifier).await
    }

    async fn list_linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, StoreError> {
        self.inner.list_linked_profiles(user_id).await
    }

    async fn insert_linked_profile(
        &self,
        _profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        Err(StoreError::Conflict("duplicate".to_string()))
    }

    async fn insert_user_with_profile(
        &self,
        _user: LocalUser,
        _profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError> {
        Err(StoreError::Conflict("duplicate".to_string()))
    }

    async fn update_linked_profile(
        &self,
        profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        self.inner.update_linked_profile(profile).await
    }
}

/// Store whose backend is unreachable
pub(crate) struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Storage("connection refused".to_string())
}

#[async_trait]
impl IdentityStore for FailingStore {
    async fn find_user_by(&self, _field: UserSearchField) -> Result<Option<LocalUser>, StoreError> {
        Err(unavailable())
    }

    async fn get_linked_profile(
        &self,
        _provider: &str,
        _identifier: &str,
    ) -> Result<Option<LinkedProfile>, StoreError> {
        Err(unavailable())
    }

    async fn list_linked_profiles(&self, _user_id: &str) -> Result<Vec<LinkedProfile>, StoreError> {
        Err(unavailable())
    }

    async fn insert_linked_profile(
        &self,
        _profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        Err(unavailable())
    }

    async fn insert_user_with_profile(
        &self,
        _user: LocalUser,
        _profile: LinkedProfile,
    ) -> Result<(LocalUser, LinkedProfile), StoreError> {
        Err(unavailable())
    }

    async fn update_linked_profile(
        &self,
        _profile: LinkedProfile,
    ) -> Result<LinkedProfile, StoreError> {
        Err(unavailable())
    }
}

/// Provider client returning canned results and counting calls
#[derive(Default)]
pub(crate) struct MockProvider {
    profile: Option<ThirdPartyProfile>,
    logout_error: Option<ProviderError>,
    pub(crate) authenticate_calls: AtomicUsize,
    pub(crate) logout_calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn returning(profile: ThirdPartyProfile) -> Self {
        Self {
            profile: Some(profile),
            ..Default::default()
        }
    }

    /// Every authentication is refused
    pub(crate) fn refusing() -> Self {
        Self::default()
    }

    pub(crate) fn with_logout_error(mut self, err: ProviderError) -> Self {
        self.logout_error = Some(err);
        self
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn authenticate(&self, provider: &str) -> Result<ThirdPartyProfile, ProviderError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        self.profile.clone().ok_or_else(|| {
            ProviderError::AuthenticationFailed(format!("{provider} denied access"))
        })
    }

    async fn logout_all(&self) -> Result<(), ProviderError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match &self.logout_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Session that records the logged in user
#[derive(Default)]
pub(crate) struct MockSession {
    pub(crate) current: Mutex<Option<String>>,
    fail_login: bool,
}

impl MockSession {
    pub(crate) fn failing() -> Self {
        Self {
            fail_login: true,
            ..Default::default()
        }
    }

    pub(crate) fn current(&self) -> Option<String> {
        self.current.lock().expect("session lock").clone()
    }
}

#[async_trait]
impl SessionLogin for MockSession {
    async fn login(&self, user_id: &str) -> Result<(), SessionError> {
        if self.fail_login {
            return Err(SessionError::Session("session store unavailable".to_string()));
        }
        *self.current.lock().expect("session lock") = Some(user_id.to_string());
        Ok(())
    }

    async fn logout(&self) -> Result<(), SessionError> {
        *self.current.lock().expect("session lock") = None;
        Ok(())
    }
}
