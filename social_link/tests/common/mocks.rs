use async_trait::async_trait;
use social_link::{
    IdentityStore, LinkedProfile, LocalUser, ProviderClient, ProviderError, SessionError,
    SessionLogin, StoreError, ThirdPartyProfile, UserSearchField,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Provider client serving one canned profile per provider
#[derive(Default)]
pub struct MockProvider {
    profiles: Mutex<HashMap<String, ThirdPartyProfile>>,
    pub logouts: AtomicUsize,
}

impl MockProvider {
    pub fn with(self, provider: &str, profile: ThirdPartyProfile) -> Self {
        self.set(provider, profile);
        self
    }

    pub fn set(&self, provider: &str, profile: ThirdPartyProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(provider.to_string(), profile);
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn authenticate(&self, provider: &str) -> Result<ThirdPartyProfile, ProviderError> {
        self.profiles
            .lock()
            .unwrap()
            .get(provider)
            .cloned()
            .ok_or_else(|| ProviderError::AuthenticationFailed(format!("user cancelled {provider}")))
    }

    async fn logout_all(&self) -> Result<(), ProviderError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSession {
    current: Mutex<Option<String>>,
}

impl MockSession {
    pub fn current(&self) -> Option<String> {
        self.current.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionLogin for MockSession {
    async fn login(&self, user_id: &str) -> Result<(), SessionError> {
        *self.current.lock().unwrap() = Some(user_id.to_string());
        Ok(())
    }

    async fn logout(&self) -> Result<(), SessionError> {
        *self.current.lock().unwrap() = None;
        Ok(())
    }
}

/// Makes the first `parties` callers that find no linked profile wait for
/// each other, so they all go on to create the same identity
pub struct BarrierStore {
    inner: Arc<dyn IdentityStore>,
    barrier: Barrier,
    parties: usize,
    misses: AtomicUsize,
}

impl BarrierStore {
    pub fn new(inner: Arc<dyn IdentityStore>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            misses: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityStore for BarrierStore {
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
