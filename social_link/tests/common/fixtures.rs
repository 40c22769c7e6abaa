use social_link::{
    DataStoreConfig, DataStoreKind, IdentityStore, LinkedProfile, MemoryStore, SqlStore,
    ThirdPartyProfile,
};
use std::sync::{Arc, Once};

/// Install a test subscriber once; `RUST_LOG` controls the output
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Backends every flow is exercised against
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Sqlite,
}

pub const BACKENDS: [Backend; 2] = [Backend::Memory, Backend::Sqlite];

pub async fn store_for(backend: Backend) -> Arc<dyn IdentityStore> {
    init_tracing();
    match backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Sqlite => Arc::new(sqlite_store().await),
    }
}

pub async fn sqlite_store() -> SqlStore {
    let config = DataStoreConfig::new(DataStoreKind::Sqlite, "sqlite::memory:");
    let store = SqlStore::from_config(&config).expect("Failed to open sqlite pool");
    store.init().await.expect("Failed to create tables");
    store
}

/// Test profile fixtures
pub struct TestProfiles;

impl TestProfiles {
    pub fn alice_facebook() -> ThirdPartyProfile {
        ThirdPartyProfile::new("fb123")
            .with_email("a@x.com")
            .with_attribute("displayName", "Alice")
            .with_attribute("photoURL", "https://img.example/alice.png")
    }

    pub fn alice_linkedin() -> ThirdPartyProfile {
        ThirdPartyProfile::new("li456")
            .with_email("a@x.com")
            .with_attribute("displayName", "Alice A.")
            .with_attribute("headline", "Engineer")
    }

    pub fn anonymous_twitter() -> ThirdPartyProfile {
        ThirdPartyProfile::new("tw789").with_attribute("displayName", "@alice")
    }
}

/// Count the profiles linked under `(provider, identifier)` across `owners`
pub async fn count_links(
    store: &dyn IdentityStore,
    owners: &[String],
    provider: &str,
    identifier: &str,
) -> usize {
    let mut count = 0;
    for owner in owners {
        let profiles: Vec<LinkedProfile> = store
            .list_linked_profiles(owner)
            .await
            .expect("Failed to list profiles");
        count += profiles
            .iter()
            .filter(|p| p.provider == provider && p.identifier == identifier)
            .count();
    }
    count
}
