//! social-link - Map third-party login profiles onto local user accounts
//!
//! Given a verified profile from an OAuth/OpenID provider, this crate finds
//! the local user it belongs to: the user already linked to that identity,
//! otherwise a user with the same email, otherwise a newly created one. The
//! provider exchange and the session are supplied by the host through the
//! [`ProviderClient`] and [`SessionLogin`] traits; users and linked profiles
//! are persisted through [`IdentityStore`].

mod capability;
mod config;
mod coordination;
mod profile;
mod storage;
mod userdb;
mod utils;

#[cfg(test)]
mod test_utils;

pub use capability::{ProviderClient, ProviderError, SessionError, SessionLogin};

pub use config::{
    ConfigError, DefaultValue, DeriveFn, FieldMapping, LinkerConfig, LinkerConfigBuilder,
    UserDefault, UserField, UserMatchField,
};

pub use coordination::{IdentityLinker, LinkError, LinkOutcome, LinkedIdentity, SocialAuth};

pub use profile::{DISPLAY_NAME_ATTRIBUTE, LinkedProfile, PHOTO_URL_ATTRIBUTE, ThirdPartyProfile};

pub use storage::{
    DataStore, DataStoreConfig, DataStoreKind, IdentityStore, MemoryStore, SqlStore, StoreError,
};

pub use userdb::{LocalUser, UserSearchField};

/// Open and initialize the SQL store configured by `GENERIC_DATA_STORE_TYPE`
/// and `GENERIC_DATA_STORE_URL`
pub async fn init() -> Result<SqlStore, Box<dyn std::error::Error + Send + Sync>> {
    let config = DataStoreConfig::from_env()?;
    let store = SqlStore::from_config(&config)?;
    store.init().await?;
    Ok(store)
}
