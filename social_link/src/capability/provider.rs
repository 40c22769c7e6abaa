use async_trait::async_trait;
use thiserror::Error;

use crate::profile::ThirdPartyProfile;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    /// The provider refused or the exchange did not complete
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Performs the OAuth/OpenID exchange with a provider.
///
/// Supplied by the host; the wire protocol never reaches this crate.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Authenticate against `provider` and return the verified profile
    async fn authenticate(&self, provider: &str) -> Result<ThirdPartyProfile, ProviderError>;

    /// End every provider session held for the caller
    async fn logout_all(&self) -> Result<(), ProviderError>;
}
