//! Error types for identity linking

use thiserror::Error;

use crate::capability::{ProviderError, SessionError};
use crate::storage::StoreError;
use crate::utils::UtilError;

/// Errors that can occur while resolving or logging in a social identity
#[derive(Error, Debug, Clone)]
pub enum LinkError {
    /// The provider profile lacks a usable identifier
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Provider not enabled: {0}")]
    ProviderNotEnabled(String),

    /// Propagated from the provider client, never retried
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Provider client failure outside of authentication
    #[error("Provider error: {0}")]
    Provider(String),

    /// Writing (or reading back) the user or linked profile failed
    #[error("Linking failed: {0}")]
    LinkingFailed(String),

    /// Someone else linked the same identity and the retry could not load it
    #[error("Concurrent link conflict: {provider}/{identifier}")]
    ConcurrentLinkConflict {
        provider: String,
        identifier: String,
    },

    #[error("Session error: {0}")]
    Session(SessionError),
}

impl LinkError {
    /// Log the error and return self
    ///
    /// The linker itself never logs failures; hosts that want them in their
    /// logs chain this before handling the error.
    pub fn log(self) -> Self {
        match &self {
            Self::InvalidProfile(msg) => tracing::error!("Invalid profile: {}", msg),
            Self::InvalidProvider(msg) => tracing::error!("Invalid provider: {}", msg),
            Self::ProviderNotEnabled(provider) => {
                tracing::error!("Provider not enabled: {}", provider)
            }
            Self::AuthenticationFailed(msg) => tracing::error!("Authentication failed: {}", msg),
            Self::Provider(msg) => tracing::error!("Provider error: {}", msg),
            Self::LinkingFailed(msg) => tracing::error!("Linking failed: {}", msg),
            Self::ConcurrentLinkConflict {
                provider,
                identifier,
            } => tracing::error!("Concurrent link conflict: {}/{}", provider, identifier),
            Self::Session(err) => tracing::error!("Session error: {}", err),
        }
        self
    }

    pub(crate) fn from_store(context: &str, err: StoreError) -> Self {
        Self::LinkingFailed(format!("{context}: {err}"))
    }
}

impl From<ProviderError> for LinkError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::AuthenticationFailed(msg) => Self::AuthenticationFailed(msg),
            ProviderError::Other(msg) => Self::Provider(msg),
        }
    }
}

impl From<SessionError> for LinkError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<UtilError> for LinkError {
    fn from(err: UtilError) -> Self {
        Self::LinkingFailed(err.to_string())
    }
}
