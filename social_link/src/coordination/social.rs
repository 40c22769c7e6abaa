use std::sync::Arc;

use crate::capability::{ProviderClient, SessionLogin};

use super::errors::LinkError;
use super::linker::{IdentityLinker, LinkedIdentity};

/// Sign-in flow: authenticate with a provider, link the identity, log the
/// resulting user in.
pub struct SocialAuth {
    linker: IdentityLinker,
    provider_client: Arc<dyn ProviderClient>,
    session: Arc<dyn SessionLogin>,
}

impl SocialAuth {
    pub fn new(
        linker: IdentityLinker,
        provider_client: Arc<dyn ProviderClient>,
        session: Arc<dyn SessionLogin>,
    ) -> Self {
        Self {
            linker,
            provider_client,
            session,
        }
    }

    pub fn linker(&self) -> &IdentityLinker {
        &self.linker
    }

    /// Enabled providers, in configuration order
    pub fn providers(&self) -> &[String] {
        &self.linker.config().providers
    }

    pub fn is_enabled(&self, provider: &str) -> bool {
        self.linker.config().is_enabled(provider)
    }

    /// Authenticate against `provider` and log in the linked user.
    ///
    /// Nothing is written when authentication fails, and no session is
    /// started when linking fails.
    #[tracing::instrument(skip(self))]
    pub async fn attempt(&self, provider: &str) -> Result<LinkedIdentity, LinkError> {
        if !self.is_enabled(provider) {
            return Err(LinkError::ProviderNotEnabled(provider.to_string()));
        }

        let profile = self.provider_client.authenticate(provider).await?;
        let linked = self.linker.resolve(provider, &profile).await?;
        self.session.login(&linked.user.id).await?;

        tracing::info!(user_id = %linked.user.id, outcome = ?linked.outcome, "Social login completed");
        Ok(linked)
    }

    /// End every provider session and the local session.
    ///
    /// Both steps always run; the first failure is returned.
    pub async fn logout(&self) -> Result<(), LinkError> {
        let providers = self.provider_client.logout_all().await;
        let session = self.session.logout().await;
        providers?;
        session?;
        Ok(())
    }
}
