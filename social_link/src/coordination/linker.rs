use std::sync::Arc;

use crate::config::{LinkerConfig, UserMatchField};
use crate::profile::{LinkedProfile, ThirdPartyProfile};
use crate::storage::{IdentityStore, StoreError};
use crate::userdb::{LocalUser, UserSearchField};
use crate::utils::gen_random_string;

use super::errors::LinkError;
use super::mapping::build_new_user;

/// Which branch of the resolution produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The identity was already linked; its profile was refreshed
    ExistingIdentity,
    /// The identity was attached to a user found by email
    ExistingUser,
    /// A new user was created for the identity
    NewUser,
}

#[derive(Debug, Clone)]
pub struct LinkedIdentity {
    pub user: LocalUser,
    pub profile: LinkedProfile,
    pub outcome: LinkOutcome,
}

impl LinkedIdentity {
    pub fn into_parts(self) -> (LocalUser, LinkedProfile) {
        (self.user, self.profile)
    }

    /// Short human readable summary, suitable for a flash message
    pub fn message(&self) -> String {
        match self.outcome {
            LinkOutcome::ExistingIdentity => format!(
                "Signed in with {} as {}",
                self.profile.provider, self.user.label
            ),
            LinkOutcome::ExistingUser => format!(
                "Linked {} account to {}",
                self.profile.provider, self.user.label
            ),
            LinkOutcome::NewUser => format!(
                "Created account {} from {}",
                self.user.label, self.profile.provider
            ),
        }
    }
}

/// Resolves provider profiles to local users.
///
/// Holds no per-call state; a single linker can be shared across tasks.
#[derive(Clone)]
pub struct IdentityLinker {
    store: Arc<dyn IdentityStore>,
    config: Arc<LinkerConfig>,
}

impl IdentityLinker {
    pub fn new(store: Arc<dyn IdentityStore>, config: LinkerConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &LinkerConfig {
        &self.config
    }

    /// Find or create the local user behind `profile` and make sure the
    /// `(provider, identifier)` pair is linked to it.
    ///
    /// 1. A profile already linked under the same key wins: its copied
    ///    data is refreshed and its owner returned.
    /// 2. Otherwise, when the profile carries an email and matching is
    ///    enabled, the oldest user with that email gets the new link.
    /// 3. Otherwise a user is created from the attribute mapping and the
    ///    defaults, together with its first linked profile.
    ///
    /// A uniqueness conflict while writing means another task linked the
    /// same identity first; the lookup in step 1 is then retried once.
    #[tracing::instrument(skip(self, profile), fields(identifier = %profile.identifier))]
    pub async fn resolve(
        &self,
        provider: &str,
        profile: &ThirdPartyProfile,
    ) -> Result<LinkedIdentity, LinkError> {
        validate(provider, profile)?;

        match self.try_resolve(provider, profile).await {
            Err(LinkError::ConcurrentLinkConflict { .. }) => {
                tracing::debug!("Identity linked concurrently, loading the winning link");
                match self.existing_identity(provider, profile).await? {
                    Some(linked) => Ok(linked),
                    None => Err(conflict(provider, profile)),
                }
            }
            result => result,
        }
    }

    /// Every profile linked to `user_id`, oldest first
    pub async fn linked_profiles(&self, user_id: &str) -> Result<Vec<LinkedProfile>, LinkError> {
        self.store
            .list_linked_profiles(user_id)
            .await
            .map_err(|e| LinkError::from_store("list linked profiles", e))
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<LocalUser>, LinkError> {
        self.store
            .get_user(user_id)
            .await
            .map_err(|e| LinkError::from_store("get user", e))
    }

    async fn try_resolve(
        &self,
        provider: &str,
        profile: &ThirdPartyProfile,
    ) -> Result<LinkedIdentity, LinkError> {
        if let Some(linked) = self.existing_identity(provider, profile).await? {
            return Ok(linked);
        }

        if let Some(user) = self.match_existing_user(profile).await? {
            tracing::debug!(user_id = %user.id, "Attaching identity to existing user");
            let linked = LinkedProfile::from_third_party(
                new_profile_id(),
                &user.id,
                provider,
                profile,
                self.config.profile_attributes.as_deref(),
            );
            let stored = self
                .store
                .insert_linked_profile(linked)
                .await
                .map_err(|e| write_error(provider, profile, "insert linked profile", e))?;
            return Ok(LinkedIdentity {
                user,
                profile: stored,
                outcome: LinkOutcome::ExistingUser,
            });
        }

        let user = build_new_user(self.gen_new_user_id().await?, profile, &self.config);
        tracing::debug!(user_id = %user.id, account = %user.account, "Creating user for identity");
        let linked = LinkedProfile::from_third_party(
            new_profile_id(),
            &user.id,
            provider,
            profile,
            self.config.profile_attributes.as_deref(),
        );
        let (user, stored) = self
            .store
            .insert_user_with_profile(user, linked)
            .await
            .map_err(|e| write_error(provider, profile, "insert user", e))?;

        Ok(LinkedIdentity {
            user,
            profile: stored,
            outcome: LinkOutcome::NewUser,
        })
    }

    async fn existing_identity(
        &self,
        provider: &str,
        profile: &ThirdPartyProfile,
    ) -> Result<Option<LinkedIdentity>, LinkError> {
        let Some(mut linked) = self
            .store
            .get_linked_profile(provider, &profile.identifier)
            .await
            .map_err(|e| LinkError::from_store("get linked profile", e))?
        else {
            return Ok(None);
        };

        let user = self
            .store
            .get_user(&linked.user_id)
            .await
            .map_err(|e| LinkError::from_store("get user", e))?
            .ok_or_else(|| {
                LinkError::LinkingFailed(format!(
                    "user {} owning {}/{} not found",
                    linked.user_id, provider, profile.identifier
                ))
            })?;

        linked.refresh_from(profile, self.config.profile_attributes.as_deref());
        let stored = self
            .store
            .update_linked_profile(linked)
            .await
            .map_err(|e| LinkError::from_store("update linked profile", e))?;

        Ok(Some(LinkedIdentity {
            user,
            profile: stored,
            outcome: LinkOutcome::ExistingIdentity,
        }))
    }

    async fn match_existing_user(
        &self,
        profile: &ThirdPartyProfile,
    ) -> Result<Option<LocalUser>, LinkError> {
        let Some(email) = profile.email() else {
            return Ok(None);
        };
        let field = match self.config.match_field {
            UserMatchField::Email => UserSearchField::Email(email.to_string()),
            UserMatchField::Account => UserSearchField::Account(email.to_string()),
            UserMatchField::Disabled => return Ok(None),
        };
        self.store
            .find_user_by(field)
            .await
            .map_err(|e| LinkError::from_store("find user", e))
    }

    async fn gen_new_user_id(&self) -> Result<String, LinkError> {
        for _ in 0..3 {
            let id = gen_random_string(32)?;
            match self.store.get_user(&id).await {
                Ok(None) => return Ok(id),
                Ok(Some(_)) => continue,
                Err(e) => return Err(LinkError::from_store("check user id", e)),
            }
        }
        Err(LinkError::LinkingFailed(
            "Failed to generate a unique user ID after multiple attempts".to_string(),
        ))
    }
}

fn validate(provider: &str, profile: &ThirdPartyProfile) -> Result<(), LinkError> {
    if provider.trim().is_empty() {
        return Err(LinkError::InvalidProvider(
            "provider name is empty".to_string(),
        ));
    }
    if profile.identifier.trim().is_empty() {
        return Err(LinkError::InvalidProfile(
            "identifier is empty".to_string(),
        ));
    }
    Ok(())
}

fn new_profile_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn conflict(provider: &str, profile: &ThirdPartyProfile) -> LinkError {
    LinkError::ConcurrentLinkConflict {
        provider: provider.to_string(),
        identifier: profile.identifier.clone(),
    }
}

fn write_error(
    provider: &str,
    profile: &ThirdPartyProfile,
    context: &str,
    err: StoreError,
) -> LinkError {
    if err.is_conflict() {
        conflict(provider, profile)
    } else {
        LinkError::from_store(context, err)
    }
}
