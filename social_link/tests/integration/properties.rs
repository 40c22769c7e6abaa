use proptest::prelude::*;
use social_link::{IdentityLinker, LinkOutcome, LinkerConfig, MemoryStore, ThirdPartyProfile};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Login {
    provider: &'static str,
    identifier: String,
    email: Option<&'static str>,
    name: String,
}

fn login() -> impl Strategy<Value = Login> {
    (
        prop::sample::select(vec!["facebook", "google", "twitter"]),
        "[a-c]{1,2}",
        prop::option::of(prop::sample::select(vec!["a@x.com", "b@x.com"])),
        "[A-Za-z ]{0,12}",
    )
        .prop_map(|(provider, identifier, email, name)| Login {
            provider,
            identifier,
            email,
            name,
        })
}

impl Login {
    fn profile(&self) -> ThirdPartyProfile {
        let profile = ThirdPartyProfile::new(self.identifier.clone())
            .with_attribute("displayName", self.name.clone());
        match self.email {
            Some(email) => profile.with_email(email),
            None => profile,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of logins behaves like the reference model: a known
    /// identity keeps its owner, a known email attaches to its first user,
    /// anything else creates a user. No identity is ever linked twice.
    #[test]
    fn test_login_sequences_follow_linking_rules(logins in prop::collection::vec(login(), 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        rt.block_on(async {
            let memory = Arc::new(MemoryStore::new());
            let linker = IdentityLinker::new(memory.clone(), LinkerConfig::default());

            let mut owners: HashMap<(String, String), (String, String)> = HashMap::new();
            let mut email_owner: HashMap<&str, String> = HashMap::new();
            let mut users = HashSet::new();

            for login in &logins {
                let key = (login.provider.to_string(), login.identifier.clone());
                let linked = linker
                    .resolve(login.provider, &login.profile())
                    .await
                    .expect("resolve should succeed");

                prop_assert_eq!(&linked.profile.user_id, &linked.user.id);
                prop_assert_eq!(&linked.profile.provider, &key.0);
                prop_assert_eq!(&linked.profile.identifier, &key.1);

                if let Some((user_id, profile_id)) = owners.get(&key) {
                    prop_assert_eq!(linked.outcome, LinkOutcome::ExistingIdentity);
                    prop_assert_eq!(&linked.user.id, user_id);
                    prop_assert_eq!(&linked.profile.id, profile_id);
                } else if let Some(user_id) = login.email.and_then(|e| email_owner.get(e)) {
                    prop_assert_eq!(linked.outcome, LinkOutcome::ExistingUser);
                    prop_assert_eq!(&linked.user.id, user_id);
                } else {
                    prop_assert_eq!(linked.outcome, LinkOutcome::NewUser);
                    prop_assert!(users.insert(linked.user.id.clone()));
                    if let Some(email) = login.email {
                        email_owner.insert(email, linked.user.id.clone());
                    }
                }

                owners
                    .entry(key)
                    .or_insert_with(|| (linked.user.id.clone(), linked.profile.id.clone()));
            }

            prop_assert_eq!(memory.counts().await, (users.len(), owners.len()));
            Ok(())
        })?;
    }

    /// Without an email every new identity gets its own user
    #[test]
    fn test_no_email_always_creates_user(identifiers in prop::collection::hash_set("[a-z0-9]{1,16}", 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        rt.block_on(async {
            let memory = Arc::new(MemoryStore::new());
            let linker = IdentityLinker::new(memory.clone(), LinkerConfig::default());

            for identifier in &identifiers {
                let linked = linker
                    .resolve("twitter", &ThirdPartyProfile::new(identifier.clone()))
                    .await
                    .expect("resolve should succeed");
                prop_assert_eq!(linked.outcome, LinkOutcome::NewUser);
                prop_assert_eq!(&linked.user.account, identifier);
            }

            prop_assert_eq!(memory.counts().await, (identifiers.len(), identifiers.len()));
            Ok(())
        })?;
    }
}
