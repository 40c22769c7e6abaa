use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use super::third_party::ThirdPartyProfile;

/// One `(provider, identifier)` pair bound to the local user that owns it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LinkedProfile {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub identifier: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Selected provider attributes, always a JSON object
    pub attributes: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkedProfile {
    /// Build a new, not yet persisted, profile owned by `user_id`
    pub(crate) fn from_third_party(
        id: String,
        user_id: &str,
        provider: &str,
        profile: &ThirdPartyProfile,
        selected: Option<&[String]>,
    ) -> Self {
        let now = Utc::now();
        let mut linked = Self {
            id,
            user_id: user_id.to_string(),
            provider: provider.to_string(),
            identifier: profile.identifier.clone(),
            email: None,
            display_name: None,
            photo_url: None,
            attributes: Value::Object(Map::new()),
            created_at: now,
            updated_at: now,
        };
        linked.refresh_from(profile, selected);
        linked
    }

    /// Overwrite the copied data with what the provider just returned.
    ///
    /// Ownership and the `(provider, identifier)` key are left untouched.
    pub(crate) fn refresh_from(&mut self, profile: &ThirdPartyProfile, selected: Option<&[String]>) {
        self.email = profile.email().map(str::to_string);
        self.display_name = profile.display_name();
        self.photo_url = profile.photo_url();
        self.attributes = select_attributes(profile, selected);
        self.updated_at = Utc::now();
    }
}

fn select_attributes(profile: &ThirdPartyProfile, selected: Option<&[String]>) -> Value {
    let attributes = match selected {
        None => profile.attributes.clone(),
        Some(keys) => profile
            .attributes
            .iter()
            .filter(|(key, _)| keys.iter().any(|k| k == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    };
    Value::Object(attributes)
}
