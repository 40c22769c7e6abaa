use serde_json::{Map, Value};

use crate::config::{DefaultValue, LinkerConfig, UserField};
use crate::profile::{ThirdPartyProfile, value_to_string};
use crate::userdb::LocalUser;

/// Build a new, not yet persisted, user from a provider profile.
///
/// The attribute mapping runs first, then the defaults fill whatever the
/// mapping left unset, in declaration order. `account` falls back to the
/// identifier and `label` to `account`.
pub(super) fn build_new_user(
    id: String,
    profile: &ThirdPartyProfile,
    config: &LinkerConfig,
) -> LocalUser {
    let mut user = LocalUser::new(id, String::new(), String::new());

    for mapping in &config.attribute_mapping {
        if let Some(value) = source_value(profile, &mapping.source) {
            set_field(&mut user, &mapping.target, &value);
        }
    }

    for default in &config.defaults {
        if is_field_set(&user, &default.target) {
            continue;
        }
        let value = match &default.value {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Derived(derive) => derive(&user, profile),
        };
        if !is_unset(&value) {
            set_field(&mut user, &default.target, &value);
        }
    }

    if user.account.is_empty() {
        user.account = profile.identifier.clone();
    }
    if user.label.is_empty() {
        user.label = user.account.clone();
    }

    user
}

fn source_value(profile: &ThirdPartyProfile, source: &str) -> Option<Value> {
    match source {
        "identifier" | "email" => profile.field(source).map(Value::String),
        key => profile
            .attributes
            .get(key)
            .filter(|value| !is_unset(value))
            .cloned(),
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_field_set(user: &LocalUser, target: &UserField) -> bool {
    match target {
        UserField::Account => !user.account.is_empty(),
        UserField::Label => !user.label.is_empty(),
        UserField::Email => user.email.is_some(),
        UserField::Metadata(key) => user.metadata_value(key).is_some_and(|v| !is_unset(v)),
    }
}

fn set_field(user: &mut LocalUser, target: &UserField, value: &Value) {
    match target {
        UserField::Account => {
            if let Some(s) = value_to_string(value) {
                user.account = s;
            }
        }
        UserField::Label => {
            if let Some(s) = value_to_string(value) {
                user.label = s;
            }
        }
        UserField::Email => {
            if let Some(s) = value_to_string(value) {
                user.email = Some(s);
            }
        }
        UserField::Metadata(key) => {
            if !user.metadata.is_object() {
                user.metadata = Value::Object(Map::new());
            }
            if let Some(metadata) = user.metadata.as_object_mut() {
                metadata.insert(key.clone(), value.clone());
            }
        }
    }
}
