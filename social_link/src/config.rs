//! Linker configuration
//!
//! Everything the linker needs to know about the host application: which
//! providers are enabled, how profile fields map onto a new local user, the
//! defaults filled in for new users, and which user column the profile email
//! is matched against.

use serde_json::Value;
use std::{env, fmt, str::FromStr, sync::Arc};
use thiserror::Error;

use crate::profile::ThirdPartyProfile;
use crate::userdb::LocalUser;
use crate::utils::split_list;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// A writable field of [`LocalUser`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserField {
    Account,
    Label,
    Email,
    /// A key inside `LocalUser::metadata`
    Metadata(String),
}

impl FromStr for UserField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "account" => Ok(Self::Account),
            "label" => Ok(Self::Label),
            "email" => Ok(Self::Email),
            other => match other.strip_prefix("metadata.") {
                Some(key) if !key.is_empty() => Ok(Self::Metadata(key.to_string())),
                _ => Err(ConfigError::Invalid {
                    key: "user field".to_string(),
                    value: other.to_string(),
                }),
            },
        }
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "account"),
            Self::Label => write!(f, "label"),
            Self::Email => write!(f, "email"),
            Self::Metadata(key) => write!(f, "metadata.{key}"),
        }
    }
}

/// User column compared against the profile email when no linked profile exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserMatchField {
    #[default]
    Email,
    Account,
    /// Never attach a new identity to an existing user
    Disabled,
}

impl FromStr for UserMatchField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "account" => Ok(Self::Account),
            "none" | "disabled" => Ok(Self::Disabled),
            other => Err(ConfigError::Invalid {
                key: "SOCIAL_LINK_USER_MATCH_FIELD".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Copy profile field `source` into user field `target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub source: String,
    pub target: UserField,
}

impl FieldMapping {
    pub fn new(source: impl Into<String>, target: UserField) -> Self {
        Self {
            source: source.into(),
            target,
        }
    }
}

pub type DeriveFn = Arc<dyn Fn(&LocalUser, &ThirdPartyProfile) -> Value + Send + Sync>;

#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// Computed from the user built so far and the incoming profile
    Derived(DeriveFn),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Value for `target` when the mapping left it unset on a new user
#[derive(Debug, Clone)]
pub struct UserDefault {
    pub target: UserField,
    pub value: DefaultValue,
}

#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Enabled providers, in configuration order
    pub providers: Vec<String>,
    pub attribute_mapping: Vec<FieldMapping>,
    /// Applied in order after the mapping
    pub defaults: Vec<UserDefault>,
    pub match_field: UserMatchField,
    /// Attribute keys copied onto linked profiles; `None` copies all
    pub profile_attributes: Option<Vec<String>>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            attribute_mapping: vec![
                FieldMapping::new("email", UserField::Email),
                FieldMapping::new("email", UserField::Account),
                FieldMapping::new("displayName", UserField::Label),
            ],
            defaults: Vec::new(),
            match_field: UserMatchField::Email,
            profile_attributes: None,
        }
    }
}

impl LinkerConfig {
    pub fn builder() -> LinkerConfigBuilder {
        LinkerConfigBuilder::default()
    }

    pub fn is_enabled(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p == provider)
    }

    /// Load the configuration from the environment (and `.env`).
    ///
    /// - `SOCIAL_LINK_PROVIDERS`: comma separated enabled providers
    /// - `SOCIAL_LINK_USER_MATCH_FIELD`: `email` (default), `account` or `none`
    /// - `SOCIAL_LINK_USER_ACCOUNT_FIELD`: profile field for `account` (default `email`)
    /// - `SOCIAL_LINK_USER_LABEL_FIELD`: profile field for `label` (default `displayName`)
    /// - `SOCIAL_LINK_USER_DEFAULTS`: `target=value` pairs, e.g. `metadata.role=member`
    /// - `SOCIAL_LINK_PROFILE_ATTRIBUTES`: attribute whitelist for linked profiles
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Self::builder();

        if let Ok(raw) = env::var("SOCIAL_LINK_PROVIDERS") {
            builder = builder.providers(split_list(&raw));
        }
        if let Ok(raw) = env::var("SOCIAL_LINK_USER_MATCH_FIELD") {
            builder = builder.match_field(raw.parse()?);
        }
        if let Ok(source) = env::var("SOCIAL_LINK_USER_ACCOUNT_FIELD") {
            builder = builder.map(source.trim(), UserField::Account);
        }
        if let Ok(source) = env::var("SOCIAL_LINK_USER_LABEL_FIELD") {
            builder = builder.map(source.trim(), UserField::Label);
        }
        if let Ok(raw) = env::var("SOCIAL_LINK_USER_DEFAULTS") {
            for pair in split_list(&raw) {
                let (target, value) = pair.split_once('=').ok_or_else(|| ConfigError::Invalid {
                    key: "SOCIAL_LINK_USER_DEFAULTS".to_string(),
                    value: pair.clone(),
                })?;
                builder = builder.default_literal(target.parse()?, value.trim());
            }
        }
        if let Ok(raw) = env::var("SOCIAL_LINK_PROFILE_ATTRIBUTES") {
            let keys = split_list(&raw);
            if !keys.is_empty() {
                builder = builder.profile_attributes(keys);
            }
        }

        let config = builder.build();
        tracing::debug!(
            providers = ?config.providers,
            match_field = ?config.match_field,
            "Loaded linker configuration"
        );
        Ok(config)
    }
}

#[derive(Debug, Default)]
pub struct LinkerConfigBuilder {
    config: LinkerConfig,
}

impl LinkerConfigBuilder {
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.config.providers.contains(&name) {
            self.config.providers.push(name);
        }
        self
    }

    pub fn providers<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |b, name| b.provider(name))
    }

    /// Map a profile field onto a user field, replacing any earlier mapping
    /// for the same target
    pub fn map(mut self, source: impl Into<String>, target: UserField) -> Self {
        self.config.attribute_mapping.retain(|m| m.target != target);
        self.config
            .attribute_mapping
            .push(FieldMapping::new(source, target));
        self
    }

    /// Drop every mapping, including the built-in ones
    pub fn clear_mapping(mut self) -> Self {
        self.config.attribute_mapping.clear();
        self
    }

    pub fn default_literal(mut self, target: UserField, value: impl Into<Value>) -> Self {
        self.config.defaults.push(UserDefault {
            target,
            value: DefaultValue::Literal(value.into()),
        });
        self
    }

    pub fn default_with<F>(mut self, target: UserField, f: F) -> Self
    where
        F: Fn(&LocalUser, &ThirdPartyProfile) -> Value + Send + Sync + 'static,
    {
        self.config.defaults.push(UserDefault {
            target,
            value: DefaultValue::Derived(Arc::new(f)),
        });
        self
    }

    pub fn match_field(mut self, field: UserMatchField) -> Self {
        self.config.match_field = field;
        self
    }

    pub fn profile_attributes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.profile_attributes = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> LinkerConfig {
        self.config
    }
}
