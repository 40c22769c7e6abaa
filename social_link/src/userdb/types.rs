use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::fmt;

/// A local account; owns zero or more linked profiles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LocalUser {
    /// Store-assigned sequence number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<i64>,
    /// Unique user identifier
    pub id: String,
    /// Login identifier
    pub account: String,
    /// Display name
    pub label: String,
    pub email: Option<String>,
    /// Mapped fields without a dedicated column, always a JSON object
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalUser {
    pub fn new(id: String, account: String, label: String) -> Self {
        let now = Utc::now();
        Self {
            sequence_number: None,
            id,
            account,
            label,
            email: None,
            metadata: Value::Object(Map::new()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read a metadata entry
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_object().and_then(|m| m.get(key))
    }
}

/// Columns a user can be looked up by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSearchField {
    Id(String),
    Email(String),
    Account(String),
}

impl fmt::Display for UserSearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Email(email) => write!(f, "email={email}"),
            Self::Account(account) => write!(f, "account={account}"),
        }
    }
}
