use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute key carrying the human readable name
pub const DISPLAY_NAME_ATTRIBUTE: &str = "displayName";
/// Attribute key carrying the avatar URL
pub const PHOTO_URL_ATTRIBUTE: &str = "photoURL";

/// Profile returned by a provider after a successful authentication.
///
/// Built fresh for every login attempt and never stored as-is: the linker
/// copies the parts it needs onto a [`LocalUser`](crate::LocalUser) and a
/// [`LinkedProfile`](crate::LinkedProfile).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ThirdPartyProfile {
    /// Provider scoped identifier, stable across logins
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Everything else the provider returned (`displayName`, `photoURL`, ...)
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ThirdPartyProfile {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            email: None,
            attributes: Map::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The email, if present and not blank
    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }

    pub fn display_name(&self) -> Option<String> {
        self.field(DISPLAY_NAME_ATTRIBUTE)
    }

    pub fn photo_url(&self) -> Option<String> {
        self.field(PHOTO_URL_ATTRIBUTE)
    }

    /// Read a field by name as a string.
    ///
    /// `identifier` and `email` address the dedicated fields, anything else is
    /// looked up in `attributes`. Blank strings and nulls read as `None`.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "identifier" => Some(self.identifier.clone()).filter(|s| !s.trim().is_empty()),
            "email" => self.email().map(str::to_string),
            key => self.attributes.get(key).and_then(value_to_string),
        }
    }
}

/// Render a scalar JSON value as a string; containers and nulls yield `None`
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
