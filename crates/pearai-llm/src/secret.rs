//! API key wrapper that keeps credentials out of logs.
//!
//! [`ApiKey`] is what every handler stores. Its `Debug` and `Display`
//! output never contains the key, and serializing it writes an empty
//! string so a saved option bag cannot leak credentials.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A provider API key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value for bearer-token providers.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// A key made only of whitespace counts as missing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Returns the key when it is present and non-blank.
pub fn present(key: Option<&ApiKey>) -> Option<&ApiKey> {
    key.filter(|k| !k.is_blank())
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "\"\"")
        } else {
            write!(f, "\"***\"")
        }
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, "***")
        }
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("")
    }
}

impl<'de> Deserialize<'de> for ApiKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ApiKey)
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(s.to_string())
    }
}
