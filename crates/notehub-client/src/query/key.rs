//! Query keys and key filters.
//!
//! A key is a tuple of parts. The first part names the namespace; filters
//! select keys by exact match or by prefix.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One component of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Null,
    Int(i64),
    Str(String),
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Identifies one cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// Starts a key in the given namespace.
    pub fn new(namespace: &str) -> Self {
        Self(vec![KeyPart::from(namespace)])
    }

    /// Appends a part.
    #[must_use]
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// The namespace, if the first part is a string.
    pub fn namespace(&self) -> Option<&str> {
        match self.0.first() {
            Some(KeyPart::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns true if `prefix` matches the leading parts of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

/// Selects cache entries for invalidation, removal, or inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Every entry.
    All,
    /// Exactly this key.
    Exact(QueryKey),
    /// Every key beginning with these parts.
    Prefix(QueryKey),
}

impl QueryFilter {
    /// Every key in a namespace.
    pub fn namespace(namespace: &str) -> Self {
        Self::Prefix(QueryKey::new(namespace))
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::All => true,
            Self::Exact(exact) => exact == key,
            Self::Prefix(prefix) => key.starts_with(prefix),
        }
    }
}
