//! Strongly-typed migration name wrapper.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Strongly-typed wrapper for migration names.
///
/// A migration name is the identity of a step in the migration log, so it
/// must never change once a migration has shipped. Names are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationName(String);

impl<'de> Deserialize<'de> for MigrationName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationName::try_new(s)
            .ok_or_else(|| serde::de::Error::custom("MigrationName must not be empty"))
    }
}

impl MigrationName {
    /// Create a new `MigrationName`, panicking in debug builds if the name is empty.
    ///
    /// Prefer [`try_new`](Self::try_new) when handling untrusted input.
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        debug_assert!(!s.is_empty(), "MigrationName must not be empty");
        Self(s)
    }

    /// Try to create a new `MigrationName`, returning `None` if the name is empty.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for MigrationName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for MigrationName {
    fn eq(&self, other: &String) -> bool {
        self.0 == *other
    }
}
