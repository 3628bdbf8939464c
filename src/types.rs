#![forbid(unsafe_code)]

//! Core domain types for rewrites

use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated recipe name
///
/// Recipe names are dot-separated, e.g. `spring.batch.MigrateItemWriterWrite`.
/// Each segment must be non-empty and contain only alphanumeric characters,
/// hyphens and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipeName(String);

impl RecipeName {
    /// Creates a new RecipeName, validating the input
    ///
    /// Returns None if the input is empty or any segment is empty or contains
    /// invalid characters
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let valid = name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        });
        if !valid {
            return None;
        }
        Some(RecipeName(name))
    }

    /// Returns the recipe name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecipeName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RecipeName::new(value.clone()).ok_or_else(|| format!("Invalid recipe name '{}'", value))
    }
}

impl From<RecipeName> for String {
    fn from(name: RecipeName) -> Self {
        name.0
    }
}

/// A glob pattern for file matching
///
/// This is a simple wrapper around a string that will be used with the `globset` crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobPattern(String);

impl GlobPattern {
    /// Creates a new GlobPattern
    pub fn new(pattern: impl Into<String>) -> Self {
        GlobPattern(pattern.into())
    }

    /// Returns the pattern as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GlobPattern {
    fn from(pattern: String) -> Self {
        GlobPattern(pattern)
    }
}

impl From<&str> for GlobPattern {
    fn from(pattern: &str) -> Self {
        GlobPattern(pattern.to_string())
    }
}
