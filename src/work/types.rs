use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::constants::work_types;

/// Type or category of a work item.
///
/// Equality is exact string match. The reserved value `all` is the wildcard
/// registration key; see [`WorkType::all`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkType(String);

impl WorkType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The wildcard work type, matching every published item when used as a
    /// registration key.
    pub fn all() -> Self {
        Self(work_types::ALL.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == work_types::ALL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for WorkType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&WorkType> for WorkType {
    fn from(value: &WorkType) -> Self {
        value.clone()
    }
}

impl AsRef<str> for WorkType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for WorkType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_detection() {
        assert!(WorkType::all().is_wildcard());
        assert!(WorkType::new("all").is_wildcard());
        assert!(!WorkType::new("All").is_wildcard());
        assert!(!WorkType::new("greeting").is_wildcard());
    }

    #[test]
    fn test_exact_match_equality() {
        assert_eq!(WorkType::from("greeting"), WorkType::new("greeting".to_string()));
        assert_ne!(WorkType::from("greeting"), WorkType::from("greeting "));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&WorkType::new("mail.welcome")).unwrap();
        assert_eq!(json, "\"mail.welcome\"");
        let parsed: WorkType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_str(), "mail.welcome");
    }
}
