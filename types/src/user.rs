//! User identity type.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::TypeError;

/// Identity of a proposer, voter or guardian.
///
/// Authentication happens upstream; this type only guarantees the identifier
/// is usable as a storage key: non-empty, bounded, and free of whitespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UserId(String);

impl UserId {
    /// Maximum identifier length in bytes.
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a raw identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TypeError> {
        let s = raw.into();
        if s.is_empty() || s.len() > Self::MAX_LEN || s.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidUserId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        let id = UserId::parse("guardian-07").unwrap();
        assert_eq!(id.as_str(), "guardian-07");
        assert_eq!(id.to_string(), "guardian-07");
    }

    #[test]
    fn rejects_empty_whitespace_and_oversized() {
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("two words").is_err());
        assert!(UserId::parse("x".repeat(UserId::MAX_LEN + 1)).is_err());
        assert!(UserId::parse("x".repeat(UserId::MAX_LEN)).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<UserId>("\"bob\"").is_ok());
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
