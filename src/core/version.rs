//! Target version keys.
//!
//! A `TargetVersionKey` names one version of the host platform, e.g. `1.21.3`.
//! Keys are opaque strings with a total order that treats dot-separated
//! numeric components as numbers, so `1.21.10` sorts after `1.21.9`.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned when a target key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetKeyError {
    #[error("target version must not be empty")]
    Empty,

    #[error("target version `{0}` contains whitespace")]
    Whitespace(String),

    #[error("target version `{0}` is not a plain directory name")]
    NotADirectoryName(String),
}

/// Identifier for one host platform version.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TargetVersionKey(Arc<str>);

impl TargetVersionKey {
    /// Parse a key, trimming surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, TargetKeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TargetKeyError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TargetKeyError::Whitespace(trimmed.to_string()));
        }
        // Keys name per-target output directories.
        if !is_single_normal_component(trimmed) {
            return Err(TargetKeyError::NotADirectoryName(trimmed.to_string()));
        }
        Ok(TargetVersionKey(Arc::from(trimmed)))
    }

    /// Build a key without validation, for exercising downstream guards.
    #[cfg(test)]
    pub(crate) fn unchecked(raw: &str) -> Self {
        TargetVersionKey(Arc::from(raw))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_single_normal_component(s: &str) -> bool {
    if s.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(s).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == s
    )
}

impl FromStr for TargetVersionKey {
    type Err = TargetKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for TargetVersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut lhs = self.0.split('.');
        let mut rhs = other.0.split('.');
        loop {
            match (lhs.next(), rhs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                        _ => a.cmp(b),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl PartialOrd for TargetVersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Borrow<str> for TargetVersionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TargetVersionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetVersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TargetVersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl Serialize for TargetVersionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TargetVersionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TargetVersionKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> TargetVersionKey {
        TargetVersionKey::parse(s).unwrap()
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(key(" 1.21.3 ").as_str(), "1.21.3");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(TargetVersionKey::parse("   "), Err(TargetKeyError::Empty));
        assert!(matches!(
            TargetVersionKey::parse("1.21 .3"),
            Err(TargetKeyError::Whitespace(_))
        ));
    }

    #[test]
    fn test_parse_rejects_path_like_keys() {
        for raw in ["../../src", "..", ".", "1.21/x", "a\\b", "/abs"] {
            assert!(
                matches!(
                    TargetVersionKey::parse(raw),
                    Err(TargetKeyError::NotADirectoryName(_))
                ),
                "{} should be rejected",
                raw
            );
        }
        assert_eq!(key("1.21.1-pre1").as_str(), "1.21.1-pre1");
        assert_eq!(key("..1.21").as_str(), "..1.21");
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(key("1.21") < key("1.21.1"));
        assert!(key("1.21.9") < key("1.21.10"));
        assert!(key("1.20.6") < key("1.21"));
        assert!(key("1.21.1") < key("1.21.1-pre1"));
    }
}
