//! Version registry - the ordered table of supported targets.
//!
//! The registry maps each `TargetVersionKey` to the `ToolchainSpec` needed to
//! compile against it. Iteration order is declaration order, which is also
//! the build order used by `build-all`.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::core::version::TargetVersionKey;

/// Toolchain parameters required to compile against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainSpec {
    /// Mapping specification identifier (e.g. `1.21.3+build.2`)
    pub mapping_id: String,

    /// Companion framework version (e.g. `0.114.1+1.21.3`)
    pub companion_version: String,
}

impl ToolchainSpec {
    pub fn new(mapping_id: impl Into<String>, companion_version: impl Into<String>) -> Self {
        ToolchainSpec {
            mapping_id: mapping_id.into(),
            companion_version: companion_version.into(),
        }
    }
}

/// Error raised while constructing a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("target `{0}` is declared more than once")]
    DuplicateTarget(TargetVersionKey),
}

/// Immutable, insertion-ordered table of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionRegistry {
    entries: IndexMap<TargetVersionKey, ToolchainSpec>,
}

impl VersionRegistry {
    /// Build a registry from entries in declaration order.
    ///
    /// Fails if any key appears more than once.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (TargetVersionKey, ToolchainSpec)>,
    {
        let mut map = IndexMap::new();
        for (key, spec) in entries {
            if map.contains_key(&key) {
                return Err(RegistryError::DuplicateTarget(key));
            }
            map.insert(key, spec);
        }
        Ok(VersionRegistry { entries: map })
    }

    /// Look up the toolchain spec for a target.
    pub fn get(&self, target: &str) -> Option<&ToolchainSpec> {
        self.entries.get(target.trim())
    }

    /// Check whether a target is registered.
    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target.trim())
    }

    /// Check whether a raw, user-supplied version string is supported.
    ///
    /// The input is trimmed and lowercased before comparison.
    pub fn is_supported(&self, raw: &str) -> bool {
        let normalized = raw.trim().to_lowercase();
        !normalized.is_empty()
            && self
                .entries
                .keys()
                .any(|k| k.as_str().eq_ignore_ascii_case(&normalized))
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetVersionKey, &ToolchainSpec)> {
        self.entries.iter()
    }

    /// Iterate keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &TargetVersionKey> {
        self.entries.keys()
    }

    /// First declared target.
    pub fn first(&self) -> Option<&TargetVersionKey> {
        self.entries.keys().next()
    }

    /// Last declared target.
    pub fn last(&self) -> Option<&TargetVersionKey> {
        self.entries.keys().next_back()
    }

    /// Human-readable range, e.g. `1.21 - 1.21.8`.
    pub fn supported_range(&self) -> Option<String> {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => Some(format!("{} - {}", first, last)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
