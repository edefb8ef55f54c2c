//! Source variant selection.
//!
//! Each target is compiled from the source bucket matching its platform API
//! generation. The partition is curated by hand: API breaks do not follow
//! version numbers, so membership is never derived from version arithmetic.
//! Anything not explicitly listed as legacy or mid is modern.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::version::TargetVersionKey;

/// Source bucket for a platform API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVariantClass {
    Legacy,
    Mid,
    Modern,
}

impl SourceVariantClass {
    /// Directory name holding this variant's sources.
    pub fn dir_name(&self) -> &'static str {
        match self {
            SourceVariantClass::Legacy => "legacy",
            SourceVariantClass::Mid => "mid",
            SourceVariantClass::Modern => "modern",
        }
    }

    /// Source directory for this variant under `sources_root`.
    pub fn source_dir(&self, sources_root: &Path) -> PathBuf {
        sources_root.join(self.dir_name())
    }
}

impl fmt::Display for SourceVariantClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for SourceVariantClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(SourceVariantClass::Legacy),
            "mid" => Ok(SourceVariantClass::Mid),
            "modern" => Ok(SourceVariantClass::Modern),
            _ => Err(format!(
                "invalid source variant '{}'; expected 'legacy', 'mid', or 'modern'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("target `{0}` is listed as both legacy and mid")]
pub struct OverlappingVariant(pub TargetVersionKey);

/// Classifies targets into source variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceVariantSelector {
    legacy: HashSet<TargetVersionKey>,
    mid: HashSet<TargetVersionKey>,
}

impl SourceVariantSelector {
    /// Create a selector from the two curated membership sets.
    pub fn new<L, M>(legacy: L, mid: M) -> Result<Self, OverlappingVariant>
    where
        L: IntoIterator<Item = TargetVersionKey>,
        M: IntoIterator<Item = TargetVersionKey>,
    {
        let legacy: HashSet<_> = legacy.into_iter().collect();
        let mid: HashSet<_> = mid.into_iter().collect();

        if let Some(dup) = legacy.iter().find(|k| mid.contains(*k)) {
            return Err(OverlappingVariant(dup.clone()));
        }

        Ok(SourceVariantSelector { legacy, mid })
    }

    /// Classify a target. Total: unknown targets are `Modern`.
    pub fn classify(&self, target: &str) -> SourceVariantClass {
        let target = target.trim();
        if self.legacy.contains(target) {
            SourceVariantClass::Legacy
        } else if self.mid.contains(target) {
            SourceVariantClass::Mid
        } else {
            SourceVariantClass::Modern
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<TargetVersionKey> {
        list.iter()
            .map(|s| TargetVersionKey::parse(s).unwrap())
            .collect()
    }

    fn selector() -> SourceVariantSelector {
        SourceVariantSelector::new(keys(&["1.21", "1.21.1"]), keys(&["1.21.2", "1.21.5"])).unwrap()
    }

    #[test]
    fn test_classify_members() {
        let sel = selector();
        assert_eq!(sel.classify("1.21"), SourceVariantClass::Legacy);
        assert_eq!(sel.classify("1.21.1"), SourceVariantClass::Legacy);
        assert_eq!(sel.classify("1.21.2"), SourceVariantClass::Mid);
        assert_eq!(sel.classify("1.21.5"), SourceVariantClass::Mid);
    }

    #[test]
    fn test_unknown_targets_are_modern() {
        let sel = selector();
        // Numerically between mid members, still modern.
        assert_eq!(sel.classify("1.21.3"), SourceVariantClass::Modern);
        assert_eq!(sel.classify("1.21.8"), SourceVariantClass::Modern);
        assert_eq!(sel.classify("99.0"), SourceVariantClass::Modern);
        assert_eq!(sel.classify(""), SourceVariantClass::Modern);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let sel = selector();
        for target in ["1.21", "1.21.2", "1.21.7"] {
            assert_eq!(sel.classify(target), sel.classify(target));
        }
    }

    #[test]
    fn test_overlap_rejected() {
        let result = SourceVariantSelector::new(keys(&["1.21"]), keys(&["1.21"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_source_dir() {
        let dir = SourceVariantClass::Mid.source_dir(Path::new("src"));
        assert_eq!(dir, PathBuf::from("src/mid"));
        assert_eq!("Legacy".parse::<SourceVariantClass>(), Ok(SourceVariantClass::Legacy));
    }
}
