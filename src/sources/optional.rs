//! Optional native companion dependency.
//!
//! The dependency is located through an ordered candidate search: the
//! environment variable first, then an explicit path, then conventional
//! locations. The first existing file wins; nothing is merged.
//!
//! Presence is enough to compile against it. Linking it at run time also
//! needs an explicit opt-in and a target from the compatibility allow-list,
//! because its binary layout is not stable across every target.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::core::version::TargetVersionKey;

/// Where a candidate location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    Environment,
    Explicit,
    Conventional,
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateSource::Environment => write!(f, "environment"),
            CandidateSource::Explicit => write!(f, "explicit"),
            CandidateSource::Conventional => write!(f, "conventional"),
        }
    }
}

/// One candidate location for the dependency file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub source: CandidateSource,
}

/// Ordered search description for the optional dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalDependencyDescriptor {
    /// Display name used in warnings
    pub name: String,

    /// Candidates in search order
    pub candidates: Vec<Candidate>,
}

impl OptionalDependencyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        OptionalDependencyDescriptor {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a candidate. Relative paths are resolved against `base`.
    pub fn with_candidate(mut self, base: &Path, path: impl AsRef<Path>, source: CandidateSource) -> Self {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        self.candidates.push(Candidate { path, source });
        self
    }

    /// Build the standard search order.
    ///
    /// `env_value` is the value of the dependency's environment variable, if set.
    pub fn search_order(
        name: impl Into<String>,
        base: &Path,
        env_value: Option<&str>,
        explicit: Option<&Path>,
        conventional: &[PathBuf],
    ) -> Self {
        let mut descriptor = OptionalDependencyDescriptor::new(name);
        if let Some(env) = env_value.filter(|v| !v.trim().is_empty()) {
            descriptor = descriptor.with_candidate(base, env.trim(), CandidateSource::Environment);
        }
        if let Some(explicit) = explicit {
            descriptor = descriptor.with_candidate(base, explicit, CandidateSource::Explicit);
        }
        for path in conventional {
            descriptor = descriptor.with_candidate(base, path, CandidateSource::Conventional);
        }
        descriptor
    }

    /// Paths in search order.
    pub fn searched(&self) -> Vec<PathBuf> {
        self.candidates.iter().map(|c| c.path.clone()).collect()
    }
}

/// Why runtime linking was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NotOptedIn,
    TargetNotAllowListed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotOptedIn => write!(f, "runtime linking was not requested"),
            SkipReason::TargetNotAllowListed => {
                write!(f, "target is not known to be runtime-compatible")
            }
        }
    }
}

/// Non-fatal conditions reported during a single-target build.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BuildWarning {
    #[error("optional dependency `{name}` not found; building without it")]
    MissingOptionalDependency { name: String, searched: Vec<PathBuf> },

    #[error("optional dependency `{name}` will not be linked at run time for `{target}`: {reason}")]
    RuntimeLinkSkipped {
        name: String,
        target: TargetVersionKey,
        reason: SkipReason,
    },
}

/// Resolved state of the optional dependency for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "path", rename_all = "kebab-case")]
pub enum OptionalDependency {
    /// Not found anywhere in the search order
    Absent,
    /// Present; used at compile time only
    CompileOnly(PathBuf),
    /// Present; used at compile time and linked at run time
    CompileAndRuntime(PathBuf),
}

impl OptionalDependency {
    /// Path of the dependency if it is present.
    pub fn path(&self) -> Option<&Path> {
        match self {
            OptionalDependency::Absent => None,
            OptionalDependency::CompileOnly(p) | OptionalDependency::CompileAndRuntime(p) => {
                Some(p)
            }
        }
    }

    pub fn is_runtime_linked(&self) -> bool {
        matches!(self, OptionalDependency::CompileAndRuntime(_))
    }
}

/// Locates the optional dependency and gates its runtime use.
#[derive(Debug, Clone)]
pub struct OptionalDependencyResolver {
    descriptor: OptionalDependencyDescriptor,
    runtime_allow_list: HashSet<TargetVersionKey>,
}

impl OptionalDependencyResolver {
    pub fn new<I>(descriptor: OptionalDependencyDescriptor, runtime_allow_list: I) -> Self
    where
        I: IntoIterator<Item = TargetVersionKey>,
    {
        OptionalDependencyResolver {
            descriptor,
            runtime_allow_list: runtime_allow_list.into_iter().collect(),
        }
    }

    /// First existing candidate, if any.
    pub fn resolve(&self) -> Option<&Candidate> {
        let found = self.descriptor.candidates.iter().find(|c| c.path.is_file());
        match found {
            Some(candidate) => tracing::debug!(
                "Found {} at {} ({})",
                self.descriptor.name,
                candidate.path.display(),
                candidate.source
            ),
            None => tracing::debug!(
                "{} not found in {} candidate location(s)",
                self.descriptor.name,
                self.descriptor.candidates.len()
            ),
        }
        found
    }

    /// Whether the dependency may be linked at run time for `target`.
    pub fn gate_runtime(&self, target: &str, resolved: Option<&Path>, explicit_opt_in: bool) -> bool {
        self.runtime_skip_reason(target, resolved, explicit_opt_in)
            .is_none()
            && resolved.is_some()
    }

    fn runtime_skip_reason(
        &self,
        target: &str,
        resolved: Option<&Path>,
        explicit_opt_in: bool,
    ) -> Option<SkipReason> {
        resolved?;
        if !explicit_opt_in {
            Some(SkipReason::NotOptedIn)
        } else if !self.runtime_allow_list.contains(target.trim()) {
            Some(SkipReason::TargetNotAllowListed)
        } else {
            None
        }
    }

    /// Resolve and gate in one step, collecting non-fatal warnings.
    pub fn resolve_for(
        &self,
        target: &TargetVersionKey,
        explicit_opt_in: bool,
        warnings: &mut Vec<BuildWarning>,
    ) -> OptionalDependency {
        let Some(candidate) = self.resolve() else {
            warnings.push(BuildWarning::MissingOptionalDependency {
                name: self.descriptor.name.clone(),
                searched: self.descriptor.searched(),
            });
            return OptionalDependency::Absent;
        };

        let path = candidate.path.clone();
        match self.runtime_skip_reason(target.as_str(), Some(&path), explicit_opt_in) {
            None => OptionalDependency::CompileAndRuntime(path),
            Some(reason) => {
                warnings.push(BuildWarning::RuntimeLinkSkipped {
                    name: self.descriptor.name.clone(),
                    target: target.clone(),
                    reason,
                });
                OptionalDependency::CompileOnly(path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn key(s: &str) -> TargetVersionKey {
        TargetVersionKey::parse(s).unwrap()
    }

    fn resolver(tmp: &TempDir, allow: &[&str]) -> OptionalDependencyResolver {
        let descriptor = OptionalDependencyDescriptor::search_order(
            "companion-api",
            tmp.path(),
            Some("env/missing.jar"),
            Some(Path::new("explicit/missing.jar")),
            &[PathBuf::from("libs/a.jar"), PathBuf::from("run/b.jar")],
        );
        OptionalDependencyResolver::new(descriptor, allow.iter().map(|s| key(s)))
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"jar").unwrap();
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("libs/a.jar"));
        touch(&tmp.path().join("run/b.jar"));

        let res = resolver(&tmp, &[]);
        let found = res.resolve().unwrap();
        assert_eq!(found.path, tmp.path().join("libs/a.jar"));
        assert_eq!(found.source, CandidateSource::Conventional);
    }

    #[test]
    fn test_environment_beats_explicit() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("env/missing.jar"));
        touch(&tmp.path().join("explicit/missing.jar"));

        let res = resolver(&tmp, &[]);
        assert_eq!(res.resolve().unwrap().source, CandidateSource::Environment);
    }

    #[test]
    fn test_absent_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let res = resolver(&tmp, &["1.21.8"]);
        let mut warnings = Vec::new();

        let dep = res.resolve_for(&key("1.21.8"), true, &mut warnings);
        assert_eq!(dep, OptionalDependency::Absent);
        assert!(matches!(
            warnings.as_slice(),
            [BuildWarning::MissingOptionalDependency { searched, .. }] if searched.len() == 4
        ));
    }

    #[test]
    fn test_gate_runtime() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("libs/a.jar");
        touch(&jar);
        let res = resolver(&tmp, &["1.21.8"]);

        assert!(!res.gate_runtime("1.21.8", Some(&jar), false));
        assert!(!res.gate_runtime("1.21.3", Some(&jar), true));
        assert!(!res.gate_runtime("1.21.8", None, true));
        assert!(res.gate_runtime("1.21.8", Some(&jar), true));
    }

    #[test]
    fn test_three_way_states() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("libs/a.jar");
        touch(&jar);
        let res = resolver(&tmp, &["1.21.8"]);

        let mut warnings = Vec::new();
        assert_eq!(
            res.resolve_for(&key("1.21.8"), true, &mut warnings),
            OptionalDependency::CompileAndRuntime(jar.clone())
        );
        assert!(warnings.is_empty());

        let dep = res.resolve_for(&key("1.21.3"), true, &mut warnings);
        assert_eq!(dep, OptionalDependency::CompileOnly(jar.clone()));
        assert!(matches!(
            warnings.as_slice(),
            [BuildWarning::RuntimeLinkSkipped { reason: SkipReason::TargetNotAllowListed, .. }]
        ));

        warnings.clear();
        let dep = res.resolve_for(&key("1.21.8"), false, &mut warnings);
        assert_eq!(dep, OptionalDependency::CompileOnly(jar));
        assert!(matches!(
            warnings.as_slice(),
            [BuildWarning::RuntimeLinkSkipped { reason: SkipReason::NotOptedIn, .. }]
        ));
    }
}
