//! Artifact selection and collection.
//!
//! Every job writes into the same shared build-output location, so a job
//! only ever picks files whose exact name embeds its own target. Collected
//! files are staged next to the destination and moved into place once all
//! of them copied, leaving a target's output directory complete or absent.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::builder::job::JobError;
use crate::builder::template::{substitute, PlaceholderStyle};
use crate::core::version::TargetVersionKey;
use crate::util::fs::{copy_file, list_files, remove_dir_all_if_exists, reset_dir};
use crate::util::hash::sha256_file;
use crate::util::process::CancellationToken;

/// Kind of collected artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Primary,
    Sources,
}

/// Naming rule for target-qualified artifacts.
///
/// The stem template may use `{base}`, `{version}` and must use `{target}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPattern {
    pub stem: String,
    pub base: String,
    pub version: String,
    pub ext: String,
}

impl ArtifactPattern {
    pub fn new(
        stem: impl Into<String>,
        base: impl Into<String>,
        version: impl Into<String>,
        ext: impl Into<String>,
    ) -> Self {
        ArtifactPattern {
            stem: stem.into(),
            base: base.into(),
            version: version.into(),
            ext: ext.into(),
        }
    }

    fn stem_for(&self, target: &TargetVersionKey) -> String {
        substitute(
            &self.stem,
            PlaceholderStyle::Braces,
            &[
                ("base", self.base.as_str()),
                ("version", self.version.as_str()),
                ("target", target.as_str()),
            ],
        )
    }

    /// Expected file names for a target: primary first, then sources.
    pub fn file_names(&self, target: &TargetVersionKey) -> [String; 2] {
        let stem = self.stem_for(target);
        [
            format!("{}.{}", stem, self.ext),
            format!("{}-sources.{}", stem, self.ext),
        ]
    }

    /// Classify a file name against a target's expected names.
    pub fn matches(&self, file_name: &str, target: &TargetVersionKey) -> Option<ArtifactKind> {
        let [primary, sources] = self.file_names(target);
        if file_name == primary {
            Some(ArtifactKind::Primary)
        } else if file_name == sources {
            Some(ArtifactKind::Sources)
        } else {
            None
        }
    }
}

/// A collected output file tagged with its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub target: TargetVersionKey,
    pub kind: ArtifactKind,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub sha256: String,
}

/// Staging directory used while collecting into `dest`.
pub fn staging_dir(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.partial", name))
}

/// Copy a target's artifacts from `source_dir` into `dest`.
///
/// Fails with `ArtifactNotFound` when nothing matches; on any failure the
/// staging directory is removed and `dest` is left absent.
pub fn collect_artifacts(
    pattern: &ArtifactPattern,
    target: &TargetVersionKey,
    source_dir: &Path,
    dest: &Path,
    token: &CancellationToken,
) -> Result<Vec<ArtifactRecord>, JobError> {
    let matched: Vec<(PathBuf, ArtifactKind)> = list_files(source_dir)
        .map_err(|e| JobError::io(target, &e))?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            pattern.matches(&name, target).map(|kind| (path, kind))
        })
        .collect();

    if matched.is_empty() {
        return Err(JobError::ArtifactNotFound {
            target: target.clone(),
            expected: pattern.file_names(target).to_vec(),
            searched: source_dir.to_path_buf(),
        });
    }

    let staging = staging_dir(dest);
    let result = stage(&matched, target, &staging, dest, token);
    if result.is_err() {
        if let Err(e) = remove_dir_all_if_exists(&staging) {
            tracing::warn!("failed to remove staging directory: {:#}", e);
        }
        if let Err(e) = remove_dir_all_if_exists(dest) {
            tracing::warn!("failed to remove incomplete output: {:#}", e);
        }
    }
    result
}

fn stage(
    matched: &[(PathBuf, ArtifactKind)],
    target: &TargetVersionKey,
    staging: &Path,
    dest: &Path,
    token: &CancellationToken,
) -> Result<Vec<ArtifactRecord>, JobError> {
    reset_dir(staging).map_err(|e| JobError::io(target, &e))?;

    let mut records = Vec::with_capacity(matched.len());
    for (source, kind) in matched {
        if token.is_cancelled() {
            return Err(JobError::Cancelled {
                target: target.clone(),
            });
        }

        let file_name = source.file_name().unwrap_or_default();
        let staged = staging.join(file_name);
        copy_file(source, &staged).map_err(|e| JobError::io(target, &e))?;
        let sha256 = sha256_file(&staged).map_err(|e| JobError::io(target, &e))?;

        tracing::debug!("Collected {} for {}", source.display(), target);
        records.push(ArtifactRecord {
            target: target.clone(),
            kind: *kind,
            source_path: source.clone(),
            destination_path: dest.join(file_name),
            sha256,
        });
    }

    remove_dir_all_if_exists(dest).map_err(|e| JobError::io(target, &e))?;
    fs::rename(staging, dest)
        .with_context(|| format!("failed to move {} to {}", staging.display(), dest.display()))
        .map_err(|e| JobError::io(target, &e))?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> TargetVersionKey {
        TargetVersionKey::parse(s).unwrap()
    }

    fn pattern() -> ArtifactPattern {
        ArtifactPattern::new("{base}-{version}+mc{target}", "pathmind", "1.0.0", "jar")
    }

    #[test]
    fn test_file_names() {
        let [primary, sources] = pattern().file_names(&key("1.21.3"));
        assert_eq!(primary, "pathmind-1.0.0+mc1.21.3.jar");
        assert_eq!(sources, "pathmind-1.0.0+mc1.21.3-sources.jar");
    }

    #[test]
    fn test_matches_only_own_target() {
        let p = pattern();
        let t = key("1.21");
        assert_eq!(p.matches("pathmind-1.0.0+mc1.21.jar", &t), Some(ArtifactKind::Primary));
        assert_eq!(
            p.matches("pathmind-1.0.0+mc1.21-sources.jar", &t),
            Some(ArtifactKind::Sources)
        );
        // Prefix-sharing target must not leak into 1.21.
        assert_eq!(p.matches("pathmind-1.0.0+mc1.21.1.jar", &t), None);
        assert_eq!(p.matches("pathmind-1.0.0+mc1.21-dev.jar", &t), None);
    }

    #[test]
    fn test_collect_copies_matching_files() {
        let tmp = TempDir::new().unwrap();
        let libs = tmp.path().join("libs");
        fs::create_dir_all(&libs).unwrap();
        fs::write(libs.join("pathmind-1.0.0+mc1.21.jar"), "a").unwrap();
        fs::write(libs.join("pathmind-1.0.0+mc1.21-sources.jar"), "b").unwrap();
        fs::write(libs.join("pathmind-1.0.0+mc1.21.1.jar"), "c").unwrap();

        let dest = tmp.path().join("out/1.21");
        let records =
            collect_artifacts(&pattern(), &key("1.21"), &libs, &dest, &CancellationToken::new())
                .unwrap();

        assert_eq!(records.len(), 2);
        assert!(dest.join("pathmind-1.0.0+mc1.21.jar").is_file());
        assert!(dest.join("pathmind-1.0.0+mc1.21-sources.jar").is_file());
        assert!(!dest.join("pathmind-1.0.0+mc1.21.1.jar").exists());
        assert!(!staging_dir(&dest).exists());
    }

    #[test]
    fn test_collect_missing_is_artifact_not_found() {
        let tmp = TempDir::new().unwrap();
        let libs = tmp.path().join("libs");
        fs::create_dir_all(&libs).unwrap();
        fs::write(libs.join("pathmind-1.0.0+mc1.21.1.jar"), "c").unwrap();

        let err = collect_artifacts(
            &pattern(),
            &key("1.21"),
            &libs,
            &tmp.path().join("out/1.21"),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, JobError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_collect_cancelled_leaves_no_output() {
        let tmp = TempDir::new().unwrap();
        let libs = tmp.path().join("libs");
        fs::create_dir_all(&libs).unwrap();
        fs::write(libs.join("pathmind-1.0.0+mc1.21.jar"), "a").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let dest = tmp.path().join("out/1.21");
        let err = collect_artifacts(&pattern(), &key("1.21"), &libs, &dest, &token).unwrap_err();

        assert!(matches!(err, JobError::Cancelled { .. }));
        assert!(!dest.exists());
        assert!(!staging_dir(&dest).exists());
    }

    #[test]
    fn test_staging_dir_is_hidden_sibling() {
        assert_eq!(
            staging_dir(Path::new("out/1.21.3")),
            PathBuf::from("out/.1.21.3.partial")
        );
    }
}
