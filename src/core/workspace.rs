//! Workspace - central configuration hub.
//!
//! A Workspace pairs the loaded manifest with its project root and resolves
//! every manifest-relative path the build needs.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::manifest::{manifest_in, Manifest, MANIFEST_NAME};
use crate::util::fs::resolve_against;

/// Error locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}`", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },

    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFoundInAncestors { dir: PathBuf },
}

/// Find the manifest in a directory (no upward search).
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    manifest_in(dir).ok_or_else(|| ManifestError::NotFound {
        dir: dir.to_path_buf(),
    })
}

/// A loaded project.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    manifest_path: PathBuf,
    manifest: Manifest,
}

impl Workspace {
    /// Load a workspace from a manifest path.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Ok(Workspace {
            root,
            manifest_path: manifest_path.to_path_buf(),
            manifest,
        })
    }

    /// Create a workspace from an already parsed manifest.
    pub fn from_manifest(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        let root = root.into();
        Workspace {
            manifest_path: root.join(MANIFEST_NAME),
            root,
            manifest,
        }
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolve a manifest-relative path.
    pub fn path(&self, relative: &Path) -> PathBuf {
        resolve_against(&self.root, relative)
    }

    /// Shared build-output location that jobs write artifacts to.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.path(&self.manifest.build.artifacts)
    }

    /// Multi-target output root.
    pub fn output_root(&self) -> PathBuf {
        self.path(&self.manifest.output.root)
    }

    /// Root holding per-variant source directories.
    pub fn sources_root(&self) -> PathBuf {
        self.path(&self.manifest.build.sources)
    }

    /// Absolute paths wiped by a full reset.
    pub fn reset_paths(&self) -> Vec<PathBuf> {
        self.manifest
            .reset_paths()
            .iter()
            .map(|p| self.path(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_workspace(dir: &Path) -> PathBuf {
        let manifest_path = dir.join(MANIFEST_NAME);
        std::fs::write(
            &manifest_path,
            r#"
[project]
name = "demo"
version = "1.0.0"

[[targets]]
version = "1.21"
mapping = "1.21+build.9"
companion = "0.102.0+1.21"
"#,
        )
        .unwrap();
        manifest_path
    }

    #[test]
    fn test_workspace_creation() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = create_test_workspace(tmp.path());

        let ws = Workspace::new(&manifest_path).unwrap();
        assert_eq!(ws.manifest().project.name, "demo");
        assert_eq!(ws.root(), tmp.path());
        assert_eq!(ws.manifest().registry.len(), 1);
    }

    #[test]
    fn test_workspace_paths() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = create_test_workspace(tmp.path());
        let ws = Workspace::new(&manifest_path).unwrap();

        assert_eq!(ws.artifacts_dir(), tmp.path().join("build/libs"));
        assert_eq!(ws.output_root(), tmp.path().join("build/multi-target"));
        assert_eq!(ws.sources_root(), tmp.path().join("src"));
        assert_eq!(ws.reset_paths(), vec![tmp.path().join("build")]);
    }

    #[test]
    fn test_find_manifest_missing() {
        let tmp = TempDir::new().unwrap();
        let err = find_manifest(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("Multiver.toml"));
        assert!(!err.to_string().contains("parent directory"));
    }
}
