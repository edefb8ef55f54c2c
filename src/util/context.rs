//! Global context for multiver operations.
//!
//! Provides centralized access to the working directory, configuration
//! locations and output preferences.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::workspace::{find_manifest as ws_find_manifest, ManifestError};
use crate::util::config::{load_config, Config};

/// Project directories for multiver
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("dev", "multiver", "multiver"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Directory holding the global config file
    config_home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let config_home = match PROJECT_DIRS.as_ref() {
            Some(dirs) => dirs.config_dir().to_path_buf(),
            None => directories::BaseDirs::new()
                .map(|b| b.home_dir().join(".multiver"))
                .unwrap_or_else(|| PathBuf::from(".multiver")),
        };

        Ok(GlobalContext {
            cwd,
            config_home,
            verbose: false,
            color: true,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.config_home.join("config.toml")
    }

    /// Get the project-local configuration file path for `root`.
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(".multiver").join("config.toml")
    }

    /// Load merged global and project configuration for a project root.
    pub fn load_config(&self, root: &Path) -> Config {
        load_config(&self.config_path(), &Self::project_config_path(root))
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find Multiver.toml by searching upward from the current directory.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            match ws_find_manifest(&current) {
                Ok(path) => return Ok(path),
                Err(ManifestError::NotFound { .. }) => {
                    if !current.pop() {
                        return Err(ManifestError::NotFoundInAncestors {
                            dir: self.cwd.clone(),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_find_manifest_walks_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("Multiver.toml");
        std::fs::write(&manifest, "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n").unwrap();
        let nested = tmp.path().join("src").join("modern");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested).unwrap();
        assert_eq!(ctx.find_manifest().ok(), Some(manifest));
    }

    #[test]
    fn test_find_manifest_not_found() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf()).unwrap();
        // Walking up from a temp dir may hit the filesystem root without a manifest.
        if let Err(e) = ctx.find_manifest() {
            assert!(matches!(e, ManifestError::NotFoundInAncestors { .. }));
            assert!(e.to_string().contains("or any parent directory"));
        }
    }

    #[test]
    fn test_project_config_path() {
        let path = GlobalContext::project_config_path(Path::new("/work/demo"));
        assert_eq!(path, PathBuf::from("/work/demo/.multiver/config.toml"));
    }
}
