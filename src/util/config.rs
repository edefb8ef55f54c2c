//! Configuration file support for multiver.
//!
//! Two configuration file locations are supported:
//! - Global: `<config dir>/multiver/config.toml` - User-wide defaults
//! - Project: `.multiver/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both. A setting left out of a file is unset
//! and does not override a lower layer; an explicit `false` does.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::orchestrator::FailurePolicy;

/// multiver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Optional dependency settings
    pub optional_dependency: OptionalDependencyConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Keep building remaining targets after a failure
    pub continue_on_error: Option<bool>,

    /// Default message format for build-all (human, json)
    pub message_format: Option<String>,
}

/// Optional dependency configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OptionalDependencyConfig {
    /// Explicit path to the dependency file
    pub path: Option<PathBuf>,

    /// Opt in to linking the dependency at run time
    pub runtime_link: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.continue_on_error.is_some() {
            self.build.continue_on_error = other.build.continue_on_error;
        }
        if other.build.message_format.is_some() {
            self.build.message_format = other.build.message_format;
        }

        if other.optional_dependency.path.is_some() {
            self.optional_dependency.path = other.optional_dependency.path;
        }
        if other.optional_dependency.runtime_link.is_some() {
            self.optional_dependency.runtime_link = other.optional_dependency.runtime_link;
        }
    }

    /// Failure policy implied by this configuration.
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.build.continue_on_error.unwrap_or(false) {
            FailurePolicy::ContinueOnError
        } else {
            FailurePolicy::FailFast
        }
    }

    /// Whether runtime linking is opted in.
    pub fn runtime_link(&self) -> bool {
        self.optional_dependency.runtime_link.unwrap_or(false)
    }

    /// Whether JSON messages are the configured default.
    pub fn json_messages(&self) -> bool {
        self.build
            .message_format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.multiver/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.build.continue_on_error.is_none());
        assert!(config.optional_dependency.path.is_none());
        assert!(!config.runtime_link());
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
continue-on-error = true
message-format = "json"

[optional-dependency]
path = "libs/companion.jar"
runtime-link = true
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.continue_on_error, Some(true));
        assert!(config.json_messages());
        assert_eq!(
            config.optional_dependency.path,
            Some(PathBuf::from("libs/companion.jar"))
        );
        assert!(config.runtime_link());
        assert_eq!(config.failure_policy(), FailurePolicy::ContinueOnError);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
message-format = "json"

[optional-dependency]
path = "/opt/global.jar"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[build]
message-format = "human"
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        assert_eq!(config.build.message_format.as_deref(), Some("human"));
        assert_eq!(
            config.optional_dependency.path,
            Some(PathBuf::from("/opt/global.jar"))
        );
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\ncontinue-on-error = ").unwrap();

        let config = Config::load_or_default(&config_path);
        assert!(config.build.continue_on_error.is_none());
    }

    #[test]
    fn test_project_false_overrides_global_true() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
continue-on-error = true

[optional-dependency]
runtime-link = true
"#,
        )
        .unwrap();
        std::fs::write(
            &project_path,
            r#"
[build]
continue-on-error = false

[optional-dependency]
runtime-link = false
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
        assert!(!config.runtime_link());
    }

    #[test]
    fn test_unset_project_value_keeps_global() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(&global_path, "[build]\ncontinue-on-error = true\n").unwrap();
        std::fs::write(&project_path, "[build]\nmessage-format = \"json\"\n").unwrap();

        let config = load_config(&global_path, &project_path);
        assert_eq!(config.failure_policy(), FailurePolicy::ContinueOnError);
    }
}
