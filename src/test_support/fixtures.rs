//! Test fixtures for common test scenarios.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixture for a project directory with a Multiver.toml.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Multiver.toml content.
    pub manifest: String,
    /// Extra files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFixture {
    pub fn new(manifest: impl Into<String>) -> Self {
        ProjectFixture {
            manifest: manifest.into(),
            files: BTreeMap::new(),
        }
    }

    /// The three-target demo project.
    pub fn demo() -> Self {
        ProjectFixture::new(manifests::demo())
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write this fixture into `root` and return the manifest path.
    pub fn write_to(&self, root: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(root)?;
        let manifest_path = root.join(crate::core::manifest::MANIFEST_NAME);
        std::fs::write(&manifest_path, &self.manifest)?;

        for (rel_path, content) in &self.files {
            let full_path = root.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(manifest_path)
    }
}

/// Common manifest templates.
pub mod manifests {
    /// A small project with three targets, one per source variant.
    pub fn demo() -> String {
        r#"[project]
name = "demo"
version = "1.0.0"
loader-version = "0.16.14"

[build]
command = ["./gradlew", "build", "-Pmc_version={target}"]
artifact-stem = "{base}-{version}+mc{target}"

[descriptor]
template = "templates/mod.json"
output = "build/generated/mod.json"

[[targets]]
version = "1.21"
mapping = "1.21+build.9"
companion = "0.102.0+1.21"

[[targets]]
version = "1.21.3"
mapping = "1.21.3+build.2"
companion = "0.114.1+1.21.3"

[[targets]]
version = "1.21.8"
mapping = "1.21.8+build.1"
companion = "0.133.4+1.21.8"

[variants]
legacy = ["1.21"]
mid = ["1.21.3"]

[optional-dependency]
name = "companion-api"
env = "MULTIVER_TEST_COMPANION_JAR"
candidates = ["libs/companion-api.jar"]
runtime-compatible = ["1.21.8"]
"#
        .to_string()
    }

    /// Descriptor template using every supported placeholder.
    pub fn descriptor_template() -> &'static str {
        r#"{"version":"${version}","minecraft":"${target}","fabric-api":"${companionVersion}","loader":"${loaderVersion}"}"#
    }
}
