//! Multiver.toml manifest parsing and schema.
//!
//! The manifest declares the project, how to invoke the underlying build,
//! the ordered target registry, the curated source-variant partition and
//! the optional companion dependency.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::registry::{ToolchainSpec, VersionRegistry};
use crate::core::variant::SourceVariantSelector;
use crate::core::version::TargetVersionKey;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Multiver.toml";

/// Placeholder that must appear in the artifact stem.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ProjectMetadata {
    /// Project name
    pub name: String,

    /// Project version
    pub version: Version,

    /// Base name of produced artifacts (defaults to the project name)
    #[serde(default)]
    pub artifact_base: Option<String>,

    /// Loader/runtime identifier substituted into the descriptor
    #[serde(default)]
    pub loader_version: Option<String>,
}

impl ProjectMetadata {
    pub fn artifact_base(&self) -> &str {
        self.artifact_base.as_deref().unwrap_or(&self.name)
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct BuildSection {
    /// External compile command; arguments may contain placeholders
    pub command: Vec<String>,

    /// Shared build state directory, wiped by reset
    pub dir: PathBuf,

    /// Shared build-output location scanned for artifacts
    pub artifacts: PathBuf,

    /// Target-qualified artifact file stem
    pub artifact_stem: String,

    /// Artifact file extension
    pub artifact_ext: String,

    /// Root holding one source directory per variant
    pub sources: PathBuf,

    /// Extra paths removed by reset
    pub reset_paths: Vec<PathBuf>,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            command: Vec::new(),
            dir: PathBuf::from("build"),
            artifacts: PathBuf::from("build/libs"),
            artifact_stem: "{base}-{target}".to_string(),
            artifact_ext: "jar".to_string(),
            sources: PathBuf::from("src"),
            reset_paths: Vec::new(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Multi-target output root; one directory per target below it
    pub root: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        OutputSection {
            root: PathBuf::from("build/multi-target"),
        }
    }
}

/// `[descriptor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorSection {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// One `[[targets]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    version: TargetVersionKey,
    mapping: String,
    companion: String,
}

/// `[variants]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VariantsSection {
    legacy: Vec<TargetVersionKey>,
    mid: Vec<TargetVersionKey>,
}

/// `[optional-dependency]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct OptionalDependencySpec {
    /// Display name
    pub name: String,

    /// Environment variable holding the file location
    #[serde(default)]
    pub env: Option<String>,

    /// Conventional locations, relative to the project root
    #[serde(default)]
    pub candidates: Vec<PathBuf>,

    /// Targets known to be binary-compatible at run time
    #[serde(default)]
    pub runtime_compatible: Vec<TargetVersionKey>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawManifest {
    project: ProjectMetadata,
    #[serde(default)]
    build: BuildSection,
    #[serde(default)]
    output: OutputSection,
    #[serde(default)]
    descriptor: Option<DescriptorSection>,
    #[serde(default)]
    targets: Vec<TargetEntry>,
    #[serde(default)]
    variants: VariantsSection,
    #[serde(default)]
    optional_dependency: Option<OptionalDependencySpec>,
}

/// The parsed and validated Multiver.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub project: ProjectMetadata,
    pub build: BuildSection,
    pub output: OutputSection,
    pub descriptor: Option<DescriptorSection>,
    pub registry: VersionRegistry,
    pub variants: SourceVariantSelector,
    pub optional_dependency: Option<OptionalDependencySpec>,
}

impl Manifest {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse and validate manifest contents.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(contents)?;

        if raw.project.name.trim().is_empty() {
            bail!("project name must not be empty");
        }

        if !raw.build.artifact_stem.contains(TARGET_PLACEHOLDER) {
            bail!(
                "artifact-stem `{}` must contain `{}` so each target's artifacts stay distinct",
                raw.build.artifact_stem,
                TARGET_PLACEHOLDER
            );
        }

        let registry = VersionRegistry::from_entries(raw.targets.into_iter().map(|t| {
            (t.version, ToolchainSpec::new(t.mapping, t.companion))
        }))?;

        let variants = SourceVariantSelector::new(raw.variants.legacy, raw.variants.mid)?;

        Ok(Manifest {
            project: raw.project,
            build: raw.build,
            output: raw.output,
            descriptor: raw.descriptor,
            registry,
            variants,
            optional_dependency: raw.optional_dependency,
        })
    }

    /// Effective artifact version for a target, e.g. `1.0.0+1.21.3`.
    pub fn artifact_version(&self, target: &TargetVersionKey) -> String {
        format!("{}+{}", self.project.version, target)
    }

    /// Relative paths wiped by a full reset.
    pub fn reset_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.build.dir.clone()];
        if !self.output.root.starts_with(&self.build.dir) {
            paths.push(self.output.root.clone());
        }
        paths.extend(self.build.reset_paths.iter().cloned());
        paths
    }
}

/// Resolve the manifest path inside `dir`, if one exists.
pub fn manifest_in(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(MANIFEST_NAME);
    path.is_file().then_some(path)
}
