//! Single-target build planning.
//!
//! A plan is everything one target's build needs to know: its resolved
//! toolchain parameters, source variant, optional-dependency state,
//! rendered descriptor location and the concrete compile command. Planning
//! touches nothing on disk besides probing for the optional dependency.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::builder::template::{substitute, PlaceholderStyle};
use crate::core::variant::SourceVariantClass;
use crate::core::version::TargetVersionKey;
use crate::core::workspace::Workspace;
use crate::resolver::{Overrides, ParameterResolver};
use crate::sources::optional::{
    BuildWarning, OptionalDependency, OptionalDependencyDescriptor, OptionalDependencyResolver,
};

/// Caller-supplied inputs for a single-target build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOptions {
    pub mapping_id: Option<String>,
    pub companion_version: Option<String>,
    /// Explicit optional-dependency location
    pub optional_dep: Option<PathBuf>,
    /// Opt in to linking the optional dependency at run time
    pub runtime_link: bool,
}

impl TargetOptions {
    fn overrides(&self) -> Overrides {
        Overrides {
            mapping_id: self.mapping_id.clone(),
            companion_version: self.companion_version.clone(),
        }
    }
}

/// Descriptor template and where its rendered copy goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorPlan {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// Everything needed to build one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPlan {
    pub target: TargetVersionKey,
    pub mapping_id: String,
    pub companion_version: String,
    /// Effective artifact version, `<project version>+<target>`
    pub version: String,
    pub loader_version: Option<String>,
    pub variant: SourceVariantClass,
    pub variant_dir: PathBuf,
    pub optional_dependency: OptionalDependency,
    pub runtime_link: bool,
    pub descriptor: Option<DescriptorPlan>,
    pub command: Vec<String>,
    pub working_dir: PathBuf,
    pub warnings: Vec<BuildWarning>,
}

impl TargetPlan {
    /// Environment exported to the compile command.
    pub fn env_vars(&self) -> BTreeMap<&'static str, String> {
        let mut env = BTreeMap::new();
        env.insert("MULTIVER_TARGET", self.target.to_string());
        env.insert("MULTIVER_MAPPING_ID", self.mapping_id.clone());
        env.insert("MULTIVER_COMPANION_VERSION", self.companion_version.clone());
        env.insert("MULTIVER_VERSION", self.version.clone());
        env.insert("MULTIVER_VARIANT", self.variant.to_string());
        env.insert(
            "MULTIVER_VARIANT_DIR",
            self.variant_dir.display().to_string(),
        );
        if let Some(path) = self.optional_dependency.path() {
            env.insert("MULTIVER_OPTIONAL_DEP", path.display().to_string());
        }
        env.insert("MULTIVER_OPTIONAL_DEP_RUNTIME", self.runtime_link.to_string());
        env
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Optional-dependency resolver for a workspace, if one is declared.
///
/// `env_value` is the current value of the dependency's environment
/// variable; it is passed in so callers decide how the environment is read.
pub fn optional_dependency_resolver(
    ws: &Workspace,
    explicit: Option<&std::path::Path>,
    env_value: Option<&str>,
) -> Option<OptionalDependencyResolver> {
    let spec = ws.manifest().optional_dependency.as_ref()?;
    let descriptor = OptionalDependencyDescriptor::search_order(
        spec.name.clone(),
        ws.root(),
        env_value,
        explicit,
        &spec.candidates,
    );
    Some(OptionalDependencyResolver::new(
        descriptor,
        spec.runtime_compatible.iter().cloned(),
    ))
}

/// Resolve everything a single-target build needs.
///
/// Fails with a [`ConfigurationError`](crate::resolver::ConfigurationError)
/// when a toolchain parameter cannot be resolved.
pub fn plan_target(
    ws: &Workspace,
    target: &TargetVersionKey,
    options: &TargetOptions,
) -> Result<TargetPlan> {
    let manifest = ws.manifest();
    let params = ParameterResolver::new(&manifest.registry).resolve(target, &options.overrides())?;

    let variant = manifest.variants.classify(target.as_str());
    let variant_dir = variant.source_dir(&ws.sources_root());

    let mut warnings = Vec::new();
    let env_value = manifest
        .optional_dependency
        .as_ref()
        .and_then(|spec| spec.env.as_deref())
        .and_then(|name| std::env::var(name).ok());
    let optional_dependency =
        match optional_dependency_resolver(ws, options.optional_dep.as_deref(), env_value.as_deref()) {
            Some(resolver) => resolver.resolve_for(target, options.runtime_link, &mut warnings),
            None => OptionalDependency::Absent,
        };
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let version = manifest.artifact_version(target);
    let command = manifest
        .build
        .command
        .iter()
        .map(|arg| {
            substitute(
                arg,
                PlaceholderStyle::Braces,
                &[
                    ("target", target.as_str()),
                    ("mapping", params.mapping_id.as_str()),
                    ("companion", params.companion_version.as_str()),
                    ("variant", variant.dir_name()),
                    ("version", version.as_str()),
                ],
            )
        })
        .collect();

    let descriptor = manifest.descriptor.as_ref().map(|d| DescriptorPlan {
        template: ws.path(&d.template),
        output: ws.path(&d.output),
    });

    Ok(TargetPlan {
        target: params.target,
        mapping_id: params.mapping_id,
        companion_version: params.companion_version,
        version,
        loader_version: manifest.project.loader_version.clone(),
        variant,
        variant_dir,
        runtime_link: optional_dependency.is_runtime_linked(),
        optional_dependency,
        descriptor,
        command,
        working_dir: ws.root().to_path_buf(),
        warnings,
    })
}
