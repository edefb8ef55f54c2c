//! Implementation of `multiver build-all`.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::builder::artifacts::ArtifactPattern;
use crate::builder::compile::{CompileTarget, SelfInvokeCompiler};
use crate::builder::events::BuildEvent;
use crate::builder::orchestrator::{BuildAllReport, BuildOrchestrator, FailurePolicy, OutputLayout};
use crate::core::workspace::Workspace;
use crate::util::process::CancellationToken;

/// Options for the build-all command.
#[derive(Debug, Clone, Default)]
pub struct BuildAllOptions {
    pub policy: FailurePolicy,

    /// Explicit optional-dependency location forwarded to every job
    pub optional_dep: Option<PathBuf>,

    /// Runtime-link opt-in forwarded to every job
    pub runtime_link: bool,

    /// Forward `--verbose` to every job
    pub verbose: bool,

    pub cancellation: CancellationToken,
}

/// Artifact naming rule for a workspace.
pub fn artifact_pattern(ws: &Workspace) -> ArtifactPattern {
    let manifest = ws.manifest();
    ArtifactPattern::new(
        manifest.build.artifact_stem.clone(),
        manifest.project.artifact_base(),
        manifest.project.version.to_string(),
        manifest.build.artifact_ext.clone(),
    )
}

/// Build every registered target by re-invoking this executable per target.
pub fn build_all(
    ws: &Workspace,
    opts: &BuildAllOptions,
    observer: impl FnMut(&BuildEvent),
) -> Result<BuildAllReport> {
    let compiler = SelfInvokeCompiler::current(ws.root())?
        .manifest_path(ws.manifest_path())
        .optional_dep(opts.optional_dep.as_deref())
        .runtime_link(opts.runtime_link)
        .verbose(opts.verbose);
    build_all_with(ws, compiler, opts, observer)
}

/// Build every registered target with the given compiler.
pub fn build_all_with<C: CompileTarget>(
    ws: &Workspace,
    compiler: C,
    opts: &BuildAllOptions,
    observer: impl FnMut(&BuildEvent),
) -> Result<BuildAllReport> {
    let registry = &ws.manifest().registry;
    if registry.is_empty() {
        bail!("no targets declared; add [[targets]] entries to Multiver.toml");
    }

    tracing::info!(
        "Building {} target(s): {}",
        registry.len(),
        registry.supported_range().unwrap_or_default()
    );

    BuildOrchestrator::new(registry, compiler, OutputLayout::from_workspace(ws), artifact_pattern(ws))
        .policy(opts.policy)
        .cancellation(opts.cancellation.clone())
        .observe(observer)
        .build_all()
}
