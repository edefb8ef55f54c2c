//! Implementation of `multiver build`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::plan::{plan_target, TargetOptions, TargetPlan};
use crate::builder::template::DescriptorVars;
use crate::core::version::TargetVersionKey;
use crate::core::workspace::Workspace;
use crate::util::fs::{read_to_string, write_string};
use crate::util::process::{resolve_program, ProcessBuilder};

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Parameter overrides and optional-dependency inputs
    pub target: TargetOptions,

    /// Print the plan instead of building
    pub plan_only: bool,
}

/// Build a single target.
///
/// Resolves the plan, renders the descriptor and runs the configured
/// compile command with inherited stdio. Returns the plan that was run.
pub fn build(ws: &Workspace, target: &TargetVersionKey, opts: &BuildOptions) -> Result<TargetPlan> {
    let plan = plan_target(ws, target, &opts.target)?;
    if !ws.manifest().registry.is_supported(target.as_str()) {
        tracing::warn!(
            "`{}` is not a registered target; building with explicit overrides",
            target
        );
    }
    if opts.plan_only {
        return Ok(plan);
    }

    render_descriptor(&plan)?;
    run_command(&plan)?;
    Ok(plan)
}

/// Write the rendered descriptor, if the project declares one.
pub fn render_descriptor(plan: &TargetPlan) -> Result<Option<PathBuf>> {
    let Some(descriptor) = &plan.descriptor else {
        return Ok(None);
    };

    let template = read_to_string(&descriptor.template)
        .with_context(|| format!("failed to read descriptor template for `{}`", plan.target))?;
    let rendered = DescriptorVars {
        version: &plan.version,
        target: plan.target.as_str(),
        companion_version: &plan.companion_version,
        loader_version: plan.loader_version.as_deref().unwrap_or_default(),
    }
    .render(&template);

    write_string(&descriptor.output, &rendered)?;
    tracing::debug!("Rendered {}", descriptor.output.display());
    Ok(Some(descriptor.output.clone()))
}

/// The process that compiles `plan`.
pub fn command_for(plan: &TargetPlan) -> Result<ProcessBuilder> {
    let Some((program, args)) = plan.command.split_first() else {
        bail!("no build command configured; set `command` in the [build] section of Multiver.toml");
    };

    let mut process = ProcessBuilder::new(program_path(&plan.working_dir, program))
        .args(args)
        .cwd(&plan.working_dir);
    for (key, value) in plan.env_vars() {
        process = process.env(key, value);
    }
    if plan.optional_dependency.path().is_none() {
        process = process.env_remove("MULTIVER_OPTIONAL_DEP");
    }
    Ok(process)
}

fn program_path(root: &Path, program: &str) -> PathBuf {
    let resolved = resolve_program(program);
    if resolved.is_relative() && resolved.components().count() > 1 {
        root.join(resolved)
    } else {
        resolved
    }
}

fn run_command(plan: &TargetPlan) -> Result<()> {
    let process = command_for(plan)?;
    tracing::info!("Compiling `{}` ({} sources)", plan.target, plan.variant);
    tracing::debug!("Running `{}`", process.display_command());

    let status = process.status()?;
    if !status.success() {
        match status.code() {
            Some(code) => bail!("build command for `{}` exited with status {}", plan.target, code),
            None => bail!("build command for `{}` was terminated by a signal", plan.target),
        }
    }
    Ok(())
}
