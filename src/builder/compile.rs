//! The "compile one target" abstraction.
//!
//! The orchestrator only ever hands a target to a [`CompileTarget`] and
//! blocks until it reports back. The default implementation re-invokes the
//! current executable as `multiver build --target <t>` in the project root,
//! so every target goes through the same parameter resolution, variant
//! selection and optional-dependency gating as a direct single-target run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::builder::job::JobResult;
use crate::core::version::TargetVersionKey;
use crate::util::process::{CancellationToken, ProcessBuilder, ProcessOutcome};

/// Input to a single compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub target: TargetVersionKey,
}

impl CompileRequest {
    pub fn new(target: TargetVersionKey) -> Self {
        CompileRequest { target }
    }
}

/// Blocking compile of one target.
///
/// A non-zero exit is reported through [`JobResult`], not as an error;
/// `Err` is reserved for failing to run the compile at all.
pub trait CompileTarget {
    fn compile(&mut self, request: &CompileRequest, token: &CancellationToken) -> Result<JobResult>;
}

impl<T: CompileTarget + ?Sized> CompileTarget for &mut T {
    fn compile(&mut self, request: &CompileRequest, token: &CancellationToken) -> Result<JobResult> {
        (**self).compile(request, token)
    }
}

/// Compiles a target by running this tool's own `build` command.
#[derive(Debug, Clone)]
pub struct SelfInvokeCompiler {
    program: PathBuf,
    root: PathBuf,
    global_args: Vec<String>,
    build_args: Vec<String>,
}

impl SelfInvokeCompiler {
    /// Re-invoke the running executable.
    pub fn current(root: &Path) -> Result<Self> {
        let program = std::env::current_exe().context("failed to locate the running executable")?;
        Ok(Self::new(program, root))
    }

    pub fn new(program: impl Into<PathBuf>, root: &Path) -> Self {
        SelfInvokeCompiler {
            program: program.into(),
            root: root.to_path_buf(),
            global_args: Vec::new(),
            build_args: Vec::new(),
        }
    }

    /// Forward `--manifest-path` to every child.
    pub fn manifest_path(mut self, path: &Path) -> Self {
        self.global_args.push("--manifest-path".into());
        self.global_args.push(path.display().to_string());
        self
    }

    /// Forward `--optional-dep` to every child.
    pub fn optional_dep(mut self, path: Option<&Path>) -> Self {
        if let Some(path) = path {
            self.build_args.push("--optional-dep".into());
            self.build_args.push(path.display().to_string());
        }
        self
    }

    /// Forward the runtime-link decision to every child, so its own
    /// configuration cannot override it.
    pub fn runtime_link(mut self, enabled: bool) -> Self {
        let flag = if enabled { "--runtime-link" } else { "--no-runtime-link" };
        self.build_args.push(flag.into());
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        if enabled {
            self.global_args.push("--verbose".into());
        }
        self
    }

    /// The process that would run for `target`.
    pub fn process(&self, target: &TargetVersionKey) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(&self.global_args)
            .args(["build", "--target", target.as_str()])
            .args(&self.build_args)
            .cwd(&self.root)
    }
}

impl CompileTarget for SelfInvokeCompiler {
    fn compile(&mut self, request: &CompileRequest, token: &CancellationToken) -> Result<JobResult> {
        let process = self.process(&request.target);
        tracing::debug!("Running `{}`", process.display_command());

        let start = Instant::now();
        let outcome = process
            .exec_cancellable(token)
            .with_context(|| format!("failed to run the build for `{}`", request.target))?;
        let duration = start.elapsed();

        let result = match outcome {
            ProcessOutcome::Exited(output) => JobResult {
                target: request.target.clone(),
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                duration,
                cancelled: false,
            },
            ProcessOutcome::Cancelled { stdout, stderr } => JobResult {
                target: request.target.clone(),
                exit_code: None,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
                duration,
                cancelled: true,
            },
        };
        Ok(result)
    }
}
