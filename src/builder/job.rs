//! Build jobs and their outcomes.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::core::version::TargetVersionKey;

/// Number of trailing stderr lines kept in failure reports.
const STDERR_TAIL_LINES: usize = 20;

/// Result of one blocking compile invocation.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Target the compile ran for
    pub target: TargetVersionKey,

    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,

    /// Wall-clock duration
    pub duration: Duration,

    /// Whether the compile was killed after cancellation
    pub cancelled: bool,
}

impl JobResult {
    /// A successful result with no output, mostly useful for test doubles.
    pub fn succeeded(target: TargetVersionKey) -> Self {
        JobResult {
            target,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
            cancelled: false,
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(target: TargetVersionKey, exit_code: i32, stderr: impl Into<String>) -> Self {
        JobResult {
            target,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
            cancelled: false,
        }
    }

    /// Whether the compile completed successfully.
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == Some(0)
    }

    /// Last lines of stderr, for diagnostics.
    pub fn stderr_tail(&self) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
        lines[start..].join("\n")
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JobError {
    #[error("build for `{target}` failed with exit code {}", display_code(.exit_code))]
    SubprocessFailure {
        target: TargetVersionKey,
        exit_code: Option<i32>,
        stderr_tail: String,
    },

    #[error("build for `{target}` succeeded but produced no artifact named {}", .expected.join(" or "))]
    ArtifactNotFound {
        target: TargetVersionKey,
        expected: Vec<String>,
        searched: PathBuf,
    },

    #[error("build for `{target}` was cancelled")]
    Cancelled { target: TargetVersionKey },

    #[error("build for `{target}` failed: {message}")]
    Io {
        target: TargetVersionKey,
        message: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl JobError {
    pub fn target(&self) -> &TargetVersionKey {
        match self {
            JobError::SubprocessFailure { target, .. }
            | JobError::ArtifactNotFound { target, .. }
            | JobError::Cancelled { target }
            | JobError::Io { target, .. } => target,
        }
    }

    /// Wrap an unexpected error for a target.
    pub fn io(target: &TargetVersionKey, err: &anyhow::Error) -> Self {
        JobError::Io {
            target: target.clone(),
            message: format!("{:#}", err),
        }
    }
}

/// Lifecycle of a build job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed(JobError),
}

/// How far a job's working directory is isolated from other jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceIsolation {
    /// Every job compiles in the one project workspace, so jobs must run
    /// one at a time.
    #[default]
    SharedWorkspace,
}

/// One compile-and-collect unit of work for a single target.
///
/// A job exclusively owns its output directory; how much of the build
/// workspace it shares is recorded in `isolation`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildJob {
    pub target: TargetVersionKey,
    pub output_dir: PathBuf,
    pub isolation: WorkspaceIsolation,
    pub status: JobStatus,
}

impl BuildJob {
    pub fn new(target: TargetVersionKey, output_dir: PathBuf) -> Self {
        BuildJob {
            target,
            output_dir,
            isolation: WorkspaceIsolation::SharedWorkspace,
            status: JobStatus::Pending,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match &self.status {
            JobStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}
