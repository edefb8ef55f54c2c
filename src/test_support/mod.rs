//! Test doubles for multiver unit tests.
//!
//! The stub compiler stands in for the external compile operation: it
//! writes target-named artifacts into a shared output directory, the same
//! way a real build does, and can be told to fail, to produce nothing or to
//! trigger cancellation for a given target.

pub mod fixtures;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use crate::builder::artifacts::ArtifactPattern;
use crate::builder::compile::{CompileRequest, CompileTarget};
use crate::builder::job::JobResult;
use crate::builder::orchestrator::OutputLayout;
use crate::core::registry::{ToolchainSpec, VersionRegistry};
use crate::core::version::TargetVersionKey;
use crate::util::process::CancellationToken;

pub use fixtures::*;

/// Registry with placeholder toolchain specs, in the given order.
pub fn registry_of(targets: &[&str]) -> VersionRegistry {
    VersionRegistry::from_entries(targets.iter().map(|t| {
        (
            TargetVersionKey::parse(t).expect("valid target"),
            ToolchainSpec::new(format!("{}+build.1", t), format!("0.1.0+{}", t)),
        )
    }))
    .expect("unique targets")
}

/// A temporary project tree with the default build layout.
pub struct TestLayout {
    dir: TempDir,
}

impl TestLayout {
    pub fn new() -> Self {
        TestLayout {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.root().join("build/libs")
    }

    pub fn output_root(&self) -> PathBuf {
        self.root().join("build/multi-target")
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            reset_paths: vec![self.root().join("build")],
            artifacts_dir: self.artifacts_dir(),
            output_root: self.output_root(),
        }
    }

    /// Artifacts named `demo-<target>.jar` and `demo-<target>-sources.jar`.
    pub fn pattern(&self) -> ArtifactPattern {
        ArtifactPattern::new("{base}-{target}", "demo", "1.0.0", "jar")
    }
}

/// Compile double that writes artifacts instead of building.
#[derive(Debug)]
pub struct StubCompiler {
    artifacts_dir: PathBuf,
    pattern: ArtifactPattern,
    calls: Vec<String>,
    fail: HashSet<String>,
    no_output: HashSet<String>,
    expect_absent: Option<PathBuf>,
    cancel_after: Option<(String, CancellationToken)>,
}

impl StubCompiler {
    pub fn new(layout: &TestLayout) -> Self {
        StubCompiler {
            artifacts_dir: layout.artifacts_dir(),
            pattern: layout.pattern(),
            calls: Vec::new(),
            fail: HashSet::new(),
            no_output: HashSet::new(),
            expect_absent: None,
            cancel_after: None,
        }
    }

    /// Exit with status 1 for `target`.
    pub fn fail_on(mut self, target: &str) -> Self {
        self.fail.insert(target.to_string());
        self
    }

    /// Succeed for `target` without writing anything.
    pub fn no_output_for(mut self, target: &str) -> Self {
        self.no_output.insert(target.to_string());
        self
    }

    /// Fail every compile that finds `path` on disk.
    pub fn expect_absent(mut self, path: PathBuf) -> Self {
        self.expect_absent = Some(path);
        self
    }

    /// Cancel `token` while compiling `target`, as a signal would.
    pub fn cancel_after(mut self, target: &str, token: CancellationToken) -> Self {
        self.cancel_after = Some((target.to_string(), token));
        self
    }

    /// Targets compiled so far, in call order.
    pub fn calls(&self) -> Vec<&str> {
        self.calls.iter().map(|s| s.as_str()).collect()
    }

    fn write_artifacts(&self, target: &TargetVersionKey) -> Result<()> {
        std::fs::create_dir_all(&self.artifacts_dir)?;
        for name in self.pattern.file_names(target) {
            std::fs::write(self.artifacts_dir.join(&name), format!("{} built for {}", name, target))?;
        }
        Ok(())
    }
}

impl CompileTarget for StubCompiler {
    fn compile(&mut self, request: &CompileRequest, _token: &CancellationToken) -> Result<JobResult> {
        let target = &request.target;
        self.calls.push(target.to_string());

        if let Some(path) = &self.expect_absent {
            if path.exists() {
                return Ok(JobResult::failed(
                    target.clone(),
                    2,
                    format!("{} survived the reset", path.display()),
                ));
            }
        }

        if self.fail.contains(target.as_str()) {
            return Ok(JobResult::failed(target.clone(), 1, "BUILD FAILED"));
        }

        if !self.no_output.contains(target.as_str()) {
            self.write_artifacts(target)?;
        }

        if let Some((cancel_target, token)) = &self.cancel_after {
            if cancel_target == target.as_str() {
                token.cancel();
                let mut result = JobResult::succeeded(target.clone());
                result.exit_code = None;
                result.cancelled = true;
                return Ok(result);
            }
        }

        Ok(JobResult::succeeded(target.clone()))
    }
}
