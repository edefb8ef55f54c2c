//! Multi-target build orchestration.
//!
//! A build-all wipes the shared build state once, then runs one job per
//! registry entry, in registry order, one at a time. Each job owns exactly
//! one output directory under the output root; it wipes that directory,
//! compiles its target through a [`CompileTarget`] and collects the files
//! whose names embed its target.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::builder::artifacts::{collect_artifacts, staging_dir, ArtifactPattern, ArtifactRecord};
use crate::builder::compile::{CompileRequest, CompileTarget};
use crate::builder::events::BuildEvent;
use crate::builder::job::{BuildJob, JobError, JobStatus};
use crate::core::registry::VersionRegistry;
use crate::core::version::TargetVersionKey;
use crate::core::workspace::Workspace;
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::process::CancellationToken;

/// What to do with the remaining targets after a job fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop issuing jobs after the first failure.
    #[default]
    FailFast,
    /// Record the failure and move on to the next target.
    ContinueOnError,
}

/// Filesystem locations a build-all touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Paths removed by the global reset
    pub reset_paths: Vec<PathBuf>,
    /// Shared build-output location every job writes to
    pub artifacts_dir: PathBuf,
    /// Parent of the per-target output directories
    pub output_root: PathBuf,
}

impl OutputLayout {
    pub fn from_workspace(ws: &Workspace) -> Self {
        OutputLayout {
            reset_paths: ws.reset_paths(),
            artifacts_dir: ws.artifacts_dir(),
            output_root: ws.output_root(),
        }
    }

    /// Output directory owned by `target`: always a direct child of
    /// `output_root`, since a job wipes it before running.
    pub fn target_dir(&self, target: &TargetVersionKey) -> Result<PathBuf> {
        let dir = self.output_root.join(target.as_str());
        let direct_child = dir.parent() == Some(self.output_root.as_path())
            && dir.file_name().and_then(|n| n.to_str()) == Some(target.as_str());
        if !direct_child {
            bail!(
                "target `{}` does not name a directory under {}",
                target,
                self.output_root.display()
            );
        }
        Ok(dir)
    }
}

/// Outcome of a build-all.
#[derive(Debug, Clone)]
pub struct BuildAllReport {
    /// One job per registry entry, in registry order
    pub jobs: Vec<BuildJob>,
    /// Every collected artifact
    pub artifacts: Vec<ArtifactRecord>,
    /// Recorded transitions
    pub events: Vec<BuildEvent>,
    pub duration: Duration,
}

impl BuildAllReport {
    /// True only when every job succeeded.
    pub fn success(&self) -> bool {
        self.jobs.iter().all(|j| j.status == JobStatus::Succeeded)
    }

    pub fn succeeded_targets(&self) -> Vec<TargetVersionKey> {
        self.targets_where(|s| matches!(s, JobStatus::Succeeded))
    }

    pub fn failed_targets(&self) -> Vec<TargetVersionKey> {
        self.targets_where(|s| matches!(s, JobStatus::Failed(_)))
    }

    /// Targets whose jobs never started.
    pub fn skipped_targets(&self) -> Vec<TargetVersionKey> {
        self.targets_where(|s| matches!(s, JobStatus::Pending))
    }

    pub fn errors(&self) -> impl Iterator<Item = &JobError> {
        self.jobs.iter().filter_map(|j| j.error())
    }

    /// Artifacts collected for one target.
    pub fn artifacts_for<'a>(
        &'a self,
        target: &'a TargetVersionKey,
    ) -> impl Iterator<Item = &'a ArtifactRecord> + 'a {
        self.artifacts.iter().filter(move |a| &a.target == target)
    }

    fn targets_where(&self, pred: impl Fn(&JobStatus) -> bool) -> Vec<TargetVersionKey> {
        self.jobs
            .iter()
            .filter(|j| pred(&j.status))
            .map(|j| j.target.clone())
            .collect()
    }
}

type Observer<'a> = Box<dyn FnMut(&BuildEvent) + 'a>;

/// Drives one isolated compile-and-collect job per registered target.
pub struct BuildOrchestrator<'a, C> {
    registry: &'a VersionRegistry,
    compiler: C,
    layout: OutputLayout,
    pattern: ArtifactPattern,
    policy: FailurePolicy,
    token: CancellationToken,
    observer: Option<Observer<'a>>,
}

impl<'a, C: CompileTarget> BuildOrchestrator<'a, C> {
    pub fn new(
        registry: &'a VersionRegistry,
        compiler: C,
        layout: OutputLayout,
        pattern: ArtifactPattern,
    ) -> Self {
        BuildOrchestrator {
            registry,
            compiler,
            layout,
            pattern,
            policy: FailurePolicy::default(),
            token: CancellationToken::new(),
            observer: None,
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use an externally owned cancellation token.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Receive every event as it happens.
    pub fn observe(mut self, observer: impl FnMut(&BuildEvent) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Reset shared state, then build every registered target.
    ///
    /// Job failures are reported in the returned [`BuildAllReport`]; `Err`
    /// means no job ran, because a target has no valid output directory or
    /// the global reset failed.
    pub fn build_all(&mut self) -> Result<BuildAllReport> {
        let start = Instant::now();
        let mut events = Vec::new();
        let mut artifacts = Vec::new();

        let mut jobs = self
            .registry
            .keys()
            .map(|t| Ok(BuildJob::new(t.clone(), self.layout.target_dir(t)?)))
            .collect::<Result<Vec<_>>>()?;

        self.reset()?;
        self.emit(
            &mut events,
            BuildEvent::Reset {
                paths: self.layout.reset_paths.clone(),
            },
        );

        let total = jobs.len();
        for (i, job) in jobs.iter_mut().enumerate() {
            if self.token.is_cancelled() {
                tracing::warn!("Cancellation requested; not starting `{}`", job.target);
                break;
            }

            self.emit(
                &mut events,
                BuildEvent::JobStarted {
                    target: job.target.clone(),
                    index: i + 1,
                    total,
                },
            );
            job.status = JobStatus::Running;

            let job_start = Instant::now();
            let outcome = self.run_job(job);
            let duration_ms = job_start.elapsed().as_millis() as u64;

            let failed = match outcome {
                Ok(records) => {
                    for record in &records {
                        self.emit(&mut events, BuildEvent::artifact(record));
                    }
                    artifacts.extend(records);
                    job.status = JobStatus::Succeeded;
                    self.emit(
                        &mut events,
                        BuildEvent::JobFinished {
                            target: job.target.clone(),
                            success: true,
                            duration_ms,
                            error: None,
                        },
                    );
                    false
                }
                Err(err) => {
                    tracing::error!("{}", err);
                    job.status = JobStatus::Failed(err.clone());
                    self.emit(
                        &mut events,
                        BuildEvent::JobFinished {
                            target: job.target.clone(),
                            success: false,
                            duration_ms,
                            error: Some(err),
                        },
                    );
                    true
                }
            };

            if failed && self.policy == FailurePolicy::FailFast {
                break;
            }
        }

        for job in jobs.iter().filter(|j| j.status == JobStatus::Pending) {
            self.emit(
                &mut events,
                BuildEvent::JobSkipped {
                    target: job.target.clone(),
                },
            );
        }

        let duration = start.elapsed();
        let mut report = BuildAllReport {
            jobs,
            artifacts,
            events: Vec::new(),
            duration,
        };
        self.emit(
            &mut events,
            BuildEvent::BuildFinished {
                success: report.success(),
                duration_ms: duration.as_millis() as u64,
                succeeded: report.succeeded_targets().len(),
                failed: report.failed_targets(),
                skipped: report.skipped_targets(),
            },
        );
        report.events = events;
        Ok(report)
    }

    /// Global reset. Runs exactly once, before any job.
    fn reset(&self) -> Result<()> {
        for path in &self.layout.reset_paths {
            tracing::debug!("Removing {}", path.display());
            remove_dir_all_if_exists(path)
                .with_context(|| format!("failed to reset {}", path.display()))?;
        }
        Ok(())
    }

    fn run_job(&mut self, job: &BuildJob) -> Result<Vec<ArtifactRecord>, JobError> {
        let target = &job.target;

        for dir in [job.output_dir.clone(), staging_dir(&job.output_dir)] {
            remove_dir_all_if_exists(&dir).map_err(|e| JobError::io(target, &e))?;
        }

        tracing::info!("Building `{}`", target);
        let result = self
            .compiler
            .compile(&CompileRequest::new(target.clone()), &self.token)
            .map_err(|e| JobError::io(target, &e))?;

        if result.cancelled {
            return Err(JobError::Cancelled {
                target: target.clone(),
            });
        }
        if !result.success() {
            return Err(JobError::SubprocessFailure {
                target: target.clone(),
                exit_code: result.exit_code,
                stderr_tail: result.stderr_tail(),
            });
        }

        collect_artifacts(
            &self.pattern,
            target,
            &self.layout.artifacts_dir,
            &job.output_dir,
            &self.token,
        )
    }

    fn emit(&mut self, events: &mut Vec<BuildEvent>, event: BuildEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
        events.push(event);
    }
}
