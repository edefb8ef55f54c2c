//! Per-target builds and multi-target orchestration.
//!
//! This module plans single-target builds, runs the external compile
//! through [`CompileTarget`], and drives [`BuildOrchestrator`] across the
//! whole registry.

pub mod artifacts;
pub mod compile;
pub mod events;
pub mod job;
pub mod orchestrator;
pub mod plan;
pub mod template;

pub use artifacts::{ArtifactKind, ArtifactPattern, ArtifactRecord};
pub use compile::{CompileRequest, CompileTarget, SelfInvokeCompiler};
pub use events::BuildEvent;
pub use job::{BuildJob, JobError, JobResult, JobStatus, WorkspaceIsolation};
pub use orchestrator::{BuildAllReport, BuildOrchestrator, FailurePolicy, OutputLayout};
pub use plan::{plan_target, TargetOptions, TargetPlan};
