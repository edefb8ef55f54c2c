//! Build event types for JSON output.
//!
//! These events are emitted one per line when using `--message-format=json`.
//!
//! # Event Types
//!
//! - `reset`: The shared build state was wiped
//! - `job-started`: A target's compile began
//! - `artifact-collected`: A target-qualified file was copied into place
//! - `job-finished`: A target's job ended (success or failure)
//! - `job-skipped`: A target never ran because an earlier job failed
//! - `build-finished`: The whole build-all ended
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::artifacts::{ArtifactKind, ArtifactRecord};
use crate::builder::job::JobError;
use crate::core::version::TargetVersionKey;

/// A build event emitted during a build-all.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum BuildEvent {
    /// Shared build state was removed.
    Reset { paths: Vec<PathBuf> },

    /// A job started.
    JobStarted {
        target: TargetVersionKey,
        /// 1-based position in registry order
        index: usize,
        total: usize,
    },

    /// An artifact was collected into the target's output directory.
    ArtifactCollected {
        target: TargetVersionKey,
        kind: ArtifactKind,
        path: PathBuf,
        sha256: String,
    },

    /// A job finished.
    JobFinished {
        target: TargetVersionKey,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<JobError>,
    },

    /// A job never started.
    JobSkipped { target: TargetVersionKey },

    /// Build-all completed.
    BuildFinished {
        success: bool,
        duration_ms: u64,
        succeeded: usize,
        failed: Vec<TargetVersionKey>,
        skipped: Vec<TargetVersionKey>,
    },
}

impl BuildEvent {
    pub fn artifact(record: &ArtifactRecord) -> Self {
        BuildEvent::ArtifactCollected {
            target: record.target.clone(),
            kind: record.kind,
            path: record.destination_path.clone(),
            sha256: record.sha256.clone(),
        }
    }

    /// Target this event concerns, if any.
    pub fn target(&self) -> Option<&TargetVersionKey> {
        match self {
            BuildEvent::JobStarted { target, .. }
            | BuildEvent::ArtifactCollected { target, .. }
            | BuildEvent::JobFinished { target, .. }
            | BuildEvent::JobSkipped { target } => Some(target),
            _ => None,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> TargetVersionKey {
        TargetVersionKey::parse(s).unwrap()
    }

    #[test]
    fn test_job_started_serialization() {
        let event = BuildEvent::JobStarted {
            target: key("1.21.3"),
            index: 4,
            total: 9,
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"job-started\""));
        assert!(json.contains("\"target\":\"1.21.3\""));
        assert!(json.contains("\"index\":4"));
    }

    #[test]
    fn test_job_finished_with_error() {
        let event = BuildEvent::JobFinished {
            target: key("1.21"),
            success: false,
            duration_ms: 1200,
            error: Some(JobError::SubprocessFailure {
                target: key("1.21"),
                exit_code: Some(1),
                stderr_tail: "BUILD FAILED".into(),
            }),
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"job-finished\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"kind\":\"subprocess-failure\""));
        assert!(json.contains("BUILD FAILED"));
    }

    #[test]
    fn test_job_finished_success_omits_error() {
        let event = BuildEvent::JobFinished {
            target: key("1.21"),
            success: true,
            duration_ms: 10,
            error: None,
        };
        assert!(!event.to_json().contains("\"error\""));
    }

    #[test]
    fn test_build_finished_serialization() {
        let event = BuildEvent::BuildFinished {
            success: false,
            duration_ms: 2340,
            succeeded: 2,
            failed: vec![key("1.21.1")],
            skipped: vec![],
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"build-finished\""));
        assert!(json.contains("\"failed\":[\"1.21.1\"]"));
        assert!(event.target().is_none());
    }
}
