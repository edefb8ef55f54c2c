//! High-level operations.
//!
//! This module contains the implementation of multiver commands.

pub mod multiver_build;
pub mod multiver_build_all;
pub mod multiver_clean;
pub mod targets;

pub use multiver_build::{build, BuildOptions};
pub use multiver_build_all::{artifact_pattern, build_all, build_all_with, BuildAllOptions};
pub use multiver_clean::clean;
pub use targets::{format_targets, list_targets, TargetInfo};
