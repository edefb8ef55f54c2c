//! Multiver - builds one project against many host platform versions
//!
//! This crate provides the core library functionality for multiver:
//! the target registry, parameter resolution, source variant selection,
//! optional dependency gating and multi-target build orchestration.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test doubles for multiver unit tests.
///
/// Only available when compiling tests.
#[cfg(test)]
pub mod test_support;

pub use core::{
    manifest::Manifest, registry::VersionRegistry, version::TargetVersionKey,
    workspace::Workspace,
};

pub use resolver::{ParameterResolver, ResolvedParameters};
pub use util::context::GlobalContext;
