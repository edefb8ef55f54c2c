//! Core data structures.
//!
//! Target keys, the version registry, source variants, the manifest and
//! the workspace that ties them to a project root.

pub mod manifest;
pub mod registry;
pub mod variant;
pub mod version;
pub mod workspace;

pub use manifest::Manifest;
pub use registry::{ToolchainSpec, VersionRegistry};
pub use variant::{SourceVariantClass, SourceVariantSelector};
pub use version::TargetVersionKey;
pub use workspace::Workspace;
