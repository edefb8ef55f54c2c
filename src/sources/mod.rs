//! External inputs located at build time.
//!
//! Currently this is the optional compile-time companion dependency.

pub mod optional;

pub use optional::{
    BuildWarning, OptionalDependency, OptionalDependencyDescriptor, OptionalDependencyResolver,
};
