//! Parameter resolution.
//!
//! Each version-keyed parameter resolves independently: an explicit override
//! wins, otherwise the registry entry for the target is used, otherwise
//! resolution fails. There is no other defaulting.

pub mod errors;

use serde::Serialize;

use crate::core::registry::VersionRegistry;
use crate::core::version::TargetVersionKey;

pub use errors::{ConfigurationError, Parameter};

/// Caller-supplied parameter overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub mapping_id: Option<String>,
    pub companion_version: Option<String>,
}

impl Overrides {
    pub fn none() -> Self {
        Overrides::default()
    }

    pub fn with_mapping_id(mut self, mapping_id: impl Into<String>) -> Self {
        self.mapping_id = Some(mapping_id.into());
        self
    }

    pub fn with_companion_version(mut self, companion_version: impl Into<String>) -> Self {
        self.companion_version = Some(companion_version.into());
        self
    }
}

/// Effective parameters for one build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedParameters {
    pub target: TargetVersionKey,
    pub mapping_id: String,
    pub companion_version: String,
}

/// Resolves parameters against an explicitly supplied registry.
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    registry: &'a VersionRegistry,
}

impl<'a> ParameterResolver<'a> {
    pub fn new(registry: &'a VersionRegistry) -> Self {
        ParameterResolver { registry }
    }

    /// Resolve the parameters for `target`.
    pub fn resolve(
        &self,
        target: &TargetVersionKey,
        overrides: &Overrides,
    ) -> Result<ResolvedParameters, ConfigurationError> {
        let entry = self.registry.get(target.as_str());

        let mapping_id = match (&overrides.mapping_id, entry) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(spec)) => spec.mapping_id.clone(),
            (None, None) => return Err(self.missing(Parameter::MappingId, target)),
        };

        let companion_version = match (&overrides.companion_version, entry) {
            (Some(explicit), _) => explicit.clone(),
            (None, Some(spec)) => spec.companion_version.clone(),
            (None, None) => return Err(self.missing(Parameter::CompanionVersion, target)),
        };

        tracing::debug!(
            "Resolved {}: mapping {}, companion {}",
            target,
            mapping_id,
            companion_version
        );

        Ok(ResolvedParameters {
            target: target.clone(),
            mapping_id,
            companion_version,
        })
    }

    fn missing(&self, parameter: Parameter, target: &TargetVersionKey) -> ConfigurationError {
        ConfigurationError {
            missing_parameter: parameter,
            target: target.to_string(),
            known_targets: self.registry.keys().map(|k| k.to_string()).collect(),
        }
    }
}
