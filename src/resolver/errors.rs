//! Parameter resolution errors and diagnostics.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A version-keyed toolchain parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Parameter {
    MappingId,
    CompanionVersion,
}

impl Parameter {
    /// CLI flag that overrides this parameter.
    pub fn flag(&self) -> &'static str {
        match self {
            Parameter::MappingId => "--mapping-id",
            Parameter::CompanionVersion => "--companion-version",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::MappingId => write!(f, "mapping id"),
            Parameter::CompanionVersion => write!(f, "companion version"),
        }
    }
}

/// A required parameter could not be resolved for the requested target.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("no {missing_parameter} configured for target `{target}`")]
#[diagnostic(
    code(multiver::resolve::missing_parameter),
    help("add the target to [[targets]] in Multiver.toml or pass an explicit override")
)]
pub struct ConfigurationError {
    pub missing_parameter: Parameter,
    pub target: String,
    pub known_targets: Vec<String>,
}

impl ConfigurationError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string());

        if !self.known_targets.is_empty() {
            diag = diag.with_context(format!(
                "registered targets: {}",
                self.known_targets.join(", ")
            ));
        }

        diag.with_suggestion(format!(
            "Add `{}` to [[targets]] in Multiver.toml",
            self.target
        ))
        .with_suggestion(format!(
            "Pass `{} <value>` to override it for this build",
            self.missing_parameter.flag()
        ))
        .with_suggestion(suggestions::TARGET_NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_parameter_and_target() {
        let err = ConfigurationError {
            missing_parameter: Parameter::CompanionVersion,
            target: "1.22".to_string(),
            known_targets: vec!["1.21".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no companion version configured for target `1.22`"
        );

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("registered targets: 1.21"));
        assert!(output.contains("--companion-version"));
        assert!(output.contains("multiver targets"));
    }
}
