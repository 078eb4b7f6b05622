//! Error taxonomy for the verification engine.
//!
//! Configuration errors (bad scenario graph, malformed reference, unparsable
//! document) abort the operation they occur in. Missing-input errors are
//! usually folded into the report by the validator instead of being raised.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while parsing or resolving a cross-domain reference.
///
/// The four resolution variants are kept distinct so callers can tell which
/// layer of the manifest was missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("invalid reference syntax: {raw:?} (expected ${{domain.resource.outputs.field}})")]
    InvalidSyntax { raw: String },

    #[error("reference {reference}: domain '{domain}' not found in manifest")]
    DomainNotFound { reference: String, domain: String },

    #[error("reference {reference}: resource '{resource}' not found in domain '{domain}'")]
    ResourceNotFound {
        reference: String,
        domain: String,
        resource: String,
    },

    #[error("reference {reference}: resource '{resource}' has no outputs")]
    NoOutputs { reference: String, resource: String },

    #[error("reference {reference}: output field '{field}' not found on resource '{resource}'")]
    FieldNotFound {
        reference: String,
        resource: String,
        field: String,
    },
}

impl ReferenceError {
    /// The raw reference string the error is about.
    pub fn reference(&self) -> &str {
        match self {
            ReferenceError::InvalidSyntax { raw } => raw,
            ReferenceError::DomainNotFound { reference, .. }
            | ReferenceError::ResourceNotFound { reference, .. }
            | ReferenceError::NoOutputs { reference, .. }
            | ReferenceError::FieldNotFound { reference, .. } => reference,
        }
    }
}

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("domain '{domain}' depends on unknown domain '{dependency}'")]
    UnknownDependency { domain: String, dependency: String },

    #[error("domain '{domain}' depends on itself")]
    SelfDependency { domain: String },

    #[error("circular dependency detected among domains: {domains:?}")]
    CircularDependency { domains: Vec<String> },

    #[error("duplicate domain name: {name}")]
    DuplicateDomain { name: String },

    #[error("cross-domain relationship {from} -> {to} names unknown domain '{domain}'")]
    UnknownRelationshipDomain {
        from: String,
        to: String,
        domain: String,
    },

    #[error("validation constraints name unknown domain '{domain}'")]
    UnknownConstraintDomain { domain: String },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("results directory not found: {}", path.display())]
    ResultsDirMissing { path: PathBuf },

    #[error("file walk under {} exceeded its time budget", root.display())]
    WalkTimedOut { root: PathBuf },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_mentions_circular() {
        let err = VerifyError::CircularDependency {
            domains: vec!["a".to_string(), "b".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("circular"));
        assert!(msg.contains("\"a\""));
    }

    #[test]
    fn test_unknown_dependency_mentions_both_names() {
        let err = VerifyError::UnknownDependency {
            domain: "app".to_string(),
            dependency: "ghost".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unknown"));
        assert!(msg.contains("app"));
        assert!(msg.contains("ghost"));
    }

    #[test]
    fn test_reference_error_exposes_reference() {
        let err = ReferenceError::FieldNotFound {
            reference: "${aws.vpc.outputs.vpc_id}".to_string(),
            resource: "vpc".to_string(),
            field: "vpc_id".to_string(),
        };
        assert_eq!(err.reference(), "${aws.vpc.outputs.vpc_id}");
        assert!(err.to_string().contains("vpc_id"));
    }

    #[test]
    fn test_invalid_syntax_display_shows_expected_shape() {
        let err = ReferenceError::InvalidSyntax {
            raw: "${aws.s3}".to_string(),
        };
        assert!(err.to_string().contains("${domain.resource.outputs.field}"));
    }
}
