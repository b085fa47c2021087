//! Error types for the PDP.
//!
//! Only loading and configuration can fail. Evaluation itself never returns
//! an error: problems found while matching a request surface as
//! `Indeterminate` decisions instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::value::AttributeKind;

/// A raw literal could not be turned into an [`AttributeValue`](crate::AttributeValue).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// No attribute kind is registered under this type identifier.
    #[error("Unknown attribute type '{0}'")]
    UnknownType(String),

    /// The literal is not valid for the requested kind.
    #[error("Invalid {kind} literal '{raw}': {reason}")]
    InvalidLiteral {
        kind: AttributeKind,
        raw: String,
        reason: String,
    },
}

impl ValueError {
    pub(crate) fn invalid(kind: AttributeKind, raw: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLiteral {
            kind,
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// Load-time fatal errors for policy documents.
///
/// Every variant names the policy (or source) that was rejected so that the
/// operator can find it.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy '{policy}': unknown attribute type '{type_id}'")]
    UnknownType { policy: String, type_id: String },

    #[error("Policy '{policy}': unknown function '{function_id}'")]
    UnknownFunction { policy: String, function_id: String },

    #[error("Policy '{policy}': unknown combining algorithm '{algorithm_id}'")]
    UnknownAlgorithm {
        policy: String,
        algorithm_id: String,
    },

    #[error("Policy '{policy}': invalid pattern: {reason}")]
    InvalidPattern { policy: String, reason: String },

    #[error("Policy '{policy}' is malformed: {reason}")]
    Malformed { policy: String, reason: String },

    #[error("Policy '{policy}': cyclic reference to group '{group_id}' in {}", location.display())]
    CyclicGroupReference {
        policy: String,
        location: PathBuf,
        group_id: String,
    },

    #[error("Policy '{policy}': group '{group_id}' not found in {}", location.display())]
    GroupNotFound {
        policy: String,
        location: PathBuf,
        group_id: String,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

impl PolicyError {
    pub(crate) fn malformed(policy: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            policy: policy.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors reading a request document.
///
/// Attributes of an unknown type are not errors; they are kept in the request
/// and contribute `Indeterminate` during matching.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Failed to read request {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse request {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Path reported for documents parsed from memory rather than a file.
pub(crate) const INLINE_SOURCE: &str = "<inline>";

/// Evaluator configuration names something that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No {kind} registered as '{id}'")]
    UnknownFactory { kind: &'static str, id: String },

    #[error("No combining algorithm registered as '{0}'")]
    UnknownAlgorithm(String),

    #[error("Cannot alias '{alias}': target '{target}' is not registered")]
    DanglingAlias { alias: String, target: String },
}

/// Errors constructing or reloading a [`PolicyDecisionPoint`](crate::PolicyDecisionPoint).
#[derive(Debug, Error)]
pub enum PdpError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Result type for policy loading.
pub type Result<T> = std::result::Result<T, PolicyError>;
