//! Error types for graphbind.
//!
//! All errors are strongly typed using thiserror. Construction-time errors
//! are always fatal; there is no silent-construction mode. Execution-time
//! matcher errors respect the caller's `silent` flag (see
//! [`crate::engine::BindEngine::evaluate`]). Zero matches is never an error.

use thiserror::Error;

use crate::fragment::FragmentId;
use crate::storage::StorageError;

/// Errors raised while validating and decomposing a bind construct.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The construct's outgoing sequence has an unsupported size.
    #[error("Expecting an outgoing size of 2 or 3, got {actual}")]
    Structural {
        /// The actual outgoing size.
        actual: usize,
    },

    /// The root fragment is not a recognized bind kind.
    #[error("Expecting a bind link, got {kind}")]
    TypeMismatch {
        /// The offending kind name.
        kind: String,
    },

    /// The variable declaration fragment is malformed.
    #[error("Malformed variable declaration: {reason}")]
    MalformedDeclaration {
        /// What was wrong with the declaration.
        reason: String,
    },

    /// A referenced fragment is not interned in the store.
    #[error("Fragment {id} is not present in the store")]
    DanglingReference {
        /// The missing fragment id.
        id: FragmentId,
    },
}

/// Matcher-internal failures.
///
/// Surfaced to the caller only when a query runs with `silent == false`;
/// silent execution downgrades these to an empty result.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The pattern body cannot be decomposed into clauses.
    #[error("Malformed pattern body: {reason}")]
    MalformedBody {
        /// What was wrong with the body.
        reason: String,
    },

    /// A variable carries a type restriction naming no known fragment kind.
    #[error("Variable {variable} has unresolvable type restriction '{restriction}'")]
    UnresolvableRestriction {
        /// The restricted variable.
        variable: String,
        /// The unrecognized kind name.
        restriction: String,
    },

    /// Unexpected matcher-internal state.
    #[error("Internal matcher error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised while executing a validated construct.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Neither an explicit nor a default store reference was supplied.
    #[error("No store available: neither an explicit nor a default store reference was supplied")]
    StoreUnavailable,

    /// The pattern is disconnected and the connectivity check is enabled.
    #[error("Pattern consists of {components} disconnected components")]
    DisconnectedPattern {
        /// Number of connected components found.
        components: usize,
    },

    /// A storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The matcher failed and the query was not silent.
    #[error("Match error: {0}")]
    Match(#[from] MatchError),
}

/// Top-level error type for graphbind.
///
/// Preserves the distinction between construction-time errors (always fatal)
/// and execution-time errors (matcher failures gated by the `silent` flag).
#[derive(Debug, Error)]
pub enum BindError {
    /// Construction-time error.
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// Execution-time error.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl BindError {
    /// Returns true if this is a construction-time error.
    #[must_use]
    pub const fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Returns true if this is an execution-time error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a matcher failure.
    ///
    /// Only matcher failures are eligible for suppression under silent
    /// execution.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Match(_)))
    }
}

impl From<StorageError> for BindError {
    fn from(error: StorageError) -> Self {
        Self::Execution(ExecutionError::Storage(error))
    }
}

impl From<MatchError> for BindError {
    fn from(error: MatchError) -> Self {
        Self::Execution(ExecutionError::Match(error))
    }
}

/// Result type alias for graphbind operations.
pub type BindResult<T> = Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_names_size() {
        let err = ConstructionError::Structural { actual: 4 };
        let msg = format!("{err}");
        assert!(msg.contains("2 or 3"));
        assert!(msg.contains('4'));
    }

    #[test]
    fn test_type_mismatch_names_kind() {
        let err = ConstructionError::TypeMismatch {
            kind: "Set".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("bind link"));
        assert!(msg.contains("Set"));
    }

    #[test]
    fn test_bind_error_from_construction() {
        let err: BindError = ConstructionError::MalformedDeclaration {
            reason: "empty variable list".to_string(),
        }
        .into();
        assert!(err.is_construction());
        assert!(!err.is_execution());
        assert!(!err.is_match());
    }

    #[test]
    fn test_bind_error_from_execution() {
        let err: BindError = ExecutionError::StoreUnavailable.into();
        assert!(err.is_execution());
        assert!(!err.is_match());
    }

    #[test]
    fn test_bind_error_from_match() {
        let err: BindError = MatchError::MalformedBody {
            reason: "clause is a leaf".to_string(),
        }
        .into();
        assert!(err.is_execution());
        assert!(err.is_match());
        let msg = format!("{err}");
        assert!(msg.contains("clause is a leaf"));
    }

    #[test]
    fn test_bind_error_from_storage() {
        let err: BindError = StorageError::BackendError("poisoned lock".to_string()).into();
        assert!(err.is_execution());
        assert!(!err.is_match());
    }

    #[test]
    fn test_unresolvable_restriction_message() {
        let err = MatchError::UnresolvableRestriction {
            variable: "$x".to_string(),
            restriction: "Widget".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("$x"));
        assert!(msg.contains("Widget"));
    }
}
