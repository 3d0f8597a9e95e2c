//! Error types for binding operations

use thiserror::Error;

use crate::tree::NodeId;
use crate::variable::VarId;
use crate::workspace::WorkspaceId;

/// Main error type for binding operations.
///
/// Every variant except `OutOfScope`, `InvalidConnection` and `InvalidName`
/// signals a broken invariant or a caller bug and should abort the current edit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A variable was registered while already registered somewhere
    #[error("Duplicate binding for {id}: {reason}")]
    DuplicateBinding {
        /// The offending variable
        id: VarId,
        /// What was already occupied
        reason: String,
    },

    /// Membership state disagrees with database or slot contents
    #[error("Inconsistent state for {id}: {reason}")]
    InconsistentState {
        /// The offending variable
        id: VarId,
        /// What disagreed
        reason: String,
    },

    /// Operation requested on the wrong role, or not implemented
    #[error("Unsupported operation `{operation}`: {reason}")]
    UnsupportedOperation {
        /// Name of the operation
        operation: &'static str,
        /// Why it cannot be performed
        reason: String,
    },

    /// A reference was bound to a value it cannot see
    #[error("{value} is not visible from reference {reference}")]
    OutOfScope {
        /// The reference being bound
        reference: VarId,
        /// The value it was bound to
        value: VarId,
    },

    /// A tree edit would produce an invalid shape
    #[error("Invalid connection of {child} to {parent}.{input}: {reason}")]
    InvalidConnection {
        /// Node being plugged in
        child: NodeId,
        /// Node receiving the child
        parent: NodeId,
        /// Input name on the parent
        input: String,
        /// Why the connection was refused
        reason: String,
    },

    /// A builder was given a name its variable cannot carry
    #[error("Invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// No variable with this id exists
    #[error("Unknown variable {0}")]
    UnknownVariable(VarId),

    /// No node with this id exists
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// No workspace with this id exists
    #[error("Unknown workspace {0}")]
    UnknownWorkspace(WorkspaceId),
}

impl BindingError {
    pub(crate) fn duplicate(id: VarId, reason: impl Into<String>) -> Self {
        BindingError::DuplicateBinding {
            id,
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(id: VarId, reason: impl Into<String>) -> Self {
        BindingError::InconsistentState {
            id,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(operation: &'static str, reason: impl Into<String>) -> Self {
        BindingError::UnsupportedOperation {
            operation,
            reason: reason.into(),
        }
    }

    /// True for errors that indicate a broken invariant rather than a
    /// rejected request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            BindingError::DuplicateBinding { .. } | BindingError::InconsistentState { .. }
        )
    }
}

/// Why a candidate variable name was refused.
///
/// A rename reports these as an ordinary rejection; only the node builders
/// surface them as [`BindingError::InvalidName`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Nothing left after stripping whitespace
    #[error("variable name is empty")]
    Empty,

    /// Does not follow identifier syntax
    #[error("`{0}` is not a valid variable name")]
    Malformed(String),

    /// A reference cannot refer to the wildcard
    #[error("a reference cannot be named `{0}`")]
    WildcardReference(String),

    /// The wildcard was refused for a value
    #[error("a value cannot be named `{0}` here")]
    WildcardValue(String),
}

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, BindingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_violation_classification() {
        let id = VarId::from_raw(7);
        assert!(BindingError::duplicate(id, "slot").is_invariant_violation());
        assert!(BindingError::inconsistent(id, "db").is_invariant_violation());
        assert!(!BindingError::unsupported("rename", "x").is_invariant_violation());
        assert!(!BindingError::UnknownVariable(id).is_invariant_violation());
        assert!(!BindingError::from(NameError::Empty).is_invariant_violation());
    }

    #[test]
    fn test_error_display() {
        let err = BindingError::duplicate(VarId::from_raw(3), "owner slot `VAR` occupied");
        assert_eq!(
            err.to_string(),
            "Duplicate binding for var#3: owner slot `VAR` occupied"
        );
        assert_eq!(NameError::Empty.to_string(), "variable name is empty");
    }
}
