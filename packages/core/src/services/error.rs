//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations. Every
//! variant carries an HTTP-agnostic [`ErrorKind`] so transport layers can
//! map failures to status codes without knowing the details.

use crate::models::ValidationError;
use crate::tree::TreeError;
use std::time::Duration;
use thiserror::Error;

/// HTTP-agnostic failure classification for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced id is absent
    NotFound,
    /// A sibling name collision
    Conflict,
    /// A structurally invalid request (cycle-forming move, malformed
    /// input, forbidden root mutation, non-leaf delete)
    InvalidOperation,
    /// Storage I/O failure or traversal invariant violation
    Internal,
}

/// Tree service operation errors
///
/// Guard failures (everything but the last three variants) are produced
/// before any write and are fully recoverable - the caller can correct
/// the input and retry without cleanup.
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by id
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Destination parent not found
    #[error("Parent node not found: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// Sibling name collision
    #[error("Name '{name}' is already taken under parent {parent_id}")]
    NameTaken { name: String, parent_id: String },

    /// Circular reference detected
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    /// Validation failed for a node name
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Delete rejected because the node still has children
    #[error("Node {id} has children and cannot be deleted")]
    NotEmpty { id: String },

    /// The root node cannot be mutated
    #[error("The root node cannot be {operation}")]
    RootImmutable { operation: &'static str },

    /// Tree traversal invariant violation
    #[error("Tree inconsistency: {context}")]
    Inconsistent { context: String },

    /// Store call exceeded its deadline
    #[error("Store operation '{operation}' timed out after {timeout:?}")]
    StoreTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Store call failed
    #[error("Store operation failed: {context}")]
    StoreFailed { context: String },
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a parent not found error
    pub fn parent_not_found(parent_id: impl Into<String>) -> Self {
        Self::ParentNotFound {
            parent_id: parent_id.into(),
        }
    }

    /// Create a name collision error
    pub fn name_taken(name: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::NameTaken {
            name: name.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    /// Create a non-empty delete rejection
    pub fn not_empty(id: impl Into<String>) -> Self {
        Self::NotEmpty { id: id.into() }
    }

    /// Create a root mutation rejection
    pub fn root_immutable(operation: &'static str) -> Self {
        Self::RootImmutable { operation }
    }

    /// Create an inconsistency error
    pub fn inconsistent(context: impl Into<String>) -> Self {
        Self::Inconsistent {
            context: context.into(),
        }
    }

    /// Create a store failure error
    pub fn store_failed(context: impl Into<String>) -> Self {
        Self::StoreFailed {
            context: context.into(),
        }
    }

    /// The HTTP-agnostic classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound { .. } | Self::ParentNotFound { .. } => ErrorKind::NotFound,
            Self::NameTaken { .. } => ErrorKind::Conflict,
            Self::CircularReference { .. }
            | Self::ValidationFailed(_)
            | Self::NotEmpty { .. }
            | Self::RootImmutable { .. } => ErrorKind::InvalidOperation,
            Self::Inconsistent { .. } | Self::StoreTimeout { .. } | Self::StoreFailed { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<TreeError> for TreeServiceError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NotFound { id } => Self::NodeNotFound { id },
            TreeError::Inconsistent { context } => Self::Inconsistent { context },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TreeServiceError::node_not_found("x").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TreeServiceError::name_taken("a", "p").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            TreeServiceError::circular_reference("ctx").kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(
            TreeServiceError::not_empty("x").kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(
            TreeServiceError::store_failed("io").kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_tree_error_conversion() {
        let err: TreeServiceError = TreeError::not_found("abc").into();
        assert!(matches!(err, TreeServiceError::NodeNotFound { ref id } if id == "abc"));
        let err: TreeServiceError = TreeError::inconsistent("broken").into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
