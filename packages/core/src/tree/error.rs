//! Tree Algorithm Error Types

use thiserror::Error;

/// Failures raised by the pure tree algorithms.
///
/// `Inconsistent` covers traversal invariant violations (a parent missing
/// from the enriched set, a repeated node pointing at a cycle in the
/// input). These are never defaulted over; callers surface them as
/// internal errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {id}")]
    NotFound { id: String },

    #[error("Tree inconsistency: {context}")]
    Inconsistent { context: String },
}

impl TreeError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an inconsistency error
    pub fn inconsistent(context: impl Into<String>) -> Self {
        Self::Inconsistent {
            context: context.into(),
        }
    }
}
