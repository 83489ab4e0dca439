//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::tree::NodeId;

/// Errors raised by structural operations on the ownership tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The proposed parent is the node itself or one of its descendants.
    #[error("hierarchy violation: {parent} is {node} or one of its descendants")]
    HierarchyViolation { node: NodeId, parent: NodeId },

    /// The node was destroyed earlier (or never belonged to this tree).
    #[error("use after destroy: node {0} is no longer alive")]
    UseAfterDestroy(NodeId),

    #[error("tree invariant broken: {0}")]
    Corrupted(String),
}

impl TreeError {
    /// True for errors that indicate a logic error in the caller rather than
    /// a rejected request.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, TreeError::UseAfterDestroy(_) | TreeError::Corrupted(_))
    }
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
