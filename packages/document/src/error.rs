//! Error types for document structure operations

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Node not found: {0}")]
    InvalidReference(String),

    #[error("cannot nest a component inside itself: moving {node} under {target} would create a cycle")]
    CyclicMove { node: String, target: String },

    #[error("Node {0} does not accept children")]
    NotAContainer(String),

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Invalid structure: {0}")]
    IntegrityViolation(String),
}
