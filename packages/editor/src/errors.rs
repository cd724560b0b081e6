//! Error types for the editor

use thiserror::Error;

use pagecraft_document::DocumentError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("subtree roots overlap: {inner} is inside {outer}")]
    OverlappingSubtrees { outer: String, inner: String },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}
