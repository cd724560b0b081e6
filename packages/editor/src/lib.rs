//! # Pagecraft Editor
//!
//! The undoable edit layer for Pagecraft page documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: PageDocument (flat tree)          │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession (single choke point)    │
//! │  - every mutation is a reversible Command   │
//! │  - validate → apply → record inverse        │
//! │  - linear undo/redo with coalescing         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Commands, never direct edits**: all structural and prop mutation
//!    passes through [`EditSession::apply`]
//! 2. **Reject whole, never partial**: a failed command leaves the document
//!    byte-for-byte unchanged and reports the violated invariant
//! 3. **Exact round-trips**: undo restores the prior serialized state,
//!    redo after undo restores the post-command state
//! 4. **Linear history**: a new command clears the redo stack; no branching

mod commands;
mod errors;
mod history;
mod session;

pub use commands::Command;
pub use errors::EditorError;
pub use history::{History, HistoryEntry, COALESCE_WINDOW};
pub use session::EditSession;
