//! # Pagecraft Document
//!
//! Core document model for the Pagecraft page builder.
//!
//! A page is a flat, arena-style tree: a synthetic root plus an id→node map
//! with explicit parent/child references. Structural edits are O(1) index
//! rewrites rather than subtree copies, which keeps drag-and-drop moves and
//! undo snapshots cheap.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: PageDocument + ComponentNode      │
//! │  - flat id→node map, ordered child lists    │
//! │  - responsive per-breakpoint prop values    │
//! │  - integrity validation (no orphans/cycles) │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands + undo history             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Flat storage**: nodes live in one map; edges are id lists
//! 2. **Mobile-first cascade**: responsive values always carry a mobile
//!    baseline; larger breakpoints inherit downward
//! 3. **Choke-point mutation**: structural edits happen through the editor
//!    crate's command layer, never ad hoc

mod error;
mod id;
mod node;
mod responsive;

pub use error::DocumentError;
pub use id::new_id;
pub use node::{
    clone_subtree_with_fresh_ids, validate_node_batch, ComponentNode, PageDocument, RootNode,
    SubtreeSnapshot,
};
pub use responsive::{
    collapse_responsive, expand_responsive, resolve, Breakpoint, PropValue, ResponsiveValue,
};
