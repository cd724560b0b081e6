//! # Edit Commands
//!
//! Every structural or prop mutation on a page is expressed as a reversible
//! command. Applying a command yields its inverse, which the history stack
//! records for undo.
//!
//! ## Command Semantics
//!
//! ### InsertSubtree
//! - Splices the batch's top-level ids into the parent's child list
//! - Fails if the parent is missing or a leaf (no orphans created)
//! - Inverse: remove the same subtree roots
//!
//! ### DeleteSubtree
//! - Removes the root and every transitive descendant
//! - Inverse: restore the captured snapshot at the original index, with
//!   identical ids, props and ordering
//!
//! ### MoveSubtree
//! - Atomic relocation; fails if the target is the node itself or one of
//!   its descendants, leaving the document unchanged
//! - Inverse: move back to the original parent/index
//!
//! ### SetProp
//! - Atomic replacement; inverse carries the prior value
//! - Rapid same-prop edits coalesce in history (see `history`)

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pagecraft_document::{
    validate_node_batch, ComponentNode, PageDocument, PropValue, SubtreeSnapshot,
};

use crate::errors::EditorError;

/// A reversible edit on a [`PageDocument`].
///
/// `RemoveSubtrees` and `RestoreSubtrees` exist as inverse forms for the
/// insert/delete pair; interactive callers issue the other four.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Insert a node batch under `parent_id` (`None` = page root) at `index`.
    InsertSubtree {
        nodes: Vec<ComponentNode>,
        parent_id: Option<String>,
        index: usize,
    },

    /// Remove `root_id` and all descendants.
    DeleteSubtree { root_id: String },

    /// Relocate `root_id` under `new_parent_id` at `new_index`.
    MoveSubtree {
        root_id: String,
        new_parent_id: Option<String>,
        new_index: usize,
    },

    /// Set (or with `None`, clear) one prop on one node.
    SetProp {
        node_id: String,
        prop: String,
        value: Option<PropValue>,
    },

    /// Inverse of `InsertSubtree`: remove each listed subtree root. Roots
    /// must be distinct and disjoint (none inside another's subtree).
    RemoveSubtrees { root_ids: Vec<String> },

    /// Inverse of `DeleteSubtree`/`RemoveSubtrees`: reattach captured
    /// snapshots in order.
    RestoreSubtrees { snapshots: Vec<SubtreeSnapshot> },
}

impl Command {
    /// Check preconditions without touching the document.
    pub fn validate(&self, doc: &PageDocument) -> Result<(), EditorError> {
        match self {
            Command::InsertSubtree {
                nodes, parent_id, ..
            } => {
                doc.children_of(parent_id.as_deref())?;
                validate_node_batch(nodes)?;
                Ok(())
            }
            Command::DeleteSubtree { root_id } => {
                require_node(doc, root_id)?;
                Ok(())
            }
            Command::MoveSubtree {
                root_id,
                new_parent_id,
                ..
            } => {
                require_node(doc, root_id)?;
                if let Some(target) = new_parent_id {
                    if target == root_id || doc.is_descendant(target, root_id) {
                        return Err(pagecraft_document::DocumentError::CyclicMove {
                            node: root_id.clone(),
                            target: target.clone(),
                        }
                        .into());
                    }
                }
                doc.children_of(new_parent_id.as_deref())?;
                Ok(())
            }
            Command::SetProp { node_id, .. } => {
                require_node(doc, node_id)?;
                Ok(())
            }
            Command::RemoveSubtrees { root_ids } => {
                let mut seen = HashSet::new();
                for id in root_ids {
                    require_node(doc, id)?;
                    if !seen.insert(id.as_str()) {
                        return Err(pagecraft_document::DocumentError::DuplicateId(id.clone())
                            .into());
                    }
                }
                // Removal happens root by root; a root nested inside
                // another would vanish with its ancestor and fail halfway
                for id in root_ids {
                    for other in root_ids {
                        if id != other && doc.is_descendant(id, other) {
                            return Err(EditorError::OverlappingSubtrees {
                                inner: id.clone(),
                                outer: other.clone(),
                            });
                        }
                    }
                }
                Ok(())
            }
            Command::RestoreSubtrees { snapshots } => {
                for snapshot in snapshots {
                    validate_node_batch(&snapshot.nodes)?;
                }
                Ok(())
            }
        }
    }

    /// Validate, apply, and return the inverse command.
    ///
    /// On error the document is unchanged: multi-step commands validate
    /// every step up front, and the tree primitives check their targets
    /// before mutating.
    pub fn apply(&self, doc: &mut PageDocument) -> Result<Command, EditorError> {
        self.validate(doc)?;

        match self {
            Command::InsertSubtree {
                nodes,
                parent_id,
                index,
            } => {
                let root_ids = doc.attach_subtree(nodes.clone(), parent_id.as_deref(), *index)?;
                Ok(Command::RemoveSubtrees { root_ids })
            }

            Command::DeleteSubtree { root_id } => {
                let snapshot = doc.detach_subtree(root_id)?;
                Ok(Command::RestoreSubtrees {
                    snapshots: vec![snapshot],
                })
            }

            Command::MoveSubtree {
                root_id,
                new_parent_id,
                new_index,
            } => {
                let (old_parent, old_index) =
                    doc.move_subtree(root_id, new_parent_id.as_deref(), *new_index)?;
                Ok(Command::MoveSubtree {
                    root_id: root_id.clone(),
                    new_parent_id: old_parent,
                    new_index: old_index,
                })
            }

            Command::SetProp {
                node_id,
                prop,
                value,
            } => {
                let prior = doc.set_prop(node_id, prop, value.clone())?;
                Ok(Command::SetProp {
                    node_id: node_id.clone(),
                    prop: prop.clone(),
                    value: prior,
                })
            }

            Command::RemoveSubtrees { root_ids } => {
                // Restore order is the reverse of removal order so sibling
                // indices land back where they were.
                let mut snapshots = Vec::with_capacity(root_ids.len());
                for id in root_ids {
                    snapshots.push(doc.detach_subtree(id)?);
                }
                snapshots.reverse();
                Ok(Command::RestoreSubtrees { snapshots })
            }

            Command::RestoreSubtrees { snapshots } => {
                let mut root_ids = Vec::with_capacity(snapshots.len());
                for snapshot in snapshots {
                    let roots = doc.reattach(snapshot.clone())?;
                    root_ids.extend(roots);
                }
                root_ids.reverse();
                Ok(Command::RemoveSubtrees { root_ids })
            }
        }
    }

    /// Key under which rapid homogeneous edits merge into one undo step.
    /// Only prop edits coalesce; structural commands never do.
    pub fn coalesce_key(&self) -> Option<String> {
        match self {
            Command::SetProp { node_id, prop, .. } => {
                Some(format!("set-prop:{}:{}", node_id, prop))
            }
            _ => None,
        }
    }

    /// Short human-readable label for history UIs.
    pub fn describe(&self) -> String {
        match self {
            Command::InsertSubtree { nodes, .. } => match nodes.first() {
                Some(node) => format!("Insert {}", node.type_name),
                None => "Insert".to_string(),
            },
            Command::DeleteSubtree { root_id } => format!("Delete {}", root_id),
            Command::MoveSubtree { root_id, .. } => format!("Move {}", root_id),
            Command::SetProp { prop, .. } => format!("Edit {}", prop),
            Command::RemoveSubtrees { .. } => "Remove".to_string(),
            Command::RestoreSubtrees { .. } => "Restore".to_string(),
        }
    }
}

fn require_node(doc: &PageDocument, id: &str) -> Result<(), EditorError> {
    if doc.contains(id) {
        Ok(())
    } else {
        Err(pagecraft_document::DocumentError::InvalidReference(id.to_string()).into())
    }
}
