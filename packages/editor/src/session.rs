//! # Edit Session
//!
//! One interactive editing session over one open document. `apply` is the
//! single choke point every mutation funnels through: validate, apply,
//! capture the inverse, push to history. Single-writer by construction —
//! the session holds the document by value, so no locks are needed.
//!
//! Selection is read-only with respect to the command layer; it only
//! supplies the default target for the next command.

use tracing::{debug, warn};

use pagecraft_document::{
    clone_subtree_with_fresh_ids, resolve, Breakpoint, ComponentNode, PageDocument,
};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::commands::Command;
use crate::errors::EditorError;
use crate::history::History;

/// An open document plus its edit history and selection state.
pub struct EditSession {
    document: PageDocument,
    history: History,
    selection: Vec<String>,
}

impl EditSession {
    pub fn new(document: PageDocument) -> Self {
        Self {
            document,
            history: History::new(),
            selection: Vec::new(),
        }
    }

    pub fn with_history(document: PageDocument, history: History) -> Self {
        Self {
            document,
            history,
            selection: Vec::new(),
        }
    }

    pub fn document(&self) -> &PageDocument {
        &self.document
    }

    // ----- the choke point ------------------------------------------------

    /// Apply a command, recording its inverse for undo.
    ///
    /// A rejected command leaves the document unchanged and surfaces the
    /// violated invariant ("cannot nest a component inside itself", ...).
    pub fn apply(&mut self, command: Command) -> Result<(), EditorError> {
        let inverse = command.apply(&mut self.document).map_err(|err| {
            warn!(command = %command.describe(), %err, "command rejected");
            err
        })?;

        debug_assert!(self.document.validate_integrity().is_ok());
        debug!(command = %command.describe(), "command applied");

        self.history.record(command, inverse);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), EditorError> {
        self.history.undo(&mut self.document)
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        self.history.redo(&mut self.document)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Group subsequent commands into one undo step until `end_batch`.
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.history.begin_batch(Some(description.into()));
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    // ----- selection ------------------------------------------------------

    pub fn set_selection(&mut self, node_ids: Vec<String>) {
        self.selection = node_ids;
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    /// Default target for the next command: the first selected node.
    pub fn default_target(&self) -> Option<&str> {
        self.selection.first().map(String::as_str)
    }

    // ----- conveniences ---------------------------------------------------

    /// Clone a subtree with fresh ids and insert the copy directly after
    /// the source. One history entry.
    pub fn duplicate(&mut self, node_id: &str) -> Result<String, EditorError> {
        let nodes: Vec<ComponentNode> = self
            .document
            .subtree_ids(node_id)?
            .iter()
            .filter_map(|id| self.document.get(id).cloned())
            .collect();

        let (clones, _) = clone_subtree_with_fresh_ids(&nodes);
        let new_root_id = clones[0].id.clone();

        let parent_id = self
            .document
            .get(node_id)
            .and_then(|n| n.parent_id.clone());
        let index = self
            .document
            .children_of(parent_id.as_deref())?
            .iter()
            .position(|id| id == node_id)
            .map(|i| i + 1)
            .unwrap_or(0);

        self.apply(Command::InsertSubtree {
            nodes: clones,
            parent_id,
            index,
        })?;

        Ok(new_root_id)
    }

    /// Props of a node with every responsive value resolved for the active
    /// breakpoint — the shape handed to the rendering collaborator.
    pub fn resolved_props(
        &self,
        node_id: &str,
        breakpoint: Breakpoint,
    ) -> Result<BTreeMap<String, Value>, EditorError> {
        let node = self
            .document
            .get(node_id)
            .ok_or_else(|| pagecraft_document::DocumentError::InvalidReference(node_id.to_string()))?;

        Ok(node
            .props
            .iter()
            .map(|(name, value)| (name.clone(), resolve(value, breakpoint).clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::{PropValue, ResponsiveValue};
    use serde_json::json;

    fn session_with_tree() -> (EditSession, String, String) {
        let mut doc = PageDocument::new();
        let section = ComponentNode::container("Section");
        let heading = ComponentNode::leaf("Heading").with_prop("text", PropValue::plain("Hi"));
        let section_id = section.id.clone();
        let heading_id = heading.id.clone();
        doc.attach_subtree(vec![section], None, 0).unwrap();
        doc.attach_subtree(vec![heading], Some(&section_id), 0)
            .unwrap();
        (EditSession::new(doc), section_id, heading_id)
    }

    #[test]
    fn test_rejected_command_leaves_document_unchanged() {
        let (mut session, ..) = session_with_tree();
        let before = serde_json::to_value(session.document()).unwrap();

        let err = session
            .apply(Command::DeleteSubtree {
                root_id: "ghost".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::Document(_)));

        assert_eq!(serde_json::to_value(session.document()).unwrap(), before);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_miswired_insert_batch_never_commits() {
        let (mut session, section_id, _) = session_with_tree();
        let before = serde_json::to_value(session.document()).unwrap();

        // Child wired under an in-batch leaf: nothing would ever list it
        let leaf = ComponentNode::leaf("Heading");
        let mut stray = ComponentNode::leaf("Text");
        stray.parent_id = Some(leaf.id.clone());

        let err = session
            .apply(Command::InsertSubtree {
                nodes: vec![leaf, stray],
                parent_id: Some(section_id),
                index: 0,
            })
            .unwrap_err();
        assert!(matches!(err, EditorError::Document(_)));

        assert_eq!(serde_json::to_value(session.document()).unwrap(), before);
        session.document().validate_integrity().unwrap();
        assert!(!session.can_undo());
    }

    #[test]
    fn test_undo_after_delete_restores_state() {
        let (mut session, section_id, _) = session_with_tree();
        let before = serde_json::to_value(session.document()).unwrap();

        session
            .apply(Command::DeleteSubtree {
                root_id: section_id,
            })
            .unwrap();
        assert!(session.document().components.is_empty());

        session.undo().unwrap();
        assert_eq!(serde_json::to_value(session.document()).unwrap(), before);
    }

    #[test]
    fn test_duplicate_yields_disjoint_ids_next_to_source() {
        let (mut session, section_id, heading_id) = session_with_tree();

        let copy_id = session.duplicate(&section_id).unwrap();
        assert_ne!(copy_id, section_id);

        let doc = session.document();
        assert_eq!(doc.root.children, vec![section_id.clone(), copy_id.clone()]);

        // The copy's subtree shares no ids with the original
        let original: std::collections::HashSet<_> =
            doc.subtree_ids(&section_id).unwrap().into_iter().collect();
        for id in doc.subtree_ids(&copy_id).unwrap() {
            assert!(!original.contains(&id));
        }

        // Undo removes the copy entirely
        session.undo().unwrap();
        assert!(session.document().contains(&heading_id));
        assert!(!session.document().contains(&copy_id));
    }

    #[test]
    fn test_selection_supplies_default_target() {
        let (mut session, _, heading_id) = session_with_tree();
        assert_eq!(session.default_target(), None);

        session.set_selection(vec![heading_id.clone()]);
        assert_eq!(session.default_target(), Some(heading_id.as_str()));
    }

    #[test]
    fn test_resolved_props_cascade_per_breakpoint() {
        let (mut session, _, heading_id) = session_with_tree();
        session
            .apply(Command::SetProp {
                node_id: heading_id.clone(),
                prop: "size".to_string(),
                value: Some(PropValue::Responsive(ResponsiveValue {
                    mobile: json!(16),
                    tablet: Some(json!(24)),
                    desktop: None,
                })),
            })
            .unwrap();

        let mobile = session
            .resolved_props(&heading_id, Breakpoint::Mobile)
            .unwrap();
        assert_eq!(mobile["size"], json!(16));
        assert_eq!(mobile["text"], json!("Hi"));

        // Desktop inherits tablet through the cascade
        let desktop = session
            .resolved_props(&heading_id, Breakpoint::Desktop)
            .unwrap();
        assert_eq!(desktop["size"], json!(24));
    }
}
