//! # Component Tree
//!
//! The page structure is stored arena-style: one flat id→node map plus
//! explicit parent/child references. A synthetic root holds the ordered
//! top-level child ids and page-level props; the root is never itself a
//! child and never appears in `components`.
//!
//! Invariant: the union of all `children` lists (root included) partitions
//! the node set exactly once — no orphans, no duplicates, no cycles. The
//! structural primitives here preserve that invariant; the editor crate's
//! command layer is the only intended caller for mutation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;
use crate::id::new_id;
use crate::responsive::PropValue;

/// A single component instance in the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    pub id: String,

    /// Key into the component registry.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, PropValue>,

    /// Ordered child ids. `None` for leaf component types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,

    /// Absent only for direct children of the synthetic root.
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl ComponentNode {
    /// Create a container node (accepts children) with a fresh id.
    pub fn container(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            id: new_id(Some(&type_name.to_lowercase())),
            type_name,
            props: BTreeMap::new(),
            children: Some(Vec::new()),
            parent_id: None,
        }
    }

    /// Create a leaf node (no child list) with a fresh id.
    pub fn leaf(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            id: new_id(Some(&type_name.to_lowercase())),
            type_name,
            props: BTreeMap::new(),
            children: None,
            parent_id: None,
        }
    }

    pub fn with_prop(mut self, name: impl Into<String>, value: PropValue) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    pub fn accepts_children(&self) -> bool {
        self.children.is_some()
    }
}

/// The synthetic root: ordered top-level child ids plus page-level props.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, PropValue>,
}

/// A detached subtree plus enough position information to reattach it
/// exactly where it came from. This is what `DeleteSubtree` captures for
/// undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtreeSnapshot {
    /// Every node of the subtree, root first, in document (depth-first)
    /// order.
    pub nodes: Vec<ComponentNode>,

    /// Parent the subtree root was attached to (`None` = synthetic root).
    pub parent_id: Option<String>,

    /// Index the subtree root occupied in that parent's child list.
    pub index: usize,
}

/// One open page document.
///
/// Serializes to the persistence collaborator's
/// `{version, root, components}` shape. `components` is a BTreeMap so
/// serialization is deterministic and undo round-trips compare exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub version: u64,
    pub root: RootNode,
    pub components: BTreeMap<String, ComponentNode>,
}

impl Default for PageDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDocument {
    pub fn new() -> Self {
        Self {
            version: 1,
            root: RootNode::default(),
            components: BTreeMap::new(),
        }
    }

    // ----- queries -------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&ComponentNode> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Child list of a parent (`None` = root). Fails if the parent is
    /// missing or a leaf.
    pub fn children_of(&self, parent_id: Option<&str>) -> Result<&[String], DocumentError> {
        match parent_id {
            None => Ok(&self.root.children),
            Some(pid) => {
                let parent = self
                    .get(pid)
                    .ok_or_else(|| DocumentError::InvalidReference(pid.to_string()))?;
                parent
                    .children
                    .as_deref()
                    .ok_or_else(|| DocumentError::NotAContainer(pid.to_string()))
            }
        }
    }

    /// Ids of a subtree, root included, in depth-first order.
    pub fn subtree_ids(&self, root_id: &str) -> Result<Vec<String>, DocumentError> {
        if !self.contains(root_id) {
            return Err(DocumentError::InvalidReference(root_id.to_string()));
        }

        let mut out = Vec::new();
        let mut stack = vec![root_id.to_string()];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(&id) {
                if let Some(children) = &node.children {
                    // Reverse so the stack pops in document order
                    for child in children.iter().rev() {
                        stack.push(child.clone());
                    }
                }
            }
            out.push(id);
        }
        Ok(out)
    }

    /// Whether `candidate` lies inside the subtree rooted at `ancestor`
    /// (a node is not its own descendant).
    pub fn is_descendant(&self, candidate: &str, ancestor: &str) -> bool {
        let mut current = self.get(candidate).and_then(|n| n.parent_id.as_deref());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent_id.as_deref());
        }
        false
    }

    // ----- structural primitives -----------------------------------------

    /// Insert a batch of nodes under `parent_id` at `index`.
    ///
    /// Nodes whose `parent_id` does not point inside the batch are the
    /// batch's top level; their ids are spliced into the parent's child
    /// list in batch order and their `parent_id` is rewritten to the
    /// target. Returns the top-level ids.
    pub fn attach_subtree(
        &mut self,
        nodes: Vec<ComponentNode>,
        parent_id: Option<&str>,
        index: usize,
    ) -> Result<Vec<String>, DocumentError> {
        // Validate target and batch wiring before touching anything
        self.children_of(parent_id)?;
        validate_node_batch(&nodes)?;

        let batch_ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
        for node in &nodes {
            if self.contains(&node.id) {
                return Err(DocumentError::DuplicateId(node.id.clone()));
            }
        }

        let mut top_level = Vec::new();
        for mut node in nodes {
            let is_top_level = match &node.parent_id {
                Some(pid) => !batch_ids.contains(pid),
                None => true,
            };
            if is_top_level {
                node.parent_id = parent_id.map(str::to_string);
                top_level.push(node.id.clone());
            }
            self.components.insert(node.id.clone(), node);
        }

        let children = self.children_list_mut(parent_id)?;
        let at = index.min(children.len());
        children.splice(at..at, top_level.iter().cloned());

        Ok(top_level)
    }

    /// Remove `root_id` and every transitive descendant, capturing a
    /// snapshot that `reattach` restores exactly.
    pub fn detach_subtree(&mut self, root_id: &str) -> Result<SubtreeSnapshot, DocumentError> {
        let ids = self.subtree_ids(root_id)?;
        let parent_id = self.get(root_id).and_then(|n| n.parent_id.clone());

        let siblings = self.children_list_mut(parent_id.as_deref())?;
        let index = siblings
            .iter()
            .position(|id| id == root_id)
            .ok_or_else(|| {
                DocumentError::IntegrityViolation(format!(
                    "node {} missing from its parent's child list",
                    root_id
                ))
            })?;
        siblings.remove(index);

        let mut nodes = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(node) = self.components.remove(id) {
                nodes.push(node);
            }
        }

        Ok(SubtreeSnapshot {
            nodes,
            parent_id,
            index,
        })
    }

    /// Re-insert a previously detached subtree at its captured position.
    pub fn reattach(&mut self, snapshot: SubtreeSnapshot) -> Result<Vec<String>, DocumentError> {
        self.attach_subtree(snapshot.nodes, snapshot.parent_id.as_deref(), snapshot.index)
    }

    /// Relocate a subtree under a new parent at `index`. Rejects moves into
    /// the subtree itself, leaving the document unchanged. Returns the old
    /// position for the inverse.
    pub fn move_subtree(
        &mut self,
        root_id: &str,
        new_parent_id: Option<&str>,
        index: usize,
    ) -> Result<(Option<String>, usize), DocumentError> {
        if !self.contains(root_id) {
            return Err(DocumentError::InvalidReference(root_id.to_string()));
        }
        if let Some(target) = new_parent_id {
            if target == root_id || self.is_descendant(target, root_id) {
                return Err(DocumentError::CyclicMove {
                    node: root_id.to_string(),
                    target: target.to_string(),
                });
            }
        }
        // Validate destination before detaching
        self.children_of(new_parent_id)?;

        let old_parent = self.get(root_id).and_then(|n| n.parent_id.clone());
        let old_siblings = self.children_list_mut(old_parent.as_deref())?;
        let old_index = old_siblings
            .iter()
            .position(|id| id == root_id)
            .ok_or_else(|| {
                DocumentError::IntegrityViolation(format!(
                    "node {} missing from its parent's child list",
                    root_id
                ))
            })?;
        old_siblings.remove(old_index);

        let new_siblings = self.children_list_mut(new_parent_id)?;
        let at = index.min(new_siblings.len());
        new_siblings.insert(at, root_id.to_string());

        if let Some(node) = self.components.get_mut(root_id) {
            node.parent_id = new_parent_id.map(str::to_string);
        }

        Ok((old_parent, old_index))
    }

    /// Set a prop (`None` removes it), returning the prior value.
    pub fn set_prop(
        &mut self,
        node_id: &str,
        name: &str,
        value: Option<PropValue>,
    ) -> Result<Option<PropValue>, DocumentError> {
        let node = self
            .components
            .get_mut(node_id)
            .ok_or_else(|| DocumentError::InvalidReference(node_id.to_string()))?;
        Ok(match value {
            Some(v) => node.props.insert(name.to_string(), v),
            None => node.props.remove(name),
        })
    }

    fn children_list_mut(
        &mut self,
        parent_id: Option<&str>,
    ) -> Result<&mut Vec<String>, DocumentError> {
        match parent_id {
            None => Ok(&mut self.root.children),
            Some(pid) => {
                let parent = self
                    .components
                    .get_mut(pid)
                    .ok_or_else(|| DocumentError::InvalidReference(pid.to_string()))?;
                parent
                    .children
                    .as_mut()
                    .ok_or_else(|| DocumentError::NotAContainer(pid.to_string()))
            }
        }
    }

    // ----- integrity ------------------------------------------------------

    /// Check the partition invariant: every referenced id exists, every
    /// node appears in exactly one child list, parent back-references
    /// agree, and no node is orphaned.
    pub fn validate_integrity(&self) -> Result<(), DocumentError> {
        let mut seen_as_child: HashMap<String, usize> = HashMap::new();

        let mut record = |list: &[String], owner: Option<&str>| -> Result<(), DocumentError> {
            for child_id in list {
                let child = self
                    .get(child_id)
                    .ok_or_else(|| DocumentError::InvalidReference(child_id.clone()))?;
                if child.parent_id.as_deref() != owner {
                    return Err(DocumentError::IntegrityViolation(format!(
                        "node {} is listed under {:?} but claims parent {:?}",
                        child_id, owner, child.parent_id
                    )));
                }
                *seen_as_child.entry(child_id.clone()).or_insert(0) += 1;
            }
            Ok(())
        };

        record(&self.root.children, None)?;
        for (id, node) in &self.components {
            if let Some(children) = &node.children {
                record(children, Some(id.as_str()))?;
            }
            if let Some(pid) = &node.parent_id {
                if !self.contains(pid) {
                    return Err(DocumentError::InvalidReference(pid.clone()));
                }
            }
        }

        for (id, count) in &seen_as_child {
            if *count != 1 {
                return Err(DocumentError::IntegrityViolation(format!(
                    "node {} appears in {} child lists",
                    id, count
                )));
            }
        }
        for id in self.components.keys() {
            if !seen_as_child.contains_key(id.as_str()) {
                return Err(DocumentError::IntegrityViolation(format!(
                    "node {} is orphaned (in no child list)",
                    id
                )));
            }
        }

        Ok(())
    }
}

/// Check a node batch's internal wiring before it is attached: every id
/// is unique, every listed child is in the batch and claims its lister as
/// parent, and every node whose `parent_id` points inside the batch is
/// listed by that parent exactly once. A batch that fails here would
/// attach as an orphan or a double-listed node.
pub fn validate_node_batch(nodes: &[ComponentNode]) -> Result<(), DocumentError> {
    let mut by_id: HashMap<&str, &ComponentNode> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if by_id.insert(node.id.as_str(), node).is_some() {
            return Err(DocumentError::DuplicateId(node.id.clone()));
        }
    }

    let mut listed: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        if let Some(children) = &node.children {
            for child_id in children {
                let child = by_id.get(child_id.as_str()).ok_or_else(|| {
                    DocumentError::IntegrityViolation(format!(
                        "batch node {} lists child {} that is not in the batch",
                        node.id, child_id
                    ))
                })?;
                if child.parent_id.as_deref() != Some(node.id.as_str()) {
                    return Err(DocumentError::IntegrityViolation(format!(
                        "batch node {} is listed under {} but claims parent {:?}",
                        child_id, node.id, child.parent_id
                    )));
                }
                *listed.entry(child_id.as_str()).or_insert(0) += 1;
            }
        }
    }

    for node in nodes {
        let in_batch_parent = node
            .parent_id
            .as_deref()
            .map_or(false, |pid| by_id.contains_key(pid));
        if in_batch_parent {
            match listed.get(node.id.as_str()).copied().unwrap_or(0) {
                1 => {}
                0 => {
                    return Err(DocumentError::IntegrityViolation(format!(
                        "batch node {} claims parent {:?} but is not listed among its children",
                        node.id, node.parent_id
                    )))
                }
                count => {
                    return Err(DocumentError::IntegrityViolation(format!(
                        "batch node {} appears in its parent's child list {} times",
                        node.id, count
                    )))
                }
            }
        }
    }

    Ok(())
}

/// Clone a subtree batch, minting fresh ids and rewriting every
/// `parent_id` and `children` entry through the old→new map. Nodes whose
/// `parent_id` falls outside the batch become the clone's roots.
///
/// Shared by editor duplication and template instantiation; the input is
/// never mutated.
pub fn clone_subtree_with_fresh_ids(
    nodes: &[ComponentNode],
) -> (Vec<ComponentNode>, HashMap<String, String>) {
    let mut id_map = HashMap::with_capacity(nodes.len());
    for node in nodes {
        id_map.insert(
            node.id.clone(),
            new_id(Some(&node.type_name.to_lowercase())),
        );
    }

    let clones = nodes
        .iter()
        .map(|node| {
            let mut clone = node.clone();
            clone.id = id_map[&node.id].clone();
            clone.parent_id = node
                .parent_id
                .as_ref()
                .and_then(|pid| id_map.get(pid).cloned());
            if let Some(children) = &mut clone.children {
                for child in children.iter_mut() {
                    if let Some(mapped) = id_map.get(child) {
                        *child = mapped.clone();
                    }
                }
            }
            clone
        })
        .collect();

    (clones, id_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> (PageDocument, String, String, String) {
        let mut doc = PageDocument::new();
        let section = ComponentNode::container("Section");
        let column = ComponentNode::container("Column");
        let heading = ComponentNode::leaf("Heading").with_prop("text", PropValue::plain("Hello"));

        let section_id = section.id.clone();
        let column_id = column.id.clone();
        let heading_id = heading.id.clone();

        doc.attach_subtree(vec![section], None, 0).unwrap();
        doc.attach_subtree(vec![column], Some(&section_id), 0).unwrap();
        doc.attach_subtree(vec![heading], Some(&column_id), 0).unwrap();

        (doc, section_id, column_id, heading_id)
    }

    #[test]
    fn test_attach_splices_at_index() {
        let mut doc = PageDocument::new();
        let a = ComponentNode::container("Section");
        let b = ComponentNode::container("Section");
        let c = ComponentNode::container("Section");
        let (a_id, b_id, c_id) = (a.id.clone(), b.id.clone(), c.id.clone());

        doc.attach_subtree(vec![a], None, 0).unwrap();
        doc.attach_subtree(vec![b], None, 1).unwrap();
        // Splice between the two
        doc.attach_subtree(vec![c], None, 1).unwrap();

        assert_eq!(doc.root.children, vec![a_id, c_id, b_id]);
        doc.validate_integrity().unwrap();
    }

    #[test]
    fn test_attach_rejects_missing_parent() {
        let mut doc = PageDocument::new();
        let node = ComponentNode::leaf("Heading");
        let err = doc.attach_subtree(vec![node], Some("nope"), 0).unwrap_err();
        assert_eq!(err, DocumentError::InvalidReference("nope".to_string()));
        assert!(doc.components.is_empty());
    }

    #[test]
    fn test_attach_rejects_leaf_parent() {
        let (mut doc, _, _, heading_id) = sample_tree();
        let node = ComponentNode::leaf("Text");
        let err = doc
            .attach_subtree(vec![node], Some(&heading_id), 0)
            .unwrap_err();
        assert_eq!(err, DocumentError::NotAContainer(heading_id));
    }

    #[test]
    fn test_attach_rejects_child_wired_under_batch_leaf() {
        let mut doc = PageDocument::new();
        let before = serde_json::to_value(&doc).unwrap();

        let leaf = ComponentNode::leaf("Heading");
        let mut stray = ComponentNode::leaf("Text");
        stray.parent_id = Some(leaf.id.clone());

        let err = doc.attach_subtree(vec![leaf, stray], None, 0).unwrap_err();
        assert!(matches!(err, DocumentError::IntegrityViolation(_)));
        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
    }

    #[test]
    fn test_attach_rejects_child_listing_outside_the_batch() {
        let mut doc = PageDocument::new();

        let mut section = ComponentNode::container("Section");
        section.children.as_mut().unwrap().push("ghost".to_string());

        let err = doc.attach_subtree(vec![section], None, 0).unwrap_err();
        assert!(matches!(err, DocumentError::IntegrityViolation(_)));
        assert!(doc.components.is_empty());
    }

    #[test]
    fn test_attach_rejects_unlisted_batch_child() {
        let mut doc = PageDocument::new();

        let section = ComponentNode::container("Section");
        let mut heading = ComponentNode::leaf("Heading");
        heading.parent_id = Some(section.id.clone());
        // Heading claims the section as parent but the section never lists it

        let err = doc
            .attach_subtree(vec![section, heading], None, 0)
            .unwrap_err();
        assert!(matches!(err, DocumentError::IntegrityViolation(_)));
        assert!(doc.components.is_empty());
    }

    #[test]
    fn test_detach_captures_descendants_in_order() {
        let (mut doc, section_id, column_id, heading_id) = sample_tree();

        let snapshot = doc.detach_subtree(&section_id).unwrap();
        assert_eq!(
            snapshot
                .nodes
                .iter()
                .map(|n| n.id.clone())
                .collect::<Vec<_>>(),
            vec![section_id.clone(), column_id, heading_id]
        );
        assert_eq!(snapshot.parent_id, None);
        assert_eq!(snapshot.index, 0);

        assert!(doc.components.is_empty());
        assert!(doc.root.children.is_empty());
        doc.validate_integrity().unwrap();
    }

    #[test]
    fn test_reattach_restores_exactly() {
        let (mut doc, section_id, ..) = sample_tree();
        let before = serde_json::to_value(&doc).unwrap();

        let snapshot = doc.detach_subtree(&section_id).unwrap();
        doc.reattach(snapshot).unwrap();

        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
    }

    #[test]
    fn test_move_into_own_descendant_is_rejected_unchanged() {
        let (mut doc, section_id, column_id, _) = sample_tree();
        let before = serde_json::to_value(&doc).unwrap();

        let err = doc
            .move_subtree(&section_id, Some(&column_id), 0)
            .unwrap_err();
        assert!(matches!(err, DocumentError::CyclicMove { .. }));
        assert_eq!(serde_json::to_value(&doc).unwrap(), before);
    }

    #[test]
    fn test_move_into_self_is_rejected() {
        let (mut doc, section_id, ..) = sample_tree();
        let err = doc
            .move_subtree(&section_id, Some(&section_id), 0)
            .unwrap_err();
        assert!(matches!(err, DocumentError::CyclicMove { .. }));
    }

    #[test]
    fn test_move_returns_old_position() {
        let (mut doc, section_id, column_id, heading_id) = sample_tree();

        let (old_parent, old_index) =
            doc.move_subtree(&heading_id, Some(&section_id), 0).unwrap();
        assert_eq!(old_parent, Some(column_id.clone()));
        assert_eq!(old_index, 0);

        assert_eq!(
            doc.get(&heading_id).unwrap().parent_id,
            Some(section_id.clone())
        );
        assert!(doc
            .get(&column_id)
            .unwrap()
            .children
            .as_ref()
            .unwrap()
            .is_empty());
        doc.validate_integrity().unwrap();
    }

    #[test]
    fn test_set_prop_returns_prior() {
        let (mut doc, _, _, heading_id) = sample_tree();

        let prior = doc
            .set_prop(&heading_id, "text", Some(PropValue::plain("World")))
            .unwrap();
        assert_eq!(prior, Some(PropValue::plain("Hello")));

        let prior = doc
            .set_prop(&heading_id, "align", Some(PropValue::plain("center")))
            .unwrap();
        assert_eq!(prior, None);
    }

    #[test]
    fn test_integrity_catches_orphan() {
        let (mut doc, ..) = sample_tree();
        let stray = ComponentNode::leaf("Text");
        doc.components.insert(stray.id.clone(), stray);
        assert!(doc.validate_integrity().is_err());
    }

    #[test]
    fn test_integrity_catches_duplicate_listing() {
        let (mut doc, _, _, heading_id) = sample_tree();
        doc.root.children.push(heading_id);
        assert!(doc.validate_integrity().is_err());
    }

    #[test]
    fn test_clone_rewrites_all_references() {
        let (doc, section_id, ..) = sample_tree();
        let nodes: Vec<ComponentNode> = doc
            .subtree_ids(&section_id)
            .unwrap()
            .iter()
            .map(|id| doc.get(id).unwrap().clone())
            .collect();

        let (clones, id_map) = clone_subtree_with_fresh_ids(&nodes);

        assert_eq!(clones.len(), 3);
        // Every id is fresh
        for clone in &clones {
            assert!(!doc.contains(&clone.id));
        }
        // Root of the clone has no parent (original was under the document root)
        assert_eq!(clones[0].parent_id, None);
        // Child references follow the map
        let new_section = &clones[0];
        assert_eq!(
            new_section.children.as_ref().unwrap()[0],
            id_map[&nodes[1].id]
        );
        // Input untouched
        assert_eq!(nodes[0].id, section_id);
    }

    #[test]
    fn test_document_serialization_shape() {
        let (doc, ..) = sample_tree();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("version").is_some());
        assert!(json.get("root").is_some());
        assert!(json.get("components").is_some());

        let back: PageDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_props_survive_roundtrip_with_responsive_values() {
        let mut doc = PageDocument::new();
        let node = ComponentNode::leaf("Heading").with_prop(
            "size",
            PropValue::Responsive(crate::responsive::ResponsiveValue {
                mobile: json!(16),
                tablet: None,
                desktop: Some(json!(32)),
            }),
        );
        let id = node.id.clone();
        doc.attach_subtree(vec![node], None, 0).unwrap();

        let json = serde_json::to_string(&doc).unwrap();
        let back: PageDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&id).unwrap().props, doc.get(&id).unwrap().props);
    }
}
