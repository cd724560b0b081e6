//! # Pagecraft Templates
//!
//! Instantiates serialized template subtrees into a page: every node gets
//! a fresh id, color tokens are filled from the site's palette, and text
//! tokens are filled from the template's default copy so the result is
//! immediately presentable.
//!
//! The three passes are pure and order-dependent:
//!
//! 1. **Clone** — mint fresh ids, rewrite every `parentId`/`children`
//!    reference through the old→new map
//! 2. **Color tokens** — `$primary` and friends replaced from `SiteColors`
//! 3. **Text tokens** — `$headline` and friends replaced from the
//!    template's default copy, never blanked
//!
//! Inputs are immutable; instantiating the same template twice yields two
//! subtrees with disjoint id sets.

mod tokens;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pagecraft_document::{clone_subtree_with_fresh_ids, ComponentNode};

use crate::tokens::substitute_prop;

/// The theme collaborator's palette: color name → value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteColors(pub BTreeMap<String, String>);

impl SiteColors {
    /// Fallback palette used when the theme collaborator supplies nothing.
    pub fn default_palette() -> Self {
        Self(BTreeMap::from([
            ("primary".to_string(), "#2563eb".to_string()),
            ("secondary".to_string(), "#64748b".to_string()),
            ("accent".to_string(), "#f59e0b".to_string()),
            ("background".to_string(), "#ffffff".to_string()),
            ("text".to_string(), "#0f172a".to_string()),
        ]))
    }
}

impl Default for SiteColors {
    fn default() -> Self {
        Self::default_palette()
    }
}

/// A serialized template: the node batch plus the default copy for its
/// text tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSubtree {
    pub nodes: Vec<ComponentNode>,

    /// Text token name → default copy (`"headline"` → `"Hello"`).
    #[serde(default)]
    pub text_defaults: BTreeMap<String, String>,
}

/// Instantiate a template against a site palette. Nodes without a
/// `parentId` in the template become the roots of the new subtree, ready
/// to insert via the editor's `InsertSubtree` command.
pub fn instantiate(template: &TemplateSubtree, site_colors: &SiteColors) -> Vec<ComponentNode> {
    let (mut nodes, _) = clone_subtree_with_fresh_ids(&template.nodes);

    for node in &mut nodes {
        for value in node.props.values_mut() {
            let colored = substitute_prop(value, &site_colors.0);
            *value = substitute_prop(&colored, &template.text_defaults);
        }
    }

    nodes
}
