//! # Component Definitions
//!
//! The schema a component type publishes to the editor: which props it
//! has, how each is edited, and the contract handed to the rendering
//! collaborator. Plugin-contributed schemas arrive loosely typed over the
//! wire, so `FieldSpec` is a closed tagged union validated once at
//! registration time rather than shape-checked at every point of use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Editing widget and constraints for one prop, by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
        #[serde(default)]
        multiline: bool,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Select {
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Color {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Spacing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Toggle {
        #[serde(default)]
        default: bool,
    },
}

/// One prop's field schema: kind plus whether the prop may vary per
/// breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub kind: FieldKind,

    #[serde(default)]
    pub responsive: bool,
}

/// What the rendering collaborator receives for a node of this type. The
/// core never paints; this is the whole contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderContract {
    /// Render target tag/handle (e.g. `"section"`, `"img"`).
    pub tag: String,

    #[serde(default)]
    pub accepts_children: bool,
}

/// Which installed module contributed a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleProvenance {
    pub module_id: String,

    /// Display name, injected into search keywords so plugin components
    /// are discoverable by module name.
    pub module_name: String,
}

/// A component type as registered in the palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Globally unique type key; what `ComponentNode.type` points at.
    #[serde(rename = "type")]
    pub type_name: String,

    pub label: String,

    #[serde(default)]
    pub description: String,

    /// Palette group (e.g. "Layout", "Content", "Commerce").
    pub category: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldSpec>,

    pub render: RenderContract,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ModuleProvenance>,
}

/// Reject malformed definitions at registration, naming the offending
/// module in the diagnostic.
pub fn validate_definition(
    definition: &ComponentDefinition,
    module: &str,
) -> Result<(), RegistryError> {
    let reject = |reason: String| RegistryError::InvalidDefinition {
        module: module.to_string(),
        reason,
    };

    if definition.type_name.trim().is_empty() {
        return Err(reject("definition is missing a type key".to_string()));
    }
    if definition.label.trim().is_empty() {
        return Err(reject(format!(
            "definition {} is missing a label",
            definition.type_name
        )));
    }
    if definition.render.tag.trim().is_empty() {
        return Err(reject(format!(
            "definition {} is missing a render contract",
            definition.type_name
        )));
    }

    for (name, field) in &definition.fields {
        match &field.kind {
            FieldKind::Select { options, .. } if options.is_empty() => {
                return Err(reject(format!(
                    "select field {}.{} has no options",
                    definition.type_name, name
                )));
            }
            FieldKind::Number {
                min: Some(min),
                max: Some(max),
                ..
            } if min > max => {
                return Err(reject(format!(
                    "number field {}.{} has min > max",
                    definition.type_name, name
                )));
            }
            _ => {}
        }
    }

    Ok(())
}
