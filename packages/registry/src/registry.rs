//! # Component Registry
//!
//! Holds the component type definitions available to one editor session:
//! built-in core types plus whatever the site's installed modules
//! contribute. A registry is an explicit per-session instance — never a
//! process-wide singleton — so two open documents cannot leak each other's
//! module sets.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::definition::{validate_definition, ComponentDefinition, ModuleProvenance};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("type {type_name} is already registered by module {existing_module}, rejected re-registration from {incoming_module}")]
    DuplicateType {
        type_name: String,
        existing_module: String,
        incoming_module: String,
    },

    #[error("invalid definition from module {module}: {reason}")]
    InvalidDefinition { module: String, reason: String },
}

/// Who registered a definition. Type keys are namespaced by source so a
/// plugin cannot silently shadow a core component or another plugin's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    Core,
    Module(String),
}

impl DefinitionSource {
    fn label(&self) -> &str {
        match self {
            DefinitionSource::Core => "core",
            DefinitionSource::Module(id) => id,
        }
    }
}

struct RegisteredDefinition {
    definition: ComponentDefinition,
    source: DefinitionSource,
}

/// Render-time lookup result. A node whose type has no live definition
/// (its module was uninstalled after authoring) gets a placeholder that
/// names the original type and, when recoverable, the missing module —
/// never an error, never a silent drop.
#[derive(Debug, PartialEq)]
pub enum RenderEntry<'a> {
    Known(&'a ComponentDefinition),
    Placeholder {
        type_name: String,
        module_name: Option<String>,
    },
}

/// Per-session component palette.
#[derive(Default)]
pub struct ComponentRegistry {
    definitions: BTreeMap<String, RegisteredDefinition>,

    /// type → contributing module display name, kept after unregistration
    /// so placeholders can say which module to reinstall.
    tombstones: HashMap<String, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under a source.
    ///
    /// Re-registering an active type from a *different* module is rejected
    /// with `DuplicateType`; the *same* module re-registering (a reload)
    /// replaces the definition in place, leaving existing node instances
    /// pointing at the unchanged type key.
    pub fn register(
        &mut self,
        mut definition: ComponentDefinition,
        source: DefinitionSource,
    ) -> Result<(), RegistryError> {
        validate_definition(&definition, source.label())?;

        if let Some(existing) = self.definitions.get(&definition.type_name) {
            if existing.source != source {
                return Err(RegistryError::DuplicateType {
                    type_name: definition.type_name.clone(),
                    existing_module: existing.source.label().to_string(),
                    incoming_module: source.label().to_string(),
                });
            }
        }

        // Plugin components are discoverable by their module's display name
        if let Some(ModuleProvenance { module_name, .. }) = &definition.provenance {
            let keyword = module_name.to_lowercase();
            if !definition.keywords.contains(&keyword) {
                definition.keywords.push(keyword);
            }
            self.tombstones.remove(&definition.type_name);
        }

        debug!(
            type_name = %definition.type_name,
            source = %source.label(),
            "registered component definition"
        );
        self.definitions.insert(
            definition.type_name.clone(),
            RegisteredDefinition { definition, source },
        );
        Ok(())
    }

    /// Remove every definition contributed by `module_id`, leaving a
    /// provenance tombstone per type. Existing document nodes of those
    /// types are untouched (the registry never sees documents).
    pub fn unregister_module(&mut self, module_id: &str) {
        let source = DefinitionSource::Module(module_id.to_string());
        let removed: Vec<String> = self
            .definitions
            .iter()
            .filter(|(_, reg)| reg.source == source)
            .map(|(type_name, _)| type_name.clone())
            .collect();

        for type_name in removed {
            if let Some(reg) = self.definitions.remove(&type_name) {
                if let Some(provenance) = reg.definition.provenance {
                    self.tombstones.insert(type_name, provenance.module_name);
                }
            }
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&ComponentDefinition> {
        self.definitions.get(type_name).map(|reg| &reg.definition)
    }

    pub fn get_all(&self) -> Vec<&ComponentDefinition> {
        self.definitions.values().map(|reg| &reg.definition).collect()
    }

    /// Palette view: definitions grouped by category, categories and
    /// entries in stable order.
    pub fn grouped_by_category(&self) -> BTreeMap<&str, Vec<&ComponentDefinition>> {
        let mut groups: BTreeMap<&str, Vec<&ComponentDefinition>> = BTreeMap::new();
        for reg in self.definitions.values() {
            groups
                .entry(reg.definition.category.as_str())
                .or_default()
                .push(&reg.definition);
        }
        groups
    }

    /// Case-insensitive substring search over label, description and
    /// keywords (which include contributing module names).
    pub fn search(&self, query: &str) -> Vec<&ComponentDefinition> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.get_all();
        }

        self.definitions
            .values()
            .map(|reg| &reg.definition)
            .filter(|def| {
                def.label.to_lowercase().contains(&needle)
                    || def.description.to_lowercase().contains(&needle)
                    || def.keywords.iter().any(|k| k.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Render-time lookup with placeholder degradation.
    pub fn render_entry(&self, type_name: &str) -> RenderEntry<'_> {
        match self.get(type_name) {
            Some(definition) => RenderEntry::Known(definition),
            None => RenderEntry::Placeholder {
                type_name: type_name.to_string(),
                module_name: self.tombstones.get(type_name).cloned(),
            },
        }
    }
}
