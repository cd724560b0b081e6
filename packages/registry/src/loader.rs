//! # Module Loader
//!
//! Discovers the plugin modules installed for a site and imports their
//! contributed component definitions into a registry.
//!
//! Module loading is the one inherently concurrent operation in the core:
//! imports for multiple modules run as independent tasks and are joined
//! individually, each under its own timeout, so one slow or broken module
//! cannot block or fail the rest. Failures are recorded per module id and
//! reported alongside the successes — never thrown at the batch level.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::definition::{ComponentDefinition, FieldSpec, ModuleProvenance};
use crate::registry::{ComponentRegistry, DefinitionSource};

const DEFAULT_IMPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Active,
    Inactive,
    Suspended,
}

/// What the module host reports about one installed module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledModuleInfo {
    pub id: String,
    pub slug: String,

    /// Display name (used for provenance and search keywords).
    pub name: String,

    pub status: ModuleStatus,
    pub version: String,

    /// Whether the module contributes document components at all.
    pub provides_components: bool,
}

impl InstalledModuleInfo {
    fn is_loadable(&self) -> bool {
        self.status == ModuleStatus::Active && self.provides_components
    }
}

/// A module's export bundle, as produced by its dynamic import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleBundle {
    #[serde(default)]
    pub components: Vec<ComponentDefinition>,

    /// Custom field kinds the module contributes (reserved for field
    /// plugins; carried through untouched).
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleLoadError {
    #[error("module has no component export")]
    MissingExport,

    #[error("import failed: {0}")]
    Import(String),

    #[error("import timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Dynamic-import mechanism, supplied by the module host collaborator.
/// The core depends only on the bundle shape.
pub trait ModuleHost: Send + Sync {
    fn import_bundle<'a>(
        &'a self,
        module: &'a InstalledModuleInfo,
    ) -> BoxFuture<'a, Result<ModuleBundle, ModuleLoadError>>;
}

/// Outcome of one load batch: module ids that registered at least one
/// definition, and per-module failures. Failures are non-blocking — the
/// UI surfaces them as a list next to the loaded ones.
#[derive(Debug, Default, PartialEq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failed: BTreeMap<String, ModuleLoadError>,
}

/// Session-scoped loader over a host. Holds no state beyond the host
/// handle, the timeout, and which module ids it has loaded — multiple
/// sessions in one process get independent loaders and registries.
pub struct ModuleLoader<H> {
    host: H,
    import_timeout: Duration,
    loaded: HashSet<String>,
}

impl<H: ModuleHost> ModuleLoader<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            import_timeout: DEFAULT_IMPORT_TIMEOUT,
            loaded: HashSet::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.import_timeout = timeout;
        self
    }

    /// Import every active, component-contributing module and register its
    /// definitions with provenance.
    ///
    /// Imports run as independent tasks joined individually; a module that
    /// fails (missing export, error, timeout) lands in `failed` keyed by
    /// its id while the rest proceed.
    pub async fn load_modules(
        &mut self,
        registry: &mut ComponentRegistry,
        installed: &[InstalledModuleInfo],
    ) -> LoadReport {
        let eligible: Vec<&InstalledModuleInfo> =
            installed.iter().filter(|m| m.is_loadable()).collect();

        let host = &self.host;
        let timeout = self.import_timeout;
        let imports = eligible.into_iter().map(|module| async move {
            let result = match tokio::time::timeout(timeout, host.import_bundle(module)).await {
                Ok(result) => result,
                Err(_) => Err(ModuleLoadError::Timeout {
                    secs: timeout.as_secs(),
                }),
            };
            (module, result)
        });

        let mut report = LoadReport::default();
        for (module, result) in join_all(imports).await {
            match result {
                Ok(bundle) => {
                    self.register_bundle(registry, module, bundle, &mut report);
                }
                Err(err) => {
                    warn!(module = %module.id, %err, "module import failed");
                    report.failed.insert(module.id.clone(), err);
                }
            }
        }
        report
    }

    fn register_bundle(
        &mut self,
        registry: &mut ComponentRegistry,
        module: &InstalledModuleInfo,
        bundle: ModuleBundle,
        report: &mut LoadReport,
    ) {
        if bundle.components.is_empty() {
            report
                .failed
                .insert(module.id.clone(), ModuleLoadError::MissingExport);
            return;
        }

        let mut registered = 0usize;
        for mut definition in bundle.components {
            definition.provenance = Some(ModuleProvenance {
                module_id: module.id.clone(),
                module_name: module.name.clone(),
            });
            match registry.register(definition, DefinitionSource::Module(module.id.clone())) {
                Ok(()) => registered += 1,
                // A bad definition is skipped; the module's valid ones and
                // every other module still register
                Err(err) => warn!(module = %module.id, %err, "skipped invalid definition"),
            }
        }

        if registered > 0 {
            info!(module = %module.id, registered, "module loaded");
            self.loaded.insert(module.id.clone());
            report.loaded.push(module.id.clone());
        } else {
            report.failed.insert(
                module.id.clone(),
                ModuleLoadError::Import("no valid component definitions".to_string()),
            );
        }
    }

    /// Remove a module's definitions. Idempotent: unloading a module that
    /// was never loaded is a no-op.
    pub fn unload_module(&mut self, registry: &mut ComponentRegistry, module_id: &str) {
        registry.unregister_module(module_id);
        self.loaded.remove(module_id);
    }

    /// Unload then re-import one module. Safe even if it was never loaded.
    pub async fn reload_module(
        &mut self,
        registry: &mut ComponentRegistry,
        module: &InstalledModuleInfo,
    ) -> LoadReport {
        self.unload_module(registry, &module.id);
        self.load_modules(registry, std::slice::from_ref(module)).await
    }

    pub fn is_loaded(&self, module_id: &str) -> bool {
        self.loaded.contains(module_id)
    }
}
