//! # Module Install Events
//!
//! Real-time install/uninstall notifications arrive asynchronously from
//! the module host. They are applied as discrete, fully-serialized events:
//! `handle_event` takes the loader and registry by `&mut`, so one event's
//! register/unregister completes before the next is processed — a partial
//! unregister can never interleave with a partial register of the same
//! module id.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::loader::{InstalledModuleInfo, LoadReport, ModuleHost, ModuleLoader};
use crate::registry::ComponentRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ModuleEvent {
    Installed(InstalledModuleInfo),
    Uninstalled { module_id: String },
}

impl<H: ModuleHost> ModuleLoader<H> {
    /// Apply one event end-to-end. Install failures are isolated into the
    /// returned report, exactly as in batch loading.
    pub async fn handle_event(
        &mut self,
        registry: &mut ComponentRegistry,
        event: ModuleEvent,
    ) -> LoadReport {
        match event {
            ModuleEvent::Installed(module) => {
                info!(module = %module.id, "module installed");
                // reload covers both fresh installs and reinstalls
                self.reload_module(registry, &module).await
            }
            ModuleEvent::Uninstalled { module_id } => {
                info!(module = %module_id, "module uninstalled");
                self.unload_module(registry, &module_id);
                LoadReport::default()
            }
        }
    }

    /// Drain an event channel, applying events strictly one at a time.
    /// Returns when the sending side closes.
    pub async fn run_event_loop(
        &mut self,
        registry: &mut ComponentRegistry,
        mut events: mpsc::Receiver<ModuleEvent>,
    ) {
        while let Some(event) = events.recv().await {
            self.handle_event(registry, event).await;
        }
    }
}
