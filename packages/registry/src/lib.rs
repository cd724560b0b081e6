//! # Pagecraft Registry
//!
//! Component type definitions and the plugin modules that contribute them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ ModuleHost (collaborator)                   │
//! │  - installed module list for a site         │
//! │  - dynamic import of each export bundle     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ModuleLoader: concurrent, isolated imports  │
//! │  - per-module timeout, individual joins     │
//! │  - one failure never aborts the batch       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ ComponentRegistry (per editor session)      │
//! │  - core + plugin definitions, namespaced    │
//! │  - search / category grouping               │
//! │  - placeholder entries for missing types    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **No global singleton**: a registry is an explicit per-session value;
//!    concurrent sessions never share mutable module state
//! 2. **Isolation**: a malformed definition or failing module is reported
//!    and skipped, never fatal to its siblings
//! 3. **Zero data loss**: unregistering a module leaves existing document
//!    nodes of its types untouched; rendering degrades to a placeholder

mod definition;
mod events;
mod loader;
mod registry;

pub use definition::{
    validate_definition, ComponentDefinition, FieldKind, FieldSpec, ModuleProvenance,
    RenderContract,
};
pub use events::ModuleEvent;
pub use loader::{
    InstalledModuleInfo, LoadReport, ModuleBundle, ModuleHost, ModuleLoadError, ModuleLoader,
    ModuleStatus,
};
pub use registry::{ComponentRegistry, DefinitionSource, RegistryError, RenderEntry};
