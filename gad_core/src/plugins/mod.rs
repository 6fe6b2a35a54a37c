//! # Bridge-Type Plugins
//!
//! Extension modules that add bridge types without touching the host.
//!
//! ## Modules
//!
//! - [`contract`] - The [`BridgePlugin`] capability and module file format
//! - [`discovery`] - Scanning the plugin directory
//! - [`registry`] - JSON catalog of discovered plugins
//! - [`generator`] - Scaffolding new plugin modules
//! - [`sandbox`] - Running a plugin in a child process with a deadline
//! - [`update`] - Checking for a newer plugin pack

pub mod contract;
pub mod discovery;
pub mod generator;
pub mod registry;
pub mod sandbox;
pub mod update;

pub use contract::{BridgePlugin, PluginAction, PluginDescriptor};
pub use discovery::{discover, load_plugins, Discovery, LoadFailure};
pub use generator::create_plugin;
pub use registry::{Catalog, PluginRegistry, RegistryRecord};
pub use sandbox::{run_child, ChildLauncher, SandboxReport, SandboxRunner, SandboxState};
pub use update::{check_for_plugin_updates, UpdateCheckResult};
