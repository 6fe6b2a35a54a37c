//! # Plugin Contract
//!
//! Every bridge-type module exposes a display name, version, author,
//! description and a `run` action. Modules are TOML files under the plugin
//! directory; each declares one or more `[[plugin]]` tables:
//!
//! ```toml
//! [[plugin]]
//! class = "SlabBridgePlugin"
//! name = "Slab Bridge Design"
//! version = "1.0.0"
//! author = "Bridge Design Cell"
//! description = "Performs design calculations for slab bridges."
//!
//! [plugin.run]
//! kind = "analyze"
//! span = 10.0
//! load = 45.0
//! ```
//!
//! `run` may fail or never return; callers that must stay alive go through
//! [`crate::plugins::sandbox`].

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calculations::beam::{summarize, DEFAULT_E, DEFAULT_I};
use crate::errors::{GadError, GadResult};

/// Version assumed when a plugin declares none
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Author assumed when a plugin declares none
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Description assumed when a plugin declares none
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Capability every bridge-type module provides.
pub trait BridgePlugin {
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        DEFAULT_VERSION
    }

    fn author(&self) -> &str {
        DEFAULT_AUTHOR
    }

    fn description(&self) -> &str {
        DEFAULT_DESCRIPTION
    }

    /// Perform the module's work. May fail; may run indefinitely.
    fn run(&self) -> GadResult<()>;
}

/// What a plugin does when run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginAction {
    /// Show a titled message
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        text: String,
    },

    /// Analyze one simply-supported span and print the results
    Analyze {
        span: f64,
        load: f64,
        #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
        e: Option<f64>,
        #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
        i: Option<f64>,
    },

    /// Run an external program, failing on a non-zero exit
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Block for a number of seconds
    Sleep { seconds: f64 },

    /// Fail with a message
    Fail { message: String },
}

/// One plugin found during discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    /// Module (file stem) the plugin was declared in
    pub module: String,
    /// Module file
    pub source: PathBuf,
    /// Declared class name, if any
    pub class_name: Option<String>,
    /// `None` when the declaration has no `run` table
    pub action: Option<PluginAction>,
}

impl BridgePlugin for PluginDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn run(&self) -> GadResult<()> {
        let action = self
            .action
            .as_ref()
            .ok_or_else(|| GadError::plugin_failed(&self.name, "Each plugin must implement run()"))?;

        match action {
            PluginAction::Message { title, text } => {
                println!("[{}] {}", title.as_deref().unwrap_or(&self.name), text);
                Ok(())
            }
            PluginAction::Analyze { span, load, e, i } => {
                let results = summarize(*span, *load, e.unwrap_or(DEFAULT_E), i.unwrap_or(DEFAULT_I))
                    .map_err(|err| GadError::plugin_failed(&self.name, err.to_string()))?;
                println!("[{}]", self.name);
                for (key, value) in results.iter() {
                    println!("{}={}", key, value);
                }
                Ok(())
            }
            PluginAction::Command { program, args } => {
                let status = Command::new(program).args(args).status().map_err(|err| {
                    GadError::plugin_failed(&self.name, format!("could not start '{}': {}", program, err))
                })?;
                if status.success() {
                    Ok(())
                } else {
                    Err(GadError::plugin_failed(&self.name, format!("'{}' {}", program, status)))
                }
            }
            PluginAction::Sleep { seconds } => {
                let duration = Duration::try_from_secs_f64(*seconds).map_err(|_| {
                    GadError::plugin_failed(
                        &self.name,
                        format!("sleep needs a non-negative number of seconds, got {}", seconds),
                    )
                })?;
                std::thread::sleep(duration);
                Ok(())
            }
            PluginAction::Fail { message } => Err(GadError::plugin_failed(&self.name, message.clone())),
        }
    }
}

/// `[[plugin]]` table as written in a module file
#[derive(Debug, Deserialize)]
pub(crate) struct PluginDeclaration {
    pub class: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub run: Option<PluginAction>,
}

/// Whole module file
#[derive(Debug, Deserialize)]
pub(crate) struct PluginModule {
    #[serde(default)]
    pub plugin: Vec<PluginDeclaration>,
}

/// `true` for versions like `1`, `1.0`, `2.10.3`
pub fn is_dotted_numeric(version: &str) -> bool {
    !version.is_empty()
        && version
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
