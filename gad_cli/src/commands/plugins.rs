use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Subcommand;
use gad_core::plugins::{run_child, BridgePlugin, ChildLauncher, SandboxState};

use super::load_app;
use crate::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum PluginsAction {
    /// List discovered plugins (name, version, author)
    List,
    /// Run a plugin in the sandbox
    Run {
        /// Plugin display name
        name: String,
        /// Deadline in seconds, overriding `sandbox.deadline_secs`
        #[arg(long, value_name = "SECS")]
        timeout: Option<f64>,
    },
    /// Create a starter module for a new bridge type
    New {
        /// Display name, e.g. "Arch Bridge"
        name: String,
    },
    /// Rebuild or show the plugin registry
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
    /// Check for a newer plugin pack
    CheckUpdates,
    /// Sandbox child entry point
    #[command(hide = true)]
    Exec {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RegistryAction {
    /// Rediscover plugins and overwrite the registry
    Rebuild,
    /// Print the registry as JSON
    Show,
}

pub async fn handle(action: PluginsAction, global: &GlobalOpts) -> Result<ExitCode> {
    let app = match &action {
        PluginsAction::Exec { source, name } => {
            let code = run_child(source, name);
            return Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)));
        }
        _ => load_app(global)?,
    };

    match action {
        PluginsAction::List => {
            let discovery = app.list_plugins();
            for failure in &discovery.failures {
                eprintln!("warning: skipped {}: {}", failure.path.display(), failure.reason);
            }
            if discovery.plugins.is_empty() {
                eprintln!("No plugins found in {}", app.plugin_dir().display());
            }
            for plugin in &discovery.plugins {
                println!("{}\t{}\t{}", plugin.name(), plugin.version(), plugin.author());
            }
        }
        PluginsAction::Run { name, timeout } => {
            let deadline = match timeout {
                Some(secs) => match Duration::try_from_secs_f64(secs) {
                    Ok(deadline) if !deadline.is_zero() => Some(deadline),
                    _ => bail!("--timeout must be a positive number of seconds, got {}", secs),
                },
                None => None,
            };

            let launcher = ChildLauncher::current_exe(child_args(global))?;
            let report = app.run_plugin(&name, launcher, deadline).await?;

            for event in &report.events {
                println!(
                    "{} {:<12} {}: {}",
                    event.at.format("%H:%M:%S"),
                    event.state,
                    report.plugin,
                    event.message
                );
            }
            if report.outcome() == SandboxState::SpawnFailed {
                return Ok(ExitCode::FAILURE);
            }
        }
        PluginsAction::New { name } => {
            let path = app.create_plugin(&name)?;
            println!("Created plugin module: {}", path.display());
        }
        PluginsAction::Registry { action } => match action {
            RegistryAction::Rebuild => {
                let catalog = app.rebuild_registry()?;
                println!(
                    "Registry updated with {} plugin(s): {}",
                    catalog.len(),
                    app.registry().path().display()
                );
            }
            RegistryAction::Show => {
                let catalog = app.registry().load_or_empty();
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            }
        },
        PluginsAction::CheckUpdates => {
            println!("{}", app.check_updates().await);
        }
        PluginsAction::Exec { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Arguments placed before `--source/--name` when re-launching ourselves
fn child_args(global: &GlobalOpts) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(config) = &global.config {
        args.push("--config".to_string());
        args.push(config.display().to_string());
    }
    args.push("plugins".to_string());
    args.push("exec".to_string());
    args
}
