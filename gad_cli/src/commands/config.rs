use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use gad_core::config::{read_config, save_config, set_value};
use gad_core::Settings;

use super::load_app;
use crate::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved settings
    Show,
    /// Print the configuration file location
    Path,
    /// Set a dotted key, e.g. `sandbox.deadline_secs 60`
    Set {
        key: String,
        value: String,
    },
}

pub fn handle(action: ConfigAction, global: &GlobalOpts) -> Result<ExitCode> {
    let path = global.config_path();

    match action {
        ConfigAction::Show => {
            let app = load_app(global)?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(app.settings())?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Set { key, value } => {
            let mut table = read_config(&path)?;
            set_value(&mut table, &key, &value)?;
            // Refuse to save a file that would no longer load
            Settings::from_table(&table, &path.display().to_string())?;
            save_config(&table, &path)?;
            println!("Set {} in {}", key, path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
