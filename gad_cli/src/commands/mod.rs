pub mod analyze;
pub mod config;
pub mod logs;
pub mod plugins;

use anyhow::Result;
use gad_core::{BridgeGad, Settings};

use crate::{install_crash_hook, GlobalOpts};

/// Resolve settings from the config file and flags, and build the app.
pub fn load_app(global: &GlobalOpts) -> Result<BridgeGad> {
    let config_path = global.config_path();
    let mut settings = Settings::load(&config_path)?;
    if let Some(dir) = &global.plugin_dir {
        settings.plugins.dir = dir.clone();
    }
    tracing::debug!(config = %config_path.display(), plugin_dir = %settings.plugins.dir.display(), "settings loaded");

    let app = BridgeGad::new(settings);
    install_crash_hook(app.log().clone());
    Ok(app)
}
