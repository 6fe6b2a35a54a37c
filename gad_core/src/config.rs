//! # Configuration
//!
//! Human-editable TOML configuration. The raw file is a [`toml::Table`];
//! [`Settings`] is the typed view the rest of the crate consumes.
//!
//! An absent or blank file is an empty configuration, never an error.
//!
//! ```toml
//! [analysis]
//! E = 2.1e8
//! I = 0.0025
//!
//! [plugins]
//! dir = "plugins"
//!
//! [updates]
//! url = "https://api.github.com/repos/owner/repo/releases/latest"
//! timeout_secs = 5
//!
//! [sandbox]
//! deadline_secs = 180
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::calculations::beam::{DEFAULT_E, DEFAULT_I};
use crate::errors::{GadError, GadResult};
use crate::file_io::write_atomic;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "BRIDGE_GAD_CONFIG";

/// Release-metadata endpoint queried for the latest plugin pack
pub const DEFAULT_UPDATE_URL: &str =
    "https://api.github.com/repos/CRAJKUMARSINGH/Bridge_GAD_Yogendra_Borse/releases/latest";

/// Registry catalog file name, placed in the user's home directory
pub const REGISTRY_FILE_NAME: &str = "Bridge_GAD_PluginRegistry.json";

/// Log directory name, placed in the user's home directory
pub const LOG_DIR_NAME: &str = "Bridge_GAD_Logs";

/// Read a configuration file.
///
/// # Returns
///
/// * `Ok(Table::new())` - file is missing or contains only whitespace
/// * `Err(GadError::Config)` - file is unreadable or not valid TOML
pub fn read_config(path: &Path) -> GadResult<Table> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Table::new()),
        Err(e) => return Err(GadError::config(path.display().to_string(), e.to_string())),
    };

    if content.trim().is_empty() {
        return Ok(Table::new());
    }

    toml::from_str(&content).map_err(|e| GadError::config(path.display().to_string(), e.to_string()))
}

/// Save a configuration table atomically, creating parent directories.
pub fn save_config(config: &Table, path: &Path) -> GadResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| GadError::file_error("create config dir", parent.display().to_string(), e.to_string()))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| GadError::SerializationError {
        reason: e.to_string(),
    })?;
    write_atomic(path, &content)
}

/// Set a dotted key (e.g. `sandbox.deadline_secs`) in a configuration table.
///
/// The raw value is parsed as a TOML value when possible (`180`, `2.1e8`,
/// `true`, `"text"`) and stored as a plain string otherwise. Missing
/// intermediate tables are created.
pub fn set_value(config: &mut Table, dotted_key: &str, raw: &str) -> GadResult<()> {
    let parts: Vec<&str> = dotted_key.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(GadError::invalid_input("key", dotted_key, "keys are dot-separated, non-empty names"));
    }

    let value = parse_value(raw);
    let Some((last, parents)) = parts.split_last() else {
        return Err(GadError::invalid_input("key", dotted_key, "key is empty"));
    };

    let mut table = config;
    for part in parents {
        let entry = table
            .entry(part.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        table = match entry {
            Value::Table(t) => t,
            _ => {
                return Err(GadError::invalid_input(
                    "key",
                    dotted_key,
                    format!("'{}' is not a table", part),
                ))
            }
        };
    }
    table.insert(last.to_string(), value);
    Ok(())
}

fn parse_value(raw: &str) -> Value {
    toml::from_str::<Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Default config file location.
///
/// `BRIDGE_GAD_CONFIG` wins when set and non-empty; otherwise
/// `~/.config/bridge_gad/config.toml` (the platform config dir on Windows).
pub fn default_config_path() -> PathBuf {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let trimmed = env_path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    #[cfg(not(target_os = "windows"))]
    let base = home_dir().join(".config");

    #[cfg(target_os = "windows")]
    let base = dirs::config_dir().unwrap_or_else(home_dir);

    base.join("bridge_gad").join("config.toml")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Typed settings resolved from a configuration table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub plugins: PluginSettings,
    pub updates: UpdateSettings,
    pub sandbox: SandboxSettings,
    pub logging: LoggingSettings,
}

/// Default section properties for the analysis path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    #[serde(rename = "E")]
    pub e_kn_per_m2: f64,
    #[serde(rename = "I")]
    pub i_m4: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            e_kn_per_m2: DEFAULT_E,
            i_m4: DEFAULT_I,
        }
    }
}

/// Plugin directory and registry location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub dir: PathBuf,
    /// Registry catalog path; `None` means `~/Bridge_GAD_PluginRegistry.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        PluginSettings {
            dir: PathBuf::from("plugins"),
            registry: None,
        }
    }
}

impl PluginSettings {
    pub fn registry_path(&self) -> PathBuf {
        self.registry
            .clone()
            .unwrap_or_else(|| home_dir().join(REGISTRY_FILE_NAME))
    }
}

/// Version-check endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        UpdateSettings {
            url: DEFAULT_UPDATE_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

impl UpdateSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Wall-clock limit for sandboxed plugins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub deadline_secs: f64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        SandboxSettings { deadline_secs: 180.0 }
    }
}

impl SandboxSettings {
    pub fn deadline(&self) -> Duration {
        Duration::try_from_secs_f64(self.deadline_secs).unwrap_or(Duration::MAX)
    }
}

/// Where the daily sandbox/crash log lives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `None` means `~/Bridge_GAD_Logs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LoggingSettings {
    pub fn log_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| home_dir().join(LOG_DIR_NAME))
    }
}

impl Settings {
    /// Resolve settings from a raw table. `source` names the file in errors.
    pub fn from_table(config: &Table, source: &str) -> GadResult<Self> {
        let settings: Settings = Value::Table(config.clone())
            .try_into()
            .map_err(|e: toml::de::Error| GadError::config(source, e.to_string()))?;
        settings.validate(source)?;
        Ok(settings)
    }

    /// Read and resolve a configuration file.
    pub fn load(path: &Path) -> GadResult<Self> {
        let table = read_config(path)?;
        Settings::from_table(&table, &path.display().to_string())
    }

    fn validate(&self, source: &str) -> GadResult<()> {
        if !(self.analysis.e_kn_per_m2.is_finite() && self.analysis.e_kn_per_m2 > 0.0) {
            return Err(GadError::config(source, "analysis.E must be a positive number"));
        }
        if !(self.analysis.i_m4.is_finite() && self.analysis.i_m4 > 0.0) {
            return Err(GadError::config(source, "analysis.I must be a positive number"));
        }
        if !(self.sandbox.deadline_secs.is_finite() && self.sandbox.deadline_secs > 0.0) {
            return Err(GadError::config(source, "sandbox.deadline_secs must be a positive number"));
        }
        Ok(())
    }
}
