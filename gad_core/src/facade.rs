//! # Application Facade
//!
//! Binds resolved [`Settings`] to the analysis kernel and the plugin
//! subsystem. Front ends (the CLI today) talk to [`BridgeGad`] only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::calculations::beam::{calculate, keys, BeamInput};
use crate::config::Settings;
use crate::errors::{GadError, GadResult};
use crate::file_io::{read_parameters, write_results};
use crate::logger::{DailyLog, DIAGNOSTICS_ARCHIVE};
use crate::plugins::discovery::{discover, Discovery};
use crate::plugins::generator;
use crate::plugins::registry::{Catalog, PluginRegistry};
use crate::plugins::sandbox::{ChildLauncher, SandboxReport, SandboxRunner};
use crate::plugins::update::check_for_plugin_updates;
use crate::values::{Parameters, Results};

/// One analysis run.
///
/// Values given explicitly override the same keys read from `input`.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub span: Option<f64>,
    pub load: Option<f64>,
    pub e: Option<f64>,
    pub i: Option<f64>,
    /// Parameter workbook to read first
    pub input: Option<PathBuf>,
    /// Results workbook to write
    pub out: Option<PathBuf>,
}

/// Application entry point for front ends.
#[derive(Debug, Clone)]
pub struct BridgeGad {
    settings: Settings,
    log: DailyLog,
}

impl BridgeGad {
    pub fn new(settings: Settings) -> Self {
        let log = DailyLog::new(settings.logging.log_dir());
        BridgeGad { settings, log }
    }

    pub fn with_log(mut self, log: DailyLog) -> Self {
        self.log = log;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn log(&self) -> &DailyLog {
        &self.log
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.settings.plugins.dir
    }

    /// Analyze one span, optionally reading parameters from and writing
    /// results to workbooks.
    pub fn analyze(&self, request: &AnalysisRequest) -> GadResult<Results> {
        let (mut params, source) = match &request.input {
            Some(path) => (read_parameters(path)?, path.display().to_string()),
            None => (Parameters::new(), "command line".to_string()),
        };

        for (key, value) in [
            (keys::SPAN, request.span),
            (keys::LOAD, request.load),
            (keys::E, request.e),
            (keys::I, request.i),
        ] {
            if let Some(value) = value {
                params.insert(key, value);
            }
        }

        let input = BeamInput::from_parameters(
            &params,
            &source,
            self.settings.analysis.e_kn_per_m2,
            self.settings.analysis.i_m4,
        )?;
        let results = calculate(&input)?;

        if let Some(out) = &request.out {
            write_results(&results, out)?;
            tracing::info!(path = %out.display(), "results written");
        }
        Ok(results)
    }

    /// Fresh scan of the plugin directory.
    pub fn list_plugins(&self) -> Discovery {
        discover(self.plugin_dir())
    }

    /// Run the named plugin in the sandbox.
    ///
    /// `deadline` overrides the configured one.
    pub async fn run_plugin(
        &self,
        name: &str,
        launcher: ChildLauncher,
        deadline: Option<Duration>,
    ) -> GadResult<SandboxReport> {
        let discovery = self.list_plugins();
        let plugin = discovery.find(name).ok_or_else(|| GadError::plugin_not_found(name))?;

        let runner = SandboxRunner::new(launcher)
            .with_deadline(deadline.unwrap_or_else(|| self.settings.sandbox.deadline()))
            .with_log(self.log.clone());
        Ok(runner.safe_run(plugin).await)
    }

    /// Scaffold a new plugin module. Returns the created file.
    pub fn create_plugin(&self, display_name: &str) -> GadResult<PathBuf> {
        generator::create_plugin(self.plugin_dir(), display_name)
    }

    pub fn registry(&self) -> PluginRegistry {
        PluginRegistry::new(self.settings.plugins.registry_path(), self.plugin_dir())
    }

    /// Rediscover and overwrite the registry catalog.
    pub fn rebuild_registry(&self) -> GadResult<Catalog> {
        self.registry().build()
    }

    /// Zip the daily logs for support, into the temp directory unless
    /// `dest` is given. Returns the archive path and the logs it holds.
    pub fn export_diagnostics(&self, dest: Option<&Path>) -> GadResult<(PathBuf, Vec<String>)> {
        let dest = dest
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::temp_dir().join(DIAGNOSTICS_ARCHIVE));
        let logs = self.log.export_diagnostics(&dest)?;
        Ok((dest, logs))
    }

    /// One-line message about the latest plugin pack.
    pub async fn check_updates(&self) -> String {
        check_for_plugin_updates(&self.settings.updates.url, self.settings.updates.timeout()).await
    }
}
