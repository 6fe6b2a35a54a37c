//! # Bridge_GAD CLI
//!
//! Command-line front end for beam analysis and bridge-type plugins.
//!
//! ```text
//! bridge-gad analyze --span 20 --load 15 --out results.xlsx
//! bridge-gad plugins list
//! bridge-gad plugins run "Slab Bridge Design" --timeout 30
//! bridge-gad plugins new "Arch Bridge"
//! bridge-gad plugins registry rebuild
//! bridge-gad config set sandbox.deadline_secs 60
//! bridge-gad logs export --out diagnostics.zip
//! ```

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gad_core::config::default_config_path;
use gad_core::{DailyLog, GadError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::analyze::AnalyzeArgs;
use commands::config::ConfigAction;
use commands::logs::LogsAction;
use commands::plugins::PluginsAction;

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "BRIDGE_GAD_LOG";

#[derive(Parser)]
#[command(name = "bridge-gad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Bridge general arrangement analysis",
    long_about = "Analyze simply-supported bridge spans and manage bridge-type plugins."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Configuration file (default: $BRIDGE_GAD_CONFIG or ~/.config/bridge_gad/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Plugin directory, overriding `plugins.dir`
    #[arg(long, global = true, value_name = "DIR")]
    pub plugin_dir: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalOpts {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a simply-supported span under uniform load
    Analyze(AnalyzeArgs),
    /// List, run, create and catalog plugins
    Plugins {
        #[command(subcommand)]
        action: PluginsAction,
    },
    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Work with the daily log files
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::handle(args, &cli.global),
        Commands::Plugins { action } => commands::plugins::handle(action, &cli.global).await,
        Commands::Config { action } => commands::config::handle(action, &cli.global),
        Commands::Logs { action } => commands::logs::handle(action, &cli.global),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let code = match e.downcast_ref::<GadError>() {
                Some(gad) => {
                    eprintln!("Error [{}]: {}", gad.error_code(), gad);
                    gad.exit_code()
                }
                None => {
                    eprintln!("Error: {:#}", e);
                    1
                }
            };
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "gad_core=info,gad_cli=info",
        _ => "gad_core=debug,gad_cli=debug",
    };

    let filter =
        tracing_subscriber::EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Record panics in the daily log before the default hook reports them.
pub fn install_crash_hook(log: DailyLog) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        if let Some(path) = log.crash(&format!("{}\n\nStack trace:\n{}", info, backtrace)) {
            eprintln!("Crash details logged to: {}", path.display());
        }
        default_hook(info);
    }));
}
