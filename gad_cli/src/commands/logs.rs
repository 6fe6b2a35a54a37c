use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use super::load_app;
use crate::GlobalOpts;

#[derive(Subcommand, Debug)]
pub enum LogsAction {
    /// Zip the daily logs for a support request
    Export {
        /// Archive to write (default: Bridge_GAD_Diagnostics.zip in the temp directory)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

pub fn handle(action: LogsAction, global: &GlobalOpts) -> Result<ExitCode> {
    let app = load_app(global)?;

    match action {
        LogsAction::Export { out } => {
            let (archive, logs) = app.export_diagnostics(out.as_deref())?;
            if logs.is_empty() {
                eprintln!("No log files found; writing an empty archive");
            }
            println!("Exported {} log file(s) to {}", logs.len(), archive.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
