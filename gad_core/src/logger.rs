//! # Daily Log File
//!
//! Plain-text log shared by the sandbox runner and the CLI crash hook.
//! One file per day: `<dir>/bridge_gad_YYYY-MM-DD.log`.
//!
//! Writing is best-effort. A log that cannot be written is reported
//! through `tracing` and never fails the caller. Exporting the logs for
//! support is not best-effort and reports its errors.

use std::fs::{self, OpenOptions};
use std::io::{Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{GadError, GadResult};

/// Tag prefixed to every sandbox line
pub const SANDBOX_TAG: &str = "[PLUGIN-SANDBOX]";

/// Daily log file names start with this
pub const LOG_PREFIX: &str = "bridge_gad_";

/// File name used for a diagnostics archive when none is given
pub const DIAGNOSTICS_ARCHIVE: &str = "Bridge_GAD_Diagnostics.zip";

/// Appends sandbox events and crash reports to the daily log.
#[derive(Debug, Clone, Default)]
pub struct DailyLog {
    dir: Option<PathBuf>,
}

impl DailyLog {
    /// Log into `dir`, created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DailyLog { dir: Some(dir.into()) }
    }

    /// A log that drops everything (events still reach `tracing`)
    pub fn disabled() -> Self {
        DailyLog { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Log file for a given day
    pub fn file_for(&self, date: NaiveDate) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}{}.log", LOG_PREFIX, date.format("%Y-%m-%d"))))
    }

    /// Today's log file
    pub fn current_file(&self) -> Option<PathBuf> {
        self.file_for(Local::now().date_naive())
    }

    /// Append `[PLUGIN-SANDBOX] <plugin>: <status>` with a timestamp.
    pub fn sandbox(&self, plugin: &str, status: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.append(&format!("[{}] {} {}: {}\n", timestamp, SANDBOX_TAG, plugin, status));
    }

    /// Append a formatted crash record. Returns the file written, if any.
    pub fn crash(&self, report: &str) -> Option<PathBuf> {
        let mut record = String::new();
        record.push_str(&"=".repeat(80));
        record.push('\n');
        record.push_str(&format!("Timestamp: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S%.3f")));
        record.push_str(&format!(
            "System: {} {} ({})\n",
            std::env::consts::OS,
            std::env::consts::ARCH,
            std::env::consts::FAMILY
        ));
        record.push_str(&format!("Version: {}\n", env!("CARGO_PKG_VERSION")));
        if let Ok(exe) = std::env::current_exe() {
            record.push_str(&format!("Executable: {}\n", exe.display()));
        }
        record.push('\n');
        record.push_str(report);
        record.push('\n');

        self.append(&record)
    }

    /// Every daily log file in the directory, oldest first.
    ///
    /// A disabled log or a directory that does not exist yet has none.
    pub fn log_files(&self) -> GadResult<Vec<PathBuf>> {
        let Some(dir) = &self.dir else {
            return Ok(Vec::new());
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GadError::file_error("read directory", dir.display().to_string(), e.to_string()))
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.file_name().and_then(|n| n.to_str()).is_some_and(is_log_name))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Zip every daily log into `dest` for a support request.
    ///
    /// Entries are deflated and named after their log file. Returns the
    /// entry names in archive order; with no logs the archive is empty.
    pub fn export_diagnostics(&self, dest: &Path) -> GadResult<Vec<String>> {
        let out = |reason: String| GadError::output(dest.display().to_string(), reason);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let mut names = Vec::new();
        for path in self.log_files()? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let contents = fs::read(&path)
                .map_err(|e| GadError::file_error("read", path.display().to_string(), e.to_string()))?;

            archive.start_file(name.as_str(), options).map_err(|e| out(e.to_string()))?;
            archive.write_all(&contents).map_err(|e| out(e.to_string()))?;
            names.push(name);
        }
        let buffer = archive.finish().map_err(|e| out(e.to_string()))?.into_inner();

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| out(e.to_string()))?;
        }
        fs::write(dest, buffer).map_err(|e| out(e.to_string()))?;

        tracing::info!(archive = %dest.display(), logs = names.len(), "exported diagnostics");
        Ok(names)
    }

    fn append(&self, text: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = self.current_file()?;

        let result = fs::create_dir_all(dir).and_then(|()| {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            file.write_all(text.as_bytes())
        });

        match result {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not write log file");
                None
            }
        }
    }
}

fn is_log_name(name: &str) -> bool {
    name.starts_with(LOG_PREFIX) && name.ends_with(".log")
}
