//! # Plugin Sandbox
//!
//! Runs one plugin in a separate process with a wall-clock deadline, so a
//! crashing or hanging plugin cannot take the host down.
//!
//! The child is started as `<launcher> --source <module file> --name <plugin>`.
//! The launcher is expected to call [`run_child`], which re-loads the plugin
//! from its module and runs it.
//!
//! ```text
//! NEW -> SPAWNING -> RUNNING -> EXITED_OK | EXITED_ERROR | TIMED_OUT
//!                 -> SPAWN_FAILED
//! ```
//!
//! Every transition is appended to the report, sent to `tracing` and written
//! to the daily log. [`SandboxRunner::safe_run`] itself never fails.
//!
//! On Unix the child leads its own process group, so anything it starts
//! (a `command` plugin's program, say) shares its fate. When the deadline
//! passes the group gets SIGTERM, then SIGKILL once the terminate grace
//! has run out. Elsewhere only the direct child is killed.

use std::backtrace::Backtrace;
use std::ffi::OsString;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::process::{Child, Command};

use crate::errors::{GadError, GadResult};
use crate::logger::DailyLog;
use crate::plugins::contract::{BridgePlugin, PluginDescriptor};
use crate::plugins::discovery::load_module;

/// Deadline used when none is configured
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(180);

/// How long a timed-out child may take to exit after SIGTERM
pub const DEFAULT_TERM_GRACE: Duration = Duration::from_secs(3);

/// How long to wait for a killed child to be reaped
const REAP_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle of one sandboxed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxState {
    New,
    Spawning,
    Running,
    ExitedOk,
    ExitedError,
    TimedOut,
    SpawnFailed,
}

impl SandboxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxState::New => "NEW",
            SandboxState::Spawning => "SPAWNING",
            SandboxState::Running => "RUNNING",
            SandboxState::ExitedOk => "EXITED_OK",
            SandboxState::ExitedError => "EXITED_ERROR",
            SandboxState::TimedOut => "TIMED_OUT",
            SandboxState::SpawnFailed => "SPAWN_FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SandboxState::ExitedOk | SandboxState::ExitedError | SandboxState::TimedOut | SandboxState::SpawnFailed
        )
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded transition
#[derive(Debug, Clone, Serialize)]
pub struct SandboxEvent {
    pub at: DateTime<Utc>,
    pub state: SandboxState,
    pub message: String,
}

/// Everything observed while running one plugin
#[derive(Debug, Clone, Serialize)]
pub struct SandboxReport {
    pub plugin: String,
    pub events: Vec<SandboxEvent>,
    /// Child exit code, when it exited normally
    pub exit_code: Option<i32>,
}

impl SandboxReport {
    fn new(plugin: &str) -> Self {
        SandboxReport {
            plugin: plugin.to_string(),
            events: Vec::new(),
            exit_code: None,
        }
    }

    /// Final state reached
    pub fn outcome(&self) -> SandboxState {
        self.events.last().map(|e| e.state).unwrap_or(SandboxState::New)
    }

    /// Whether a child process was started
    pub fn launched(&self) -> bool {
        self.events.iter().any(|e| e.state == SandboxState::Running)
    }
}

/// Program (plus leading arguments) used to start sandbox children
#[derive(Debug, Clone)]
pub struct ChildLauncher {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ChildLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ChildLauncher {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Re-launch the running executable with `args` in front of the child flags.
    pub fn current_exe<I, S>(args: I) -> GadResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let program = std::env::current_exe()
            .map_err(|e| GadError::file_error("locate executable", "current_exe", e.to_string()))?;
        Ok(ChildLauncher {
            program,
            args: args.into_iter().map(Into::into).collect(),
        })
    }
}

/// Runs plugins in child processes.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    launcher: ChildLauncher,
    deadline: Duration,
    term_grace: Duration,
    log: DailyLog,
}

impl SandboxRunner {
    pub fn new(launcher: ChildLauncher) -> Self {
        SandboxRunner {
            launcher,
            deadline: DEFAULT_DEADLINE,
            term_grace: DEFAULT_TERM_GRACE,
            log: DailyLog::disabled(),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_term_grace(mut self, grace: Duration) -> Self {
        self.term_grace = grace;
        self
    }

    pub fn with_log(mut self, log: DailyLog) -> Self {
        self.log = log;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `plugin` in a child process and wait at most the deadline.
    pub async fn safe_run(&self, plugin: &PluginDescriptor) -> SandboxReport {
        let mut report = SandboxReport::new(plugin.name());

        self.record(
            &mut report,
            SandboxState::Spawning,
            format!("Running in sandbox (deadline {:.1}s)", self.deadline.as_secs_f64()),
        );

        let mut command = Command::new(&self.launcher.program);
        command
            .args(&self.launcher.args)
            .arg("--source")
            .arg(&plugin.source)
            .arg("--name")
            .arg(plugin.name())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.record(&mut report, SandboxState::SpawnFailed, format!("Failed to launch: {}", e));
                return report;
            }
        };

        let pid = child.id().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
        self.record(&mut report, SandboxState::Running, format!("Child process {} started", pid));

        match tokio::time::timeout(self.deadline, child.wait()).await {
            Ok(Ok(status)) => {
                report.exit_code = status.code();
                let state = if status.success() {
                    SandboxState::ExitedOk
                } else {
                    SandboxState::ExitedError
                };
                self.record(&mut report, state, format!("Exited safely ({})", status));
            }
            Ok(Err(e)) => {
                let _ = child.start_kill();
                self.record(
                    &mut report,
                    SandboxState::ExitedError,
                    format!("Lost track of child process: {}", e),
                );
            }
            Err(_) => {
                self.terminate(&mut child, &report.plugin).await;
                self.record(&mut report, SandboxState::TimedOut, "Terminated (timeout)".to_string());
            }
        }

        report
    }

    /// Stop a timed-out child and everything in its process group.
    async fn terminate(&self, child: &mut Child, plugin: &str) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            signal_group(pid, libc::SIGTERM, plugin);
            if tokio::time::timeout(self.term_grace, child.wait()).await.is_err() {
                tracing::debug!(plugin, pid, "child ignored SIGTERM");
            }
            // leftovers that outlived the leader or ignore SIGTERM
            signal_group(pid, libc::SIGKILL, plugin);
        }

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        if let Err(e) = child.start_kill() {
            tracing::warn!(plugin, error = %e, "could not kill timed-out plugin");
        }
        if tokio::time::timeout(REAP_GRACE, child.wait()).await.is_err() {
            tracing::warn!(plugin, "timed-out plugin was not reaped");
        }
    }

    fn record(&self, report: &mut SandboxReport, state: SandboxState, message: String) {
        match state {
            SandboxState::ExitedError | SandboxState::TimedOut | SandboxState::SpawnFailed => {
                tracing::warn!(plugin = %report.plugin, state = %state, "{}", message)
            }
            _ => tracing::info!(plugin = %report.plugin, state = %state, "{}", message),
        }
        self.log.sandbox(&report.plugin, &format!("{} {}", state, message));
        report.events.push(SandboxEvent {
            at: Utc::now(),
            state,
            message,
        });
    }
}

/// Send `signal` to the process group led by `pgid`. An already empty
/// group is not an error.
#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int, plugin: &str) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only reads its two integer arguments
    if unsafe { libc::killpg(pgid, signal) } == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(plugin, pgid, signal, error = %err, "could not signal plugin process group");
        }
    }
}

/// Child-side entry point. Loads `name` from the module at `source`, runs
/// it and returns the process exit code.
///
/// Failures are written to stderr with a backtrace and turned into exit
/// code 1.
pub fn run_child(source: &Path, name: &str) -> i32 {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> GadResult<()> {
        let plugins = load_module(source)?;
        let plugin = plugins
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| GadError::plugin_not_found(name))?;
        plugin.run()
    }));

    match outcome {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            eprintln!("Plugin '{}' crashed: {} [{}]", name, e, e.error_code());
            eprintln!("{}", Backtrace::force_capture());
            1
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            eprintln!("Plugin '{}' panicked: {}", name, message);
            1
        }
    }
}
