//! Integration tests for bridge-gad

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use gad_core::file_io::read_results;
use predicates::prelude::*;
use tempfile::TempDir;

fn bundled_plugins() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("plugins")
}

/// Workspace with a config that keeps the registry and logs inside it
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "[plugins]\nregistry = {:?}\n\n[logging]\ndir = {:?}\n",
            dir.path().join("registry.json").display().to_string(),
            dir.path().join("logs").display().to_string(),
        );
        fs::write(dir.path().join("config.toml"), config).unwrap();
        Sandbox { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bridge-gad").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env_remove("BRIDGE_GAD_LOG")
            .arg("--config")
            .arg(self.path().join("config.toml"));
        cmd
    }

    fn with_bundled_plugins(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--plugin-dir").arg(bundled_plugins());
        cmd
    }

    fn log_contents(&self) -> String {
        let mut contents = String::new();
        for entry in fs::read_dir(self.path().join("logs")).unwrap() {
            contents.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
        }
        contents
    }
}

/// Live, non-zombie process
#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| stat.rsplit(')').next().map(|rest| !rest.trim_start().starts_with('Z')))
        .unwrap_or(false)
}

/// Poll until `pid` has exited, for at most three seconds
#[cfg(target_os = "linux")]
fn exited(pid: u32) -> bool {
    let started = Instant::now();
    while is_running(pid) {
        if started.elapsed() > Duration::from_secs(3) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    true
}

/// PID from the `RUNNING ... Child process <pid> started` line
fn child_pid(stdout: &[u8]) -> u32 {
    let stdout = String::from_utf8_lossy(stdout);
    stdout
        .lines()
        .find_map(|line| line.split("Child process ").nth(1))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|pid| pid.parse().ok())
        .unwrap_or_else(|| panic!("no child pid in output:\n{}", stdout))
}

#[test]
fn test_help() {
    Command::cargo_bin("bridge-gad")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyze simply-supported bridge spans"));
}

#[test]
fn test_analyze_prints_and_writes_results() {
    let sandbox = Sandbox::new();
    let out = sandbox.path().join("r.xlsx");

    sandbox
        .cmd()
        .args(["analyze", "--span", "20", "--load", "15", "--E", "2e8", "--I", "0.004", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("bending_moment_kNm=750\n"))
        .stdout(predicate::str::contains("shear_force_kN=150\n"))
        .stdout(predicate::str::contains("deflection_m=0.03906"));

    let results = read_results(&out).unwrap();
    assert_eq!(results.get("bending_moment_kNm"), Some(750.0));
    assert_eq!(results.get("span"), Some(20.0));
}

#[test]
fn test_analyze_domain_error_exit_code() {
    Sandbox::new()
        .cmd()
        .args(["analyze", "--span", "-1", "--load", "10"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DOMAIN_ERROR"));
}

#[test]
fn test_analyze_missing_load() {
    Sandbox::new()
        .cmd()
        .args(["analyze", "--span", "12"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("LOAD"));
}

#[test]
fn test_list_bundled_plugins() {
    Sandbox::new()
        .with_bundled_plugins()
        .args(["plugins", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Box Culvert Design\t1.0.0\tEr. Rajkumar Singh Chauhan",
        ))
        .stdout(predicate::str::contains("Faulty Test Plugin\t0.1\tTest Suite"))
        .stdout(predicate::str::contains("Slab Bridge Design"));
}

#[test]
fn test_list_missing_directory_is_empty() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("--plugin-dir")
        .arg(sandbox.path().join("nope"))
        .args(["plugins", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_run_plugin_success() {
    let sandbox = Sandbox::new();
    sandbox
        .with_bundled_plugins()
        .args(["plugins", "run", "Slab Bridge Design"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bending_moment_kNm=360"))
        .stdout(predicate::str::contains("EXITED_OK"));

    assert!(sandbox
        .log_contents()
        .contains("[PLUGIN-SANDBOX] Slab Bridge Design: EXITED_OK Exited safely"));
}

#[test]
fn test_faulty_plugin_is_contained() {
    let sandbox = Sandbox::new();
    sandbox
        .with_bundled_plugins()
        .args(["plugins", "run", "Faulty Test Plugin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EXITED_ERROR"))
        .stdout(predicate::str::contains("Exited safely"))
        .stderr(predicate::str::contains("intentional crash for testing sandbox protection"));

    assert!(sandbox.log_contents().contains("Faulty Test Plugin: EXITED_ERROR"));
}

#[test]
fn test_slow_plugin_times_out() {
    let sandbox = Sandbox::new();
    let started = Instant::now();

    let assert = sandbox
        .with_bundled_plugins()
        .args(["plugins", "run", "Slow Plugin", "--timeout", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TIMED_OUT"))
        .stdout(predicate::str::contains("Terminated (timeout)"));

    assert!(started.elapsed() < Duration::from_secs(15));
    assert!(sandbox.log_contents().contains("Slow Plugin: TIMED_OUT Terminated (timeout)"));

    let pid = child_pid(&assert.get_output().stdout);
    #[cfg(target_os = "linux")]
    assert!(exited(pid), "sandbox child {} still running", pid);
    #[cfg(not(target_os = "linux"))]
    let _ = pid;
}

#[cfg(target_os = "linux")]
#[test]
fn test_timed_out_command_plugin_leaves_nothing_running() {
    let sandbox = Sandbox::new();
    let plugin_dir = sandbox.path().join("plugins");
    let pid_file = sandbox.path().join("worker.pid");
    fs::create_dir(&plugin_dir).unwrap();
    fs::write(
        plugin_dir.join("long_command.toml"),
        format!(
            "[[plugin]]\nname = \"Long Command\"\n\n[plugin.run]\nkind = \"command\"\nprogram = \"sh\"\n\
             args = [\"-c\", \"echo $$ > '{}'; exec sleep 4242\"]\n",
            pid_file.display()
        ),
    )
    .unwrap();

    let assert = sandbox
        .cmd()
        .arg("--plugin-dir")
        .arg(&plugin_dir)
        .args(["plugins", "run", "Long Command", "--timeout", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TIMED_OUT"));

    let child = child_pid(&assert.get_output().stdout);
    let worker: u32 = fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert_ne!(child, worker);
    assert!(exited(child), "sandbox child {} still running", child);
    assert!(exited(worker), "plugin program {} outlived the deadline", worker);
}

#[test]
fn test_run_unknown_plugin() {
    Sandbox::new()
        .with_bundled_plugins()
        .args(["plugins", "run", "No Such Plugin"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("PLUGIN_NOT_FOUND"));
}

#[test]
fn test_new_plugin_refuses_duplicate() {
    let sandbox = Sandbox::new();
    let plugin_dir = sandbox.path().join("my_plugins");

    sandbox
        .cmd()
        .arg("--plugin-dir")
        .arg(&plugin_dir)
        .args(["plugins", "new", "Arch Bridge"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arch_bridge.toml"));

    sandbox
        .cmd()
        .arg("--plugin-dir")
        .arg(&plugin_dir)
        .args(["plugins", "new", "Arch Bridge"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("DUPLICATE_PLUGIN"));

    sandbox
        .cmd()
        .arg("--plugin-dir")
        .arg(&plugin_dir)
        .args(["plugins", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Arch Bridge\t1.0.0\tBridge_GAD Auto Generator"));
}

#[test]
fn test_registry_rebuild_and_show() {
    let sandbox = Sandbox::new();

    sandbox
        .with_bundled_plugins()
        .args(["plugins", "registry", "rebuild"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registry updated with 5 plugin(s)"));

    let json = fs::read_to_string(sandbox.path().join("registry.json")).unwrap();
    assert!(json.contains("  \"PSC Girder Design\": {"));

    sandbox
        .cmd()
        .args(["plugins", "registry", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"author\": \"Er. Rajkumar Singh Chauhan\""));
}

#[test]
fn test_check_updates_offline() {
    let sandbox = Sandbox::new();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/releases/latest", listener.local_addr().unwrap());
    drop(listener);

    sandbox
        .cmd()
        .args(["config", "set", "updates.url", &url])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["plugins", "check-updates"])
        .assert()
        .success()
        .stdout("Unable to check for updates.\n");
}

#[test]
fn test_config_set_and_show() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["config", "set", "sandbox.deadline_secs", "60"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deadline_secs = 60.0"))
        .stdout(predicate::str::contains("registry.json"));
}

#[test]
fn test_config_set_rejects_bad_value() {
    let sandbox = Sandbox::new();
    let before = fs::read_to_string(sandbox.path().join("config.toml")).unwrap();

    sandbox
        .cmd()
        .args(["config", "set", "sandbox.deadline_secs", "soon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("CONFIG_ERROR"));

    assert_eq!(fs::read_to_string(sandbox.path().join("config.toml")).unwrap(), before);
}

#[test]
fn test_logs_export_after_plugin_run() {
    let sandbox = Sandbox::new();
    sandbox
        .with_bundled_plugins()
        .args(["plugins", "run", "Slab Bridge Design"])
        .assert()
        .success();

    let archive = sandbox.path().join("support").join("diagnostics.zip");
    sandbox
        .cmd()
        .args(["logs", "export", "--out"])
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 log file(s)"));

    let bytes = fs::read(&archive).unwrap();
    assert!(bytes.starts_with(b"PK"));
}
