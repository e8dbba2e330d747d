//! Supervisor integration tests
//!
//! Runs the real `cgit-slim init` binary against throwaway service tables
//! built from /bin/sh.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tempfile::TempDir;

const LONG_RUNNING: &str = "exec sleep 30";

fn service(script: &str) -> String {
    format!("    path: /bin/sh\n    args: [\"-c\", \"{}\"]\n", script)
}

fn write_config(dir: &Path, fcgi: &str, sync: &str, web: &str) -> PathBuf {
    let path = dir.join("cgit-slim.yml");
    let yaml = format!(
        "services:\n  fcgi:\n{}  sync:\n{}  web:\n{}",
        service(fcgi),
        service(sync),
        service(web)
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn init_command(config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cgit-slim"));
    cmd.args(["init", "-c"]).arg(config).env("RUST_LOG", "info");
    cmd
}

#[test]
fn test_failing_child_shuts_down_group() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), LONG_RUNNING, "exit 3", LONG_RUNNING);

    let started = Instant::now();
    let output = init_command(&config).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("Critical process"), "stderr: {}", stderr);
    assert!(stderr.contains("(sync) exited with exit status 3"), "stderr: {}", stderr);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_clean_child_exit_also_shuts_down_group() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), LONG_RUNNING, LONG_RUNNING, "exit 0");

    let started = Instant::now();
    let output = init_command(&config).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr);
    assert!(stderr.contains("(web) exited with exit status 0"), "stderr: {}", stderr);
    assert!(stderr.contains("Terminating sync"), "stderr: {}", stderr);
    assert!(stderr.contains("Terminating fcgi"), "stderr: {}", stderr);
    assert!(!stderr.contains("Terminating web"), "stderr: {}", stderr);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[test]
fn test_missing_executable_exits_with_status_one() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cgit-slim.yml");
    std::fs::write(
        &path,
        format!(
            "services:\n  fcgi:\n{}  sync:\n    path: /nonexistent/mirror-sync\n",
            service(LONG_RUNNING)
        ),
    )
    .unwrap();

    let output = init_command(&path).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("Failed to spawn sync service"), "stderr: {}", stderr);
}

#[test]
fn test_sigterm_is_forwarded_to_children() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), LONG_RUNNING, LONG_RUNNING, LONG_RUNNING);

    let started = Instant::now();
    let mut child = init_command(&config)
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let mut stderr = BufReader::new(child.stderr.take().unwrap());

    // Handlers are installed before the first spawn, so once the last
    // service is up SIGTERM is handled.
    let mut seen = String::new();
    loop {
        let mut line = String::new();
        if stderr.read_line(&mut line).unwrap() == 0 {
            panic!("supervisor exited early: {}", seen);
        }
        seen.push_str(&line);
        if line.contains("Started web service") {
            break;
        }
    }

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    let status = child.wait().unwrap();
    stderr.read_to_string(&mut seen).unwrap();

    assert!(status.success(), "stderr: {}", seen);
    assert!(seen.contains("Termination signal received"), "stderr: {}", seen);
    assert!(started.elapsed() < Duration::from_secs(20));
}
