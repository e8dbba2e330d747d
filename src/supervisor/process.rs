//! OS process seam for the supervisor
//!
//! `ProcessControl` isolates the three primitives the supervisor needs
//! (spawn, generic wait, terminate) so the state machine can be driven
//! by a scripted fake in tests.

use std::fmt;
use std::process::Command;

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitStatus, wait};
use nix::unistd::Pid;

use super::service::{Role, ServiceSpec};
use crate::error::{Result, SlimError};

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStatus {
    /// Exited normally with a status code
    Code(i32),
    /// Killed by a signal
    Signaled(Signal),
}

impl ChildStatus {
    pub fn success(&self) -> bool {
        matches!(self, ChildStatus::Code(0))
    }
}

impl fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildStatus::Code(code) => write!(f, "exit status {}", code),
            ChildStatus::Signaled(sig) => write!(f, "signal {}", sig),
        }
    }
}

/// Result of one generic wait for any child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitEvent {
    /// A child terminated and has been reaped
    Exited { pid: Pid, status: ChildStatus },
    /// The wait was interrupted by a signal (or reported a non-terminal
    /// state change) and may be retried
    Interrupted,
    /// No children remain
    NoChildren,
}

/// Process primitives used by the supervisor
pub trait ProcessControl {
    /// Launch a service and return its pid. Fails if the executable cannot
    /// be started.
    fn spawn(&mut self, role: Role, spec: &ServiceSpec) -> Result<Pid>;

    /// Block until any child changes state
    fn wait_any(&mut self) -> Result<WaitEvent>;

    /// Send a termination signal. Must be a no-op for a pid that is already
    /// gone.
    fn terminate(&mut self, role: Role, pid: Pid);
}

/// Real processes: fork/exec via `std::process::Command`, reaping via
/// `wait(2)`, termination via `kill(2)`.
#[derive(Debug, Default)]
pub struct OsProcesses;

impl OsProcesses {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for OsProcesses {
    fn spawn(&mut self, role: Role, spec: &ServiceSpec) -> Result<Pid> {
        // Command reports exec failures from the child back to the parent,
        // so a missing or non-executable binary surfaces here.
        let child = Command::new(&spec.path)
            .args(&spec.args)
            .spawn()
            .map_err(|source| SlimError::Spawn {
                role,
                path: spec.path.clone(),
                source,
            })?;
        // The Child handle is dropped without waiting; reaping goes through
        // the generic wait.
        Ok(Pid::from_raw(child.id() as i32))
    }

    fn wait_any(&mut self) -> Result<WaitEvent> {
        match wait() {
            Ok(WaitStatus::Exited(pid, code)) => Ok(WaitEvent::Exited {
                pid,
                status: ChildStatus::Code(code),
            }),
            Ok(WaitStatus::Signaled(pid, sig, _)) => Ok(WaitEvent::Exited {
                pid,
                status: ChildStatus::Signaled(sig),
            }),
            Ok(_) => Ok(WaitEvent::Interrupted),
            Err(Errno::EINTR) => Ok(WaitEvent::Interrupted),
            Err(Errno::ECHILD) => Ok(WaitEvent::NoChildren),
            Err(e) => Err(SlimError::Wait(e)),
        }
    }

    fn terminate(&mut self, role: Role, pid: Pid) {
        if let Err(e) = kill(pid, Signal::SIGTERM) {
            debug!("SIGTERM to {} ({}) not delivered: {}", pid, role, e);
        }
    }
}
