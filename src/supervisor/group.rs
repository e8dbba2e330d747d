//! Group supervisor - spawn, watch, shut down, reap
//!
//! The supervised services are fate-shared: the first exit of any of them,
//! for any reason, or a termination signal to the supervisor itself, brings
//! the whole group down. Nothing is ever restarted.

use log::{debug, error, info, warn};
use nix::unistd::Pid;

use super::process::{ChildStatus, OsProcesses, ProcessControl, WaitEvent};
use super::service::{Role, ServiceTable};
use super::signals::{SLOTS, install_shutdown_handlers};
use super::slots::ChildSlots;
use crate::error::Result;

/// Supervisor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    ShuttingDown,
    Done,
}

/// What ended the running phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A supervised service exited
    ChildExited { role: Role, pid: Pid, status: ChildStatus },
    /// SIGTERM or SIGINT reached the supervisor
    Signalled,
    /// The generic wait found no children at all
    NoChildren,
}

/// Summary of a completed supervision run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub cause: ShutdownCause,
    /// Children reaped after shutdown began
    pub reaped: usize,
}

/// Supervisor context: the launch table, the child slots and the process
/// primitives, passed explicitly instead of living in globals.
pub struct Supervisor<'a, P: ProcessControl> {
    services: ServiceTable,
    slots: &'a ChildSlots,
    procs: P,
    phase: Phase,
}

impl<'a, P: ProcessControl> Supervisor<'a, P> {
    pub fn new(services: ServiceTable, slots: &'a ChildSlots, procs: P) -> Self {
        Self {
            services,
            slots,
            procs,
            phase: Phase::Starting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn slots(&self) -> &ChildSlots {
        self.slots
    }

    pub fn procs(&self) -> &P {
        &self.procs
    }

    /// Run the group to completion.
    ///
    /// Returns `Err` only when a service cannot be launched (after the
    /// already-started ones have been sent SIGTERM) or when waiting fails.
    pub fn run(&mut self) -> Result<Outcome> {
        self.start()?;
        let cause = self.watch()?;
        self.shutdown();
        let reaped = self.reap()?;
        self.phase = Phase::Done;
        info!("Reaped {} children, exiting", reaped);
        Ok(Outcome { cause, reaped })
    }

    fn start(&mut self) -> Result<()> {
        self.phase = Phase::Starting;
        for role in Role::START_ORDER {
            if self.slots.is_shutting_down() {
                warn!("Shutdown requested during startup, not starting {}", role);
                break;
            }
            let spec = self.services.get(role).clone();
            let pid = match self.procs.spawn(role, &spec) {
                Ok(pid) => pid,
                Err(e) => {
                    error!("{}", e);
                    self.shutdown();
                    return Err(e);
                }
            };
            self.slots.publish(role, pid);
            info!("Started {} service {} as pid {}", role, spec.argv().join(" "), pid);
            // A signal can broadcast between spawn and publish; such a child
            // was not in the table yet and is terminated here instead.
            if self.slots.is_shutting_down() {
                self.procs.terminate(role, pid);
            }
        }
        self.phase = Phase::Running;
        Ok(())
    }

    fn watch(&mut self) -> Result<ShutdownCause> {
        loop {
            match self.procs.wait_any()? {
                WaitEvent::Exited { pid, status } => match self.slots.clear(pid) {
                    Some(role) if self.slots.is_shutting_down() => {
                        info!("Termination signal received. Shutting down.");
                        debug!("{} (pid {}) exited with {}", role, pid, status);
                        return Ok(ShutdownCause::Signalled);
                    }
                    Some(role) => {
                        error!(
                            "Critical process {} ({}) exited with {}. Shutting down.",
                            pid, role, status
                        );
                        return Ok(ShutdownCause::ChildExited { role, pid, status });
                    }
                    None => debug!("Reaped unsupervised process {} ({})", pid, status),
                },
                WaitEvent::Interrupted => {
                    if self.slots.is_shutting_down() {
                        info!("Termination signal received. Shutting down.");
                        return Ok(ShutdownCause::Signalled);
                    }
                }
                WaitEvent::NoChildren => {
                    warn!("No children left to supervise. Shutting down.");
                    return Ok(ShutdownCause::NoChildren);
                }
            }
        }
    }

    /// Broadcast SIGTERM to every live child. Idempotent: a no-op when the
    /// signal handler (or an earlier call) already broadcast.
    fn shutdown(&mut self) {
        self.phase = Phase::ShuttingDown;
        let procs = &mut self.procs;
        let initiated = self.slots.broadcast_shutdown(|role, pid| {
            info!("Terminating {} (pid {})", role, pid);
            procs.terminate(role, pid);
        });
        if !initiated {
            debug!("Shutdown already initiated");
        }
    }

    fn reap(&mut self) -> Result<usize> {
        let mut reaped = 0;
        loop {
            match self.procs.wait_any()? {
                WaitEvent::Exited { pid, status } => {
                    reaped += 1;
                    match self.slots.clear(pid) {
                        Some(role) => debug!("{} (pid {}) exited with {}", role, pid, status),
                        None => debug!("Reaped process {} ({})", pid, status),
                    }
                }
                WaitEvent::Interrupted => {}
                WaitEvent::NoChildren => return Ok(reaped),
            }
        }
    }
}

/// Supervise the real service group: install the signal handlers on the
/// process-wide slots, then spawn, watch and reap.
pub fn supervise(services: ServiceTable) -> Result<Outcome> {
    install_shutdown_handlers()?;
    let mut supervisor = Supervisor::new(services, &SLOTS, OsProcesses::new());
    supervisor.run()
}
