//! Termination signal handling
//!
//! SIGTERM and SIGINT run the same idempotent broadcast the main loop uses
//! when a child dies. The handler touches nothing but the process-wide
//! [`SLOTS`] record and `kill(2)`: no allocation, no locks, no logging.

use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, kill, sigaction};

use super::slots::ChildSlots;
use crate::error::{Result, SlimError};

/// The pre-allocated child table reachable from the signal handler
pub static SLOTS: ChildSlots = ChildSlots::new();

/// Signals that initiate group shutdown
pub const SHUTDOWN_SIGNALS: [Signal; 2] = [Signal::SIGTERM, Signal::SIGINT];

extern "C" fn on_shutdown_signal(_sig: libc::c_int) {
    SLOTS.broadcast_shutdown(|_, pid| {
        let _ = kill(pid, Signal::SIGTERM);
    });
}

/// Install the shutdown handler for SIGTERM and SIGINT.
///
/// No `SA_RESTART`: a blocked `wait(2)` returns `EINTR` so the main loop
/// notices the shutdown.
pub fn install_shutdown_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_shutdown_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for sig in SHUTDOWN_SIGNALS {
        // SAFETY: the handler only performs atomic operations on a static
        // and calls kill(2), both async-signal-safe.
        unsafe { sigaction(sig, &action) }.map_err(SlimError::Signal)?;
    }
    Ok(())
}
