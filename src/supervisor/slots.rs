//! Lock-free child table shared with the signal handler
//!
//! `ChildSlots` holds one pid per role plus the "shutdown already initiated"
//! flag. Every operation is a plain atomic load, store, swap or
//! compare-exchange, so it is safe to call from an asynchronous signal
//! handler as well as from the main loop.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use nix::unistd::Pid;

use super::service::Role;

/// Marker for a slot with no live process
const UNSET: i32 = -1;

/// Fixed-size pid table for the supervised roles
#[derive(Debug)]
pub struct ChildSlots {
    pids: [AtomicI32; Role::COUNT],
    shutdown: AtomicBool,
}

impl Default for ChildSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildSlots {
    /// Create an empty table. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            pids: [const { AtomicI32::new(UNSET) }; Role::COUNT],
            shutdown: AtomicBool::new(false),
        }
    }

    /// Record the live pid for a role
    pub fn publish(&self, role: Role, pid: Pid) {
        self.pids[role.index()].store(pid.as_raw(), Ordering::SeqCst);
    }

    /// Live pid for a role, if any
    pub fn pid(&self, role: Role) -> Option<Pid> {
        let raw = self.pids[role.index()].load(Ordering::SeqCst);
        (raw > 0).then(|| Pid::from_raw(raw))
    }

    /// Remove a reaped pid from the table and return the role it held.
    ///
    /// Once cleared, the pid is never signalled again even if the kernel
    /// recycles it.
    pub fn clear(&self, pid: Pid) -> Option<Role> {
        Role::START_ORDER.into_iter().find(|role| {
            self.pids[role.index()]
                .compare_exchange(pid.as_raw(), UNSET, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        })
    }

    /// Number of roles with a live pid
    pub fn live(&self) -> usize {
        Role::START_ORDER
            .into_iter()
            .filter(|role| self.pid(*role).is_some())
            .count()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Initiate group shutdown: call `send` for each live child in
    /// [`Role::SHUTDOWN_ORDER`].
    ///
    /// Only the first caller broadcasts; every later call is a no-op and
    /// returns `false`. Unset slots are skipped.
    pub fn broadcast_shutdown<F>(&self, mut send: F) -> bool
    where
        F: FnMut(Role, Pid),
    {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return false;
        }
        for role in Role::SHUTDOWN_ORDER {
            if let Some(pid) = self.pid(role) {
                send(role, pid);
            }
        }
        true
    }
}
