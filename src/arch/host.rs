//! # Simulated BASEPRI
//!
//! Register model used on host builds and in tests. It follows the Cortex-M
//! masking rules exactly, counts every raise, restore, and full fence, and
//! can simulate an interrupt request arriving while a ceiling is in effect.
//! Simulated handlers also carry an execution priority, so a request only
//! preempts a running handler when it is strictly more urgent.
//!
//! Each instance is an independent register, so tests create their own
//! instead of sharing the global [`target()`](super::target).

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use super::{Fence, PriorityMask};
use crate::config::PRIORITY_LEVELS;
use crate::priority::{Ceiling, Priority};

/// Execution priority of thread mode: below every configurable level.
const THREAD_MODE: u8 = PRIORITY_LEVELS;

/// Host-side stand-in for the BASEPRI register.
#[derive(Debug)]
pub struct SimulatedBasepri {
    raw: AtomicU8,
    running: AtomicU8,
    raises: AtomicU32,
    restores: AtomicU32,
    full_fences: AtomicU32,
}

impl SimulatedBasepri {
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(0),
            running: AtomicU8::new(THREAD_MODE),
            raises: AtomicU32::new(0),
            restores: AtomicU32::new(0),
            full_fences: AtomicU32::new(0),
        }
    }

    /// Number of conditional-raise requests, whether or not they wrote.
    pub fn raises(&self) -> u32 {
        self.raises.load(Ordering::Relaxed)
    }

    /// Number of unconditional writes.
    pub fn restores(&self) -> u32 {
        self.restores.load(Ordering::Relaxed)
    }

    /// Number of ceiling operations performed with [`Fence::Full`].
    pub fn full_fences(&self) -> u32 {
        self.full_fences.load(Ordering::Relaxed)
    }

    /// Priority of the simulated handler currently executing, or `None` in
    /// thread mode.
    pub fn running(&self) -> Option<Priority> {
        Priority::new(self.running.load(Ordering::Relaxed)).ok()
    }

    /// Simulate an interrupt request at `priority`.
    ///
    /// The handler runs immediately unless the current ceiling masks it or
    /// the running handler is at least as urgent, in which case the request
    /// stays pending and `None` is returned. As on hardware, the handler sees
    /// the interrupted context's BASEPRI, and any change it makes is undone
    /// on return.
    pub fn interrupt<R>(&self, priority: Priority, isr: impl FnOnce() -> R) -> Option<R> {
        let ceiling = self.ceiling();
        if ceiling.masks(priority) {
            log::trace!("{} pending, masked by {}", priority, ceiling);
            return None;
        }
        let running = self.running.load(Ordering::Relaxed);
        if priority.level() >= running {
            log::trace!("{} pending, P{} running", priority, running);
            return None;
        }
        self.running.store(priority.level(), Ordering::Relaxed);
        let result = isr();
        self.running.store(running, Ordering::Relaxed);
        self.raw.store(ceiling.raw(), Ordering::Relaxed);
        Some(result)
    }

    fn record(&self, fence: Fence) {
        if fence == Fence::Full {
            self.full_fences.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for SimulatedBasepri {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: the simulated register is the only masking state on the host.
unsafe impl PriorityMask for SimulatedBasepri {
    fn ceiling(&self) -> Ceiling {
        Ceiling::from_raw(self.raw.load(Ordering::Relaxed))
    }

    unsafe fn set_ceiling(&self, ceiling: Ceiling, fence: Fence) {
        fence.apply();
        self.raw.store(ceiling.raw(), Ordering::Relaxed);
        self.restores.fetch_add(1, Ordering::Relaxed);
        self.record(fence);
        fence.apply();
        log::trace!("BASEPRI <- {}", ceiling);
    }

    fn raise_ceiling(&self, ceiling: Ceiling, fence: Fence) {
        fence.apply();
        self.raises.fetch_add(1, Ordering::Relaxed);
        self.record(fence);
        // Same rule BASEPRI_MAX applies in hardware
        let _ = self.raw.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |raw| {
            let current = Ceiling::from_raw(raw);
            (!ceiling.is_disabled() && ceiling.is_at_least_as_restrictive_as(current))
                .then_some(ceiling.raw())
        });
        fence.apply();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
