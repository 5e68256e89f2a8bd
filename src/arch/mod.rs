//! # Architecture Abstraction Layer
//!
//! The only code in the crate that touches the interrupt-masking hardware.
//! Each supported target supplies one [`PriorityMask`] implementation; the
//! build selects it as [`Target`] and exposes a shared instance through
//! [`target()`].
//!
//! | Target | Port |
//! |--------|------|
//! | `thumbv7m`, `thumbv7em`, `thumbv8m.main` (cores with BASEPRI) | [`cortex_m4::Basepri`] |
//! | other bare-metal ARM (`thumbv6m`, `thumbv8m.base`) | rejected at compile time |
//! | anything else (host builds, tests) | [`host::SimulatedBasepri`] |

use core::sync::atomic::{self, Ordering};

use crate::priority::Ceiling;

#[cfg(basepri)]
pub mod cortex_m4;
pub mod host;

#[cfg(all(target_arch = "arm", target_os = "none", not(basepri)))]
compile_error!(concat!(
    "this core has no BASEPRI register; ",
    "priority-ceiling blocks need ARMv7-M or ARMv8-M Mainline"
));

// ---------------------------------------------------------------------------
// Memory ordering strength
// ---------------------------------------------------------------------------

/// Ordering strength applied around a ceiling write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fence {
    /// No memory access may be reordered across the write, in either
    /// direction, by the compiler or the core.
    Full,
    /// No ordering beyond the register write itself. Memory touched inside
    /// the masked region must be protected by the caller.
    Elided,
}

impl Fence {
    /// Emit the fence. `Fence::Elided` compiles to nothing.
    #[inline(always)]
    pub fn apply(self) {
        if self == Fence::Full {
            atomic::compiler_fence(Ordering::SeqCst);
            atomic::fence(Ordering::SeqCst);
        }
    }
}

// ---------------------------------------------------------------------------
// Port interface
// ---------------------------------------------------------------------------

/// Access to the processor's interrupt-priority masking threshold.
///
/// # Safety
/// Implementations must reflect the real masking state of the executing
/// core: after `set_ceiling(c, _)` returns, interrupts masked by `c` must not
/// preempt the caller, and `ceiling()` must return the value last written
/// by the current context or restored by a returning interrupt handler.
/// Guards rely on this to hand out exclusive access to shared data.
pub unsafe trait PriorityMask {
    /// Current masking threshold.
    fn ceiling(&self) -> Ceiling;

    /// Unconditionally write the masking threshold.
    ///
    /// # Safety
    /// Lowering the ceiling re-enables interrupts an enclosing
    /// [`AtomicBlock`](crate::sync::AtomicBlock) relies on being masked. Only
    /// restore a value previously observed by the same context.
    unsafe fn set_ceiling(&self, ceiling: Ceiling, fence: Fence);

    /// Write `ceiling` only if it is at least as restrictive as the ceiling
    /// in effect. Never weakens masking. The fence is applied whether or not
    /// the write happens.
    fn raise_ceiling(&self, ceiling: Ceiling, fence: Fence) {
        if ceiling.is_disabled() || !ceiling.is_at_least_as_restrictive_as(self.ceiling()) {
            fence.apply();
            return;
        }
        // SAFETY: the new value masks at least everything already masked.
        unsafe { self.set_ceiling(ceiling, fence) }
    }
}

// ---------------------------------------------------------------------------
// Build-time target selection
// ---------------------------------------------------------------------------

/// Port backing the free functions and guard constructors of this crate.
#[cfg(basepri)]
pub type Target = cortex_m4::Basepri;

/// Port backing the free functions and guard constructors of this crate.
#[cfg(not(basepri))]
pub type Target = host::SimulatedBasepri;

#[cfg(basepri)]
static TARGET: Target = cortex_m4::Basepri;

#[cfg(not(basepri))]
static TARGET: Target = host::SimulatedBasepri::new();

/// The port for the executing core.
#[inline(always)]
pub fn target() -> &'static Target {
    &TARGET
}
