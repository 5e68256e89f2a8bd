//! # Cortex-M4 Port Layer
//!
//! BASEPRI-backed [`PriorityMask`] for ARMv7E-M cores, plus the NVIC/SCB
//! priority configuration the firmware needs at startup.
//!
//! ## Register Semantics
//!
//! - `MSR BASEPRI, r`: unconditional write. Used to restore a saved ceiling.
//! - `MSR BASEPRI_MAX, r`: the core writes `r` only if it is non-zero and
//!   either BASEPRI is zero or `r` is numerically lower. This is exactly the
//!   conditional raise, in a single instruction that an interrupt cannot split.
//!
//! The `cortex-m` register accessors are declared `nomem`, so without a
//! [`Fence::Full`] the compiler is free to move memory accesses across them.
//! That is the non-barrier variant. A full fence brackets the write with
//! [`Fence::apply`] (a compiler fence plus `fence(SeqCst)`, which lowers to
//! `dmb`) and adds an `isb` after it so the new mask is in force at the
//! next instruction.

use cortex_m::asm;
use cortex_m::peripheral::scb::SystemHandler;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::register::{basepri, basepri_max};

use super::{Fence, PriorityMask};
use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};
use crate::priority::{Ceiling, Priority};

// ---------------------------------------------------------------------------
// BASEPRI port
// ---------------------------------------------------------------------------

/// The BASEPRI register of the executing core.
#[derive(Debug, Clone, Copy, Default)]
pub struct Basepri;

impl Basepri {
    #[inline(always)]
    fn before(fence: Fence) {
        fence.apply();
    }

    #[inline(always)]
    fn after(fence: Fence) {
        if fence == Fence::Full {
            asm::isb();
        }
        fence.apply();
    }
}

// SAFETY: BASEPRI is banked per core and restored by hardware on exception
// return, so reads always reflect the current context's mask.
unsafe impl PriorityMask for Basepri {
    #[inline(always)]
    fn ceiling(&self) -> Ceiling {
        Ceiling::from_raw(basepri::read())
    }

    #[inline(always)]
    unsafe fn set_ceiling(&self, ceiling: Ceiling, fence: Fence) {
        Self::before(fence);
        // SAFETY: forwarded to the caller.
        unsafe { basepri::write(ceiling.raw()) };
        Self::after(fence);
    }

    #[inline(always)]
    fn raise_ceiling(&self, ceiling: Ceiling, fence: Fence) {
        Self::before(fence);
        basepri_max::write(ceiling.raw());
        Self::after(fence);
    }
}

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

/// Configure the SysTick timer to fire at `TICK_HZ` from the core clock.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

/// Set the urgency of a system exception (SysTick, PendSV, ...).
///
/// Must run before the exception's shared data is first locked: a ceiling
/// only protects data from handlers whose configured priority it covers.
pub fn set_exception_priority(
    scb: &mut cortex_m::peripheral::SCB,
    handler: SystemHandler,
    priority: Priority,
) {
    // SAFETY: called during startup, before any ceiling derived from this
    // handler's priority is in use.
    unsafe { scb.set_priority(handler, priority.to_nvic()) };
}
