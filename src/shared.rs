//! # Interrupt-Shared State
//!
//! [`IsrShared`] pairs a value with the ceiling that covers the interrupt
//! producing it, so the ceiling is chosen once, at the declaration, rather
//! than at every access.
//!
//! ```text
//!   producer ISR (P2)                       main loop
//!   ─────────────────                       ─────────
//!   RC_DATA.isr_access(|rc| decode(rc))     RC_DATA.lock(|rc| *rc)
//!     no block: already at P2                 AtomicBlock at the declared
//!                                             ceiling, full fences
//! ```
//!
//! A borrow flag catches the two ways the ceiling discipline can be broken
//! at runtime: locking the same value twice from one context
//! ([`Error::Reentrant`]) and an interrupt reaching a value the main context
//! holds, which means the declared ceiling does not cover that interrupt
//! ([`Error::Busy`]).

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::arch::{self, Fence, PriorityMask};
use crate::error::{Error, Result};
use crate::priority::Ceiling;
use crate::sync::AtomicBlock;

/// Value shared between interrupt and normal context.
pub struct IsrShared<T> {
    ceiling: Ceiling,
    borrowed: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: every access either runs in an AtomicBlock at `ceiling` or in the
// producing interrupt (which that block holds off), and the borrow flag
// rejects overlapping accesses.
unsafe impl<T: Send> Sync for IsrShared<T> {}

impl<T> IsrShared<T> {
    /// Declare a shared value protected by `ceiling`.
    ///
    /// `ceiling` must mask every interrupt that accesses the value.
    pub const fn new(ceiling: Ceiling, value: T) -> Self {
        Self {
            ceiling,
            borrowed: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Ceiling entered by [`IsrShared::lock`].
    #[inline]
    pub fn ceiling(&self) -> Ceiling {
        self.ceiling
    }

    /// Access the value from normal context on the executing core.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.lock_on(arch::target(), f)
    }

    /// Access the value inside an atomic block on `port`.
    pub fn lock_on<P, R>(&self, port: &P, f: impl FnOnce(&mut T) -> R) -> Result<R>
    where
        P: PriorityMask + ?Sized,
    {
        let _block = AtomicBlock::enter(port, self.ceiling, Fence::Full);
        self.with_borrow(f).map_err(|_| {
            log::warn!("re-entrant lock at {}", self.ceiling);
            Error::Reentrant
        })
    }

    /// Access the value from the interrupt handler that produces it.
    ///
    /// # Safety
    /// Must only be called from an interrupt whose priority is masked by
    /// [`IsrShared::ceiling`], so normal-context accesses cannot interleave.
    pub unsafe fn isr_access<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.with_borrow(f).map_err(|_| {
            log::warn!("interrupt not covered by ceiling {}", self.ceiling);
            Error::Busy
        })
    }

    /// Consume the cell and return the value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Exclusive access through `&mut self`; no block needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    fn with_borrow<R>(&self, f: impl FnOnce(&mut T) -> R) -> core::result::Result<R, ()> {
        if self.borrowed.swap(true, Ordering::Acquire) {
            return Err(());
        }
        let _release = BorrowRelease(&self.borrowed);
        // SAFETY: the flag was clear, so no other reference to the value
        // exists; it stays set until `_release` drops.
        Ok(f(unsafe { &mut *self.value.get() }))
    }
}

/// Clears the borrow flag on every exit from the accessor, unwinding included.
struct BorrowRelease<'a>(&'a AtomicBool);

impl Drop for BorrowRelease<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Copy> IsrShared<T> {
    /// Copy the value out under the ceiling.
    pub fn read(&self) -> Result<T> {
        self.lock(|value| *value)
    }

    /// Replace the value under the ceiling.
    pub fn write(&self, value: T) -> Result<()> {
        self.lock(|slot| *slot = value)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
