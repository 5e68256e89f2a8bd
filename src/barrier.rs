//! # Named Memory Barriers
//!
//! A [`BarrierScope`] fences exactly one memory location, without touching
//! the interrupt mask and without ordering any other memory:
//!
//! - on entry the location is treated as freshly modified, so every read
//!   inside the scope is fetched from memory;
//! - on every exit the location is treated as read, so pending writes are
//!   committed before control leaves the scope.
//!
//! This is the companion of the non-barrier
//! [`AtomicBlock`](crate::sync::AtomicBlock) variant: mask with
//! `new_nb`, then pin the one variable that actually crosses the boundary.
//!
//! ```ignore
//! let _block = AtomicBlock::new_nb(RX_CEILING);
//! let mut frame = BarrierScope::new(unsafe { &mut *RX_FRAME.get() });
//! frame.sequence += 1;
//! ```
//!
//! Several scopes may live in the same block as long as each binds a
//! different location; they are ordinary locals and end in reverse order.

use core::hint;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

/// Scope-bound memory barrier on a single location.
#[must_use = "the barrier ends as soon as the scope is dropped"]
pub struct BarrierScope<'a, T: ?Sized> {
    target: NonNull<T>,
    _borrow: PhantomData<&'a mut T>,
}

impl<'a, T: ?Sized> BarrierScope<'a, T> {
    /// Open a barrier over `target`.
    #[inline(always)]
    pub fn new(target: &'a mut T) -> Self {
        // The optimizer must assume the pointee escaped and was modified
        let target = hint::black_box(NonNull::from(target));
        BarrierScope {
            target,
            _borrow: PhantomData,
        }
    }

    /// Address of the protected location.
    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.target.as_ptr()
    }
}

impl<T: ?Sized> Deref for BarrierScope<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // SAFETY: `target` comes from a `&'a mut T` held for the scope's
        // lifetime; `black_box` returns its argument unchanged.
        unsafe { self.target.as_ref() }
    }
}

impl<T: ?Sized> DerefMut for BarrierScope<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`; `&mut self` keeps the access exclusive.
        unsafe { self.target.as_mut() }
    }
}

impl<T: ?Sized> Drop for BarrierScope<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        // Writes through `target` must reach memory before the pointer escapes
        hint::black_box(self.target);
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
