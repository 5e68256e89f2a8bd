//! # Configuration Edit Snapshots
//!
//! Menu-style editors change configuration one keystroke at a time while
//! the control loop keeps reading it. Instead of locking on every
//! keystroke, an editor takes a [`Snapshot`] when the page opens, edits only
//! the working copy, and commits it back as one value when the page closes.
//! Concurrent access is bounded to those two instants.
//!
//! ```text
//!  page enter           keystrokes              page exit
//!  ──────────           ──────────              ─────────
//!  take()  ─ lock ─►    working copy only       commit() ─ lock ─► live
//! ```
//!
//! Dropping a snapshot without committing discards the edits.

use core::ops::{Deref, DerefMut};

use crate::arch::{self, PriorityMask, Target};
use crate::error::Result;
use crate::shared::IsrShared;

/// Working copy of a shared configuration value.
pub struct Snapshot<'a, T: Copy, P: PriorityMask + ?Sized = Target> {
    live: &'a IsrShared<T>,
    port: &'a P,
    original: T,
    working: T,
}

impl<'a, T: Copy> Snapshot<'a, T> {
    /// Copy `live` on the executing core.
    pub fn take(live: &'a IsrShared<T>) -> Result<Self> {
        Snapshot::take_on(live, arch::target())
    }
}

impl<'a, T: Copy, P: PriorityMask + ?Sized> Snapshot<'a, T, P> {
    /// Copy `live` under its ceiling on `port`.
    pub fn take_on(live: &'a IsrShared<T>, port: &'a P) -> Result<Self> {
        let original = live.lock_on(port, |value| *value)?;
        log::trace!("snapshot taken at {}", live.ceiling());
        Ok(Snapshot {
            live,
            port,
            original,
            working: original,
        })
    }

    /// Value as it was when the snapshot was taken.
    #[inline]
    pub fn original(&self) -> &T {
        &self.original
    }

    #[inline]
    pub fn working(&self) -> &T {
        &self.working
    }

    #[inline]
    pub fn working_mut(&mut self) -> &mut T {
        &mut self.working
    }

    /// Returns `true` if the working copy differs from the original.
    pub fn is_modified(&self) -> bool
    where
        T: PartialEq,
    {
        self.working != self.original
    }

    /// Write the working copy back as a single value.
    ///
    /// Returns `true` if the live value changed. The write is
    /// unconditional, so changes made to the live value after `take` are
    /// overwritten.
    pub fn commit(self) -> Result<bool>
    where
        T: PartialEq,
    {
        let working = self.working;
        let changed = self.live.lock_on(self.port, |live| {
            let changed = *live != working;
            *live = working;
            changed
        })?;
        log::trace!("snapshot committed at {} (changed: {})", self.live.ceiling(), changed);
        Ok(changed)
    }

    /// Drop the edits without touching the live value.
    pub fn discard(self) {
        log::trace!("snapshot discarded at {}", self.live.ceiling());
    }
}

impl<T: Copy, P: PriorityMask + ?Sized> Deref for Snapshot<'_, T, P> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.working
    }
}

impl<T: Copy, P: PriorityMask + ?Sized> DerefMut for Snapshot<'_, T, P> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.working
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
