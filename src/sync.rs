//! # Atomic Blocks
//!
//! Priority-ceiling critical sections. An [`AtomicBlock`] raises the BASEPRI
//! ceiling when created and restores the value it found when dropped, on
//! every exit path: fall-through, `return`, `?`, `break`, or unwinding.
//!
//! ```text
//!  main loop          ceiling          RX interrupt (P5)
//!  ─────────          ───────          ─────────────────
//!  let _b = new(5) ─► 0 → P5
//!    read buffer                       request pends
//!  drop(_b) ────────► P5 → 0 ────────► handler runs
//! ```
//!
//! ## Nesting
//!
//! Entry uses the conditional raise, so a nested block can only keep or
//! tighten the ceiling. Each block restores exactly the ceiling it observed
//! on entry, which is the enclosing block's level rather than "disabled".
//!
//! ## Barrier and Non-Barrier Variants
//!
//! [`AtomicBlock::new`] / [`atomic_block`] place a full memory fence at entry
//! and exit. [`AtomicBlock::new_nb`] / [`atomic_block_nb`] do not: with LTO
//! the compiler may move loads and stores of shared data outside the masked
//! region unless the caller protects them with a
//! [`BarrierScope`](crate::barrier::BarrierScope), volatile access, or atomics.
//!
//! ## Usage
//! ```ignore
//! use atomic_block::{priority::Ceiling, sync};
//!
//! const RX_CEILING: Ceiling = Ceiling::from_level(5);
//!
//! let copy = sync::atomic_block(RX_CEILING, || unsafe { RC_DATA });
//! ```
//!
//! Keep blocks short: every cycle spent inside adds to the latency of each
//! interrupt the ceiling holds off.

use core::marker::PhantomData;

use crate::arch::{self, Fence, PriorityMask, Target};
use crate::priority::Ceiling;

// ---------------------------------------------------------------------------
// Register access
// ---------------------------------------------------------------------------

/// Current BASEPRI ceiling of the executing core.
#[inline(always)]
pub fn get_ceiling() -> Ceiling {
    arch::target().ceiling()
}

/// Unconditionally write the ceiling of the executing core.
///
/// # Safety
/// See [`PriorityMask::set_ceiling`]. Lowering the ceiling inside an
/// [`AtomicBlock`] breaks the block's exclusion.
#[inline(always)]
pub unsafe fn set_ceiling(ceiling: Ceiling, fence: Fence) {
    // SAFETY: forwarded to the caller.
    unsafe { arch::target().set_ceiling(ceiling, fence) }
}

/// Raise the ceiling of the executing core to `ceiling` unless masking is
/// already at least that restrictive.
#[inline(always)]
pub fn raise_ceiling(ceiling: Ceiling, fence: Fence) {
    arch::target().raise_ceiling(ceiling, fence)
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Scope-bound priority-ceiling critical section.
///
/// Not `Send` or `Sync`: a block belongs to the context that entered it.
#[must_use = "the ceiling is restored as soon as the block is dropped"]
pub struct AtomicBlock<'p, P: PriorityMask + ?Sized = Target> {
    port: &'p P,
    saved: Ceiling,
    fence: Fence,
    _not_send: PhantomData<*const ()>,
}

impl AtomicBlock<'static> {
    /// Enter a block on the executing core with full memory barriers.
    #[inline(always)]
    pub fn new(ceiling: Ceiling) -> Self {
        AtomicBlock::enter(arch::target(), ceiling, Fence::Full)
    }

    /// Enter a block on the executing core without memory barriers.
    ///
    /// The caller must protect every shared location touched inside the
    /// block (see the module docs); the ceiling change alone does not stop
    /// the optimizer from moving accesses across it.
    #[inline(always)]
    pub fn new_nb(ceiling: Ceiling) -> Self {
        AtomicBlock::enter(arch::target(), ceiling, Fence::Elided)
    }
}

impl<'p, P: PriorityMask + ?Sized> AtomicBlock<'p, P> {
    /// Enter a block on an explicit port.
    #[inline(always)]
    pub fn enter(port: &'p P, ceiling: Ceiling, fence: Fence) -> Self {
        let saved = port.ceiling();
        port.raise_ceiling(ceiling, fence);
        AtomicBlock {
            port,
            saved,
            fence,
            _not_send: PhantomData,
        }
    }

    /// Ceiling that will be restored when the block ends.
    #[inline]
    pub fn saved_ceiling(&self) -> Ceiling {
        self.saved
    }

    #[inline]
    pub fn fence(&self) -> Fence {
        self.fence
    }
}

impl<P: PriorityMask + ?Sized> Drop for AtomicBlock<'_, P> {
    #[inline(always)]
    fn drop(&mut self) {
        // SAFETY: `saved` was read by this context on entry; every block
        // nested inside this one has already been dropped.
        unsafe { self.port.set_ceiling(self.saved, self.fence) };
    }
}

// ---------------------------------------------------------------------------
// Closure forms
// ---------------------------------------------------------------------------

/// Run `f` inside a barrier [`AtomicBlock`] at `ceiling`.
#[inline(always)]
pub fn atomic_block<R>(ceiling: Ceiling, f: impl FnOnce() -> R) -> R {
    let _block = AtomicBlock::new(ceiling);
    f()
}

/// Run `f` inside a non-barrier [`AtomicBlock`] at `ceiling`.
///
/// The caller is responsible for the ordering of every shared access in `f`.
#[inline(always)]
pub fn atomic_block_nb<R>(ceiling: Ceiling, f: impl FnOnce() -> R) -> R {
    let _block = AtomicBlock::new_nb(ceiling);
    f()
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::host::SimulatedBasepri;
    use crate::priority::Priority;

    const P5: Ceiling = Ceiling::from_level(5);
    const P8: Ceiling = Ceiling::from_level(8);

    #[test]
    fn test_enter_and_exit_from_disabled() {
        let port = SimulatedBasepri::new();
        {
            let block = AtomicBlock::enter(&port, P5, Fence::Full);
            assert_eq!(port.ceiling(), P5);
            assert_eq!(port.ceiling().level(), Some(5));
            assert_eq!(block.saved_ceiling(), Ceiling::DISABLED);
        }
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
    }

    #[test]
    fn test_nested_looser_request_does_not_weaken() {
        let port = SimulatedBasepri::new();
        {
            let _outer = AtomicBlock::enter(&port, P5, Fence::Full);
            {
                let inner = AtomicBlock::enter(&port, P8, Fence::Full);
                assert_eq!(port.ceiling(), P5, "Looser nested request must not weaken");
                assert_eq!(inner.saved_ceiling(), P5);
            }
            assert_eq!(port.ceiling(), P5);
        }
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
    }

    #[test]
    fn test_nested_tighter_request_restores_outer() {
        let port = SimulatedBasepri::new();
        let _outer = AtomicBlock::enter(&port, P8, Fence::Full);
        {
            let _inner = AtomicBlock::enter(&port, P5, Fence::Full);
            assert_eq!(port.ceiling(), P5);
        }
        assert_eq!(port.ceiling(), P8, "Inner exit must restore the outer level, not disabled");
    }

    #[test]
    fn test_every_nesting_order_restores_entry_ceiling() {
        let levels = [3u8, 5, 8, 11];
        let mut order = levels;

        // Heap's algorithm, iterative form
        let mut c = [0usize; 4];
        let mut permutations = 0;
        let check = |order: &[u8; 4]| {
            for initial in [Ceiling::DISABLED, Ceiling::from_level(6)] {
                let port = SimulatedBasepri::new();
                unsafe { port.set_ceiling(initial, Fence::Elided) };

                fn nest(port: &SimulatedBasepri, rest: &[u8], expected: Ceiling) {
                    let Some((&level, rest)) = rest.split_first() else {
                        return;
                    };
                    let before = port.ceiling();
                    let block = AtomicBlock::enter(port, Ceiling::from_level(level), Fence::Full);
                    let expected = expected.tighter(Ceiling::from_level(level));
                    assert_eq!(port.ceiling(), expected);
                    nest(port, rest, expected);
                    drop(block);
                    assert_eq!(port.ceiling(), before);
                }

                nest(&port, order, initial);
                assert_eq!(port.ceiling(), initial, "Order {:?} leaked a ceiling", order);
                assert_eq!(port.raises(), 4);
                assert_eq!(port.restores(), 5);
            }
        };

        check(&order);
        permutations += 1;
        let mut i = 0;
        while i < order.len() {
            if c[i] < i {
                let swap = if i % 2 == 0 { 0 } else { c[i] };
                order.swap(swap, i);
                check(&order);
                permutations += 1;
                c[i] += 1;
                i = 0;
            } else {
                c[i] = 0;
                i += 1;
            }
        }
        assert_eq!(permutations, 24);
    }

    fn early_exit(port: &SimulatedBasepri, bail: bool) -> Option<u32> {
        let _block = AtomicBlock::enter(port, P5, Fence::Full);
        if bail {
            return None;
        }
        let value: Option<u32> = None;
        let v = value?;
        Some(v + 1)
    }

    #[test]
    fn test_early_return_restores() {
        let port = SimulatedBasepri::new();
        assert_eq!(early_exit(&port, true), None);
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
        assert_eq!(early_exit(&port, false), None);
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
        assert_eq!(port.raises(), port.restores(), "Every entry needs exactly one exit");
        assert_eq!(port.restores(), 2);
    }

    #[test]
    fn test_break_out_of_loop_restores() {
        let port = SimulatedBasepri::new();
        for i in 0..10 {
            let _block = AtomicBlock::enter(&port, P8, Fence::Full);
            if i == 3 {
                break;
            }
        }
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
        assert_eq!(port.raises(), 4);
        assert_eq!(port.restores(), 4);
    }

    #[test]
    fn test_unwinding_restores() {
        let port = SimulatedBasepri::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _block = AtomicBlock::enter(&port, P5, Fence::Full);
            panic!("guarded code failed");
        }));
        assert!(result.is_err());
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
    }

    #[test]
    fn test_block_holds_off_covered_interrupts() {
        let port = SimulatedBasepri::new();
        let rx = Priority::new(5).unwrap();
        let urgent = Priority::new(2).unwrap();

        let block = AtomicBlock::enter(&port, P5, Fence::Full);
        assert_eq!(port.interrupt(rx, || ()), None);
        assert_eq!(port.interrupt(urgent, || ()), Some(()));
        drop(block);
        assert_eq!(port.interrupt(rx, || ()), Some(()));
    }

    #[test]
    fn test_barrier_variants_fence_counts() {
        let port = SimulatedBasepri::new();
        {
            let block = AtomicBlock::enter(&port, P5, Fence::Full);
            assert_eq!(block.fence(), Fence::Full);
        }
        assert_eq!(port.full_fences(), 2, "Barrier block fences entry and exit");

        {
            let block = AtomicBlock::enter(&port, P5, Fence::Elided);
            assert_eq!(block.fence(), Fence::Elided);
            assert_eq!(port.ceiling(), P5);
        }
        assert_eq!(port.full_fences(), 2, "Non-barrier block adds no fences");
        assert_eq!(port.ceiling(), Ceiling::DISABLED);
    }
}
