//! # atomic-block
//!
//! Priority-ceiling critical sections for single-core, interrupt-driven
//! ARM Cortex-M flight controllers.
//!
//! ## Overview
//!
//! Receiver drivers decode payloads inside interrupt handlers while the main
//! loop, the control loop, and the configuration menus read the same data.
//! Instead of disabling all interrupts, an atomic block raises the BASEPRI
//! ceiling just far enough to hold off the interrupts that touch the shared
//! data and restores it when the block's scope ends:
//!
//! - **No waiting**: exclusion means refusing preemption, never blocking
//! - **No weakening**: a nested block can only keep or tighten the ceiling
//! - **Every exit path restores**: the ceiling is tied to a `Drop` guard
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │   Drivers / ISRs · Main loop · Configuration menus      │
//! ├──────────────────────────┬─────────────────────────────┤
//! │  IsrShared (shared.rs)   │  Snapshot (snapshot.rs)     │
//! │  ─ lock() / isr_access() │  ─ take() / commit()        │
//! ├──────────────┬───────────┴──────┬──────────────────────┤
//! │ AtomicBlock  │ BarrierScope     │ atomic_or/atomic_and │
//! │ sync.rs      │ barrier.rs       │ atomic.rs            │
//! ├──────────────┴──────────────────┴──────────────────────┤
//! │     PriorityMask port (arch/) · Priority, Ceiling        │
//! │     cortex_m4::Basepri  |  host::SimulatedBasepri        │
//! ├────────────────────────────────────────────────────────┤
//! │         ARM Cortex-M4 BASEPRI / BASEPRI_MAX              │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Masking Convention
//!
//! BASEPRI 0 disables masking. A non-zero ceiling holds off every interrupt
//! whose priority value is numerically greater than or equal to it, so a
//! smaller non-zero ceiling is more restrictive. See [`priority`].
//!
//! ## Memory Model
//!
//! - **No heap**: guards are stack values, shared data is statically allocated
//! - **No `alloc`**: pure `core` outside of host tests
//! - **Single core**: exclusion relies on the core's interrupt mask only

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod atomic;
pub mod barrier;
pub mod config;
pub mod error;
pub mod priority;
pub mod shared;
pub mod snapshot;
pub mod sync;

pub use arch::{Fence, PriorityMask};
pub use atomic::{atomic_and, atomic_or};
pub use barrier::BarrierScope;
pub use error::{Error, Result};
pub use priority::{Ceiling, Priority};
pub use shared::IsrShared;
pub use snapshot::Snapshot;
pub use sync::{atomic_block, atomic_block_nb, get_ceiling, raise_ceiling, set_ceiling, AtomicBlock};
