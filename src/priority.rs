//! # Priorities and Ceilings
//!
//! Two views of the same NVIC encoding:
//!
//! - [`Priority`]: the urgency an interrupt is configured with.
//! - [`Ceiling`]: the BASEPRI masking threshold currently in effect.
//!
//! ## Ordering Convention
//!
//! ```text
//!   raw BASEPRI   0x00      0x10   0x20   ...   0xF0
//!                 DISABLED  most restrictive ──► least restrictive
//!   masks         nothing   levels 1..=15  ...  level 15 only
//! ```
//!
//! A non-zero ceiling masks every interrupt whose priority value is
//! numerically greater than or equal to it. A *smaller* non-zero ceiling is
//! therefore *more* restrictive, and [`Ceiling::DISABLED`] is the least
//! restrictive value of all. Level 0 interrupts can never be masked.

use core::fmt;

use crate::config::{PRIORITY_LEVELS, PRIORITY_SHIFT, PRIO_LOWEST};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Interrupt priority
// ---------------------------------------------------------------------------

/// Urgency level of an interrupt. `0` is the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    /// Most urgent level. Never masked by a ceiling.
    pub const HIGHEST: Priority = Priority(0);

    /// Least urgent implemented level.
    pub const LOWEST: Priority = Priority(PRIO_LOWEST);

    /// Build a priority from a logical level.
    pub const fn new(level: u8) -> Result<Self> {
        if level < PRIORITY_LEVELS {
            Ok(Priority(level))
        } else {
            Err(Error::PriorityOutOfRange {
                level,
                levels: PRIORITY_LEVELS,
            })
        }
    }

    /// Logical level.
    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Left-aligned 8-bit encoding written to the NVIC/SHPR registers.
    #[inline]
    pub const fn to_nvic(self) -> u8 {
        self.0 << PRIORITY_SHIFT
    }

    /// Returns `true` if `self` may preempt code running at `other`.
    #[inline]
    pub const fn is_more_urgent_than(self, other: Priority) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Masking ceiling
// ---------------------------------------------------------------------------

/// BASEPRI masking threshold, stored in its raw register encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ceiling(u8);

impl Ceiling {
    /// No interrupt is masked.
    pub const DISABLED: Ceiling = Ceiling(0);

    /// Ceiling that masks urgency level `level` and every less urgent level.
    ///
    /// Intended for constants; use [`Ceiling::try_from_level`] for runtime
    /// values.
    ///
    /// # Panics
    /// If `level` is 0 or not implemented by the NVIC. In a `const` item this
    /// is a compile error.
    pub const fn from_level(level: u8) -> Self {
        assert!(level != 0, "level 0 cannot be masked by BASEPRI");
        assert!(level < PRIORITY_LEVELS, "priority level not implemented by the NVIC");
        Ceiling(level << PRIORITY_SHIFT)
    }

    /// Fallible form of [`Ceiling::from_level`].
    pub const fn try_from_level(level: u8) -> Result<Self> {
        match Priority::new(level) {
            Ok(priority) => Self::covering(priority),
            Err(e) => Err(e),
        }
    }

    /// Least restrictive ceiling that still masks `priority`.
    pub const fn covering(priority: Priority) -> Result<Self> {
        if priority.0 == 0 {
            Err(Error::Unmaskable)
        } else {
            Ok(Ceiling(priority.to_nvic()))
        }
    }

    /// Wrap a value read back from the BASEPRI register.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Ceiling(raw)
    }

    /// Raw register encoding.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_disabled(self) -> bool {
        self.0 == 0
    }

    /// Logical level being masked, or `None` when masking is disabled.
    #[inline]
    pub const fn level(self) -> Option<u8> {
        if self.is_disabled() {
            None
        } else {
            Some(self.0 >> PRIORITY_SHIFT)
        }
    }

    /// Returns `true` if `self` masks at least everything `other` masks.
    #[inline]
    pub const fn is_at_least_as_restrictive_as(self, other: Ceiling) -> bool {
        if self.is_disabled() {
            other.is_disabled()
        } else {
            other.is_disabled() || self.0 <= other.0
        }
    }

    /// The more restrictive of `self` and `other`.
    #[inline]
    pub const fn tighter(self, other: Ceiling) -> Ceiling {
        if self.is_at_least_as_restrictive_as(other) {
            self
        } else {
            other
        }
    }

    /// Returns `true` if an interrupt at `priority` is held off by this ceiling.
    #[inline]
    pub const fn masks(self, priority: Priority) -> bool {
        !self.is_disabled() && priority.to_nvic() >= self.0
    }
}

impl Default for Ceiling {
    fn default() -> Self {
        Self::DISABLED
    }
}

impl fmt::Display for Ceiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level() {
            None => write!(f, "disabled"),
            Some(level) => write!(f, ">=P{} ({:#04x})", level, self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
