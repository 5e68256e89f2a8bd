//! Error types for the fallible edges of the crate.
//!
//! Entering and leaving an atomic block never fails. Errors only arise when
//! priorities are built from runtime values or when an [`IsrShared`] value is
//! borrowed in a way its ceiling cannot protect.
//!
//! [`IsrShared`]: crate::shared::IsrShared

use core::fmt;

/// Errors reported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Urgency level is not implemented by the NVIC.
    PriorityOutOfRange {
        /// Requested logical level.
        level: u8,
        /// Number of implemented levels.
        levels: u8,
    },

    /// Level 0 cannot be masked through BASEPRI.
    Unmaskable,

    /// A shared value was locked again while already locked.
    Reentrant,

    /// An interrupt handler reached a shared value held by the main context,
    /// meaning the value's ceiling does not cover that interrupt.
    Busy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriorityOutOfRange { level, levels } => {
                write!(f, "priority level {} out of range (0..{})", level, levels)
            }
            Self::Unmaskable => write!(f, "priority level 0 cannot be masked by BASEPRI"),
            Self::Reentrant => write!(f, "shared value is already locked by this context"),
            Self::Busy => write!(
                f,
                "shared value accessed from an interrupt its ceiling does not cover"
            ),
        }
    }
}

impl core::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
