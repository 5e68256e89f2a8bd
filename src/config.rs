//! # Build Configuration
//!
//! Compile-time constants describing the target's interrupt controller and
//! the urgency levels used across the firmware. All values are fixed at
//! compile time; there is no runtime configuration of the masking scheme.
//!
//! ## Priority Encoding
//!
//! The NVIC implements only the top `NVIC_PRIO_BITS` bits of each 8-bit
//! priority register. A logical urgency level `l` is therefore stored as
//! `l << PRIORITY_SHIFT`, and BASEPRI uses the same left-aligned encoding.
//! Lower numbers are more urgent.

/// Number of priority bits implemented by the NVIC.
/// STM32F4/F7 parts implement 4 bits (16 levels).
pub const NVIC_PRIO_BITS: u8 = 4;

/// Left shift applied to a logical level to obtain its register encoding.
pub const PRIORITY_SHIFT: u8 = 8 - NVIC_PRIO_BITS;

/// Number of distinct urgency levels (`0..PRIORITY_LEVELS`).
pub const PRIORITY_LEVELS: u8 = 1 << NVIC_PRIO_BITS;

/// Least urgent level. Exceptions at this level never preempt application ISRs.
pub const PRIO_LOWEST: u8 = PRIORITY_LEVELS - 1;

// ---------------------------------------------------------------------------
// Firmware urgency levels
// ---------------------------------------------------------------------------

// Level 0 is reserved for handlers that must never be held off; BASEPRI
// cannot mask it, so nothing at level 0 may share state through a ceiling.

/// SPI receiver (e.g. nRF24 payload) data-ready interrupt.
pub const PRIO_RX_SPI: u8 = 2;

/// Serial UART interrupts (telemetry, serial receivers).
pub const PRIO_SERIAL: u8 = 3;

/// SysTick. The demonstration firmware uses it as its receiver producer.
pub const PRIO_SYSTICK: u8 = PRIO_RX_SPI;

/// SysTick frequency in Hz for the demonstration firmware.
pub const TICK_HZ: u32 = 1000;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
