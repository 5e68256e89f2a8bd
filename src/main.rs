//! # atomic-block Example Firmware
//!
//! Demonstrates the three ways state crosses the interrupt boundary:
//!
//! | Data | Producer | Consumer | Mechanism |
//! |------|----------|----------|-----------|
//! | `RC_CHANNELS` | SysTick (receiver stand-in) | main loop | `IsrShared` + `AtomicBlock` |
//! | `RX_STATUS` | SysTick | main loop | `atomic_or` / `atomic_and` |
//! | `ALARMS` | alarms menu | main loop | `Snapshot` take / commit |
//!
//! SysTick runs at `PRIO_SYSTICK`; every shared value it touches is declared
//! with a ceiling covering that level.

#![no_std]
#![no_main]

use core::sync::atomic::AtomicU32;

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m_rt::{entry, exception};
use panic_halt as _;

use atomic_block::arch::cortex_m4;
use atomic_block::config::{PRIO_SERIAL, PRIO_SYSTICK};
use atomic_block::{atomic_and, atomic_or, Ceiling, IsrShared, Priority, Snapshot};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

const RC_CHANNEL_COUNT: usize = 8;
const RC_MID: u16 = 1500;

/// Receiver ceiling: holds off SysTick and anything less urgent.
const RX_CEILING: Ceiling = Ceiling::from_level(PRIO_SYSTICK);

/// Configuration ceiling, covering the serial telemetry interrupt that
/// reports alarm thresholds.
const CONFIG_CEILING: Ceiling = Ceiling::from_level(PRIO_SERIAL);

const RX_FRAME_READY: u32 = 1 << 0;
const RX_FAILSAFE: u32 = 1 << 1;

static RC_CHANNELS: IsrShared<[u16; RC_CHANNEL_COUNT]> =
    IsrShared::new(RX_CEILING, [RC_MID; RC_CHANNEL_COUNT]);

static RX_STATUS: AtomicU32 = AtomicU32::new(0);

#[derive(Clone, Copy, PartialEq)]
struct Alarms {
    rssi: u8,
    capacity_mah: u16,
    fly_time_min: u16,
    altitude_m: u16,
}

static ALARMS: IsrShared<Alarms> = IsrShared::new(
    CONFIG_CEILING,
    Alarms {
        rssi: 20,
        capacity_mah: 2200,
        fly_time_min: 10,
        altitude_m: 100,
    },
);

// ---------------------------------------------------------------------------
// Interrupt producer
// ---------------------------------------------------------------------------

/// Receiver stand-in. Sweeps the throttle channel and publishes a frame.
#[exception]
fn SysTick() {
    static mut TICKS: u32 = 0;
    *TICKS = TICKS.wrapping_add(1);
    let sweep = (*TICKS % 1000) as u16;

    // SAFETY: SysTick runs at PRIO_SYSTICK, which RX_CEILING masks.
    let published = unsafe {
        RC_CHANNELS.isr_access(|rc| {
            rc[2] = 1000 + sweep;
        })
    };

    match published {
        Ok(()) => atomic_or(&RX_STATUS, RX_FRAME_READY),
        Err(_) => atomic_or(&RX_STATUS, RX_FAILSAFE),
    };
}

// ---------------------------------------------------------------------------
// Main loop helpers
// ---------------------------------------------------------------------------

/// Consume a frame if one is ready. Returns the throttle channel.
fn poll_receiver() -> Option<u16> {
    let status = atomic_and(&RX_STATUS, !(RX_FRAME_READY | RX_FAILSAFE));
    if status & RX_FAILSAFE != 0 {
        return None;
    }
    if status & RX_FRAME_READY == 0 {
        return None;
    }
    RC_CHANNELS.read().ok().map(|rc| rc[2])
}

/// Alarms menu: snapshot on enter, edit locally, commit on exit. A failed
/// commit raises the failsafe flag for the next poll.
fn alarms_menu(throttle: u16) {
    let Ok(mut alarms) = Snapshot::take(&ALARMS) else {
        return;
    };
    // Stick input stands in for the menu's increment keys
    if throttle > 1900 {
        alarms.altitude_m = alarms.altitude_m.saturating_add(10).min(200);
    } else if throttle < 1100 {
        alarms.altitude_m = alarms.altitude_m.saturating_sub(10).max(10);
    }
    if alarms.commit().is_err() {
        atomic_or(&RX_STATUS, RX_FAILSAFE);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let systick_priority = Priority::new(PRIO_SYSTICK).expect("SysTick priority out of range");
    cortex_m4::set_exception_priority(&mut cp.SCB, SystemHandler::SysTick, systick_priority);
    cortex_m4::configure_systick(&mut cp.SYST);

    let mut frames: u32 = 0;
    loop {
        if let Some(throttle) = poll_receiver() {
            frames = frames.wrapping_add(1);
            if frames % 50 == 0 {
                alarms_menu(throttle);
            }
        }
        cortex_m::asm::wfi();
    }
}
