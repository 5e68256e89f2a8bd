//! Nesting, exit-path, and interleaving scenarios on per-test simulated ports.

use std::sync::atomic::{AtomicU32, Ordering};

use atomic_block::arch::host::SimulatedBasepri;
use atomic_block::*;

fn ceiling(level: u8) -> Ceiling {
    Ceiling::try_from_level(level).unwrap()
}

/// Enter one block per level, innermost last, checking the effective
/// ceiling at each depth and the restored ceiling on the way out.
fn nest_and_check(port: &SimulatedBasepri, levels: &[u8]) {
    let Some((&level, rest)) = levels.split_first() else {
        return;
    };
    let before = port.ceiling();
    {
        let _block = AtomicBlock::enter(port, ceiling(level), Fence::Full);
        assert_eq!(port.ceiling(), before.tighter(ceiling(level)));
        nest_and_check(port, rest);
        assert_eq!(port.ceiling(), before.tighter(ceiling(level)));
    }
    assert_eq!(port.ceiling(), before);
}

#[test]
fn test_nesting_sequences_restore_entry_ceiling() {
    // Every sequence of length 3 over a spread of levels, repeats included
    let levels = [1u8, 4, 5, 8, 15];
    for &a in &levels {
        for &b in &levels {
            for &c in &levels {
                let port = SimulatedBasepri::new();
                nest_and_check(&port, &[a, b, c]);
                assert_eq!(port.ceiling(), Ceiling::DISABLED, "Sequence {:?}", [a, b, c]);
                assert_eq!(port.raises(), port.restores());
            }
        }
    }
}

#[test]
fn test_scenario_disabled_to_five_and_back() {
    let port = SimulatedBasepri::new();
    assert!(port.ceiling().is_disabled());
    {
        let _block = AtomicBlock::enter(&port, ceiling(5), Fence::Full);
        let inside = port.ceiling();
        assert_eq!(inside.level(), Some(5));
        assert!(inside.masks(Priority::new(5).unwrap()));
        assert!(!inside.masks(Priority::new(4).unwrap()));
    }
    assert!(port.ceiling().is_disabled());
}

#[test]
fn test_scenario_five_then_looser_eight() {
    let port = SimulatedBasepri::new();
    let outer = AtomicBlock::enter(&port, ceiling(5), Fence::Full);
    {
        let _inner = AtomicBlock::enter(&port, ceiling(8), Fence::Elided);
        assert_eq!(port.ceiling(), ceiling(5));
    }
    assert_eq!(port.ceiling(), ceiling(5));
    drop(outer);
    assert_eq!(port.ceiling(), Ceiling::DISABLED);
}

struct Counted<'a> {
    _block: AtomicBlock<'a, SimulatedBasepri>,
    exits: &'a AtomicU32,
}

impl Drop for Counted<'_> {
    fn drop(&mut self) {
        self.exits.fetch_add(1, Ordering::Relaxed);
    }
}

fn guarded_lookup(port: &SimulatedBasepri, exits: &AtomicU32, table: &[u8], key: usize) -> Option<u8> {
    let _guard = Counted {
        _block: AtomicBlock::enter(port, ceiling(6), Fence::Full),
        exits,
    };
    let value = *table.get(key)?;
    if value == 0 {
        return None;
    }
    Some(value * 2)
}

#[test]
fn test_every_entry_has_one_exit() {
    let port = SimulatedBasepri::new();
    let exits = AtomicU32::new(0);
    let table = [3u8, 0, 7];

    assert_eq!(guarded_lookup(&port, &exits, &table, 0), Some(6));
    assert_eq!(guarded_lookup(&port, &exits, &table, 1), None);
    assert_eq!(guarded_lookup(&port, &exits, &table, 9), None);

    assert_eq!(exits.load(Ordering::Relaxed), 3);
    assert_eq!(port.raises(), 3);
    assert_eq!(port.restores(), 3);
    assert_eq!(port.ceiling(), Ceiling::DISABLED);
}

#[test]
fn test_scenario_atomic_or_flag_word() {
    let flag_word = AtomicU32::new(0x01);
    assert_eq!(atomic_or(&flag_word, 0x02), 0x01);
    assert_eq!(flag_word.load(Ordering::Relaxed), 0x03);
}

#[test]
fn test_two_contexts_never_lose_updates() {
    const ROUNDS: usize = 2_000;
    let word = AtomicU32::new(0x8000_0000);

    std::thread::scope(|s| {
        // One context sets the low half bit by bit; the other sets the high
        // bits and keeps clearing its scratch bit 30
        s.spawn(|| {
            for round in 0..ROUNDS {
                atomic_or(&word, 1 << (round % 16));
            }
        });
        s.spawn(|| {
            for round in 0..ROUNDS {
                atomic_or(&word, 1 << (16 + round % 15));
                atomic_and(&word, !(1 << 30));
            }
        });
    });

    // Initial value, every OR mask, and the AND mask applied last by its owner
    let expected = (0x8000_0000u32 | 0x0000_FFFF | 0x7FFF_0000) & !(1 << 30);
    assert_eq!(word.load(Ordering::Relaxed), expected);
}

#[test]
fn test_shared_value_is_never_torn() {
    let port = SimulatedBasepri::new();
    let rx = Priority::new(2).unwrap();
    let rc = IsrShared::new(Ceiling::covering(rx).unwrap(), [0u16; 4]);

    for frame in 1..=20u16 {
        // Main context reads; the producer fires in the middle of every read
        let snapshot = rc
            .lock_on(&port, |channels| {
                let first = channels[0];
                let fired = port.interrupt(rx, || unsafe {
                    rc.isr_access(|c| c.fill(frame)).unwrap()
                });
                assert!(fired.is_none());
                [first, channels[1], channels[2], channels[3]]
            })
            .unwrap();
        assert!(snapshot.iter().all(|&v| v == snapshot[0]), "Torn read {:?}", snapshot);

        // Delivered once the block is gone
        port.interrupt(rx, || unsafe { rc.isr_access(|c| c.fill(frame)).unwrap() });
        assert_eq!(rc.lock_on(&port, |c| *c).unwrap(), [frame; 4]);
    }
}
