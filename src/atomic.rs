//! # Atomic Flag Helpers
//!
//! Single-word read-modify-write for flag and bitmask fields updated from
//! several contexts. No atomic block is needed: the update itself cannot be
//! torn or lost, but it orders nothing else (`Ordering::Relaxed`). When a
//! flag publishes data, read that data inside an
//! [`AtomicBlock`](crate::sync::AtomicBlock).
//!
//! On ARMv7E-M these lower to an `LDREX`/`STREX` retry loop.

use core::sync::atomic::{AtomicI32, AtomicU16, AtomicU32, AtomicU8, AtomicUsize, Ordering};

/// Atomic integer cells usable with [`atomic_or`] and [`atomic_and`].
pub trait AtomicWord {
    /// Plain integer stored in the cell.
    type Word: Copy;

    fn fetch_or_relaxed(&self, mask: Self::Word) -> Self::Word;

    fn fetch_and_relaxed(&self, mask: Self::Word) -> Self::Word;
}

macro_rules! impl_atomic_word {
    ($($atomic:ty => $word:ty),* $(,)?) => {
        $(
            impl AtomicWord for $atomic {
                type Word = $word;

                #[inline(always)]
                fn fetch_or_relaxed(&self, mask: $word) -> $word {
                    self.fetch_or(mask, Ordering::Relaxed)
                }

                #[inline(always)]
                fn fetch_and_relaxed(&self, mask: $word) -> $word {
                    self.fetch_and(mask, Ordering::Relaxed)
                }
            }
        )*
    };
}

impl_atomic_word! {
    AtomicU8 => u8,
    AtomicU16 => u16,
    AtomicU32 => u32,
    AtomicUsize => usize,
    AtomicI32 => i32,
}

/// Set the bits of `mask` in `location`. Returns the previous value.
#[inline(always)]
pub fn atomic_or<A: AtomicWord>(location: &A, mask: A::Word) -> A::Word {
    location.fetch_or_relaxed(mask)
}

/// Keep only the bits of `mask` in `location`. Returns the previous value.
#[inline(always)]
pub fn atomic_and<A: AtomicWord>(location: &A, mask: A::Word) -> A::Word {
    location.fetch_and_relaxed(mask)
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_returns_previous() {
        let flags = AtomicU32::new(0x01);
        assert_eq!(atomic_or(&flags, 0x02), 0x01);
        assert_eq!(flags.load(Ordering::Relaxed), 0x03);
    }

    #[test]
    fn test_and_returns_previous() {
        let flags = AtomicU8::new(0b1011);
        assert_eq!(atomic_and(&flags, !0b0010), 0b1011);
        assert_eq!(flags.load(Ordering::Relaxed), 0b1001);
    }

    #[test]
    fn test_word_widths() {
        let half = AtomicU16::new(0x00F0);
        assert_eq!(atomic_or(&half, 0x0F00), 0x00F0);
        assert_eq!(half.load(Ordering::Relaxed), 0x0FF0);

        let signed = AtomicI32::new(-1);
        assert_eq!(atomic_and(&signed, 0x7F), -1);
        assert_eq!(signed.load(Ordering::Relaxed), 0x7F);

        let wide = AtomicUsize::new(0);
        atomic_or(&wide, 1 << 7);
        assert_eq!(wide.load(Ordering::Relaxed), 0x80);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        const ROUNDS: u32 = 10_000;
        let word = AtomicU32::new(0);

        // Each context owns one bit and toggles it; the final state keeps both
        std::thread::scope(|s| {
            for bit in [0x01u32, 0x02] {
                let word = &word;
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        atomic_and(word, !bit);
                        atomic_or(word, bit);
                    }
                });
            }
        });
        assert_eq!(word.load(Ordering::Relaxed), 0x03);
    }

    #[test]
    fn test_or_and_either_order_is_equivalent() {
        let initial = 0b0110_0001u8;
        let set = 0b0000_1000u8;
        let keep = 0b1110_1111u8;

        let a = AtomicU8::new(initial);
        atomic_or(&a, set);
        atomic_and(&a, keep);

        let b = AtomicU8::new(initial);
        atomic_and(&b, keep);
        atomic_or(&b, set);

        // Masks touch disjoint bits, so the order of application is irrelevant
        assert_eq!(a.load(Ordering::Relaxed), b.load(Ordering::Relaxed));
        assert_eq!(a.load(Ordering::Relaxed), (initial | set) & keep);
    }
}
