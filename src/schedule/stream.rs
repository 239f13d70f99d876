//! Seeded random stream shared by motion and transition selection.
//!
//! Every slot consumes exactly [`WORDS_PER_SLOT`] words, in slot order:
//! [`MOTION_WORDS`] for motion (zoom direction, horizontal pan, vertical pan)
//! followed by one for the outgoing transition. The transition word is drawn
//! for the last slot too and discarded. Words are consumed whether or not
//! the profile enables panning, so no setting can shift later slots.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Words drawn for a slot's motion
pub const MOTION_WORDS: usize = 3;

/// Words drawn per slot (motion, then transition)
pub const WORDS_PER_SLOT: usize = MOTION_WORDS + 1;

/// Raw words drawn for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDraw {
    pub motion: [u32; MOTION_WORDS],
    pub transition: u32,
}

/// Deterministic stream derived from a seed string
///
/// ChaCha8 keyed with SHA-256 of the seed; its output is fixed by the
/// algorithm, not by the `rand` release.
pub struct DeterministicStream {
    rng: ChaCha8Rng,
}

impl DeterministicStream {
    pub fn new(seed: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
        Self {
            rng: ChaCha8Rng::from_seed(digest),
        }
    }

    /// Draw the next slot's words, motion first
    pub fn next_slot(&mut self) -> SlotDraw {
        let mut motion = [0u32; MOTION_WORDS];
        for word in motion.iter_mut() {
            *word = self.rng.next_u32();
        }
        let transition = self.rng.next_u32();
        SlotDraw { motion, transition }
    }

    /// Draws for `slot_count` slots from a fresh stream
    pub fn draws(seed: &str, slot_count: usize) -> Vec<SlotDraw> {
        let mut stream = Self::new(seed);
        (0..slot_count).map(|_| stream.next_slot()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_draws() {
        assert_eq!(DeterministicStream::draws("holiday_long", 8), DeterministicStream::draws("holiday_long", 8));
    }

    #[test]
    fn test_different_seed_differs() {
        assert_ne!(DeterministicStream::draws("a", 4), DeterministicStream::draws("b", 4));
    }

    #[test]
    fn test_prefix_stable_across_lengths() {
        let short = DeterministicStream::draws("seed", 3);
        let long = DeterministicStream::draws("seed", 10);
        assert_eq!(short[..], long[..3]);
    }

    #[test]
    fn test_draw_order_is_motion_then_transition() {
        let mut rng = ChaCha8Rng::from_seed(Sha256::digest(b"order").into());
        let raw: Vec<u32> = (0..WORDS_PER_SLOT * 2).map(|_| rng.next_u32()).collect();

        let draws = DeterministicStream::draws("order", 2);
        assert_eq!(draws[0].motion, [raw[0], raw[1], raw[2]]);
        assert_eq!(draws[0].transition, raw[3]);
        assert_eq!(draws[1].motion, [raw[4], raw[5], raw[6]]);
        assert_eq!(draws[1].transition, raw[7]);
    }

    #[test]
    fn test_known_words_for_seed() {
        let draws = DeterministicStream::draws("story", 2);
        assert_eq!(
            draws,
            vec![
                SlotDraw {
                    motion: [1648262219, 2194950635, 2412415781],
                    transition: 3363707470,
                },
                SlotDraw {
                    motion: [1933995480, 3688622567, 1772891245],
                    transition: 1845568614,
                },
            ]
        );
    }
}
