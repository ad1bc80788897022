use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use super::player::Player;

/// Random 64-bit keys indexed by (position, colour).
///
/// Immutable after construction, so a `BotEngine` can hand out shared
/// references to every worker's cloned [`Field`](super::field::Field)
/// instead of copying the table per clone.
#[derive(Clone, Debug)]
pub struct ZobristTable {
    keys: Vec<u64>,
    len: usize,
}

impl ZobristTable {
    /// Builds a table of `2 * length` keys from a seeded generator so that
    /// two tables built from the same seed are bit-identical.
    pub fn new(length: usize, seed: u64) -> ZobristTable {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = (0..length * 2).map(|_| rng.random::<u64>()).collect();
        ZobristTable { keys, len: length }
    }

    /// The key for a stone of `player` at board index `pos`.
    #[inline]
    pub fn key(&self, player: Player, pos: usize) -> u64 {
        self.keys[player.index() * self.len + pos]
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_from_seed() {
        let a = ZobristTable::new(64, 42);
        let b = ZobristTable::new(64, 42);
        for pos in 0..64 {
            assert_eq!(a.key(Player::Red, pos), b.key(Player::Red, pos));
            assert_eq!(a.key(Player::Black, pos), b.key(Player::Black, pos));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = ZobristTable::new(64, 1);
        let b = ZobristTable::new(64, 2);
        let differs = (0..64).any(|pos| a.key(Player::Red, pos) != b.key(Player::Red, pos));
        assert!(differs);
    }
}
