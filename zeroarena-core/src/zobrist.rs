//! Incremental Zobrist-style hashing for fixed-size boards.
//!
//! A [`ZobristTable`] hands out one random `u32` per `(cell index, colour)`
//! pair; a game implementation XORs the relevant entry in and out as stones
//! are placed or removed, giving an `O(1)`-per-move incremental hash.

use crate::game::Player;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Table of per-cell, per-colour random numbers used to build an
/// incremental board hash.
#[derive(Clone, Debug)]
pub struct ZobristTable {
    black: Vec<u32>,
    white: Vec<u32>,
}

impl ZobristTable {
    /// Build a table for `cells` board positions, seeded deterministically.
    pub fn new(cells: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self {
            black: (0..cells).map(|_| rng.gen()).collect(),
            white: (0..cells).map(|_| rng.gen()).collect(),
        }
    }

    /// The XOR entry for placing/removing `player`'s stone at `cell`.
    pub fn entry(&self, cell: usize, player: Player) -> u32 {
        match player {
            Player::Black => self.black[cell],
            Player::White => self.white[cell],
        }
    }

    /// Compute the hash of a full board from scratch (used at construction
    /// or after a non-incremental mutation like `reset`).
    pub fn hash_board(&self, board: &[crate::game::Cell]) -> u32 {
        board
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, cell)| match cell {
                crate::game::Cell::Empty => acc,
                crate::game::Cell::Black => acc ^ self.entry(i, Player::Black),
                crate::game::Cell::White => acc ^ self.entry(i, Player::White),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    #[test]
    fn same_seed_gives_same_table() {
        let a = ZobristTable::new(9, 42);
        let b = ZobristTable::new(9, 42);
        assert_eq!(a.entry(3, Player::Black), b.entry(3, Player::Black));
    }

    #[test]
    fn xor_in_then_out_is_identity() {
        let table = ZobristTable::new(9, 7);
        let board = vec![Cell::Empty; 9];
        let h0 = table.hash_board(&board);
        let h1 = h0 ^ table.entry(4, Player::Black);
        let h2 = h1 ^ table.entry(4, Player::Black);
        assert_eq!(h0, h2);
    }
}
