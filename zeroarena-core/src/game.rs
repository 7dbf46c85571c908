//! The abstract game contract consumed by the search and training engines.
//!
//! A concrete game (Tic-Tac-Toe, m,n,k, Connect-N, a Go variant, ...)
//! implements [`GameState`]; the engine never depends on board geometry or
//! rule details beyond what this trait exposes.

use serde::{Deserialize, Serialize};

/// A board cell, or the colour to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// The other colour.
    pub fn opponent(self) -> Self {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }
}

/// A board cell: empty, or occupied by one colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Black,
    White,
}

/// A move, encoded as a signed index into the action space.
///
/// Two values are reserved: [`PASS`] and [`RESIGN`]. [`NONE`] marks the
/// absence of a move (e.g. `last_move()` before the first ply).
pub type MoveIndex = i32;

/// Reserved move encoding a pass.
pub const PASS: MoveIndex = -1;
/// Reserved move encoding a resignation.
pub const RESIGN: MoveIndex = -2;
/// Sentinel for "no move" (e.g. there is no last move yet).
pub const NONE: MoveIndex = i32::MIN;

/// A move tagged with the player making it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub player: Player,
    pub mv: MoveIndex,
}

impl PlayerMove {
    pub fn new(player: Player, mv: MoveIndex) -> Self {
        Self { player, mv }
    }
}

/// Outcome of [`GameState::ended`]: whether the game is over, and who won.
///
/// `winner = None` with `ended = true` means a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ended {
    pub ended: bool,
    pub winner: Option<Player>,
}

/// The board-game contract the search engine is generic over.
///
/// This is a direct translation of the source engine's `State` interface:
/// the `Eq`/`Clone` members of that interface become Rust's `PartialEq` and
/// `Clone` supertraits instead of explicit methods, since those are
/// idiomatic here and the rest of the contract maps one-to-one.
pub trait GameState: Clone + PartialEq + Send + Sync {
    /// `(m, n)` board dimensions.
    fn board_size(&self) -> (usize, usize);

    /// The board, as a row-major sequence of cells.
    fn board(&self) -> Vec<Cell>;

    /// Number of distinct non-pass moves.
    fn action_space(&self) -> usize;

    /// Zobrist-style incremental hash of the position.
    fn hash(&self) -> u32;

    /// The player to move next.
    fn to_move(&self) -> Player;

    /// Force the player to move next (used by the search engine when
    /// probing a position from either side).
    fn set_to_move(&mut self, player: Player);

    /// Number of consecutive passes that have been made leading to this
    /// position.
    fn passes(&self) -> u32;

    /// Count of moves played so far.
    fn move_number(&self) -> u32;

    /// The last move played, or [`NONE`]-tagged if none yet.
    fn last_move(&self) -> PlayerMove;

    /// Handicap stones/moves granted, if any.
    fn handicap(&self) -> u32 {
        0
    }

    /// Raw score for a player (before any tie-breaking additions).
    fn score(&self, player: Player) -> f32;

    /// Tie-breaking additions to the score (e.g. komi). Added once, not
    /// per-player.
    fn additional_score(&self) -> f32 {
        0.0
    }

    /// Whether the game has ended, and who won (`None` = draw).
    fn ended(&self) -> Ended;

    /// Whether `m` is legal in this position, without mutating.
    fn check(&self, m: PlayerMove) -> bool;

    /// Produce the position after `m`. The engine always calls this on a
    /// value obtained via `Clone` when it needs to branch, so an
    /// implementation is free to mutate in place and return `self.clone()`.
    fn apply(&self, m: PlayerMove) -> Self;

    /// Board state `i` plies ago (`i = 0` is the current board).
    fn historical(&self, i: usize) -> Vec<Cell>;

    /// Undo the last move played.
    fn undo_last_move(&mut self);

    /// Redo a move previously undone.
    fn fwd(&mut self);

    /// Reset to the starting position.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_involutive() {
        assert_eq!(Player::Black.opponent(), Player::White);
        assert_eq!(Player::White.opponent().opponent(), Player::White);
    }

    #[test]
    fn reserved_move_indices_are_distinct() {
        assert_ne!(PASS, RESIGN);
        assert_ne!(PASS, NONE);
        assert_ne!(RESIGN, NONE);
    }
}
