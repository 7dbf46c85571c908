//! Parallel MCTS search over an abstract [`zeroarena_core::GameState`].
//!
//! ## Architecture
//! - [`node`] - a single arena slot and its atomic statistics (Level 3)
//! - [`tree`] - the arena and the coarse lock guarding its shape (Level 2)
//! - [`inferer`] - the opaque policy/value boundary
//! - [`search`] - the PUCT selection / expansion / back-propagation pipeline
//!   and the worker pool that drives it (Level 1)
//!
//! Everything above the arena is generic over the game being played; this
//! crate never hard-codes a board size or a rule set.

pub mod inferer;
pub mod node;
pub mod search;
pub mod tree;

#[cfg(test)]
mod test_support;

use std::time::Duration;

use thiserror::Error;

pub use inferer::{DummyInferer, Inference, Inferer};
pub use node::{NodeId, Status};
pub use search::Mcts;
pub use tree::Tree;

/// Errors raised while configuring or driving a search.
#[derive(Debug, Error)]
pub enum MctsError {
    #[error(transparent)]
    Config(#[from] zeroarena_core::EngineError),

    #[error("search produced no legal move from a non-terminal position")]
    NoLegalMove,
}

/// How the engine treats a pass move once search has produced a best child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassPreference {
    /// Never volunteer a pass as the reported best move unless nothing
    /// else is available.
    DontPreferPass,
    /// Accept a pass as the best move whenever search ranks it first.
    PreferPass,
    /// Like `DontPreferPass`, and additionally never resign.
    DontResign,
}

impl Default for PassPreference {
    fn default() -> Self {
        PassPreference::DontPreferPass
    }
}

/// Tunables for one [`Mcts`] instance. Mirrors the source engine's
/// per-search `Config`, with board dimensions folded in since the tree's
/// per-child capacity and max search depth are derived from them.
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// Exploration constant in the PUCT formula. Must be in `(0, 1]`.
    pub puct: f32,
    /// Wall-clock budget for one `search` call.
    pub timeout: Duration,
    /// Board rows.
    pub rows: usize,
    /// Board columns.
    pub cols: usize,
    /// Number of opening plies during which a child is randomly promoted
    /// to "best" in proportion to its visit count, instead of argmax.
    pub random_count: u32,
    /// Iteration budget for one `search` call (in addition to `timeout`).
    pub budget: i32,
    /// A child's visit count must exceed this before randomisation swaps
    /// it to the front; below it, the engine just returns the top child.
    pub random_min_visits: u32,
    /// Softmax-style temperature applied to visit counts during
    /// randomisation; `0.0` uses the raw visit counts as weights.
    pub random_temperature: f32,
    /// If true, a pass is returned as-is whenever it is the top move.
    /// If false, passing is only kept when it does not cost the mover the
    /// lead (see `should_resign` siblings in `search`).
    pub dumb_pass: bool,
    /// Resign when the best move's evaluation is at or below this
    /// threshold past the opening. Negative disables resignation
    /// (matches the engine default).
    pub resign_percentage: f32,
    pub pass_preference: PassPreference,
    /// Hard ceiling on arena size; search stops expanding past this many
    /// nodes. Tests shrink this well below the production default.
    pub max_tree_size: usize,
    /// Number of concurrent search workers. Defaults to the available
    /// parallelism at construction time.
    pub workers: usize,
}

/// Production default matching the source engine's `DefaultConfig`.
pub const DEFAULT_MAX_TREE_SIZE: usize = 25_000_000;

impl MctsConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            puct: 1.0,
            timeout: Duration::from_millis(100),
            rows,
            cols,
            random_count: 0,
            budget: 10_000,
            random_min_visits: 0,
            random_temperature: 0.0,
            dumb_pass: true,
            resign_percentage: -1.0,
            pass_preference: PassPreference::DontPreferPass,
            max_tree_size: DEFAULT_MAX_TREE_SIZE,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    pub fn validate(&self) -> Result<(), zeroarena_core::EngineError> {
        if !(self.puct > 0.0 && self.puct <= 1.0) {
            return Err(zeroarena_core::EngineError::InvalidConfig(format!(
                "puct must be in (0, 1], got {}",
                self.puct
            )));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(zeroarena_core::EngineError::InvalidConfig(
                "board dimensions must be non-zero".into(),
            ));
        }
        if self.workers == 0 {
            return Err(zeroarena_core::EngineError::InvalidConfig(
                "workers must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn max_depth(&self) -> u32 {
        (self.rows * self.cols) as u32
    }
}
