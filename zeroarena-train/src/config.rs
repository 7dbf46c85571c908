//! Tunables for one [`crate::learn::Learner`] run.

use zeroarena_core::EngineError;

/// Mirrors the source engine's `Learn(iters, episodes, nniters, arenaGames)`
/// call plus the `updateThreshold`/`maxExamples` fields folded into `AZ`.
#[derive(Clone, Debug)]
pub struct TrainingConfig {
    /// Number of self-play/train/evaluate epochs to run.
    pub epochs: usize,
    /// Self-play games collected per epoch before training.
    pub episodes: usize,
    /// Training iterations handed to `Network::train` per epoch.
    pub nn_iterations: usize,
    /// Examples per training batch.
    pub batch_size: usize,
    /// Arena games played between champion and challenger per epoch to
    /// decide promotion.
    pub arena_games: usize,
    /// Challenger is promoted when its win share (ignoring draws) exceeds
    /// this threshold.
    pub update_threshold: f32,
    /// If non-zero, the collected example pool is shuffled and truncated to
    /// this many examples before training (matches the source engine's
    /// `maxExamples`; `0` disables truncation).
    pub max_examples: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 1,
            episodes: 1,
            nn_iterations: 1,
            batch_size: 32,
            arena_games: 1,
            update_threshold: 0.55,
            max_examples: 0,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.episodes == 0 || self.arena_games == 0 || self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "episodes, arena_games, and batch_size must all be non-zero".into(),
            ));
        }
        if !(self.update_threshold > 0.0 && self.update_threshold <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "update_threshold must be in (0, 1], got {}",
                self.update_threshold
            )));
        }
        Ok(())
    }
}
