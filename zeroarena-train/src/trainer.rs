//! The opaque neural-network boundary used by the training loop.
//!
//! Network architecture, autodiff, and the optimiser are explicitly out of
//! scope for this crate; [`Network`] is the seam a real implementation
//! plugs into. It composes [`zeroarena_mcts::Inferer`] (so a champion can
//! drive a search) with a `train` method and the ability to produce a
//! fresh, untrained instance.

use thiserror::Error;
use zeroarena_core::GameState;
use zeroarena_mcts::Inferer;

use crate::example::Example;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training batch was empty")]
    EmptyBatch,

    #[error("network training failed: {0}")]
    Backend(String),
}

/// A trainable, inferable champion. `Default` stands in for "a freshly
/// initialised, untrained network" (the source engine's `dual.New(conf)`).
pub trait Network<G: GameState>: Inferer<G> + Clone + Default + Send + Sync {
    /// Update weights from a batch of self-play examples. `batch_size` and
    /// `iterations` mirror the source engine's `dual.Train(..., batches,
    /// nniters)` call.
    fn train(
        &mut self,
        examples: &[Example],
        batch_size: usize,
        iterations: usize,
    ) -> Result<(), TrainError>;
}
