//! Checkpointing a training run.
//!
//! Model weight persistence format is explicitly out of scope; `blob` is
//! whatever bytes a concrete [`crate::trainer::Network`] chooses to
//! serialise itself into. Grounded on the source engine's `AZ.Save`/`Load`,
//! reimplemented over `serde_json` instead of `gob` since the opaque
//! `Network` boundary here has no Go-style struct tags to piggyback on.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TrainingConfig;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("(de)serialisation error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A training checkpoint: the epoch reached and the champion's weights, as
/// an opaque blob the `Network` implementation produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub epoch: usize,
    pub champion_blob: Vec<u8>,
}

pub const FORMAT_VERSION: u32 = 1;

impl Checkpoint {
    pub fn new(epoch: usize, champion_blob: Vec<u8>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            epoch,
            champion_blob,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// A training run's config alongside its latest checkpoint, for a single
/// combined save file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    pub config: StoredConfig,
    pub checkpoint: Checkpoint,
}

/// The subset of [`TrainingConfig`] worth round-tripping through a save
/// file (the rest - encoder/augmenter function pointers - can't be
/// serialised and are supplied fresh by the caller on load).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredConfig {
    pub epochs: usize,
    pub episodes: usize,
    pub nn_iterations: usize,
    pub batch_size: usize,
    pub arena_games: usize,
    pub update_threshold: f32,
    pub max_examples: usize,
}

impl From<&TrainingConfig> for StoredConfig {
    fn from(c: &TrainingConfig) -> Self {
        Self {
            epochs: c.epochs,
            episodes: c.episodes,
            nn_iterations: c.nn_iterations,
            batch_size: c.batch_size,
            arena_games: c.arena_games,
            update_threshold: c.update_threshold,
            max_examples: c.max_examples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_round_trips_through_json() {
        let dir = std::env::temp_dir().join(format!("zeroarena-checkpoint-test-{}", std::process::id()));
        let ckpt = Checkpoint::new(3, vec![1, 2, 3, 4]);
        ckpt.save(&dir).unwrap();
        let loaded = Checkpoint::load(&dir).unwrap();
        assert_eq!(loaded.epoch, 3);
        assert_eq!(loaded.champion_blob, vec![1, 2, 3, 4]);
        std::fs::remove_file(&dir).ok();
    }
}
