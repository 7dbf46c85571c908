//! The epoch loop: self-play, train the challenger, evaluate it against the
//! champion in the arena, and promote it on a clear enough win margin.
//!
//! Grounded on the source engine's `AZ.Learn`. `B` is a challenger network
//! retrained from scratch every epoch (the source engine's `newB` always
//! calls `dual.New(conf)` regardless of whether a promotion just happened -
//! the commented-out "clone B instead" branch is dead in the original and is
//! not revived here; see `DESIGN.md`).

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use zeroarena_core::GameState;

use crate::arena::Arena;
use crate::config::TrainingConfig;
use crate::example::Example;
use crate::trainer::{Network, TrainError};

/// One epoch's outcome: whether the challenger was promoted, and the
/// resulting champion/challenger tallies for that epoch's arena games.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub promoted: bool,
    pub champion_wins: f32,
    pub challenger_wins: f32,
    pub draws: f32,
}

/// Runs [`TrainingConfig::epochs`] epochs of self-play, training, and
/// arena-based promotion over an [`Arena`].
pub struct Learner<G: GameState, N: Network<G>> {
    arena: Arena<G, N>,
    config: TrainingConfig,
    rng: ChaCha8Rng,
}

impl<G: GameState, N: Network<G>> Learner<G, N> {
    pub fn new(arena: Arena<G, N>, config: TrainingConfig, seed: u64) -> Self {
        Self {
            arena,
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn arena(&self) -> &Arena<G, N> {
        &self.arena
    }

    /// The current champion (`A`'s network), the one a caller should persist.
    pub fn champion(&self) -> &N {
        &self.arena.a.champion
    }

    pub fn run(&mut self) -> Result<Vec<EpochReport>, TrainError> {
        let mut reports = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            reports.push(self.run_epoch(epoch)?);
        }
        Ok(reports)
    }

    fn run_epoch(&mut self, epoch: usize) -> Result<EpochReport, TrainError> {
        let mut examples = Vec::new();
        for _ in 0..self.config.episodes {
            let (_, ex) = self.arena.play(true, None);
            examples.extend(ex);
        }

        if self.config.max_examples > 0 && examples.len() > self.config.max_examples {
            shuffle(&mut examples, &mut self.rng);
            examples.truncate(self.config.max_examples);
        } else {
            shuffle(&mut examples, &mut self.rng);
        }

        if examples.is_empty() {
            return Err(TrainError::EmptyBatch);
        }

        self.arena.b.champion.train(
            &examples,
            self.config.batch_size,
            self.config.nn_iterations,
        )?;

        self.arena.a.reset_stats();
        self.arena.b.reset_stats();

        for _ in 0..self.config.arena_games {
            self.arena.play(false, None);
        }

        let a_wins = self.arena.a.wins;
        let b_wins = self.arena.b.wins;
        let promoted = decide_promotion(a_wins, b_wins, self.config.update_threshold);

        if promoted {
            self.arena.a.champion = self.arena.b.champion.clone();
        }
        // The challenger is always retrained from scratch next epoch,
        // win or lose - matches the source engine's unconditional `newB`.
        self.arena.b.champion = N::default();

        Ok(EpochReport {
            epoch,
            promoted,
            champion_wins: a_wins,
            challenger_wins: b_wins,
            draws: self.arena.a.draw,
        })
    }
}

/// `b_wins / (a_wins + b_wins) > threshold`: draws never enter the
/// comparison at all, matching the source engine's `Learn` inequality
/// literally (see `DESIGN.md`'s Open Question decisions).
pub fn decide_promotion(a_wins: f32, b_wins: f32, threshold: f32) -> bool {
    b_wins / (a_wins + b_wins).max(f32::MIN_POSITIVE) > threshold
}

/// Fisher-Yates, matching the source engine's `shuffleExamples` but driven
/// by a seeded RNG instead of a wall-clock seed (reproducible runs).
fn shuffle(examples: &mut [Example], rng: &mut impl rand::Rng) {
    for i in (1..examples.len()).rev() {
        let j = rng.gen_range(0..=i);
        examples.swap(i, j);
    }
}
