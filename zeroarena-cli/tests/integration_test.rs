//! End-to-end smoke tests exercising search, self-play, and training
//! together through `TicTacToe`, the way the `zeroarena` binary wires them.

use std::time::Duration;

use zeroarena_core::{GameState, Player};
use zeroarena_games::TicTacToe;
use zeroarena_mcts::{DummyInferer, Inference, Inferer, Mcts, MctsConfig};
use zeroarena_train::{Agent, Arena, Example, Learner, Network, TrainError, TrainingConfig};

#[derive(Clone, Default)]
struct NoopNetwork;

impl Inferer<TicTacToe> for NoopNetwork {
    fn infer(&self, state: &TicTacToe) -> Inference {
        DummyInferer.infer(state)
    }
}

impl Network<TicTacToe> for NoopNetwork {
    fn train(
        &mut self,
        _examples: &[Example],
        _batch_size: usize,
        _iterations: usize,
    ) -> Result<(), TrainError> {
        Ok(())
    }
}

fn encode(state: &TicTacToe) -> Vec<f32> {
    use zeroarena_core::Cell;
    state
        .board()
        .iter()
        .map(|c| match c {
            Cell::Empty => 0.0,
            Cell::Black => 1.0,
            Cell::White => -1.0,
        })
        .collect()
}

fn quick_config() -> MctsConfig {
    let mut cfg = MctsConfig::new(3, 3);
    cfg.timeout = Duration::from_millis(20);
    cfg.budget = 100;
    cfg.workers = 2;
    cfg.max_tree_size = 5_000;
    cfg
}

#[test]
fn search_completes_a_full_game_without_panicking() {
    let mut mcts = Mcts::new(quick_config(), NoopNetwork, TicTacToe::new()).unwrap();
    let mut game = TicTacToe::new();
    let mut moves = 0;
    while !game.ended().ended && moves < 9 {
        let mv = mcts.search(game.to_move());
        game = game.apply(zeroarena_core::PlayerMove::new(game.to_move(), mv));
        mcts.set_current(game.clone());
        moves += 1;
    }
    assert!(game.ended().ended || moves == 9);
}

#[test]
fn self_play_collects_examples_and_tallies_one_game() {
    let mut arena = Arena::new(
        TicTacToe::new(),
        Agent::new("A", NoopNetwork),
        Agent::new("B", NoopNetwork),
        quick_config(),
        encode,
        rand::SeedableRng::seed_from_u64(3),
    );
    let (winner, examples) = arena.play(true, None);
    assert_eq!(winner, None, "Arena::play always reports no winner");
    assert!(!examples.is_empty());
    assert_eq!(arena.a.games_played(), 1.0);
}

#[test]
fn a_short_training_run_produces_one_report_per_epoch() {
    let arena = Arena::new(
        TicTacToe::new(),
        Agent::new("champion", NoopNetwork),
        Agent::new("challenger", NoopNetwork),
        quick_config(),
        encode,
        rand::SeedableRng::seed_from_u64(4),
    );
    let config = TrainingConfig {
        epochs: 2,
        episodes: 1,
        arena_games: 1,
        ..TrainingConfig::default()
    };
    let mut learner = Learner::new(arena, config, 5);
    let reports = learner.run().unwrap();
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report.champion_wins + report.challenger_wins + report.draws, 1.0);
    }
}

#[test]
fn player_opponent_round_trips_for_both_colours() {
    assert_eq!(Player::Black.opponent(), Player::White);
    assert_eq!(Player::White.opponent(), Player::Black);
}
