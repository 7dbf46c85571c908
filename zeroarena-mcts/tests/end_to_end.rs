//! Scenario-level properties exercised end to end over `TicTacToe`, rather
//! than against unit fixtures.

use std::time::Duration;

use zeroarena_core::{GameState, Player, PlayerMove};
use zeroarena_games::TicTacToe;
use zeroarena_mcts::{DummyInferer, Mcts, MctsConfig};

fn mv(player: Player, i: i32) -> PlayerMove {
    PlayerMove::new(player, i)
}

fn forced_win_config() -> MctsConfig {
    let mut cfg = MctsConfig::new(3, 3);
    cfg.puct = 1.0;
    cfg.timeout = Duration::from_millis(500);
    cfg.budget = 10_000;
    cfg
}

/// Scenario 1: `[O,O,.,X,X,.,.,.,.]`, Cross to move - the only winning move
/// completes the row at index 5.
#[test]
fn forced_win_in_one_is_found() {
    let mut game = TicTacToe::new();
    game = game.apply(mv(Player::Black, 3));
    game = game.apply(mv(Player::White, 0));
    game = game.apply(mv(Player::Black, 4));
    game = game.apply(mv(Player::White, 1));
    assert_eq!(game.to_move(), Player::Black);

    let mut mcts = Mcts::new(forced_win_config(), DummyInferer, game).unwrap();
    let best = mcts.search(Player::Black);
    assert_eq!(best, 5);
}

fn self_play_config() -> MctsConfig {
    let mut cfg = MctsConfig::new(3, 3);
    cfg.timeout = Duration::from_millis(150);
    cfg.budget = 4_000;
    cfg.workers = 2;
    cfg.max_tree_size = 50_000;
    cfg
}

/// Scenario 2: two uniform-policy dummy-inferer engines playing 20 full
/// games from the empty board must draw at least half the time - optimal
/// play from both sides never loses Tic-Tac-Toe.
#[test]
fn uniform_self_play_mostly_draws() {
    let mut black_wins = 0;
    let mut white_wins = 0;
    let mut draws = 0;

    for seed in 0..20u64 {
        let mut game = TicTacToe::new();
        let mut black = Mcts::new(self_play_config(), DummyInferer, game.clone())
            .unwrap()
            .with_seed(seed);
        let mut white = Mcts::new(self_play_config(), DummyInferer, game.clone())
            .unwrap()
            .with_seed(seed.wrapping_add(1_000));

        loop {
            let ended = game.ended();
            if ended.ended {
                match ended.winner {
                    Some(Player::Black) => black_wins += 1,
                    Some(Player::White) => white_wins += 1,
                    None => draws += 1,
                }
                break;
            }
            let to_move = game.to_move();
            let mover = if to_move == Player::Black {
                &mut black
            } else {
                &mut white
            };
            let m = mover.search(to_move);
            game = game.apply(PlayerMove::new(to_move, m));
            black.set_current(game.clone());
            white.set_current(game.clone());
        }
    }

    assert_eq!(black_wins + white_wins + draws, 20);
    assert!(draws >= 10, "expected at least 10 draws, got {draws}");
}
