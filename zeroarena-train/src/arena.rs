//! Self-play: two champions alternate games, colours re-assigned by a coin
//! flip each game, producing both a win/loss/draw tally and (optionally) a
//! batch of training examples.
//!
//! Grounded on the source engine's `Arena.Play` / `Arena.Episode`: the coin
//! flip only decides which side holds Black (the game itself always starts
//! with Black to move), each game gets a fresh search tree per side, and the
//! function's literal return value always reports "no winner" even though a
//! winner is computed internally for stats and example labelling - preserved
//! here rather than "corrected" (see `DESIGN.md`).

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use zeroarena_core::{GameState, Player, PlayerMove, PASS, RESIGN};
use zeroarena_mcts::{Mcts, MctsConfig};

use crate::agent::Agent;
use crate::example::{is_valid, Augmenter, Example, GameEncoder};
use crate::trainer::Network;

/// Two same-game colour tags used as an `Example.value` placeholder until
/// the winner is known. Any two distinct, never-legitimately-produced
/// values would do; these mirror the source engine's raw `Player` constants.
fn colour_tag(player: Player) -> f32 {
    match player {
        Player::Black => 1.0,
        Player::White => 2.0,
    }
}

/// Plays games between two agents' champions, optionally recording training
/// examples from every move.
pub struct Arena<G: GameState, N: Network<G>> {
    pub template: G,
    pub a: Agent<N>,
    pub b: Agent<N>,
    pub config: MctsConfig,
    pub encoder: GameEncoder<G>,
    rng: ChaCha8Rng,
}

impl<G: GameState, N: Network<G>> Arena<G, N> {
    pub fn new(
        template: G,
        a: Agent<N>,
        b: Agent<N>,
        config: MctsConfig,
        encoder: GameEncoder<G>,
        rng: ChaCha8Rng,
    ) -> Self {
        config
            .validate()
            .expect("Arena requires an already-valid MctsConfig");
        Self {
            template,
            a,
            b,
            config,
            encoder,
            rng,
        }
    }

    /// Play one game. Returns `(None, examples)`: the winner is tracked
    /// internally for stats and example labelling but, per the source
    /// engine, is never surfaced through the return value itself.
    pub fn play(&mut self, record: bool, augmenter: Option<Augmenter>) -> (Option<Player>, Vec<Example>) {
        let a_is_black = self.rng.gen_bool(0.5);
        let (a_player, b_player) = if a_is_black {
            (Player::Black, Player::White)
        } else {
            (Player::White, Player::Black)
        };
        self.a.player = a_player;
        self.b.player = b_player;

        let mut game = self.template.clone();
        game.set_to_move(Player::Black);

        let seed_a = self.rng.gen::<u64>();
        let seed_b = self.rng.gen::<u64>();
        let mut mcts_a = Mcts::new(self.config.clone(), self.a.champion.clone(), game.clone())
            .expect("arena config already validated")
            .with_seed(seed_a);
        let mut mcts_b = Mcts::new(self.config.clone(), self.b.champion.clone(), game.clone())
            .expect("arena config already validated")
            .with_seed(seed_b);

        let mut examples = Vec::new();
        let mut consecutive_passes = 0u32;

        loop {
            if game.ended().ended || consecutive_passes >= 2 {
                break;
            }

            let to_move = game.to_move();
            let mover = if to_move == a_player {
                &mut mcts_a
            } else {
                &mut mcts_b
            };

            let mv = mover.search(to_move);

            if record && mv != RESIGN {
                let example = Example {
                    board: (self.encoder)(&game),
                    policy: mover.policies(),
                    value: colour_tag(to_move),
                };
                if is_valid(&example) {
                    match augmenter {
                        Some(aug) => examples.extend(aug(&example)),
                        None => examples.push(example),
                    }
                }
            }

            if mv == RESIGN {
                let winner = Some(to_move.opponent());
                self.finish(winner, a_player);
                self.rewrite_values(&mut examples, winner);
                return (None, examples);
            }

            consecutive_passes = if mv == PASS { consecutive_passes + 1 } else { 0 };

            game = game.apply(PlayerMove::new(to_move, mv));
            mcts_a.set_current(game.clone());
            mcts_b.set_current(game.clone());
        }

        let ended = game.ended();
        self.finish(ended.winner, a_player);
        self.rewrite_values(&mut examples, ended.winner);
        (None, examples)
    }

    fn finish(&mut self, winner: Option<Player>, a_player: Player) {
        match winner {
            None => {
                self.a.draw += 1.0;
                self.b.draw += 1.0;
            }
            Some(w) if w == a_player => {
                self.a.wins += 1.0;
                self.b.loss += 1.0;
            }
            Some(_) => {
                self.a.loss += 1.0;
                self.b.wins += 1.0;
            }
        }
    }

    /// Rewrite each example's placeholder colour tag into `{-1, 0, 1}` now
    /// that the winner is known.
    fn rewrite_values(&self, examples: &mut [Example], winner: Option<Player>) {
        let winner_tag = winner.map(colour_tag);
        for ex in examples.iter_mut() {
            ex.value = match winner_tag {
                None => 0.0,
                Some(tag) if ex.value == tag => 1.0,
                Some(_) => -1.0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zeroarena_games::TicTacToe;
    use zeroarena_mcts::DummyInferer;

    #[derive(Clone, Default)]
    struct StubNetwork;

    impl zeroarena_mcts::Inferer<TicTacToe> for StubNetwork {
        fn infer(&self, state: &TicTacToe) -> zeroarena_mcts::Inference {
            DummyInferer.infer(state)
        }
    }

    impl Network<TicTacToe> for StubNetwork {
        fn train(
            &mut self,
            _examples: &[Example],
            _batch_size: usize,
            _iterations: usize,
        ) -> Result<(), crate::trainer::TrainError> {
            Ok(())
        }
    }

    fn small_config() -> MctsConfig {
        let mut cfg = MctsConfig::new(3, 3);
        cfg.timeout = std::time::Duration::from_millis(10);
        cfg.budget = 50;
        cfg.workers = 1;
        cfg.max_tree_size = 2_000;
        cfg
    }

    fn encode(state: &TicTacToe) -> Vec<f32> {
        state
            .board()
            .iter()
            .map(|c| match c {
                zeroarena_core::Cell::Empty => 0.0,
                zeroarena_core::Cell::Black => 1.0,
                zeroarena_core::Cell::White => -1.0,
            })
            .collect()
    }

    fn arena() -> Arena<TicTacToe, StubNetwork> {
        Arena::new(
            TicTacToe::new(),
            Agent::new("A", StubNetwork),
            Agent::new("B", StubNetwork),
            small_config(),
            encode,
            rand::SeedableRng::seed_from_u64(7),
        )
    }

    #[test]
    fn play_always_reports_no_winner_regardless_of_outcome() {
        let mut arena = arena();
        let (winner, _) = arena.play(false, None);
        assert_eq!(winner, None);
    }

    #[test]
    fn play_updates_exactly_one_side_of_the_tally_per_game() {
        let mut arena = arena();
        arena.play(false, None);
        let total = arena.a.games_played();
        assert_eq!(total, 1.0);
        assert_eq!(arena.b.games_played(), 1.0);
    }

    #[test]
    fn recorded_example_values_are_rewritten_to_signed_outcomes() {
        let mut arena = arena();
        let (_, examples) = arena.play(true, None);
        for ex in &examples {
            assert!(ex.value == -1.0 || ex.value == 0.0 || ex.value == 1.0);
        }
    }

    #[test]
    fn no_recording_produces_no_examples() {
        let mut arena = arena();
        let (_, examples) = arena.play(false, None);
        assert!(examples.is_empty());
    }
}
