//! zeroarena CLI - a thin binary exercising the search and training crates.
//!
//! Concrete renderers, a GTP adapter, and a real trained network are all
//! out of scope for this workspace; the commands here wire the library up
//! against `TicTacToe` and a no-op [`NoopNetwork`] stand-in so the engine
//! can be driven and inspected end to end.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use zeroarena_core::{GameState, Player, PlayerMove, PASS, RESIGN};
use zeroarena_games::{tictactoe, TicTacToe};
use zeroarena_mcts::{DummyInferer, Inference, Inferer, Mcts, MctsConfig};
use zeroarena_train::persist::Checkpoint;
use zeroarena_train::{
    Agent, Arena, Example, Learner, Network, TrainError, TrainingConfig,
};

#[derive(Parser)]
#[command(name = "zeroarena")]
#[command(about = "AlphaZero-style self-play search and training, generic over the game")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play self-play games and report collected examples.
    SelfPlay {
        #[arg(long, default_value = "1")]
        games: usize,
        #[arg(long, default_value = "200")]
        budget: i32,
    },
    /// Run a short training loop (self-play, train, evaluate, promote).
    Train {
        #[arg(long, default_value = "1")]
        epochs: usize,
        #[arg(long, default_value = "1")]
        episodes: usize,
        #[arg(long, default_value = "1")]
        arena_games: usize,
        /// Write a checkpoint envelope here after the run completes. The
        /// champion blob is empty with the no-op network this CLI wires up;
        /// a real `Network` would serialise its own weights into it.
        #[arg(long)]
        checkpoint: Option<std::path::PathBuf>,
    },
    /// Play one game, engine vs engine, printing the board after each move.
    Play {
        #[arg(long, default_value = "200")]
        budget: i32,
    },
    /// Time a fixed search budget and report playouts per second.
    Bench {
        #[arg(long, default_value = "2000")]
        budget: i32,
    },
}

/// Stands in for a trained network: infers with [`DummyInferer`]'s uniform
/// policy / colour-sign value, and training is a no-op. Wiring a real
/// network in here is explicitly out of scope for this workspace.
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

fn bench_config(budget: i32) -> MctsConfig {
    let mut cfg = MctsConfig::new(3, 3);
    cfg.timeout = Duration::from_secs(5);
    cfg.budget = budget;
    cfg
}

fn print_board(state: &TicTacToe) {
    use zeroarena_core::Cell;
    let board = state.board();
    for row in 0..3 {
        let line: String = (0..3)
            .map(|col| match board[row * 3 + col] {
                Cell::Empty => '.',
                Cell::Black => 'X',
                Cell::White => 'O',
            })
            .collect();
        println!("{line}");
    }
    println!();
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::SelfPlay { games, budget } => {
            let mut arena = Arena::new(
                TicTacToe::new(),
                Agent::new("A", NoopNetwork),
                Agent::new("B", NoopNetwork),
                bench_config(budget),
                encode,
                rand::SeedableRng::seed_from_u64(0),
            );
            let mut total_examples = 0usize;
            for game in 0..games {
                let (_, examples) = arena.play(true, None);
                info!(game, collected = examples.len(), "self-play game done");
                total_examples += examples.len();
            }
            println!(
                "played {games} self-play game(s), collected {total_examples} example(s)"
            );
            println!(
                "A: {} wins, {} losses, {} draws",
                arena.a.wins, arena.a.loss, arena.a.draw
            );
        }
        Commands::Train {
            epochs,
            episodes,
            arena_games,
            checkpoint,
        } => {
            let arena = Arena::new(
                TicTacToe::new(),
                Agent::new("champion", NoopNetwork),
                Agent::new("challenger", NoopNetwork),
                bench_config(200),
                encode,
                rand::SeedableRng::seed_from_u64(0),
            );
            let config = TrainingConfig {
                epochs,
                episodes,
                arena_games,
                ..TrainingConfig::default()
            };
            config.validate()?;
            let mut learner = Learner::new(arena, config, 1);
            let reports = learner.run()?;
            let last_epoch = reports.last().map(|r| r.epoch).unwrap_or(0);
            for report in reports {
                info!(
                    epoch = report.epoch,
                    promoted = report.promoted,
                    champion_wins = report.champion_wins,
                    challenger_wins = report.challenger_wins,
                    draws = report.draws,
                    "epoch done"
                );
                println!(
                    "epoch {}: promoted={} champion_wins={} challenger_wins={} draws={}",
                    report.epoch,
                    report.promoted,
                    report.champion_wins,
                    report.challenger_wins,
                    report.draws
                );
            }
            if let Some(path) = checkpoint {
                Checkpoint::new(last_epoch, Vec::new()).save(&path)?;
                println!("wrote checkpoint to {}", path.display());
            }
        }
        Commands::Play { budget } => {
            let mut black = Mcts::new(bench_config(budget), NoopNetwork, TicTacToe::new())?;
            let mut white = Mcts::new(bench_config(budget), NoopNetwork, TicTacToe::new())?;
            let mut game = TicTacToe::new();
            print_board(&game);
            loop {
                let ended = game.ended();
                if ended.ended {
                    match ended.winner {
                        Some(Player::Black) => println!("X wins"),
                        Some(Player::White) => println!("O wins"),
                        None => println!("draw"),
                    }
                    break;
                }
                let to_move = game.to_move();
                let mover = if to_move == Player::Black {
                    &mut black
                } else {
                    &mut white
                };
                let mv = mover.search(to_move);
                if mv == RESIGN {
                    println!("{:?} resigns", to_move);
                    break;
                }
                if mv != PASS {
                    if let Some((row, col)) = tictactoe::coords(mv) {
                        println!("{:?} plays ({row}, {col})", to_move);
                    }
                }
                game = game.apply(PlayerMove::new(to_move, mv));
                black.set_current(game.clone());
                white.set_current(game.clone());
                print_board(&game);
            }
        }
        Commands::Bench { budget } => {
            let mut mcts = Mcts::new(bench_config(budget), NoopNetwork, TicTacToe::new())?;
            let start = std::time::Instant::now();
            mcts.search(Player::Black);
            let elapsed = start.elapsed();
            let playouts = mcts.last_playouts();
            let rate = playouts as f64 / elapsed.as_secs_f64().max(1e-6);
            println!(
                "{playouts} playouts in {:.3}s ({rate:.0} playouts/sec), {} nodes",
                elapsed.as_secs_f64(),
                mcts.node_count()
            );
        }
    }

    Ok(())
}
