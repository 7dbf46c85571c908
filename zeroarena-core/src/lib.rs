//! ZeroArena Core - the abstract game contract
//!
//! This crate provides nothing but the contract the rest of the workspace
//! builds on:
//! - [`game::GameState`], the trait a concrete board game implements
//! - Zobrist-style incremental board hashing helpers
//! - the shared engine error type

pub mod error;
pub mod game;
pub mod zobrist;

pub use error::EngineError;
pub use game::{Cell, Ended, GameState, MoveIndex, Player, PlayerMove, NONE, PASS, RESIGN};
pub use zobrist::ZobristTable;
