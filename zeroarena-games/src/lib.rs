//! Concrete `GameState` implementations used to exercise and demonstrate
//! the search and training engines.
//!
//! Rule implementations are explicitly out of scope for the core engine;
//! this crate is the fixture that plugs into it, not part of it.

pub mod tictactoe;

pub use tictactoe::TicTacToe;
