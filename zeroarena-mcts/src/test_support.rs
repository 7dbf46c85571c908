//! A minimal `GameState` fixture shared by this crate's unit tests: a
//! square board where every still-empty cell is a legal move and the game
//! ends the instant any row, column, or diagonal is filled by one colour
//! (or the board fills up, for a draw). Good enough to exercise selection,
//! expansion, and root reuse without pulling in a full game crate.

#![cfg(test)]

use zeroarena_core::{Cell, Ended, GameState, Player, PlayerMove, PASS};

#[derive(Clone, PartialEq, Debug)]
pub struct ToyState {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    to_move: Player,
    history: Vec<PlayerMove>,
    undone: Vec<PlayerMove>,
}

impl ToyState {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
            to_move: Player::Black,
            history: Vec::new(),
            undone: Vec::new(),
        }
    }

    fn winner(&self) -> Option<Player> {
        let lines = self.lines();
        for line in lines {
            let first = self.cells[line[0]];
            if first == Cell::Empty {
                continue;
            }
            if line.iter().all(|&i| self.cells[i] == first) {
                return Some(match first {
                    Cell::Black => Player::Black,
                    Cell::White => Player::White,
                    Cell::Empty => unreachable!(),
                });
            }
        }
        None
    }

    fn lines(&self) -> Vec<Vec<usize>> {
        let mut lines = Vec::new();
        for r in 0..self.rows {
            lines.push((0..self.cols).map(|c| r * self.cols + c).collect());
        }
        for c in 0..self.cols {
            lines.push((0..self.rows).map(|r| r * self.cols + c).collect());
        }
        if self.rows == self.cols {
            lines.push((0..self.rows).map(|i| i * self.cols + i).collect());
            lines.push((0..self.rows).map(|i| i * self.cols + (self.cols - 1 - i)).collect());
        }
        lines
    }
}

impl GameState for ToyState {
    fn board_size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn board(&self) -> Vec<Cell> {
        self.cells.clone()
    }

    fn action_space(&self) -> usize {
        self.rows * self.cols
    }

    fn hash(&self) -> u32 {
        self.cells
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, c)| match c {
                Cell::Empty => acc,
                Cell::Black => acc ^ (i as u32 + 1),
                Cell::White => acc ^ ((i as u32 + 1) << 16),
            })
    }

    fn to_move(&self) -> Player {
        self.to_move
    }

    fn set_to_move(&mut self, player: Player) {
        self.to_move = player;
    }

    fn passes(&self) -> u32 {
        0
    }

    fn move_number(&self) -> u32 {
        self.history.len() as u32
    }

    fn last_move(&self) -> PlayerMove {
        self.history
            .last()
            .copied()
            .unwrap_or(PlayerMove::new(Player::Black, zeroarena_core::NONE))
    }

    fn score(&self, player: Player) -> f32 {
        match self.winner() {
            Some(w) if w == player => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }

    fn ended(&self) -> Ended {
        if let Some(w) = self.winner() {
            return Ended {
                ended: true,
                winner: Some(w),
            };
        }
        if self.cells.iter().all(|&c| c != Cell::Empty) {
            return Ended {
                ended: true,
                winner: None,
            };
        }
        Ended {
            ended: false,
            winner: None,
        }
    }

    fn check(&self, m: PlayerMove) -> bool {
        if m.mv == PASS || m.mv < 0 {
            return false;
        }
        (m.mv as usize) < self.cells.len() && self.cells[m.mv as usize] == Cell::Empty
    }

    fn apply(&self, m: PlayerMove) -> Self {
        let mut next = self.clone();
        next.cells[m.mv as usize] = match m.player {
            Player::Black => Cell::Black,
            Player::White => Cell::White,
        };
        next.to_move = m.player.opponent();
        next.history.push(m);
        next.undone.clear();
        next
    }

    fn historical(&self, i: usize) -> Vec<Cell> {
        if i == 0 {
            return self.board();
        }
        let mut replay = ToyState::new(self.rows, self.cols);
        let upto = self.history.len().saturating_sub(i);
        for m in &self.history[..upto] {
            replay = replay.apply(*m);
        }
        replay.board()
    }

    fn undo_last_move(&mut self) {
        if let Some(m) = self.history.pop() {
            self.cells[m.mv as usize] = Cell::Empty;
            self.to_move = m.player;
            self.undone.push(m);
        }
    }

    fn fwd(&mut self) {
        if let Some(m) = self.undone.pop() {
            self.cells[m.mv as usize] = match m.player {
                Player::Black => Cell::Black,
                Player::White => Cell::White,
            };
            self.to_move = m.player.opponent();
            self.history.push(m);
        }
    }

    fn reset(&mut self) {
        self.cells = vec![Cell::Empty; self.rows * self.cols];
        self.to_move = Player::Black;
        self.history.clear();
        self.undone.clear();
    }
}
