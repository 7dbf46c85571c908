//! 3x3 Tic-Tac-Toe: the smallest complete, deterministic `GameState` that
//! still has forced wins, forced draws, and no passing at all.

use zeroarena_core::{Cell, Ended, GameState, MoveIndex, Player, PlayerMove, ZobristTable, NONE};

const SIZE: usize = 3;
const CELLS: usize = SIZE * SIZE;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-Tac-Toe board state, with full undo/redo history for the search
/// engine's root-reuse replay.
#[derive(Clone)]
pub struct TicTacToe {
    cells: [Cell; CELLS],
    to_move: Player,
    history: Vec<PlayerMove>,
    undone: Vec<PlayerMove>,
    zobrist: ZobristTable,
}

impl PartialEq for TicTacToe {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells && self.to_move == other.to_move
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELLS],
            to_move: Player::Black,
            history: Vec::new(),
            undone: Vec::new(),
            zobrist: ZobristTable::new(CELLS, 0x5A17AC7),
        }
    }

    fn winner(&self) -> Option<Player> {
        for line in LINES {
            let a = self.cells[line[0]];
            if a == Cell::Empty {
                continue;
            }
            if line.iter().all(|&i| self.cells[i] == a) {
                return Some(match a {
                    Cell::Black => Player::Black,
                    Cell::White => Player::White,
                    Cell::Empty => unreachable!(),
                });
            }
        }
        None
    }

    fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }
}

impl GameState for TicTacToe {
    fn board_size(&self) -> (usize, usize) {
        (SIZE, SIZE)
    }

    fn board(&self) -> Vec<Cell> {
        self.cells.to_vec()
    }

    fn action_space(&self) -> usize {
        CELLS
    }

    fn hash(&self) -> u32 {
        self.zobrist.hash_board(&self.cells) ^ if self.to_move == Player::White { 1 } else { 0 }
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
            .unwrap_or(PlayerMove::new(Player::Black, NONE))
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
        Ended {
            ended: self.is_full(),
            winner: None,
        }
    }

    fn check(&self, m: PlayerMove) -> bool {
        if m.player != self.to_move {
            return false;
        }
        if m.mv < 0 || m.mv as usize >= CELLS {
            return false;
        }
        self.winner().is_none() && self.cells[m.mv as usize] == Cell::Empty
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
        if i == 0 || i > self.history.len() {
            return self.board();
        }
        let mut replay = TicTacToe::new();
        for m in &self.history[..self.history.len() - i] {
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
        self.cells = [Cell::Empty; CELLS];
        self.to_move = Player::Black;
        self.history.clear();
        self.undone.clear();
    }
}

/// Interpret a move index as `(row, col)`, for display purposes.
pub fn coords(mv: MoveIndex) -> Option<(usize, usize)> {
    if mv < 0 || mv as usize >= CELLS {
        return None;
    }
    Some((mv as usize / SIZE, mv as usize % SIZE))
}
