use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::cell::{BOARD_SIDE, Cell};
use crate::codec::{Position, StateKey, action_to_coords};
use crate::error::InvalidAction;

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(2, 0), (1, 1), (0, 2)],
];

/// Largest number of symbols placed by [`Board::random_opening`].
pub const MAX_OPENING_MOVES: usize = 8;

/// Tic-tac-toe grid indexed as `grid[row][col]`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Board {
    grid: [[Cell; BOARD_SIDE]; BOARD_SIDE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the board described by a state key.
    pub fn from_key(key: &StateKey) -> Self {
        let mut board = Self::new();
        for (action, cell) in key.cells().iter().enumerate() {
            let (col, row) = action_to_coords(action);
            board.grid[row][col] = *cell;
        }
        board
    }

    /// Random non-terminal position used to diversify training starts.
    ///
    /// Places between 0 and [`MAX_OPENING_MOVES`] alternating symbols on
    /// random empty cells and retries until neither symbol has a line.
    pub fn random_opening<R: Rng>(rng: &mut R) -> Self {
        loop {
            let mut board = Self::new();
            let mut symbol = if rng.gen_bool(0.5) { Cell::X } else { Cell::O };
            let moves = rng.gen_range(0..=MAX_OPENING_MOVES);
            for _ in 0..moves {
                let empty = board.empty_cells();
                let Some(position) = empty.choose(rng) else {
                    break;
                };
                board.grid[position.row][position.col] = symbol;
                symbol = symbol.opponent();
            }
            if !board.is_won(Cell::X) && !board.is_won(Cell::O) {
                return board;
            }
        }
    }

    pub fn grid(&self) -> &[[Cell; BOARD_SIDE]; BOARD_SIDE] {
        &self.grid
    }

    pub fn cell(&self, position: Position) -> Option<Cell> {
        if !position.in_bounds() {
            return None;
        }
        Some(self.grid[position.row][position.col])
    }

    /// Places `symbol` at `position` if the cell exists and is empty.
    pub fn place(&mut self, symbol: Cell, position: Position) -> Result<(), InvalidAction> {
        if !position.in_bounds() {
            return Err(InvalidAction::OutOfRange {
                col: position.col,
                row: position.row,
            });
        }
        let cell = &mut self.grid[position.row][position.col];
        if !cell.is_empty() {
            return Err(InvalidAction::Occupied {
                col: position.col,
                row: position.row,
            });
        }
        *cell = symbol;
        Ok(())
    }

    /// Coordinates of all empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Position> {
        let mut cells = Vec::with_capacity(BOARD_SIDE * BOARD_SIDE);
        for (row, line) in self.grid.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if cell.is_empty() {
                    cells.push(Position::new(col, row));
                }
            }
        }
        cells
    }

    pub fn is_won(&self, symbol: Cell) -> bool {
        if symbol.is_empty() {
            return false;
        }
        LINES.iter().any(|line| {
            line.iter()
                .all(|&(col, row)| self.grid[row][col] == symbol)
        })
    }

    pub fn is_full(&self) -> bool {
        self.grid.iter().flatten().all(|cell| !cell.is_empty())
    }

    pub fn count(&self, symbol: Cell) -> usize {
        self.grid.iter().flatten().filter(|&&cell| cell == symbol).count()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn place_rejects_occupied_and_out_of_range() {
        let mut board = Board::new();
        assert!(board.place(Cell::X, Position::new(1, 1)).is_ok());
        assert_eq!(
            board.place(Cell::O, Position::new(1, 1)),
            Err(InvalidAction::Occupied { col: 1, row: 1 })
        );
        assert_eq!(
            board.place(Cell::O, Position::new(3, 0)),
            Err(InvalidAction::OutOfRange { col: 3, row: 0 })
        );
        assert_eq!(board.cell(Position::new(1, 1)), Some(Cell::X));
    }

    #[test]
    fn detects_rows_columns_and_diagonals() {
        for line in LINES {
            let mut board = Board::new();
            for (col, row) in line {
                board.place(Cell::O, Position::new(col, row)).unwrap();
            }
            assert!(board.is_won(Cell::O));
            assert!(!board.is_won(Cell::X));
        }
    }

    #[test]
    fn empty_cells_are_row_major() {
        let mut board = Board::new();
        board.place(Cell::X, Position::new(0, 0)).unwrap();
        let cells = board.empty_cells();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0], Position::new(1, 0));
        assert_eq!(cells[2], Position::new(0, 1));
    }

    #[test]
    fn full_board_detection() {
        let mut board = Board::new();
        for (index, position) in Board::new().empty_cells().into_iter().enumerate() {
            assert!(!board.is_full());
            let symbol = if index % 2 == 0 { Cell::X } else { Cell::O };
            board.place(symbol, position).unwrap();
        }
        assert!(board.is_full());
    }

    #[test]
    fn random_openings_are_never_decided() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let board = Board::random_opening(&mut rng);
            assert!(!board.is_won(Cell::X));
            assert!(!board.is_won(Cell::O));
            assert!(!board.is_full());
            let placed = board.count(Cell::X) + board.count(Cell::O);
            assert!(placed <= MAX_OPENING_MOVES);
            assert!(board.count(Cell::X).abs_diff(board.count(Cell::O)) <= 1);
        }
    }
}
