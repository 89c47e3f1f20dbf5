//! Canonical board keys and the action <-> coordinate mapping.
//!
//! A [`StateKey`] is the row-major sequence of the nine cell symbols. No
//! symmetry reduction is applied: rotations and reflections of a position
//! are distinct keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::cell::{BOARD_SIDE, CELL_COUNT, Cell};
use crate::error::InvalidStateKey;

/// Linear cell index in `0..CELL_COUNT`, `row * 3 + col`.
pub type Action = usize;

/// Board coordinates of a cell. `col` is the x axis, `row` the y axis.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub col: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    pub fn from_action(action: Action) -> Self {
        let (col, row) = action_to_coords(action);
        Self { col, row }
    }

    pub fn action(&self) -> Action {
        coords_to_action(self.col, self.row)
    }

    /// Whether both coordinates fall on the board.
    pub fn in_bounds(&self) -> bool {
        self.col < BOARD_SIDE && self.row < BOARD_SIDE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// `(col, row)` for a linear action index.
#[inline]
pub fn action_to_coords(action: Action) -> (usize, usize) {
    (action % BOARD_SIDE, action / BOARD_SIDE)
}

/// Linear action index for `(col, row)`.
#[inline]
pub fn coords_to_action(col: usize, row: usize) -> Action {
    col + row * BOARD_SIDE
}

/// Canonical, order-preserving key of a board's contents.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct StateKey([Cell; CELL_COUNT]);

impl StateKey {
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.0
    }

    /// Empty cells as actions, in ascending order.
    pub fn empty_actions(&self) -> Vec<Action> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(action, _)| action)
            .collect()
    }
}

/// Encodes the board into its canonical key.
pub fn encode(board: &Board) -> StateKey {
    let mut cells = [Cell::Empty; CELL_COUNT];
    for (row, line) in board.grid().iter().enumerate() {
        for (col, cell) in line.iter().enumerate() {
            cells[coords_to_action(col, row)] = *cell;
        }
    }
    StateKey(cells)
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = InvalidStateKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != CELL_COUNT {
            return Err(InvalidStateKey::Length(chars.len()));
        }
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (index, c) in chars.into_iter().enumerate() {
            cells[index] = Cell::from_char(c).ok_or(InvalidStateKey::Symbol(c))?;
        }
        Ok(Self(cells))
    }
}
