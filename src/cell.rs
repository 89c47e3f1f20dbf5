use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of the square board.
pub const BOARD_SIDE: usize = 3;
/// Number of cells on the board, and therefore the size of the action space.
pub const CELL_COUNT: usize = BOARD_SIDE * BOARD_SIDE;

/// Content of a single board cell.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum Cell {
    #[default]
    Empty,
    X,
    O,
}

impl Cell {
    /// Returns true if no symbol occupies the cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The opposing symbol. `Empty` maps to itself.
    #[inline]
    pub fn opponent(&self) -> Cell {
        match self {
            Cell::X => Cell::O,
            Cell::O => Cell::X,
            Cell::Empty => Cell::Empty,
        }
    }

    /// Single-character rendering used by state keys and the text board.
    #[inline]
    pub fn as_char(&self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    /// Parses the rendering produced by [`Cell::as_char`].
    pub fn from_char(c: char) -> Option<Cell> {
        match c {
            ' ' => Some(Cell::Empty),
            'X' => Some(Cell::X),
            'O' => Some(Cell::O),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
