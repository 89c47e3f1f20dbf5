use std::fmt::Write;

use crate::board::Board;
use crate::game::{GameOutcome, Seat};

const SEPARATOR: &str = "---+---+---";

/// Renders the grid with row separators, one text line per row.
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{SEPARATOR}");
    for line in board.grid() {
        let _ = writeln!(out, " {} | {} | {}", line[0], line[1], line[2]);
        let _ = writeln!(out, "{SEPARATOR}");
    }
    out
}

/// Human readable summary of a finished game.
pub fn describe_outcome(outcome: GameOutcome, names: [&str; 2]) -> String {
    match outcome {
        GameOutcome::Winner(seat) => {
            let index = match seat {
                Seat::First => 0,
                Seat::Second => 1,
            };
            format!("{} ({}) wins", names[index], seat.symbol())
        }
        GameOutcome::Draw => String::from("draw"),
    }
}
