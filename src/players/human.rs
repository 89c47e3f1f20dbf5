use std::io::{self, Write};

use crate::board::Board;
use crate::cell::CELL_COUNT;
use crate::codec::Position;
use crate::error::AgentError;
use crate::player::Player;
use crate::visualize::render_board;

/// Interactive player that queries a human via standard input.
pub struct HumanPlayer {
    name: String,
}

impl HumanPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for HumanPlayer {
    fn default() -> Self {
        Self::new("Human")
    }
}

impl Player for HumanPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin_episode(&mut self) {
        println!("\n=== New game for {} ===", self.name);
    }

    fn select_action(&mut self, board: &Board) -> Result<Position, AgentError> {
        loop {
            println!("\n=== {}'s turn ===", self.name);
            println!("{}", render_board(board));
            println!("Cells are numbered 0-8 row by row. Type 'q' to quit.");
            print!("Pick a position: ");
            if io::stdout().flush().is_err() {
                eprintln!("failed to flush stdout");
            }
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                eprintln!("failed to read input");
                continue;
            }
            let trimmed = input.trim();
            if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
                println!("Exiting game at user's request.");
                std::process::exit(0);
            }
            let Ok(choice) = trimmed.parse::<usize>() else {
                println!("Invalid input: '{trimmed}'. Please enter a number.");
                continue;
            };
            if choice >= CELL_COUNT {
                println!("Position out of range. Please choose 0-8.");
                continue;
            }
            return Ok(Position::from_action(choice));
        }
    }

    fn on_invalid_action(&mut self) {
        println!("That cell is already taken.");
    }

    fn on_win(&mut self) {
        println!("{} wins!", self.name);
    }

    fn on_loss(&mut self) {
        println!("{} loses.", self.name);
    }

    fn on_draw(&mut self) {
        println!("Draw.");
    }
}
