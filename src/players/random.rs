use rand::Rng;
use rand::seq::SliceRandom;

use crate::board::Board;
use crate::codec::Position;
use crate::error::AgentError;
use crate::player::Player;

/// Baseline player that samples uniformly from the empty cells.
pub struct RandomPlayer<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPlayer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Player for RandomPlayer<R> {
    fn name(&self) -> &str {
        "Random"
    }

    fn select_action(&mut self, board: &Board) -> Result<Position, AgentError> {
        board
            .empty_cells()
            .choose(&mut self.rng)
            .copied()
            .ok_or(AgentError::NoEmptyCell)
    }
}
