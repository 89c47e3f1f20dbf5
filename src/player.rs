use crate::board::Board;
use crate::codec::Position;
use crate::error::AgentError;
use crate::metrics::TrainingMetrics;

/// Turn-taking contract between the game loop and any participant.
///
/// The game calls `begin_episode` on both players before the first move,
/// then `select_action` for every turn, `on_invalid_action` whenever the
/// returned cell cannot be played (followed by a new `select_action`), and
/// exactly one of the outcome hooks when the game is decided.
pub trait Player {
    fn name(&self) -> &str;

    fn begin_episode(&mut self) {}

    fn select_action(&mut self, board: &Board) -> Result<Position, AgentError>;

    fn on_invalid_action(&mut self) {}

    fn on_win(&mut self) {}

    fn on_loss(&mut self) {}

    fn on_draw(&mut self) {}
}

/// A player that improves its policy from the outcome hooks.
pub trait LearningAgent: Player {
    /// Switches between learning (exploring, updating values) and greedy play.
    fn set_training(&mut self, training: bool);

    fn is_training(&self) -> bool;

    fn metrics(&self) -> &TrainingMetrics;
}
