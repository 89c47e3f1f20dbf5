//! Tic-tac-toe environment with tabular reinforcement-learning agents.
//!
//! Two learners train against a stationary random opponent: every-visit
//! Monte Carlo control with exploring starts, and one-step Q-learning with
//! epsilon-greedy exploration.

pub mod board;
pub mod cell;
pub mod codec;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod player;
pub mod players;
pub mod training;
pub mod visualize;

pub use crate::board::Board;
pub use crate::cell::{BOARD_SIDE, CELL_COUNT, Cell};
pub use crate::codec::{Action, Position, StateKey, action_to_coords, coords_to_action, encode};
pub use crate::config::{
    AppConfig, LoggingConfig, MonteCarloConfig, QLearningConfig, RewardConfig, TrainingConfig,
};
pub use crate::error::{
    AgentError, ConfigError, GameError, InvalidAction, InvalidStateKey, PersistenceError,
};
pub use crate::game::{Game, GameBuilder, GameConfig, GameOutcome, Seat};
pub use crate::metrics::{EpisodeOutcome, TrainingMetrics};
pub use crate::persistence::{AgentCheckpoint, Checkpoint, CheckpointMetadata};
pub use crate::player::{LearningAgent, Player};
pub use crate::players::registry::{create_player_from_spec, label_for_spec};
pub use crate::players::{HumanPlayer, MonteCarloAgent, QLearningAgent, RandomPlayer};
pub use crate::training::{Trainer, TrainingSummary};
pub use crate::visualize::{describe_outcome, render_board};
