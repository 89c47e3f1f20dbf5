use std::path::PathBuf;

use thiserror::Error;

use crate::codec::StateKey;

/// Rejected move placement. Recoverable: the same player is asked again.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("cell ({col}, {row}) is outside the board")]
    OutOfRange { col: usize, row: usize },
    #[error("cell ({col}, {row}) is already occupied")]
    Occupied { col: usize, row: usize },
}

/// Failures raised by a player while choosing a move.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AgentError {
    /// Turn limit reached during training. The value update has already been
    /// applied; the training loop drops the episode and continues.
    #[error("episode aborted after {steps} steps")]
    EpisodeAborted { steps: usize },
    #[error("no policy entry for state \"{0}\"")]
    UndefinedPolicyState(StateKey),
    #[error("no empty cell left to play")]
    NoEmptyCell,
}

/// Errors that can occur while running a game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("player made {attempts} invalid moves in a row")]
    TooManyInvalidActions { attempts: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}

impl GameError {
    /// True for the turn-limit control signal, which is not a real failure.
    pub fn is_episode_aborted(&self) -> bool {
        matches!(self, GameError::Agent(AgentError::EpisodeAborted { .. }))
    }
}

/// Text that does not describe a board.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidStateKey {
    #[error("state key must have 9 cells, found {0}")]
    Length(usize),
    #[error("unknown cell symbol {0:?}")]
    Symbol(char),
}

/// Errors raised while writing or reading agent checkpoints.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("failed to decode checkpoint: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("not a checkpoint file (bad magic bytes)")]
    BadMagic,
    #[error("unsupported checkpoint version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("{count} unexpected trailing bytes after checkpoint")]
    TrailingBytes { count: usize },
    #[error("malformed checkpoint: {0}")]
    Malformed(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}
