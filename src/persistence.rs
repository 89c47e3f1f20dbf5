//! Agent checkpoints.
//!
//! A checkpoint blob is the 4-byte magic `TTRL`, a little-endian `u32`
//! format version and a bincode-encoded [`Checkpoint`]. Value tables are
//! ordered maps, so the same agent always encodes to the same bytes. The
//! agent's random source is not stored; restored agents draw a fresh one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PersistenceError;
use crate::metrics::TrainingMetrics;
use crate::player::{LearningAgent, Player};
use crate::players::{MonteCarloAgent, QLearningAgent};

pub const MAGIC: [u8; 4] = *b"TTRL";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

/// A learner of either algorithm, with its complete learned state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AgentCheckpoint {
    MonteCarlo(MonteCarloAgent),
    QLearning(QLearningAgent),
}

impl AgentCheckpoint {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentCheckpoint::MonteCarlo(_) => "monte-carlo",
            AgentCheckpoint::QLearning(_) => "q-learning",
        }
    }

    pub fn agent(&self) -> &dyn LearningAgent {
        match self {
            AgentCheckpoint::MonteCarlo(agent) => agent,
            AgentCheckpoint::QLearning(agent) => agent,
        }
    }

    pub fn agent_mut(&mut self) -> &mut dyn LearningAgent {
        match self {
            AgentCheckpoint::MonteCarlo(agent) => agent,
            AgentCheckpoint::QLearning(agent) => agent,
        }
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        self.agent().metrics()
    }

    /// Turns the stored agent into a player in the requested mode.
    pub fn into_player(self, training: bool) -> Box<dyn Player> {
        match self {
            AgentCheckpoint::MonteCarlo(mut agent) => {
                agent.set_training(training);
                Box::new(agent)
            }
            AgentCheckpoint::QLearning(mut agent) => {
                agent.set_training(training);
                Box::new(agent)
            }
        }
    }

    fn validate(&self) -> Result<(), PersistenceError> {
        let result = match self {
            AgentCheckpoint::MonteCarlo(agent) => agent.validate(),
            AgentCheckpoint::QLearning(agent) => agent.validate(),
        };
        result.map_err(PersistenceError::Malformed)?;
        let metrics = self.metrics();
        if metrics.rewards().len() != metrics.outcomes().len() {
            return Err(PersistenceError::Malformed(String::from(
                "metrics reward and outcome logs differ in length",
            )));
        }
        Ok(())
    }
}

impl From<MonteCarloAgent> for AgentCheckpoint {
    fn from(agent: MonteCarloAgent) -> Self {
        AgentCheckpoint::MonteCarlo(agent)
    }
}

impl From<QLearningAgent> for AgentCheckpoint {
    fn from(agent: QLearningAgent) -> Self {
        AgentCheckpoint::QLearning(agent)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episodes_trained: usize,
    pub training_seed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub metadata: CheckpointMetadata,
    pub agent: AgentCheckpoint,
}

impl Checkpoint {
    pub fn new(agent: impl Into<AgentCheckpoint>, metadata: CheckpointMetadata) -> Self {
        Self {
            metadata,
            agent: agent.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
            return Err(PersistenceError::BadMagic);
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
        let found = u32::from_le_bytes(version);
        if found != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion { found });
        }
        let payload = &bytes[HEADER_LEN..];
        let (checkpoint, read): (Checkpoint, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
        if read != payload.len() {
            return Err(PersistenceError::TrailingBytes {
                count: payload.len() - read,
            });
        }
        checkpoint.agent.validate()?;
        Ok(checkpoint)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        info!(
            path = %path.display(),
            agent = self.agent.kind(),
            episodes = self.metadata.episodes_trained,
            bytes = bytes.len(),
            "checkpoint saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let bytes = fs::read(path)?;
        let checkpoint = Self::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            agent = checkpoint.agent.kind(),
            episodes = checkpoint.metadata.episodes_trained,
            "checkpoint loaded"
        );
        Ok(checkpoint)
    }
}
