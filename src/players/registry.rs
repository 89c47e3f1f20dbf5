use std::error::Error;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::persistence::Checkpoint;
use crate::player::Player;
use crate::players::{HumanPlayer, RandomPlayer};

/// Returns a normalized label for a player spec (the head token before any ':').
pub fn label_for_spec(spec: &str) -> String {
    spec.split(':')
        .next()
        .unwrap_or(spec)
        .trim()
        .to_ascii_lowercase()
}

/// Create a player instance from a CLI-style spec.
/// Supported specs:
/// - human[:name]
/// - random[:seed]
/// - montecarlo:<checkpoint>
/// - qlearning:<checkpoint>
///
/// Trained agents are loaded in greedy (non-training) mode.
pub fn create_player_from_spec(
    spec: &str,
    index: usize,
    seed: u64,
) -> Result<Box<dyn Player>, Box<dyn Error>> {
    let label = label_for_spec(spec);
    let argument = spec.split_once(':').map(|(_, value)| value.trim());
    match label.as_str() {
        "human" => {
            let name = argument
                .map(str::to_string)
                .unwrap_or_else(|| format!("Human {index}"));
            Ok(Box::new(HumanPlayer::new(name)))
        }
        "random" => {
            let custom_seed = argument
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(seed ^ ((index as u64 + 1) * 0x9E37_79B9));
            Ok(Box::new(RandomPlayer::new(StdRng::seed_from_u64(custom_seed))))
        }
        "montecarlo" | "qlearning" => {
            let path = argument.ok_or_else(|| format!("{label} requires a checkpoint path"))?;
            let checkpoint = Checkpoint::load(Path::new(path))?;
            let expected = if label == "montecarlo" {
                "monte-carlo"
            } else {
                "q-learning"
            };
            if checkpoint.agent.kind() != expected {
                return Err(format!(
                    "{path} holds a {} agent, not {expected}",
                    checkpoint.agent.kind()
                )
                .into());
            }
            Ok(checkpoint.agent.into_player(false))
        }
        _ => Err(format!("unrecognized player spec: {spec}").into()),
    }
}
