use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Episode length at which training episodes are forcibly terminated.
pub const DEFAULT_MAX_STEPS: usize = 20;
pub const DEFAULT_DISCOUNT: f64 = 0.9;

/// Reward shaping shared by both learners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
    /// Cost of time, charged for every move that did not end the episode.
    pub step: f64,
    /// Charged when the turn limit aborts the episode.
    pub abort: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            win: 10.0,
            loss: -10.0,
            draw: -2.0,
            step: -0.1,
            abort: -50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub discount: f64,
    pub max_steps: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QLearningConfig {
    pub learning_rate: f64,
    pub exploration_rate: f64,
    pub discount: f64,
    pub max_steps: usize,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            exploration_rate: 0.2,
            discount: DEFAULT_DISCOUNT,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Log progress every N episodes; 0 disables progress lines.
    pub report_every: usize,
    /// Moving-average window for reported statistics.
    pub window: usize,
    /// Write a checkpoint every N episodes; 0 disables intermediate checkpoints.
    pub checkpoint_every: usize,
    /// Start each episode from a random non-terminal position.
    pub random_opening: bool,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 100_000,
            report_every: 1_000,
            window: 100,
            checkpoint_every: 0,
            random_opening: true,
            seed: 0x7E57_5EED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monte_carlo: MonteCarloConfig,
    pub q_learning: QLearningConfig,
    pub rewards: RewardConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.monte_carlo.validate()?;
        self.q_learning.validate()?;
        self.rewards.validate()?;
        if self.training.episodes == 0 {
            return Err(ConfigError::Validation(
                "training.episodes must be > 0".into(),
            ));
        }
        if self.training.window == 0 {
            return Err(ConfigError::Validation(
                "training.window must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if [self.win, self.loss, self.draw, self.step, self.abort]
            .iter()
            .any(|r| !r.is_finite())
        {
            return Err(ConfigError::Validation("rewards must be finite".into()));
        }
        Ok(())
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_discount("monte_carlo.discount", self.discount)?;
        if self.max_steps == 0 {
            return Err(ConfigError::Validation(
                "monte_carlo.max_steps must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl QLearningConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_discount("q_learning.discount", self.discount)?;
        if self.max_steps == 0 {
            return Err(ConfigError::Validation(
                "q_learning.max_steps must be > 0".into(),
            ));
        }
        let alpha = self.learning_rate;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::Validation(
                "q_learning.learning_rate must be in (0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(ConfigError::Validation(
                "q_learning.exploration_rate must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// NaN fails the range check.
fn check_discount(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be in [0, 1]")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [q_learning]
            exploration_rate = 0.05

            [training]
            episodes = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.q_learning.exploration_rate, 0.05);
        assert_eq!(config.q_learning.learning_rate, 0.1);
        assert_eq!(config.training.episodes, 500);
        assert_eq!(config.rewards, RewardConfig::default());
        assert_eq!(config.monte_carlo.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = AppConfig::from_toml("[monte_carlo]\ndiscount = 1.5\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "config validation error: monte_carlo.discount must be in [0, 1]"
        );
        assert!(AppConfig::from_toml("[q_learning]\nlearning_rate = 0.0\n").is_err());
        assert!(AppConfig::from_toml("[training]\nwindow = 0\n").is_err());
    }

    #[test]
    fn section_checks_reject_nan() {
        let q = QLearningConfig {
            exploration_rate: f64::NAN,
            ..QLearningConfig::default()
        };
        assert!(q.validate().is_err());
        let mc = MonteCarloConfig {
            discount: f64::NAN,
            ..MonteCarloConfig::default()
        };
        assert!(mc.validate().is_err());
        let rewards = RewardConfig {
            step: f64::INFINITY,
            ..RewardConfig::default()
        };
        assert!(rewards.validate().is_err());
    }

    #[test]
    fn rejects_unparseable_toml() {
        let err = AppConfig::from_toml("[training\nepisodes = 1").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            AppConfig::load_or_default(Path::new("does/not/exist/config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
