//! Every-visit Monte Carlo control with exploring starts.
//!
//! The agent records the `(state, action)` pairs of an episode together with
//! the shaped rewards and only learns once the episode is over: the
//! trajectory is walked backwards accumulating the discounted return, and
//! each pair's value becomes the mean of every return ever observed after
//! it. The greedy policy is then re-derived for every valued state.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::cell::CELL_COUNT;
use crate::codec::{self, Action, Position, StateKey};
use crate::config::{MonteCarloConfig, RewardConfig};
use crate::error::AgentError;
use crate::metrics::{EpisodeOutcome, TrainingMetrics};
use crate::player::{LearningAgent, Player};

/// Lifetime sum and count of the returns observed after one `(state, action)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub sum: f64,
    pub count: u64,
}

impl ReturnStats {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonteCarloAgent {
    config: MonteCarloConfig,
    reward_config: RewardConfig,
    /// Sparse: only pairs that were actually visited have an entry.
    q_values: BTreeMap<StateKey, BTreeMap<Action, f64>>,
    policy: BTreeMap<StateKey, Action>,
    returns: BTreeMap<StateKey, BTreeMap<Action, ReturnStats>>,
    steps: Vec<(StateKey, Action)>,
    /// Lags `steps` by one until the terminal reward arrives.
    rewards: Vec<f64>,
    episode: u64,
    training: bool,
    metrics: TrainingMetrics,
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

impl Default for MonteCarloAgent {
    fn default() -> Self {
        Self::new(MonteCarloConfig::default(), RewardConfig::default())
    }
}

impl MonteCarloAgent {
    pub fn new(config: MonteCarloConfig, reward_config: RewardConfig) -> Self {
        Self::with_rng(config, reward_config, entropy_rng())
    }

    pub fn with_seed(config: MonteCarloConfig, reward_config: RewardConfig, seed: u64) -> Self {
        Self::with_rng(config, reward_config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: MonteCarloConfig, reward_config: RewardConfig, rng: StdRng) -> Self {
        Self {
            config,
            reward_config,
            q_values: BTreeMap::new(),
            policy: BTreeMap::new(),
            returns: BTreeMap::new(),
            steps: Vec::new(),
            rewards: Vec::new(),
            episode: 0,
            training: false,
            metrics: TrainingMetrics::new(),
            rng,
        }
    }

    /// Replaces the random source, e.g. after restoring from a checkpoint.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn reward_config(&self) -> &RewardConfig {
        &self.reward_config
    }

    /// Number of episodes started with [`Player::begin_episode`].
    pub fn episodes(&self) -> u64 {
        self.episode
    }

    pub fn q_value(&self, state: &StateKey, action: Action) -> Option<f64> {
        self.q_values.get(state)?.get(&action).copied()
    }

    pub fn action_values(&self, state: &StateKey) -> Option<&BTreeMap<Action, f64>> {
        self.q_values.get(state)
    }

    pub fn policy_action(&self, state: &StateKey) -> Option<Action> {
        self.policy.get(state).copied()
    }

    pub fn return_stats(&self, state: &StateKey, action: Action) -> Option<ReturnStats> {
        self.returns.get(state)?.get(&action).copied()
    }

    /// Number of states with at least one valued action.
    pub fn valued_states(&self) -> usize {
        self.q_values.len()
    }

    pub fn policy_len(&self) -> usize {
        self.policy.len()
    }

    pub fn trajectory(&self) -> &[(StateKey, Action)] {
        &self.steps
    }

    pub fn pending_rewards(&self) -> &[f64] {
        &self.rewards
    }

    fn finish_episode(&mut self, outcome: EpisodeOutcome) {
        let total: f64 = self.rewards.iter().sum();
        self.metrics.record(total, outcome);
        self.update_values_and_policy();
        debug!(
            episode = self.episode,
            %outcome,
            total_reward = total,
            states = self.q_values.len(),
            "monte carlo episode finished"
        );
    }

    /// Reverse pass over the trajectory; drains both buffers.
    fn update_values_and_policy(&mut self) {
        let mut discounted = 0.0;
        while let Some((state, action)) = self.steps.pop() {
            let reward = self.rewards.pop().unwrap_or(0.0);
            discounted = reward + self.config.discount * discounted;
            let earlier_visit = self
                .steps
                .iter()
                .any(|(s, a)| *a == action && *s == state);
            if earlier_visit {
                continue;
            }
            let stats = self
                .returns
                .entry(state.clone())
                .or_default()
                .entry(action)
                .or_default();
            stats.sum += discounted;
            stats.count += 1;
            let mean = stats.mean();
            self.q_values.entry(state).or_default().insert(action, mean);
        }
        self.rewards.clear();

        for (state, values) in &self.q_values {
            if let Some(best) = best_action(values) {
                self.policy.insert(state.clone(), best);
            }
        }
    }

    fn explore_empty_cell(&mut self, board: &Board) -> Result<Action, AgentError> {
        let empty = board.empty_cells();
        let position = empty.choose(&mut self.rng).ok_or(AgentError::NoEmptyCell)?;
        Ok(position.action())
    }

    /// Structural checks applied to restored agents.
    pub(crate) fn validate(&self) -> Result<(), String> {
        self.config.validate().map_err(|e| e.to_string())?;
        self.reward_config.validate().map_err(|e| e.to_string())?;
        for (state, values) in &self.q_values {
            for (&action, &value) in values {
                if action >= CELL_COUNT {
                    return Err(format!("action {action} out of range for state {state:?}"));
                }
                if !value.is_finite() {
                    return Err(format!("non-finite value for state {state:?}"));
                }
                let stats = self.return_stats(state, action).ok_or_else(|| {
                    format!("value without return statistics for state {state:?}")
                })?;
                if stats.count == 0 {
                    return Err(format!("zero visit count for state {state:?}"));
                }
                if (stats.mean() - value).abs() > 1e-9 * (1.0 + value.abs()) {
                    return Err(format!(
                        "value disagrees with mean return for state {state:?}"
                    ));
                }
            }
        }
        if let Some((state, action)) = self.policy.iter().find(|(_, a)| **a >= CELL_COUNT) {
            return Err(format!("policy action {action} out of range for state {state:?}"));
        }
        if self.steps.iter().any(|(_, a)| *a >= CELL_COUNT) {
            return Err(String::from("trajectory action out of range"));
        }
        Ok(())
    }
}

/// Highest-valued action; ties go to the lowest action index.
fn best_action(values: &BTreeMap<Action, f64>) -> Option<Action> {
    let mut best: Option<(Action, f64)> = None;
    for (&action, &value) in values {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((action, value)),
        }
    }
    best.map(|(action, _)| action)
}

impl Player for MonteCarloAgent {
    fn name(&self) -> &str {
        "MonteCarlo"
    }

    fn begin_episode(&mut self) {
        self.steps.clear();
        self.rewards.clear();
        self.episode += 1;
    }

    fn select_action(&mut self, board: &Board) -> Result<Position, AgentError> {
        let state = codec::encode(board);
        if !self.training {
            let action = self
                .policy
                .get(&state)
                .copied()
                .ok_or(AgentError::UndefinedPolicyState(state))?;
            return Ok(Position::from_action(action));
        }

        if self.steps.len() >= self.config.max_steps {
            let steps = self.steps.len();
            self.rewards.push(self.reward_config.abort);
            self.finish_episode(EpisodeOutcome::Aborted);
            return Err(AgentError::EpisodeAborted { steps });
        }
        if !self.steps.is_empty() {
            // Cost of the previous move, known now that the game went on.
            self.rewards.push(self.reward_config.step);
        }

        let action = if self.steps.is_empty() {
            // Exploring start: any raw index, occupied cells included.
            self.rng.gen_range(0..CELL_COUNT)
        } else if let Some(&action) = self.policy.get(&state) {
            action
        } else {
            let action = self.explore_empty_cell(board)?;
            self.policy.insert(state.clone(), action);
            action
        };
        self.steps.push((state, action));
        Ok(Position::from_action(action))
    }

    fn on_invalid_action(&mut self) {
        debug!(episode = self.episode, "monte carlo chose an occupied cell");
    }

    fn on_win(&mut self) {
        if self.training {
            self.rewards.push(self.reward_config.win);
            self.finish_episode(EpisodeOutcome::Win);
        }
    }

    fn on_loss(&mut self) {
        if self.training {
            self.rewards.push(self.reward_config.loss);
            self.finish_episode(EpisodeOutcome::Loss);
        }
    }

    fn on_draw(&mut self) {
        if self.training {
            self.rewards.push(self.reward_config.draw);
            self.finish_episode(EpisodeOutcome::Draw);
        }
    }
}

impl LearningAgent for MonteCarloAgent {
    fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }
}
