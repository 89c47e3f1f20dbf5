//! One-step Q-learning with epsilon-greedy exploration.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::cell::CELL_COUNT;
use crate::codec::{self, Action, Position, StateKey};
use crate::config::{QLearningConfig, RewardConfig};
use crate::error::AgentError;
use crate::metrics::{EpisodeOutcome, TrainingMetrics};
use crate::player::{LearningAgent, Player};

/// Values of all nine actions in one state.
pub type ActionValues = [f64; CELL_COUNT];

/// `value + alpha * (reward + gamma * bootstrap - value)`.
#[inline]
pub fn one_step_update(value: f64, reward: f64, bootstrap: f64, alpha: f64, gamma: f64) -> f64 {
    value + alpha * (reward + gamma * bootstrap - value)
}

/// First action holding the maximum value.
pub fn greedy_action(values: &ActionValues) -> Action {
    let mut best = 0;
    for (action, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = action;
        }
    }
    best
}

pub fn max_value(values: &ActionValues) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QLearningAgent {
    config: QLearningConfig,
    reward_config: RewardConfig,
    /// Dense: every state seen gets all nine actions, initialised to zero.
    q_values: BTreeMap<StateKey, ActionValues>,
    last: Option<(StateKey, Action)>,
    steps: usize,
    episode_reward: f64,
    training: bool,
    metrics: TrainingMetrics,
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

impl Default for QLearningAgent {
    fn default() -> Self {
        Self::new(QLearningConfig::default(), RewardConfig::default())
    }
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig, reward_config: RewardConfig) -> Self {
        Self::with_rng(config, reward_config, entropy_rng())
    }

    pub fn with_seed(config: QLearningConfig, reward_config: RewardConfig, seed: u64) -> Self {
        Self::with_rng(config, reward_config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: QLearningConfig, reward_config: RewardConfig, rng: StdRng) -> Self {
        Self {
            config,
            reward_config,
            q_values: BTreeMap::new(),
            last: None,
            steps: 0,
            episode_reward: 0.0,
            training: false,
            metrics: TrainingMetrics::new(),
            rng,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn reward_config(&self) -> &RewardConfig {
        &self.reward_config
    }

    pub fn action_values(&self, state: &StateKey) -> Option<&ActionValues> {
        self.q_values.get(state)
    }

    pub fn q_value(&self, state: &StateKey, action: Action) -> Option<f64> {
        self.q_values.get(state)?.get(action).copied()
    }

    /// Overwrites the values of a state, e.g. to seed a known position.
    pub fn set_action_values(&mut self, state: StateKey, values: ActionValues) {
        self.q_values.insert(state, values);
    }

    pub fn known_states(&self) -> usize {
        self.q_values.len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    pub fn last_transition(&self) -> Option<&(StateKey, Action)> {
        self.last.as_ref()
    }

    fn values_mut(&mut self, state: &StateKey) -> &mut ActionValues {
        self.q_values
            .entry(state.clone())
            .or_insert([0.0; CELL_COUNT])
    }

    /// Applies the one-step rule to the previous `(state, action)` pair.
    fn update_last(&mut self, reward: f64, bootstrap: f64) {
        let Some((state, action)) = self.last.clone() else {
            return;
        };
        let QLearningConfig {
            learning_rate,
            discount,
            ..
        } = self.config;
        let value = &mut self.values_mut(&state)[action];
        *value = one_step_update(*value, reward, bootstrap, learning_rate, discount);
    }

    fn finish_episode(&mut self, reward: f64, outcome: EpisodeOutcome) {
        self.episode_reward += reward;
        self.update_last(reward, 0.0);
        self.metrics.record(self.episode_reward, outcome);
        debug!(
            %outcome,
            total_reward = self.episode_reward,
            states = self.q_values.len(),
            "q-learning episode finished"
        );
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        self.config.validate().map_err(|e| e.to_string())?;
        self.reward_config.validate().map_err(|e| e.to_string())?;
        for (state, values) in &self.q_values {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("non-finite value for state {state:?}"));
            }
        }
        if let Some((_, action)) = &self.last {
            if *action >= CELL_COUNT {
                return Err(format!("last action {action} out of range"));
            }
        }
        if !self.episode_reward.is_finite() {
            return Err(String::from("non-finite episode reward"));
        }
        Ok(())
    }
}

impl Player for QLearningAgent {
    fn name(&self) -> &str {
        "QLearning"
    }

    fn begin_episode(&mut self) {
        if self.training {
            self.steps = 0;
            self.episode_reward = 0.0;
            self.last = None;
        }
    }

    fn select_action(&mut self, board: &Board) -> Result<Position, AgentError> {
        let state = codec::encode(board);
        let greedy = greedy_action(self.values_mut(&state));
        if !self.training {
            return Ok(Position::from_action(greedy));
        }

        if self.steps >= self.config.max_steps {
            let reward = self.reward_config.abort;
            self.finish_episode(reward, EpisodeOutcome::Aborted);
            return Err(AgentError::EpisodeAborted { steps: self.steps });
        } else if self.steps > 0 {
            let reward = self.reward_config.step;
            self.episode_reward += reward;
            let bootstrap = max_value(self.values_mut(&state));
            self.update_last(reward, bootstrap);
        }

        // The update above may have touched this very state.
        let greedy = greedy_action(self.values_mut(&state));
        let action = if self.rng.gen_bool(self.config.exploration_rate) {
            let empty = board.empty_cells();
            empty
                .choose(&mut self.rng)
                .ok_or(AgentError::NoEmptyCell)?
                .action()
        } else {
            greedy
        };
        self.last = Some((state, action));
        self.steps += 1;
        Ok(Position::from_action(action))
    }

    fn on_invalid_action(&mut self) {
        debug!(steps = self.steps, "q-learning chose an occupied cell");
    }

    fn on_win(&mut self) {
        if self.training {
            self.finish_episode(self.reward_config.win, EpisodeOutcome::Win);
        }
    }

    fn on_loss(&mut self) {
        if self.training {
            self.finish_episode(self.reward_config.loss, EpisodeOutcome::Loss);
        }
    }

    fn on_draw(&mut self) {
        if self.training {
            self.finish_episode(self.reward_config.draw, EpisodeOutcome::Draw);
        }
    }
}

impl LearningAgent for QLearningAgent {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn agent() -> QLearningAgent {
        QLearningAgent::with_seed(Default::default(), Default::default(), 11)
    }

    #[test]
    fn update_is_a_fixed_point_when_target_equals_value() {
        assert_eq!(one_step_update(0.0, 0.0, 0.0, 0.1, 0.9), 0.0);
        let value = 0.9 * 4.0;
        assert!((one_step_update(value, 0.0, 4.0, 0.1, 0.9) - value).abs() < 1e-12);
    }

    #[test]
    fn update_moves_a_tenth_of_the_way_to_the_target() {
        let updated = one_step_update(1.0, 10.0, 0.0, 0.1, 0.9);
        assert!((updated - 1.9).abs() < 1e-12);
    }

    #[test]
    fn greedy_action_prefers_first_maximum() {
        let mut values = [0.0; CELL_COUNT];
        values[3] = 2.0;
        values[6] = 2.0;
        assert_eq!(greedy_action(&values), 3);
        assert_eq!(greedy_action(&[0.0; CELL_COUNT]), 0);
        assert_eq!(max_value(&values), 2.0);
    }

    #[test]
    fn inference_plays_greedily_and_initialises_unseen_states() {
        let mut agent = agent();
        let mut board = Board::new();
        board.place(Cell::X, Position::new(0, 0)).unwrap();
        let state = codec::encode(&board);
        let mut values = [0.0; CELL_COUNT];
        values[5] = 1.5;
        agent.set_action_values(state, values);

        assert_eq!(agent.select_action(&board).unwrap(), Position::new(2, 1));
        assert_eq!(agent.select_action(&Board::new()).unwrap().action(), 0);
        assert_eq!(agent.known_states(), 2);
        assert_eq!(agent.steps(), 0);
    }

    #[test]
    fn step_penalty_updates_previous_pair() {
        let mut agent = agent();
        agent.set_training(true);
        agent.begin_episode();
        let mut board = Board::new();
        let first_state = codec::encode(&board);
        let first = agent.select_action(&board).unwrap();
        board.place(Cell::X, first).unwrap();
        let opponent = board.empty_cells()[0];
        board.place(Cell::O, opponent).unwrap();
        agent.select_action(&board).unwrap();

        let value = agent.q_value(&first_state, first.action()).unwrap();
        assert!((value - 0.1 * -0.1).abs() < 1e-12);
        assert_eq!(agent.steps(), 2);
        assert!((agent.episode_reward() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn terminal_hook_without_a_move_only_records_metrics() {
        let mut agent = agent();
        agent.set_training(true);
        agent.begin_episode();
        agent.on_loss();
        assert_eq!(agent.known_states(), 0);
        assert_eq!(agent.metrics().outcomes(), &[EpisodeOutcome::Loss]);
        assert_eq!(agent.metrics().rewards(), &[-10.0]);
    }
}
