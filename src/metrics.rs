use std::fmt;

use serde::{Deserialize, Serialize};

/// How a training episode ended from the learner's point of view.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EpisodeOutcome {
    Win,
    Loss,
    Draw,
    /// Terminated by the turn limit.
    Aborted,
}

impl EpisodeOutcome {
    pub fn label(&self) -> char {
        match self {
            EpisodeOutcome::Win => 'W',
            EpisodeOutcome::Loss => 'L',
            EpisodeOutcome::Draw => 'D',
            EpisodeOutcome::Aborted => 'I',
        }
    }
}

impl fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EpisodeOutcome::Win => "win",
            EpisodeOutcome::Loss => "loss",
            EpisodeOutcome::Draw => "draw",
            EpisodeOutcome::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Append-only log of per-episode reward and outcome.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    rewards: Vec<f64>,
    outcomes: Vec<EpisodeOutcome>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, total_reward: f64, outcome: EpisodeOutcome) {
        self.rewards.push(total_reward);
        self.outcomes.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn outcomes(&self) -> &[EpisodeOutcome] {
        &self.outcomes
    }

    pub fn count(&self, outcome: EpisodeOutcome) -> usize {
        self.outcomes.iter().filter(|&&o| o == outcome).count()
    }

    /// Mean reward of the last `window` episodes, or of all of them when
    /// fewer exist. Zero for an empty log.
    pub fn moving_average_reward(&self, window: usize) -> f64 {
        mean(trailing(&self.rewards, self.rewards.len(), window))
    }

    /// Fraction of wins among the last `window` episodes (same short-history rule).
    pub fn moving_success_rate(&self, window: usize) -> f64 {
        win_fraction(trailing(&self.outcomes, self.outcomes.len(), window))
    }

    /// Trailing moving-average reward at every episode index.
    pub fn reward_curve(&self, window: usize) -> Vec<f64> {
        (1..=self.rewards.len())
            .map(|end| mean(trailing(&self.rewards, end, window)))
            .collect()
    }

    /// Trailing moving success rate at every episode index.
    pub fn success_curve(&self, window: usize) -> Vec<f64> {
        (1..=self.outcomes.len())
            .map(|end| win_fraction(trailing(&self.outcomes, end, window)))
            .collect()
    }
}

fn trailing<T>(values: &[T], end: usize, window: usize) -> &[T] {
    let start = end.saturating_sub(window);
    &values[start..end]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn win_fraction(outcomes: &[EpisodeOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 0.0;
    }
    let wins = outcomes
        .iter()
        .filter(|&&o| o == EpisodeOutcome::Win)
        .count();
    wins as f64 / outcomes.len() as f64
}
