//! Episodic training of a learner against a stationary opponent.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::config::TrainingConfig;
use crate::error::GameError;
use crate::game::{Game, GameOutcome, Seat};
use crate::player::{LearningAgent, Player};

/// Tally of the episodes run by one [`Trainer::run`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrainingSummary {
    pub episodes: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub aborted: usize,
}

impl TrainingSummary {
    pub fn absorb(&mut self, other: TrainingSummary) {
        self.episodes += other.episodes;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.aborted += other.aborted;
    }
}

/// Runs training episodes with the learner in the second seat.
///
/// Each episode is a fresh [`Game`] seeded from the trainer's own random
/// source, so a trainer built from the same configuration replays the same
/// sequence of openings and starting seats.
pub struct Trainer {
    config: TrainingConfig,
    rng: StdRng,
    episodes_run: usize,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            episodes_run: 0,
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Episodes run over the trainer's lifetime.
    pub fn episodes_run(&self) -> usize {
        self.episodes_run
    }

    /// Plays `episodes` games in training mode and restores the learner's
    /// previous mode afterwards.
    ///
    /// Turn-limit aborts are counted and skipped; any other game error
    /// stops the run.
    pub fn run<A, O>(
        &mut self,
        agent: &mut A,
        opponent: &mut O,
        episodes: usize,
    ) -> Result<TrainingSummary, GameError>
    where
        A: LearningAgent + ?Sized,
        O: Player + ?Sized,
    {
        let was_training = agent.is_training();
        agent.set_training(true);
        let result = self.run_episodes(agent, opponent, episodes);
        agent.set_training(was_training);
        result
    }

    fn run_episodes<A, O>(
        &mut self,
        agent: &mut A,
        opponent: &mut O,
        episodes: usize,
    ) -> Result<TrainingSummary, GameError>
    where
        A: LearningAgent + ?Sized,
        O: Player + ?Sized,
    {
        let mut summary = TrainingSummary::default();
        for _ in 0..episodes {
            let mut game = Game::builder()
                .with_seed(self.rng.next_u64())
                .with_random_opening(self.config.random_opening)
                .build()?;
            match game.play(&mut *opponent, &mut *agent) {
                Ok(GameOutcome::Winner(Seat::Second)) => summary.wins += 1,
                Ok(GameOutcome::Winner(Seat::First)) => summary.losses += 1,
                Ok(GameOutcome::Draw) => summary.draws += 1,
                Err(err) if err.is_episode_aborted() => {
                    debug!(episode = self.episodes_run, "{err}");
                    summary.aborted += 1;
                }
                Err(err) => return Err(err),
            }
            summary.episodes += 1;
            self.episodes_run += 1;

            if self.config.report_every > 0 && self.episodes_run % self.config.report_every == 0 {
                let metrics = agent.metrics();
                info!(
                    episode = self.episodes_run,
                    agent = agent.name(),
                    average_reward = metrics.moving_average_reward(self.config.window),
                    success_rate = metrics.moving_success_rate(self.config.window),
                    "training progress"
                );
            }
        }
        Ok(summary)
    }
}
