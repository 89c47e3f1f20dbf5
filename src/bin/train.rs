use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use plotters::coord::Shift;
use plotters::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use tictactoe_rl::logging::init_tracing;
use tictactoe_rl::{
    AgentCheckpoint, AppConfig, Checkpoint, CheckpointMetadata, MonteCarloAgent, QLearningAgent,
    RandomPlayer, Trainer, TrainingConfig, TrainingMetrics, TrainingSummary,
};

const AGENT_SEED_SALT: u64 = 0xA6E7_5EED;
const OPPONENT_SEED_SALT: u64 = 0x0990_5EED;

#[derive(Parser, Debug)]
#[command(
    about = "Train a tabular tic-tac-toe agent against a random opponent",
    version
)]
struct TrainArgs {
    /// Learning algorithm to train.
    #[arg(long, value_enum, default_value_t = Algorithm::MonteCarlo)]
    algorithm: Algorithm,
    /// TOML configuration file (defaults are used when omitted).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of training episodes (overrides the config file).
    #[arg(long)]
    episodes: Option<usize>,
    /// Master seed (overrides the config file).
    #[arg(long)]
    seed: Option<u64>,
    /// Moving-average window for progress reports and plots.
    #[arg(long)]
    window: Option<usize>,
    /// Write an intermediate checkpoint every N episodes.
    #[arg(long)]
    checkpoint_every: Option<usize>,
    /// Directory where checkpoints will be written.
    #[arg(long, default_value = "checkpoints")]
    output: PathBuf,
    /// Resume training from a checkpoint created by this program.
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Start every episode from an empty board.
    #[arg(long)]
    no_random_opening: bool,
    /// PNG file for the moving-average reward and success-rate curves.
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Algorithm {
    MonteCarlo,
    QLearning,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = TrainArgs::parse();
    let config = resolve_config(&args)?;
    init_tracing(&config.logging.level);

    let training = config.training.clone();
    let (mut agent, mut metadata) = match &args.resume {
        Some(path) => {
            let checkpoint = Checkpoint::load(path)?;
            (checkpoint.agent, checkpoint.metadata)
        }
        None => (
            new_agent(args.algorithm, &config),
            CheckpointMetadata {
                episodes_trained: 0,
                training_seed: training.seed,
            },
        ),
    };
    // Resumed runs continue with fresh openings rather than replaying old ones.
    let run_seed = training.seed ^ (metadata.episodes_trained as u64);
    reseed_agent(&mut agent, run_seed ^ AGENT_SEED_SALT);
    let mut opponent = RandomPlayer::new(StdRng::seed_from_u64(run_seed ^ OPPONENT_SEED_SALT));
    let mut trainer = Trainer::new(TrainingConfig {
        seed: run_seed,
        ..training.clone()
    });

    fs::create_dir_all(&args.output)?;
    info!(
        agent = agent.kind(),
        episodes = training.episodes,
        resumed_from = metadata.episodes_trained,
        "starting training"
    );

    let chunk = if training.checkpoint_every > 0 {
        training.checkpoint_every
    } else {
        training.episodes
    };
    let mut summary = TrainingSummary::default();
    let mut remaining = training.episodes;
    while remaining > 0 {
        let episodes = chunk.min(remaining);
        let part = trainer.run(agent.agent_mut(), &mut opponent, episodes)?;
        summary.absorb(part);
        remaining -= episodes;
        metadata.episodes_trained += episodes;
        if training.checkpoint_every > 0 && remaining > 0 {
            let path = args.output.join(format!(
                "{}-ep{}.bin",
                agent.kind(),
                metadata.episodes_trained
            ));
            save(&agent, &metadata, &path)?;
        }
    }

    let path = args.output.join(format!("{}.bin", agent.kind()));
    save(&agent, &metadata, &path)?;

    let metrics = agent.metrics();
    println!(
        "Trained {} episodes: {} wins, {} losses, {} draws, {} aborted",
        summary.episodes, summary.wins, summary.losses, summary.draws, summary.aborted
    );
    println!(
        "Last {} episodes: average reward {:.3}, success rate {:.2}%",
        training.window,
        metrics.moving_average_reward(training.window),
        metrics.moving_success_rate(training.window) * 100.0
    );
    println!("Checkpoint written to {}", path.display());

    if let Some(plot) = &args.plot {
        render_learning_curves(plot, metrics, training.window, agent.kind())?;
        println!("Learning curves written to {}", plot.display());
    }
    Ok(())
}

fn resolve_config(args: &TrainArgs) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(window) = args.window {
        config.training.window = window;
    }
    if let Some(every) = args.checkpoint_every {
        config.training.checkpoint_every = every;
    }
    if args.no_random_opening {
        config.training.random_opening = false;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn new_agent(algorithm: Algorithm, config: &AppConfig) -> AgentCheckpoint {
    match algorithm {
        Algorithm::MonteCarlo => MonteCarloAgent::new(config.monte_carlo, config.rewards).into(),
        Algorithm::QLearning => QLearningAgent::new(config.q_learning, config.rewards).into(),
    }
}

fn reseed_agent(agent: &mut AgentCheckpoint, seed: u64) {
    match agent {
        AgentCheckpoint::MonteCarlo(agent) => agent.reseed(seed),
        AgentCheckpoint::QLearning(agent) => agent.reseed(seed),
    }
}

fn save(
    agent: &AgentCheckpoint,
    metadata: &CheckpointMetadata,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let checkpoint = Checkpoint {
        metadata: metadata.clone(),
        agent: agent.clone(),
    };
    checkpoint.save(path)?;
    Ok(())
}

fn render_learning_curves(
    out: &Path,
    metrics: &TrainingMetrics,
    window: usize,
    kind: &str,
) -> Result<(), Box<dyn Error>> {
    if metrics.is_empty() {
        return Err("no episodes recorded, nothing to plot".into());
    }
    let root = BitMapBackend::new(out, (1000, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| format!("{e}"))?;
    let (upper, lower) = root.split_vertically(400);

    draw_curve(
        &upper,
        &metrics.reward_curve(window),
        &format!("{kind}: episode reward (moving average over {window})"),
        "Reward",
        &RED,
    )?;
    draw_curve(
        &lower,
        &metrics.success_curve(window),
        &format!("{kind}: success rate (moving average over {window})"),
        "Success rate",
        &GREEN,
    )?;

    root.present().map_err(|e| format!("{e}"))?;
    Ok(())
}

fn draw_curve(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    values: &[f64],
    caption: &str,
    y_desc: &str,
    color: &RGBColor,
) -> Result<(), Box<dyn Error>> {
    let (low, high) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let pad = ((high - low) * 0.05).max(0.5);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 22).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..values.len(), (low - pad)..(high + pad))
        .map_err(|e| format!("{e}"))?;

    chart
        .configure_mesh()
        .x_desc("Episode")
        .y_desc(y_desc)
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()
        .map_err(|e| format!("{e}"))?;

    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i, *v)),
            color,
        ))
        .map_err(|e| format!("{e}"))?;
    Ok(())
}
