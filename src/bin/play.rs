use std::error::Error;
use std::process;

use clap::Parser;

use tictactoe_rl::logging::init_tracing;
use tictactoe_rl::{
    AgentError, Game, GameError, GameOutcome, Seat, create_player_from_spec, describe_outcome,
    label_for_spec, render_board,
};

const DEFAULT_SEED: u64 = 0xDEC0_1DED_5EED_F00D;

#[derive(Parser, Debug)]
#[command(
    name = "play",
    about = "Play tic-tac-toe between humans, random bots and trained agents."
)]
struct Args {
    /// Number of games to play
    #[arg(short = 'g', long = "games", default_value_t = 1)]
    games: usize,

    /// Base RNG seed for starting seats and random bots
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Print the final board of every game
    #[arg(long)]
    visualize: bool,

    /// Abandon a game after this many consecutive invalid moves
    #[arg(long, default_value_t = tictactoe_rl::game::DEFAULT_MAX_INVALID_ATTEMPTS)]
    max_invalid: usize,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Player specs for X and O: human[:name], random[:seed],
    /// montecarlo:<checkpoint>, qlearning:<checkpoint>
    players: Vec<String>,
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);
    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let specs = if args.players.is_empty() {
        vec![String::from("human"), String::from("random")]
    } else {
        args.players.clone()
    };
    if specs.len() != 2 {
        return Err(format!("expected exactly 2 players, received {}", specs.len()).into());
    }

    let mut first = create_player_from_spec(&specs[0], 0, args.seed)?;
    let mut second = create_player_from_spec(&specs[1], 1, args.seed)?;
    let labels = [label_for_spec(&specs[0]), label_for_spec(&specs[1])];
    let interactive = labels.iter().any(|label| label == "human");

    let mut wins = [0usize; 2];
    let mut draws = 0usize;
    let mut abandoned = 0usize;
    for game_idx in 0..args.games {
        let mut game = Game::builder()
            .with_seed(args.seed ^ (game_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
            .with_max_invalid_attempts(args.max_invalid)
            .build()?;
        let result = game.play(first.as_mut(), second.as_mut());
        if args.visualize || interactive {
            println!("{}", render_board(game.board()));
        }
        match result {
            Ok(outcome) => {
                match outcome {
                    GameOutcome::Winner(Seat::First) => wins[0] += 1,
                    GameOutcome::Winner(Seat::Second) => wins[1] += 1,
                    GameOutcome::Draw => draws += 1,
                }
                println!(
                    "Game {}: {}",
                    game_idx + 1,
                    describe_outcome(outcome, [first.name(), second.name()])
                );
            }
            Err(GameError::Agent(AgentError::UndefinedPolicyState(state))) => {
                abandoned += 1;
                println!(
                    "Game {}: abandoned, agent has no policy for position {:?}",
                    game_idx + 1,
                    state.to_string()
                );
            }
            Err(err @ GameError::TooManyInvalidActions { .. }) => {
                abandoned += 1;
                println!("Game {}: abandoned, {err}", game_idx + 1);
            }
            Err(err) => return Err(err.into()),
        }
    }

    println!("\nResults over {} game(s):", args.games);
    println!("  X {:<12} wins: {}", labels[0], wins[0]);
    println!("  O {:<12} wins: {}", labels[1], wins[1]);
    println!("  draws: {draws}");
    if abandoned > 0 {
        println!("  abandoned: {abandoned}");
    }
    Ok(())
}
