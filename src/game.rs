use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::Board;
use crate::cell::Cell;
use crate::error::GameError;
use crate::player::Player;

const DEFAULT_SEED: u64 = 0x5EED_5EED_5EED_5EED;

/// Consecutive rejected moves tolerated before a game is abandoned.
pub const DEFAULT_MAX_INVALID_ATTEMPTS: usize = 1_000;

/// Seat at the table. The first seat plays `X`, the second `O`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn symbol(&self) -> Cell {
        match self {
            Seat::First => Cell::X,
            Seat::Second => Cell::O,
        }
    }

    pub fn other(&self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Seat),
    Draw,
}

/// Configuration required to bootstrap a game instance.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub seed: u64,
    /// Start from [`Board::random_opening`] instead of an empty grid.
    pub random_opening: bool,
    /// Seat that moves first; drawn at random when unset.
    pub starting_seat: Option<Seat>,
    pub max_invalid_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            random_opening: false,
            starting_seat: None,
            max_invalid_attempts: DEFAULT_MAX_INVALID_ATTEMPTS,
        }
    }
}

/// Builder that enables deterministic board injection for tests and training.
pub struct GameBuilder {
    config: GameConfig,
    board: Option<Board>,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            board: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_random_opening(mut self, enabled: bool) -> Self {
        self.config.random_opening = enabled;
        self
    }

    pub fn with_starting_seat(mut self, seat: Seat) -> Self {
        self.config.starting_seat = Some(seat);
        self
    }

    pub fn with_max_invalid_attempts(mut self, attempts: usize) -> Self {
        self.config.max_invalid_attempts = attempts;
        self
    }

    /// Start from a fixed position. Takes precedence over a random opening.
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    pub fn build(self) -> Result<Game, GameError> {
        Game::from_builder(self)
    }
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A single game between two players.
pub struct Game {
    board: Board,
    starting_seat: Seat,
    max_invalid_attempts: usize,
    outcome: Option<GameOutcome>,
}

impl Game {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        GameBuilder { config, board: None }.build()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn starting_seat(&self) -> Seat {
        self.starting_seat
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Runs the game to completion.
    ///
    /// Errors raised by a player (including the turn-limit abort) end the
    /// game immediately without calling any outcome hook.
    pub fn play<A, B>(&mut self, first: &mut A, second: &mut B) -> Result<GameOutcome, GameError>
    where
        A: Player + ?Sized,
        B: Player + ?Sized,
    {
        if self.outcome.is_some() {
            return Err(GameError::InvalidConfiguration("game has already been played"));
        }
        first.begin_episode();
        second.begin_episode();

        let mut seat = self.starting_seat;
        while !self.board.is_full() {
            let won = match seat {
                Seat::First => self.take_turn(first, seat)?,
                Seat::Second => self.take_turn(second, seat)?,
            };
            if won {
                match seat {
                    Seat::First => {
                        first.on_win();
                        second.on_loss();
                    }
                    Seat::Second => {
                        second.on_win();
                        first.on_loss();
                    }
                }
                let outcome = GameOutcome::Winner(seat);
                self.outcome = Some(outcome);
                return Ok(outcome);
            }
            seat = seat.other();
        }

        first.on_draw();
        second.on_draw();
        self.outcome = Some(GameOutcome::Draw);
        Ok(GameOutcome::Draw)
    }

    /// Asks `player` until it names a free cell, places its symbol and
    /// reports whether that completed a line.
    fn take_turn<P: Player + ?Sized>(&mut self, player: &mut P, seat: Seat) -> Result<bool, GameError> {
        let symbol = seat.symbol();
        let mut attempts = 0;
        loop {
            let position = player.select_action(&self.board)?;
            match self.board.place(symbol, position) {
                Ok(()) => break,
                Err(reason) => {
                    attempts += 1;
                    trace!(player = player.name(), %reason, attempts, "move rejected");
                    player.on_invalid_action();
                    if attempts >= self.max_invalid_attempts {
                        return Err(GameError::TooManyInvalidActions { attempts });
                    }
                }
            }
        }
        Ok(self.board.is_won(symbol))
    }

    fn from_builder(builder: GameBuilder) -> Result<Self, GameError> {
        let GameBuilder { config, board } = builder;
        if config.max_invalid_attempts == 0 {
            return Err(GameError::InvalidConfiguration(
                "max invalid attempts must be positive",
            ));
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let board = match board {
            Some(board) => board,
            None if config.random_opening => Board::random_opening(&mut rng),
            None => Board::new(),
        };
        if board.is_won(Cell::X) || board.is_won(Cell::O) {
            return Err(GameError::InvalidConfiguration(
                "starting board already has a winner",
            ));
        }
        let starting_seat = config.starting_seat.unwrap_or_else(|| {
            if rng.gen_bool(0.5) {
                Seat::Second
            } else {
                Seat::First
            }
        });
        Ok(Self {
            board,
            starting_seat,
            max_invalid_attempts: config.max_invalid_attempts,
            outcome: None,
        })
    }
}
