use tictactoe_rl::{
    AgentError, Board, Cell, Game, GameError, GameOutcome, InvalidAction, Player, Position, Seat,
    StateKey, codec,
};

/// Plays a fixed list of positions and counts the hooks it receives.
#[derive(Default)]
struct Scripted {
    moves: Vec<Position>,
    next: usize,
    invalid: usize,
    wins: usize,
    losses: usize,
    draws: usize,
    episodes: usize,
}

impl Scripted {
    fn new(actions: &[usize]) -> Self {
        Self {
            moves: actions.iter().map(|&a| Position::from_action(a)).collect(),
            ..Self::default()
        }
    }
}

impl Player for Scripted {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn begin_episode(&mut self) {
        self.episodes += 1;
    }

    fn select_action(&mut self, _board: &Board) -> Result<Position, AgentError> {
        let position = self.moves.get(self.next).copied();
        self.next += 1;
        position.ok_or(AgentError::EpisodeAborted { steps: self.next })
    }

    fn on_invalid_action(&mut self) {
        self.invalid += 1;
    }

    fn on_win(&mut self) {
        self.wins += 1;
    }

    fn on_loss(&mut self) {
        self.losses += 1;
    }

    fn on_draw(&mut self) {
        self.draws += 1;
    }
}

/// Names the same occupied cell forever.
struct Stubborn;

impl Player for Stubborn {
    fn name(&self) -> &str {
        "Stubborn"
    }

    fn select_action(&mut self, _board: &Board) -> Result<Position, AgentError> {
        Ok(Position::new(0, 0))
    }
}

#[test]
fn first_seat_completes_top_row() -> Result<(), GameError> {
    let mut x = Scripted::new(&[0, 1, 2]);
    let mut o = Scripted::new(&[3, 4]);
    let mut game = Game::builder().with_starting_seat(Seat::First).build()?;

    let outcome = game.play(&mut x, &mut o)?;

    assert_eq!(outcome, GameOutcome::Winner(Seat::First));
    assert_eq!(game.outcome(), Some(outcome));
    assert_eq!((x.wins, x.losses, x.draws), (1, 0, 0));
    assert_eq!((o.wins, o.losses, o.draws), (0, 1, 0));
    assert_eq!((x.episodes, o.episodes), (1, 1));
    assert_eq!(game.board().count(Cell::X), 3);
    assert_eq!(game.board().count(Cell::O), 2);
    Ok(())
}

#[test]
fn second_seat_can_start_and_win() -> Result<(), GameError> {
    let mut x = Scripted::new(&[0, 1]);
    let mut o = Scripted::new(&[2, 4, 6]);
    let mut game = Game::builder().with_starting_seat(Seat::Second).build()?;

    assert_eq!(game.play(&mut x, &mut o)?, GameOutcome::Winner(Seat::Second));
    assert_eq!(o.wins, 1);
    assert_eq!(x.losses, 1);
    Ok(())
}

#[test]
fn full_board_without_line_is_a_draw() -> Result<(), GameError> {
    // X O X / X O O / O X X
    let mut x = Scripted::new(&[0, 2, 3, 7, 8]);
    let mut o = Scripted::new(&[1, 4, 5, 6]);
    let mut game = Game::builder().with_starting_seat(Seat::First).build()?;

    assert_eq!(game.play(&mut x, &mut o)?, GameOutcome::Draw);
    assert_eq!((x.draws, o.draws), (1, 1));
    assert!(game.board().is_full());
    Ok(())
}

#[test]
fn occupied_cell_is_retried_by_the_same_player() -> Result<(), GameError> {
    let mut x = Scripted::new(&[4, 0, 1, 2]);
    let mut o = Scripted::new(&[4, 4, 3, 5, 6]);
    let mut game = Game::builder().with_starting_seat(Seat::First).build()?;

    game.play(&mut x, &mut o)?;

    assert_eq!(o.invalid, 2);
    assert_eq!(x.invalid, 0);
    assert_eq!(game.board().cell(Position::new(0, 1)), Some(Cell::O));
    Ok(())
}

#[test]
fn player_error_ends_game_without_outcome_hooks() -> Result<(), GameError> {
    let mut x = Scripted::new(&[0]);
    let mut o = Scripted::new(&[4]);
    let mut game = Game::builder().with_starting_seat(Seat::First).build()?;

    let err = game.play(&mut x, &mut o).unwrap_err();

    assert!(err.is_episode_aborted());
    assert_eq!(x.wins + x.losses + x.draws, 0);
    assert_eq!(o.wins + o.losses + o.draws, 0);
    assert_eq!(game.outcome(), None);
    Ok(())
}

#[test]
fn endless_invalid_moves_are_capped() -> Result<(), GameError> {
    let mut x = Stubborn;
    let mut o = Scripted::new(&[8, 7]);
    let mut game = Game::builder()
        .with_starting_seat(Seat::Second)
        .with_max_invalid_attempts(5)
        .build()?;

    // X's (0, 0) succeeds once and is rejected from then on.
    let err = game.play(&mut x, &mut o).unwrap_err();
    assert!(matches!(err, GameError::TooManyInvalidActions { attempts: 5 }));
    Ok(())
}

#[test]
fn builder_rejects_zero_attempts_and_decided_boards() {
    assert!(matches!(
        Game::builder().with_max_invalid_attempts(0).build(),
        Err(GameError::InvalidConfiguration(_))
    ));
    let won: StateKey = "XXX OO   ".parse().unwrap();
    assert!(matches!(
        Game::builder().with_board(Board::from_key(&won)).build(),
        Err(GameError::InvalidConfiguration(_))
    ));
}

#[test]
fn game_can_only_be_played_once() -> Result<(), GameError> {
    let mut x = Scripted::new(&[0, 1, 2]);
    let mut o = Scripted::new(&[3, 4]);
    let mut game = Game::builder().with_starting_seat(Seat::First).build()?;
    game.play(&mut x, &mut o)?;
    assert!(matches!(
        game.play(&mut x, &mut o),
        Err(GameError::InvalidConfiguration(_))
    ));
    Ok(())
}

#[test]
fn same_seed_gives_same_opening_and_starting_seat() -> Result<(), GameError> {
    for seed in 0..20 {
        let a = Game::builder().with_seed(seed).with_random_opening(true).build()?;
        let b = Game::builder().with_seed(seed).with_random_opening(true).build()?;
        assert_eq!(a.board(), b.board());
        assert_eq!(a.starting_seat(), b.starting_seat());
        assert!(!a.board().is_won(Cell::X) && !a.board().is_won(Cell::O));
    }
    Ok(())
}

#[test]
fn placement_errors_name_the_cell() {
    let mut board = Board::new();
    board.place(Cell::X, Position::new(1, 2)).unwrap();
    assert_eq!(
        board.place(Cell::O, Position::new(1, 2)),
        Err(InvalidAction::Occupied { col: 1, row: 2 })
    );
    assert_eq!(
        board.place(Cell::O, Position::new(3, 0)),
        Err(InvalidAction::OutOfRange { col: 3, row: 0 })
    );
}

#[test]
fn state_key_reads_row_major() {
    let mut board = Board::new();
    board.place(Cell::X, Position::new(1, 0)).unwrap();
    board.place(Cell::O, Position::new(0, 2)).unwrap();
    let key = codec::encode(&board);
    assert_eq!(key.to_string(), " X    O  ");
    assert_eq!(Board::from_key(&key), board);
    assert_eq!(key.empty_actions(), vec![0, 2, 3, 4, 5, 7, 8]);
    assert_eq!(codec::action_to_coords(5), (2, 1));
    assert_eq!(codec::coords_to_action(2, 1), 5);
}
