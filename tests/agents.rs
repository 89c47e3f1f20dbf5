use tictactoe_rl::{
    AgentError, Board, Cell, EpisodeOutcome, LearningAgent, MonteCarloAgent, Player, Position,
    QLearningAgent, StateKey, codec,
};

fn key(text: &str) -> StateKey {
    text.parse().unwrap()
}

fn training_mc(seed: u64) -> MonteCarloAgent {
    let mut agent = MonteCarloAgent::with_seed(Default::default(), Default::default(), seed);
    agent.set_training(true);
    agent
}

fn training_q(seed: u64) -> QLearningAgent {
    let mut agent = QLearningAgent::with_seed(Default::default(), Default::default(), seed);
    agent.set_training(true);
    agent
}

#[test]
fn monte_carlo_aborts_on_the_twenty_first_call() {
    let mut agent = training_mc(7);
    agent.begin_episode();
    let board = Board::new();
    for _ in 0..20 {
        agent.select_action(&board).unwrap();
    }
    assert_eq!(agent.valued_states(), 0);

    let err = agent.select_action(&board).unwrap_err();

    assert_eq!(err, AgentError::EpisodeAborted { steps: 20 });
    assert!(agent.valued_states() > 0);
    assert!(agent.policy_action(&codec::encode(&board)).is_some());
    assert!(agent.trajectory().is_empty());
    assert_eq!(agent.metrics().outcomes(), &[EpisodeOutcome::Aborted]);
    let total = agent.metrics().rewards()[0];
    assert!((total - (19.0 * -0.1 - 50.0)).abs() < 1e-9);
}

#[test]
fn monte_carlo_learns_from_a_single_winning_move() {
    let mut agent = training_mc(3);
    agent.begin_episode();
    let board = Board::from_key(&key("XX OO    "));
    agent.select_action(&board).unwrap();
    agent.on_win();

    let state = key("XX OO    ");
    let values = agent.action_values(&state).expect("state was valued");
    assert_eq!(values.len(), 1);
    let (&action, &value) = values.iter().next().unwrap();
    assert!((value - 10.0).abs() < 1e-9);
    assert_eq!(agent.policy_action(&state), Some(action));
    assert_eq!(agent.metrics().outcomes(), &[EpisodeOutcome::Win]);
}

#[test]
fn monte_carlo_outcome_hooks_are_ignored_outside_training() {
    let mut agent = MonteCarloAgent::with_seed(Default::default(), Default::default(), 3);
    agent.on_loss();
    agent.on_draw();
    assert!(agent.metrics().is_empty());
    assert_eq!(agent.valued_states(), 0);
}

#[test]
fn monte_carlo_inference_needs_a_policy() {
    let mut agent = MonteCarloAgent::with_seed(Default::default(), Default::default(), 3);
    let board = Board::from_key(&key("X        "));
    assert_eq!(
        agent.select_action(&board),
        Err(AgentError::UndefinedPolicyState(key("X        ")))
    );
}

#[test]
fn q_learning_abort_penalises_last_move() {
    let mut agent = training_q(5);
    agent.begin_episode();
    let board = Board::new();
    for _ in 0..20 {
        agent.select_action(&board).unwrap();
    }
    let (state, action) = agent.last_transition().cloned().unwrap();
    let before = agent.q_value(&state, action).unwrap();

    let err = agent.select_action(&board).unwrap_err();

    assert_eq!(err, AgentError::EpisodeAborted { steps: 20 });
    let after = agent.q_value(&state, action).unwrap();
    assert!((after - (before + 0.1 * (-50.0 - before))).abs() < 1e-9);
    assert_eq!(agent.metrics().outcomes(), &[EpisodeOutcome::Aborted]);
    assert!((agent.episode_reward() - (19.0 * -0.1 - 50.0)).abs() < 1e-9);
}

#[test]
fn q_learning_terminal_rewards_target_zero_bootstrap() {
    let cases = [
        (EpisodeOutcome::Win, 10.0),
        (EpisodeOutcome::Loss, -10.0),
        (EpisodeOutcome::Draw, -2.0),
    ];
    for (outcome, reward) in cases {
        let mut agent = training_q(9);
        agent.begin_episode();
        let board = Board::from_key(&key("XO XO    "));
        agent.select_action(&board).unwrap();
        let (state, action) = agent.last_transition().cloned().unwrap();
        match outcome {
            EpisodeOutcome::Win => agent.on_win(),
            EpisodeOutcome::Loss => agent.on_loss(),
            _ => agent.on_draw(),
        }
        let value = agent.q_value(&state, action).unwrap();
        assert!((value - 0.1 * reward).abs() < 1e-9, "{outcome}: {value}");
        assert_eq!(agent.metrics().outcomes(), &[outcome]);
    }
}

#[test]
fn q_learning_begin_episode_resets_only_in_training() {
    let mut agent = training_q(2);
    agent.begin_episode();
    agent.select_action(&Board::new()).unwrap();
    assert_eq!(agent.steps(), 1);
    agent.begin_episode();
    assert_eq!(agent.steps(), 0);
    assert!(agent.last_transition().is_none());

    agent.select_action(&Board::new()).unwrap();
    agent.set_training(false);
    agent.begin_episode();
    assert_eq!(agent.steps(), 1);
}

#[test]
fn q_learning_inference_is_greedy() {
    let mut agent = QLearningAgent::with_seed(Default::default(), Default::default(), 4);
    let mut board = Board::new();
    board.place(Cell::X, Position::new(1, 1)).unwrap();
    let mut values = [0.0; 9];
    values[8] = 0.5;
    values[2] = 0.7;
    agent.set_action_values(codec::encode(&board), values);
    for _ in 0..10 {
        assert_eq!(agent.select_action(&board), Ok(Position::from_action(2)));
    }
    assert!(agent.metrics().is_empty());
}
