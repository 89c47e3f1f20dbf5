pub mod human;
pub mod monte_carlo;
pub mod q_learning;
pub mod random;
pub mod registry;

pub use human::HumanPlayer;
pub use monte_carlo::MonteCarloAgent;
pub use q_learning::QLearningAgent;
pub use random::RandomPlayer;
