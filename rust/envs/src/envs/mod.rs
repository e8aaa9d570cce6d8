pub mod blackjack;
pub mod cliff_gridworld;
pub mod easy21;
pub mod gambler;
pub mod grid;
pub mod gridworld;
pub mod table_simulator;
pub mod windy_gridworld;

pub use blackjack::Blackjack;
pub use cliff_gridworld::CliffGridWorld;
pub use easy21::Easy21;
pub use gambler::Gambler;
pub use gridworld::GridWorld;
pub use table_simulator::{StartState, TableSimulator};
pub use windy_gridworld::{WindyGridWorld, WindyMoves};
