//! The game engine proper: board rules, move pruning, and the three search
//! strategies the protocol layer can ask for. None of this module is
//! fallible in the `anyhow` sense — a malformed request is rejected at the
//! [`crate::protocol`] boundary before it ever reaches these types.

pub mod bot;
pub mod config;
pub mod estimate;
pub mod field;
pub mod player;
pub mod search;
pub mod trajectories;
pub mod trajectory;
pub mod uct;
pub mod zobrist;

pub use bot::{BotEngine, Move};
pub use config::EngineConfig;
pub use field::{BeginPattern, Field};
pub use player::Player;
