//! Deterministic world model for the gridharvest swarm engine.
//!
//! Holds the toroidal grid, unit and base records, game-rule configuration,
//! and the seeded RNG that every stochastic decision in the pilot flows
//! through. The pilot crate layers the per-tick coordination engine on top.

pub mod config;
pub mod error;
pub mod position;
pub mod rng;
pub mod world;

pub use config::GameConfig;
pub use error::{ConfigError, ScenarioError};
pub use position::{Direction, Position};
pub use rng::SeededRng;
pub use world::{Base, Cell, Occupant, OwnerId, Unit, UnitId, WorldView, PLACEHOLDER_UNIT};
