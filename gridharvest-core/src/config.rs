use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Game-rule constants fed by the host at startup. Nothing in the engine
/// hardcodes these; tests and the local lab host construct variants freely.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Divisor of cell resource giving the cost to leave that cell.
    pub move_cost_ratio: u32,
    /// Divisor of cell resource giving the amount extracted per stay.
    pub extract_ratio: u32,
    /// Move-cost divisor while inspired.
    pub inspired_move_cost_ratio: u32,
    /// Extract divisor while inspired.
    pub inspired_extract_ratio: u32,
    /// Radius of the hostile census that activates inspiration.
    pub inspiration_radius: u32,
    /// Hostile count within the radius at which inspiration activates.
    pub inspiration_ship_count: u32,
    /// Total extraction multiplier while inspired.
    pub inspired_bonus_multiplier: u32,
    /// Cargo capacity of a unit.
    pub unit_capacity: u32,
    /// Resource price of spawning one unit.
    pub unit_cost: u32,
    /// Total turn budget for the game.
    pub max_turns: u32,
    /// Expected-stall multiplier applied to round-trip times when scoring
    /// candidate target cells. Must exceed 1.
    pub delay_factor: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_cost_ratio: 10,
            extract_ratio: 4,
            inspired_move_cost_ratio: 10,
            inspired_extract_ratio: 4,
            inspiration_radius: 4,
            inspiration_ship_count: 2,
            inspired_bonus_multiplier: 3,
            unit_capacity: 1000,
            unit_cost: 1000,
            max_turns: 400,
            delay_factor: 1.2,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_cost_ratio == 0 || self.inspired_move_cost_ratio == 0 {
            return Err(ConfigError::ZeroMoveCostRatio);
        }
        if self.extract_ratio == 0 || self.inspired_extract_ratio == 0 {
            return Err(ConfigError::ZeroExtractRatio);
        }
        if self.unit_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_turns == 0 {
            return Err(ConfigError::ZeroTurnBudget);
        }
        if self.delay_factor < 1.0 {
            return Err(ConfigError::DelayFactorBelowOne {
                found: self.delay_factor,
            });
        }
        Ok(())
    }
}
