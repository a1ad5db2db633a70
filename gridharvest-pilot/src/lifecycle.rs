//! Unit lifecycle classification and the game-wide recall latch.

use gridharvest_core::{GameConfig, OwnerId, Unit, WorldView};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitState {
    Foraging,
    Returning,
    Recalled,
}

/// Cargo level at which a unit turns for home. Interpolates from 20% of
/// capacity at tick 0 up to a 90% cap as the game ages.
pub fn return_threshold(cfg: &GameConfig, tick: u32) -> u32 {
    let fraction = (0.2 + f64::from(tick) / 200.0).min(0.9);
    (f64::from(cfg.unit_capacity) * fraction) as u32
}

/// Recomputed fresh every tick from cargo, position, and the recall latch.
pub fn classify(cfg: &GameConfig, recall_engaged: bool, unit: &Unit, tick: u32) -> UnitState {
    if recall_engaged {
        UnitState::Recalled
    } else if unit.cargo >= return_threshold(cfg, tick) {
        UnitState::Returning
    } else {
        UnitState::Foraging
    }
}

/// Process-wide monotonic recall flag. One unit tripping the condition forces
/// every unit home for the remainder of the game; there is no reset path.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecallLatch {
    engaged: bool,
}

impl RecallLatch {
    pub fn engaged(&self) -> bool {
        self.engaged
    }

    /// Latches when any unit's remaining-turns budget can no longer cover its
    /// return distance (boundary inclusive: `turns_remaining == distance`
    /// trips). Returns whether this call newly engaged the latch.
    pub fn update(
        &mut self,
        cfg: &GameConfig,
        world: &WorldView,
        owner: OwnerId,
        tick: u32,
    ) -> bool {
        if self.engaged {
            return false;
        }
        let turns_remaining = cfg.max_turns.saturating_sub(tick);
        for unit in world.units().iter().filter(|unit| unit.owner == owner) {
            let Some((_, base_pos)) = world.nearest_base(unit.position, owner) else {
                continue;
            };
            if turns_remaining <= world.distance(unit.position, base_pos) {
                self.engaged = true;
                info!(
                    "recall latch engaged at tick {tick}: unit {:?} is {} from base with {} turns left",
                    unit.id,
                    world.distance(unit.position, base_pos),
                    turns_remaining
                );
                return true;
            }
        }
        false
    }
}
