//! Converts one unit's (state, target, economics, hostile proximity) into a
//! single candidate direction for the tick.
//!
//! The planner provisionally marks every destination it claims, so later
//! units in the same pass already see the claim. Unit iteration order is
//! ascending id and is part of the engine's contract.

use crate::cost::Harvest;
use crate::lifecycle::UnitState;
use gridharvest_core::{Direction, GameConfig, Position, SeededRng, Unit, UnitId, WorldView};
use serde::{Deserialize, Serialize};

/// Per-tick, ephemeral movement decision. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub unit: UnitId,
    pub direction: Direction,
    /// True when the unit wanted to move this tick; a `Still` direction with
    /// this flag set is a soft-deadlock candidate for the conflict resolver.
    pub attempted_move: bool,
}

impl Intent {
    pub fn stay(unit: UnitId) -> Self {
        Self {
            unit,
            direction: Direction::Still,
            attempted_move: false,
        }
    }

    pub fn is_softlocked(&self) -> bool {
        self.attempted_move && self.direction == Direction::Still
    }
}

/// Directions that strictly reduce toroidal distance to `to`, ranked with the
/// larger wrapped axis delta first (x-axis on ties). At most two entries.
pub fn fast_directions(world: &WorldView, from: Position, to: Position) -> Vec<Direction> {
    let from = world.normalize(from);
    let to = world.normalize(to);
    let dx = WorldView::wrapped_delta(from.x, to.x, world.width());
    let dy = WorldView::wrapped_delta(from.y, to.y, world.height());

    let x_dir = if dx > 0 {
        Some(Direction::East)
    } else if dx < 0 {
        Some(Direction::West)
    } else {
        None
    };
    let y_dir = if dy > 0 {
        Some(Direction::South)
    } else if dy < 0 {
        Some(Direction::North)
    } else {
        None
    };

    let mut out = Vec::with_capacity(2);
    if dy.abs() > dx.abs() {
        out.extend(y_dir);
        out.extend(x_dir);
    } else {
        out.extend(x_dir);
        out.extend(y_dir);
    }
    out
}

/// Plan one unit's raw intent, claiming its destination in `world` when the
/// plan is a move. Consumes at most two RNG draws, in a fixed order.
#[allow(clippy::too_many_arguments)]
pub fn plan_unit(
    cfg: &GameConfig,
    world: &mut WorldView,
    unit: &Unit,
    target: Position,
    state: UnitState,
    harvest: Harvest,
    rng: &mut SeededRng,
) -> Intent {
    let owner = unit.owner;
    let at_target = world.normalize(unit.position) == world.normalize(target);

    // A unit that cannot afford to leave, or already sits on its target,
    // stays put. Always legal.
    if unit.cargo < harvest.cost_to_leave || at_target {
        return Intent::stay(unit.id);
    }

    if state == UnitState::Recalled {
        // Pure urgency: first unblocked fast direction toward base, no
        // patience, no evasion.
        for dir in fast_directions(world, unit.position, target) {
            let dest = world.step(unit.position, dir);
            if !world.is_blocked(dest, owner) {
                world.mark_occupied(dest, unit.id, owner);
                return Intent {
                    unit: unit.id,
                    direction: dir,
                    attempted_move: true,
                };
            }
        }
        // Blocked on every fast direction: flagged for the resolver.
        return Intent {
            unit: unit.id,
            direction: Direction::Still,
            attempted_move: true,
        };
    }

    // Scan fast directions for an unblocked destination; prefer one that is
    // not hostile-adjacent.
    let mut tentative = Direction::Still;
    let mut need_evade = true;
    for dir in fast_directions(world, unit.position, target) {
        let dest = world.step(unit.position, dir);
        if !world.is_blocked(dest, owner) {
            tentative = dir;
            if !world.hostile_adjacent(dest, owner) {
                need_evade = false;
                break;
            }
        }
    }
    if tentative == Direction::Still && !world.hostile_adjacent(unit.position, owner) {
        need_evade = false;
    }

    let capacity = f64::from(cfg.unit_capacity);
    let evasiveness = if world.is_own_base(target, owner) {
        // Coming home with cargo: survival always wins.
        1.0
    } else if tentative == Direction::Still {
        1.0 - f64::from(harvest.gain_of_stay) / capacity
    } else {
        f64::from(unit.cargo) / capacity
    };

    if need_evade && rng.next_unit_f64() < evasiveness {
        // Defensive override: shuffled cardinal scan for a destination that
        // is unblocked and clear of hostiles.
        let mut dirs = Direction::CARDINALS;
        rng.shuffle(&mut dirs);
        for dir in dirs {
            let dest = world.step(unit.position, dir);
            if !world.is_blocked(dest, owner) && !world.hostile_adjacent(dest, owner) {
                world.mark_occupied(dest, unit.id, owner);
                return Intent {
                    unit: unit.id,
                    direction: dir,
                    attempted_move: true,
                };
            }
        }
        return Intent {
            unit: unit.id,
            direction: Direction::Still,
            attempted_move: true,
        };
    }

    // Stay-vs-go: the patience draw favors squeezing more out of the current
    // cell when the move is expensive relative to what is at stake.
    let patience = if world.is_own_base(target, owner) {
        f64::from(harvest.cost_to_leave) / f64::from(unit.cargo.max(10))
    } else {
        let target_resource = f64::from(world.cell(target).resource);
        f64::from(harvest.gain_of_stay) / (target_resource * 0.25).max(10.0)
    };

    if rng.next_unit_f64() < patience {
        return Intent::stay(unit.id);
    }

    if tentative != Direction::Still {
        let dest = world.step(unit.position, tentative);
        world.mark_occupied(dest, unit.id, owner);
    }
    Intent {
        unit: unit.id,
        direction: tentative,
        attempted_move: true,
    }
}
