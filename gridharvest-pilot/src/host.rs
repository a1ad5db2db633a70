//! Minimal local game host for closed-loop runs and tests.
//!
//! It generates a seeded resource map, applies the pilot's intents (leave
//! costs, moves, extraction, banking at base), spawns new units when the
//! pilot was told a spawn is coming, and parks optional stationary hostiles
//! on the map. It deliberately is not a rules-perfect rendition of a
//! competitive host; it is just faithful enough to exercise the engine.

use crate::cost;
use crate::ledger::TelemetryLedger;
use crate::planner::Intent;
use gridharvest_core::{
    Base, Direction, GameConfig, OwnerId, Position, ScenarioError, SeededRng, Unit, UnitId,
    WorldView,
};

pub const PILOT_OWNER: OwnerId = OwnerId(0);
pub const RIVAL_OWNER: OwnerId = OwnerId(1);

#[derive(Clone, Debug)]
pub struct Scenario {
    pub width: u32,
    pub height: u32,
    pub seed: u32,
    pub units: u32,
    pub hostiles: u32,
    pub cfg: GameConfig,
}

impl Scenario {
    pub fn new(width: u32, height: u32, seed: u32) -> Self {
        Self {
            width,
            height,
            seed,
            units: 1,
            hostiles: 0,
            cfg: GameConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct Host {
    cfg: GameConfig,
    world: WorldView,
    owner: OwnerId,
    base: Position,
    tick: u32,
    banked: u64,
    spawned: u32,
    next_unit_id: u32,
}

impl Host {
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut world = WorldView::new(scenario.width, scenario.height)?;
        let mut rng = SeededRng::new(scenario.seed);

        // Background noise plus occasional rich pockets.
        for y in 0..world.height() {
            for x in 0..world.width() {
                let mut amount = rng.next_int(256);
                if rng.next_int(10) == 0 {
                    amount += 200 + rng.next_int(600);
                }
                world.cell_mut(Position::new(x, y)).resource = amount;
            }
        }

        let base = world.normalize(Position::new(
            world.width() / 2,
            world.height() / 2,
        ));
        world.cell_mut(base).resource = 0;
        world.add_base(Base {
            owner: PILOT_OWNER,
            position: base,
        });

        let mut next_unit_id = 1u32;
        let mut spots = world.within_radius(base, 2);
        spots.retain(|pos| *pos != base);
        spots.insert(0, base);
        if (scenario.units as usize) > spots.len() {
            return Err(ScenarioError::OutOfSpawnRoom);
        }
        for spot in spots.into_iter().take(scenario.units as usize) {
            world.add_unit(Unit {
                id: UnitId(next_unit_id),
                owner: PILOT_OWNER,
                position: spot,
                cargo: 0,
            });
            next_unit_id += 1;
        }

        let mut placed = 0;
        let mut attempts = 0;
        while placed < scenario.hostiles && attempts < 10_000 {
            attempts += 1;
            let pos = Position::new(
                rng.next_int(world.width() as u32) as i32,
                rng.next_int(world.height() as u32) as i32,
            );
            if world.distance(pos, base) <= 3 || world.cell(pos).occupant.is_some() {
                continue;
            }
            world.add_unit(Unit {
                id: UnitId(10_000 + placed),
                owner: RIVAL_OWNER,
                position: pos,
                cargo: 0,
            });
            world.refresh_occupancy();
            placed += 1;
        }

        world.refresh_occupancy();
        Ok(Self {
            cfg: scenario.cfg,
            world,
            owner: PILOT_OWNER,
            base,
            tick: 0,
            banked: 0,
            spawned: 0,
            next_unit_id,
        })
    }

    /// Wrap an externally built world, for tests that need exact layouts.
    pub fn with_world(cfg: GameConfig, world: WorldView, owner: OwnerId) -> Result<Self, ScenarioError> {
        let Some(base) = world
            .bases()
            .iter()
            .find(|base| base.owner == owner)
            .map(|base| base.position)
        else {
            return Err(ScenarioError::NoBaseForOwner { owner: owner.0 });
        };
        let next_unit_id = world
            .units()
            .iter()
            .map(|unit| unit.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        Ok(Self {
            cfg,
            world,
            owner,
            base,
            tick: 0,
            banked: 0,
            spawned: 0,
            next_unit_id,
        })
    }

    pub fn world(&self) -> &WorldView {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldView {
        &mut self.world
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn banked(&self) -> u64 {
        self.banked
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn base(&self) -> Position {
        self.base
    }

    pub fn game_over(&self) -> bool {
        self.tick >= self.cfg.max_turns
    }

    /// Spawn heuristic: afford a unit and expect it to pay for itself well
    /// before the game ends, judged by the slowest breakeven seen so far.
    pub fn wants_spawn(&self, ledger: &TelemetryLedger) -> bool {
        let turns_remaining = self.cfg.max_turns.saturating_sub(self.tick);
        self.banked >= u64::from(self.cfg.unit_cost)
            && turns_remaining > ledger.max_breakeven_age().saturating_mul(4)
    }

    /// Advance one tick: apply intents in order, then the requested spawn.
    pub fn apply(&mut self, intents: &[Intent], spawn: bool) {
        for intent in intents {
            let Some(unit) = self.world.unit(intent.unit).copied() else {
                continue;
            };

            if intent.direction == Direction::Still {
                let harvest = cost::evaluate_at(
                    &self.world,
                    &self.cfg,
                    unit.position,
                    unit.owner,
                    unit.cargo,
                );
                if harvest.gain_of_stay > 0 {
                    let cell = self.world.cell_mut(unit.position);
                    let removed = cell.resource / self.cfg.extract_ratio;
                    cell.resource -= removed;
                    if let Some(unit) = self.world.unit_mut(intent.unit) {
                        unit.cargo += harvest.gain_of_stay;
                    }
                }
                continue;
            }

            let cost = self.world.cell(unit.position).resource / self.cfg.move_cost_ratio;
            if unit.cargo < cost {
                // Illegal by the planner's contract; treated as a stall.
                continue;
            }
            let dest = self.world.step(unit.position, intent.direction);
            let banks = self.world.is_own_base(dest, unit.owner) && unit.owner == self.owner;
            if let Some(unit) = self.world.unit_mut(intent.unit) {
                unit.cargo -= cost;
                unit.position = dest;
                if banks {
                    self.banked += u64::from(unit.cargo);
                    unit.cargo = 0;
                }
            }
        }

        if spawn && self.banked >= u64::from(self.cfg.unit_cost) {
            self.banked -= u64::from(self.cfg.unit_cost);
            self.world.add_unit(Unit {
                id: UnitId(self.next_unit_id),
                owner: self.owner,
                position: self.base,
                cargo: 0,
            });
            self.next_unit_id += 1;
            self.spawned += 1;
        }

        self.world.refresh_occupancy();
        self.tick += 1;
    }
}
