//! The per-tick coordination pipeline: lifecycle and recall, target
//! reassignment, raw movement intents, conflict resolution, and the final
//! ordered intent list. Fully synchronous; every decision for a tick is a
//! pure function of (world, tick, seed) plus the carried-over target book.

use crate::assign::{self, TargetBook};
use crate::cost;
use crate::ledger::TelemetryLedger;
use crate::lifecycle::{classify, RecallLatch, UnitState};
use crate::planner::{self, Intent};
use crate::resolve;
use gridharvest_core::{
    ConfigError, GameConfig, OwnerId, Position, SeededRng, UnitId, WorldView, PLACEHOLDER_UNIT,
};
use log::debug;
use std::collections::HashMap;

pub struct Pilot {
    cfg: GameConfig,
    owner: OwnerId,
    rng: SeededRng,
    targets: TargetBook,
    latch: RecallLatch,
    ledger: TelemetryLedger,
    recall_tick: Option<u32>,
    softlocks: u32,
}

impl Pilot {
    pub fn new(cfg: GameConfig, owner: OwnerId, seed: u32) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            owner,
            rng: SeededRng::new(seed),
            targets: TargetBook::default(),
            latch: RecallLatch::default(),
            ledger: TelemetryLedger::default(),
            recall_tick: None,
            softlocks: 0,
        })
    }

    pub fn cfg(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn ledger(&self) -> &TelemetryLedger {
        &self.ledger
    }

    pub fn recall_engaged(&self) -> bool {
        self.latch.engaged()
    }

    /// Tick at which the recall latch tripped, if it has.
    pub fn recall_tick(&self) -> Option<u32> {
        self.recall_tick
    }

    /// Units left softlocked over the whole game so far.
    pub fn softlocks(&self) -> u32 {
        self.softlocks
    }

    pub fn target_of(&self, id: UnitId) -> Option<Position> {
        self.targets.target_of(id)
    }

    /// Plan one tick. Mutates `world` only through provisional occupancy
    /// marks; the caller owns actual move application. The returned intents
    /// are in ascending unit id order.
    pub fn plan_turn(
        &mut self,
        world: &mut WorldView,
        tick: u32,
        spawn_requested: bool,
    ) -> Vec<Intent> {
        // A requested spawn claims the base cell before anyone plans into it.
        if spawn_requested {
            let base = world
                .bases()
                .iter()
                .find(|base| base.owner == self.owner)
                .map(|base| base.position);
            if let Some(pos) = base {
                world.mark_occupied(pos, PLACEHOLDER_UNIT, self.owner);
            }
        }

        // A hostile parked on an own base must not scare returning units or
        // block delivery; its mark is dropped for the rest of the tick.
        let own_bases: Vec<Position> = world
            .bases()
            .iter()
            .filter(|base| base.owner == self.owner)
            .map(|base| base.position)
            .collect();
        for pos in own_bases {
            let hostile = world
                .cell(pos)
                .occupant
                .is_some_and(|occ| occ.owner != self.owner);
            if hostile {
                world.clear_occupied(pos);
            }
        }

        if self.latch.update(&self.cfg, world, self.owner, tick) {
            self.recall_tick = Some(tick);
        }

        let order = world.unit_ids_of(self.owner);
        self.targets.retain_units(&order);

        let mut states: HashMap<UnitId, UnitState> = HashMap::with_capacity(order.len());
        for &id in &order {
            let Some(unit) = world.unit(id).copied() else {
                continue;
            };
            let state = classify(&self.cfg, self.latch.engaged(), &unit, tick);
            self.ledger
                .observe(world, &unit, state, tick, self.cfg.unit_cost);
            states.insert(id, state);
        }
        self.ledger.sweep_missing(tick);

        if self.latch.engaged() {
            // Everyone home; fresh foraging targets stop mattering.
            for &id in &order {
                let Some(unit) = world.unit(id).copied() else {
                    continue;
                };
                if let Some((_, base)) = world.nearest_base(unit.position, self.owner) {
                    self.targets.bind(id, base);
                }
            }
        } else {
            let mut needy = Vec::new();
            for &id in &order {
                let Some(unit) = world.unit(id).copied() else {
                    continue;
                };
                match states.get(&id) {
                    Some(UnitState::Returning) => {
                        if let Some((_, base)) = world.nearest_base(unit.position, self.owner) {
                            self.targets.bind(id, base);
                        }
                    }
                    _ => {
                        if assign::needs_retarget(&self.cfg, world, &self.targets, &unit, self.owner)
                        {
                            needy.push(unit);
                        }
                    }
                }
            }
            assign::reassign(&self.cfg, world, &mut self.targets, &needy, self.owner);
        }

        let mut intents: HashMap<UnitId, Intent> = HashMap::with_capacity(order.len());
        for &id in &order {
            let Some(unit) = world.unit(id).copied() else {
                continue;
            };
            let Some(target) = self.targets.target_of(id) else {
                // Nothing worth chasing this tick; harvest in place.
                intents.insert(id, Intent::stay(id));
                continue;
            };
            let state = states.get(&id).copied().unwrap_or(UnitState::Foraging);
            let harvest =
                cost::evaluate_at(world, &self.cfg, unit.position, self.owner, unit.cargo);
            let intent =
                planner::plan_unit(&self.cfg, world, &unit, target, state, harvest, &mut self.rng);
            intents.insert(id, intent);
        }

        let stuck = resolve::resolve_conflicts(
            world,
            &self.targets,
            &mut intents,
            &order,
            self.owner,
            &mut self.rng,
        );
        if stuck > 0 {
            debug!("tick {tick}: {stuck} unit(s) softlocked");
            self.softlocks += stuck;
        }

        order
            .iter()
            .filter_map(|id| intents.get(id).copied())
            .collect()
    }
}
