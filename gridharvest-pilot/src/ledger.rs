//! Per-unit lifetime telemetry, derived entirely from world observations.
//!
//! Records are created on first sighting and never removed; a unit missing
//! from a tick's roster is flagged inactive but its history stays. Collection
//! and delivery are inferred from cargo deltas between sightings, so the
//! ledger works against any feed without hooks into move application.

use crate::lifecycle::UnitState;
use gridharvest_core::{Position, Unit, UnitId, WorldView};
use serde::Serialize;
use std::collections::HashMap;

/// Breakeven age reported before any unit has actually paid for itself.
/// Keeps the spawn heuristic optimistic at game start.
pub const DEFAULT_BREAKEVEN_AGE: u32 = 3;

#[derive(Clone, Debug, Serialize)]
pub struct UnitRecord {
    pub unit: UnitId,
    pub born_tick: u32,
    pub last_seen_tick: u32,
    pub active: bool,
    pub collected: u64,
    pub delivered: u64,
    pub distance_traveled: u64,
    pub state: UnitState,
    #[serde(skip)]
    last_position: Position,
    #[serde(skip)]
    last_cargo: u32,
    #[serde(skip)]
    broke_even: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TelemetryLedger {
    records: Vec<UnitRecord>,
    index: HashMap<UnitId, usize>,
    breakeven_age: Option<u32>,
}

impl TelemetryLedger {
    /// Update (or create) the record for a sighted unit. A cargo increase is
    /// counted as collection; a cargo drop while standing on an own base as
    /// delivery.
    pub fn observe(
        &mut self,
        world: &WorldView,
        unit: &Unit,
        state: UnitState,
        tick: u32,
        unit_cost: u32,
    ) {
        let idx = match self.index.get(&unit.id) {
            Some(&idx) => idx,
            None => {
                let idx = self.records.len();
                self.records.push(UnitRecord {
                    unit: unit.id,
                    born_tick: tick,
                    last_seen_tick: tick,
                    active: true,
                    collected: 0,
                    delivered: 0,
                    distance_traveled: 0,
                    state,
                    last_position: world.normalize(unit.position),
                    last_cargo: unit.cargo,
                    broke_even: false,
                });
                self.index.insert(unit.id, idx);
                return;
            }
        };

        let record = &mut self.records[idx];
        record.last_seen_tick = tick;
        record.active = true;
        record.state = state;
        record.distance_traveled +=
            u64::from(world.distance(record.last_position, unit.position));
        record.last_position = world.normalize(unit.position);

        if unit.cargo > record.last_cargo {
            record.collected += u64::from(unit.cargo - record.last_cargo);
        } else if unit.cargo < record.last_cargo && world.is_own_base(unit.position, unit.owner) {
            record.delivered += u64::from(record.last_cargo - unit.cargo);
            if !record.broke_even && record.delivered >= u64::from(unit_cost) {
                record.broke_even = true;
                let age = tick.saturating_sub(record.born_tick);
                self.breakeven_age = Some(self.breakeven_age.map_or(age, |best| best.max(age)));
            }
        }
        record.last_cargo = unit.cargo;
    }

    /// Flag records not sighted this tick as inactive.
    pub fn sweep_missing(&mut self, tick: u32) {
        for record in &mut self.records {
            if record.last_seen_tick != tick {
                record.active = false;
            }
        }
    }

    pub fn record(&self, id: UnitId) -> Option<&UnitRecord> {
        self.index.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn records(&self) -> &[UnitRecord] {
        &self.records
    }

    pub fn active_count(&self) -> usize {
        self.records.iter().filter(|record| record.active).count()
    }

    pub fn total_collected(&self) -> u64 {
        self.records.iter().map(|record| record.collected).sum()
    }

    pub fn total_delivered(&self) -> u64 {
        self.records.iter().map(|record| record.delivered).sum()
    }

    /// Longest observed age at which a unit's deliveries first covered its
    /// build cost, or the optimistic default before any unit has.
    pub fn max_breakeven_age(&self) -> u32 {
        self.breakeven_age.unwrap_or(DEFAULT_BREAKEVEN_AGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridharvest_core::{Base, OwnerId, Position};

    const ME: OwnerId = OwnerId(0);

    fn world_with_base() -> WorldView {
        let mut world = WorldView::new(8, 8).unwrap();
        world.add_base(Base {
            owner: ME,
            position: Position::new(0, 0),
        });
        world
    }

    fn unit(pos: Position, cargo: u32) -> Unit {
        Unit {
            id: UnitId(1),
            owner: ME,
            position: pos,
            cargo,
        }
    }

    #[test]
    fn first_sighting_creates_a_record() {
        let world = world_with_base();
        let mut ledger = TelemetryLedger::default();
        ledger.observe(&world, &unit(Position::new(3, 3), 0), UnitState::Foraging, 5, 1000);

        let record = ledger.record(UnitId(1)).unwrap();
        assert_eq!(record.born_tick, 5);
        assert!(record.active);
        assert_eq!(record.collected, 0);
    }

    #[test]
    fn cargo_deltas_split_into_collection_and_delivery() {
        let world = world_with_base();
        let mut ledger = TelemetryLedger::default();
        ledger.observe(&world, &unit(Position::new(3, 3), 0), UnitState::Foraging, 0, 1000);
        ledger.observe(&world, &unit(Position::new(3, 3), 120), UnitState::Foraging, 1, 1000);
        ledger.observe(&world, &unit(Position::new(3, 3), 250), UnitState::Returning, 2, 1000);
        // Bank the load at the base.
        ledger.observe(&world, &unit(Position::new(0, 0), 0), UnitState::Returning, 8, 1000);

        let record = ledger.record(UnitId(1)).unwrap();
        assert_eq!(record.collected, 250);
        assert_eq!(record.delivered, 250);
        assert_eq!(ledger.total_delivered(), 250);
    }

    #[test]
    fn distance_accumulates_along_the_torus() {
        let world = world_with_base();
        let mut ledger = TelemetryLedger::default();
        ledger.observe(&world, &unit(Position::new(0, 0), 0), UnitState::Foraging, 0, 1000);
        // One wrapped step west.
        ledger.observe(&world, &unit(Position::new(7, 0), 0), UnitState::Foraging, 1, 1000);
        assert_eq!(ledger.record(UnitId(1)).unwrap().distance_traveled, 1);
    }

    #[test]
    fn breakeven_age_tracks_the_slowest_payer() {
        let world = world_with_base();
        let mut ledger = TelemetryLedger::default();
        assert_eq!(ledger.max_breakeven_age(), DEFAULT_BREAKEVEN_AGE);

        // Born tick 0, delivers 600 twice; crosses the 1000 cost at tick 40.
        ledger.observe(&world, &unit(Position::new(0, 0), 600), UnitState::Returning, 0, 1000);
        ledger.observe(&world, &unit(Position::new(0, 0), 0), UnitState::Returning, 20, 1000);
        ledger.observe(&world, &unit(Position::new(0, 0), 600), UnitState::Returning, 30, 1000);
        ledger.observe(&world, &unit(Position::new(0, 0), 0), UnitState::Returning, 40, 1000);
        assert_eq!(ledger.max_breakeven_age(), 40);

        // Crossing the threshold again never moves the recorded age.
        ledger.observe(&world, &unit(Position::new(0, 0), 600), UnitState::Returning, 50, 1000);
        ledger.observe(&world, &unit(Position::new(0, 0), 0), UnitState::Returning, 90, 1000);
        assert_eq!(ledger.max_breakeven_age(), 40);
    }

    #[test]
    fn missing_unit_goes_inactive_but_keeps_history() {
        let world = world_with_base();
        let mut ledger = TelemetryLedger::default();
        ledger.observe(&world, &unit(Position::new(3, 3), 0), UnitState::Foraging, 0, 1000);
        ledger.observe(&world, &unit(Position::new(3, 3), 90), UnitState::Foraging, 1, 1000);
        ledger.sweep_missing(2);

        let record = ledger.record(UnitId(1)).unwrap();
        assert!(!record.active);
        assert_eq!(record.collected, 90);
        assert_eq!(ledger.active_count(), 0);
    }
}
