//! Greedy bipartite matching of valuable cells to units that need a target.
//!
//! Candidate cells are "local peaks" (resource above the mean of their four
//! cardinal neighbors). Pairs are scored by resource per estimated round-trip
//! time and bound best-first: a strictly lower-scoring pair never preempts one
//! already assigned, and equal scores resolve to the pair considered first.
//! The pair enumeration order is units ascending by id, cells in row-major
//! order; that tie-break is part of the contract and is tested.

use gridharvest_core::{GameConfig, OwnerId, Position, Unit, UnitId, WorldView};
use log::debug;
use std::collections::HashMap;

/// Persistent unit-to-cell target map. A binding survives across ticks until
/// the unit arrives, a higher-priority state redirects it, or the unit dies.
#[derive(Clone, Debug, Default)]
pub struct TargetBook {
    targets: HashMap<UnitId, Position>,
}

impl TargetBook {
    pub fn target_of(&self, id: UnitId) -> Option<Position> {
        self.targets.get(&id).copied()
    }

    pub fn bind(&mut self, id: UnitId, pos: Position) {
        self.targets.insert(id, pos);
    }

    /// Whether any unit other than `except` holds `pos` as its target.
    pub fn is_bound_elsewhere(&self, pos: Position, except: UnitId) -> bool {
        self.targets
            .iter()
            .any(|(id, target)| *id != except && *target == pos)
    }

    /// Drop bindings for units no longer on the roster.
    pub fn retain_units(&mut self, live: &[UnitId]) {
        self.targets.retain(|id, _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Resource floor below which an arrived unit abandons its cell: the lesser
/// of 10% of capacity and the mean resource of open cells within radius 2.
pub fn dynamic_floor(cfg: &GameConfig, world: &WorldView, unit: &Unit) -> f64 {
    let mut total = 0u64;
    let mut open = 0u64;
    for pos in world.within_radius(unit.position, 2) {
        if pos == world.normalize(unit.position) {
            continue;
        }
        if world.cell(pos).occupant.is_none() {
            total += u64::from(world.cell(pos).resource);
            open += 1;
        }
    }
    let avg_nearby = total as f64 / open.max(1) as f64;
    (f64::from(cfg.unit_capacity) * 0.1).min(avg_nearby)
}

/// Whether a foraging unit needs a fresh target this tick.
pub fn needs_retarget(
    cfg: &GameConfig,
    world: &WorldView,
    book: &TargetBook,
    unit: &Unit,
    owner: OwnerId,
) -> bool {
    let Some(target) = book.target_of(unit.id) else {
        return true;
    };
    if world.normalize(unit.position) != world.normalize(target) {
        return false;
    }
    world.is_own_base(unit.position, owner)
        || f64::from(world.cell(unit.position).resource) < dynamic_floor(cfg, world, unit)
}

/// Cells whose resource strictly exceeds the mean of their cardinal
/// neighbors, in row-major order.
pub fn candidate_cells(world: &WorldView) -> Vec<Position> {
    let mut out = Vec::new();
    for y in 0..world.height() {
        for x in 0..world.width() {
            let pos = Position::new(x, y);
            let neighbor_sum: u64 = world
                .cardinal_neighbors(pos)
                .iter()
                .map(|nbr| u64::from(world.cell(*nbr).resource))
                .sum();
            // resource > sum/4, kept integral.
            if u64::from(world.cell(pos).resource) * 4 > neighbor_sum {
                out.push(pos);
            }
        }
    }
    out
}

fn pair_score(cfg: &GameConfig, world: &WorldView, unit: &Unit, cell: Position, owner: OwnerId) -> f64 {
    let to_cell = f64::from(world.distance(unit.position, cell));
    let to_home = world
        .nearest_base(cell, owner)
        .map(|(_, base)| f64::from(world.distance(cell, base)))
        .unwrap_or(0.0);
    let round_trip = cfg.delay_factor * (to_cell + to_home);
    f64::from(world.cell(cell).resource) / round_trip.max(1.0)
}

/// Bind fresh targets for `needy` units (already in ascending id order).
///
/// Units that exhaust the candidate set keep whatever target they already
/// held; a unit that previously had a target is never left without one.
pub fn reassign(
    cfg: &GameConfig,
    world: &WorldView,
    book: &mut TargetBook,
    needy: &[Unit],
    owner: OwnerId,
) {
    if needy.is_empty() {
        return;
    }

    // Cells already bound as someone's persisted target are out of candidacy;
    // a needy unit's own depleted target is deliberately excluded too.
    let candidates: Vec<Position> = candidate_cells(world)
        .into_iter()
        .filter(|cell| !book.targets.values().any(|target| target == cell))
        .collect();

    struct Pair {
        score: f64,
        unit_ord: usize,
        cell_ord: usize,
    }

    let mut pairs = Vec::with_capacity(needy.len() * candidates.len());
    for (unit_ord, unit) in needy.iter().enumerate() {
        for (cell_ord, cell) in candidates.iter().enumerate() {
            pairs.push(Pair {
                score: pair_score(cfg, world, unit, *cell, owner),
                unit_ord,
                cell_ord,
            });
        }
    }

    // Best score first; ties fall back to enumeration order (unit, then cell).
    pairs.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.unit_ord.cmp(&b.unit_ord))
            .then_with(|| a.cell_ord.cmp(&b.cell_ord))
    });

    let mut unit_taken = vec![false; needy.len()];
    let mut cell_taken = vec![false; candidates.len()];
    for pair in pairs {
        if unit_taken[pair.unit_ord] || cell_taken[pair.cell_ord] {
            continue;
        }
        unit_taken[pair.unit_ord] = true;
        cell_taken[pair.cell_ord] = true;
        let unit = &needy[pair.unit_ord];
        let cell = candidates[pair.cell_ord];
        debug!(
            "unit {:?} retargeted to ({}, {}) score {:.3}",
            unit.id, cell.x, cell.y, pair.score
        );
        book.bind(unit.id, cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridharvest_core::{Base, Unit, UnitId};

    const ME: OwnerId = OwnerId(0);

    fn unit(id: u32, x: i32, y: i32) -> Unit {
        Unit {
            id: UnitId(id),
            owner: ME,
            position: Position::new(x, y),
            cargo: 0,
        }
    }

    fn world_with_base(width: u32, height: u32, base: Position) -> WorldView {
        let mut world = WorldView::new(width, height).unwrap();
        world.add_base(Base {
            owner: ME,
            position: base,
        });
        world
    }

    #[test]
    fn local_peak_filter_drops_flat_cells() {
        let mut world = world_with_base(5, 5, Position::new(0, 0));
        // Uniform field: no cell strictly beats its neighborhood mean.
        for y in 0..5 {
            for x in 0..5 {
                world.cell_mut(Position::new(x, y)).resource = 100;
            }
        }
        assert!(candidate_cells(&world).is_empty());

        world.cell_mut(Position::new(2, 2)).resource = 101;
        assert_eq!(candidate_cells(&world), vec![Position::new(2, 2)]);
    }

    #[test]
    fn no_two_units_share_a_fresh_target() {
        let mut world = world_with_base(7, 7, Position::new(0, 0));
        world.cell_mut(Position::new(3, 3)).resource = 500;
        world.cell_mut(Position::new(5, 5)).resource = 400;
        let needy = vec![unit(1, 3, 2), unit(2, 5, 4)];
        let mut book = TargetBook::default();
        reassign(&GameConfig::default(), &world, &mut book, &needy, ME);

        let a = book.target_of(UnitId(1)).unwrap();
        let b = book.target_of(UnitId(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn persisted_targets_exclude_cells_from_candidacy() {
        let mut world = world_with_base(7, 7, Position::new(0, 0));
        world.cell_mut(Position::new(3, 3)).resource = 500;
        let mut book = TargetBook::default();
        book.bind(UnitId(9), Position::new(3, 3));

        let needy = vec![unit(1, 3, 2)];
        reassign(&GameConfig::default(), &world, &mut book, &needy, ME);
        // The only peak is already bound: unit 1 stays targetless rather than
        // doubling up.
        assert_eq!(book.target_of(UnitId(1)), None);
    }

    #[test]
    fn exhausted_candidates_keep_stale_target() {
        let world = world_with_base(5, 5, Position::new(0, 0));
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(4, 4));
        let needy = vec![unit(1, 4, 4)];
        reassign(&GameConfig::default(), &world, &mut book, &needy, ME);
        assert_eq!(book.target_of(UnitId(1)), Some(Position::new(4, 4)));
    }

    #[test]
    fn equal_scores_resolve_to_first_considered() {
        let mut world = world_with_base(8, 8, Position::new(0, 0));
        // Two identical peaks equidistant from the unit and from the base,
        // symmetric about the x=y diagonal.
        world.cell_mut(Position::new(2, 4)).resource = 300;
        world.cell_mut(Position::new(4, 2)).resource = 300;
        let needy = vec![unit(1, 3, 3)];
        let mut book = TargetBook::default();
        reassign(&GameConfig::default(), &world, &mut book, &needy, ME);
        // Row-major enumeration visits (4, 2) first.
        assert_eq!(book.target_of(UnitId(1)), Some(Position::new(4, 2)));
    }

    #[test]
    fn higher_scoring_unit_wins_the_contested_cell() {
        let mut world = world_with_base(9, 9, Position::new(0, 0));
        world.cell_mut(Position::new(4, 4)).resource = 600;
        world.cell_mut(Position::new(7, 7)).resource = 100;
        // Unit 2 is closer to the rich cell, so it outranks unit 1 there.
        let needy = vec![unit(1, 0, 4), unit(2, 4, 3)];
        let mut book = TargetBook::default();
        reassign(&GameConfig::default(), &world, &mut book, &needy, ME);
        assert_eq!(book.target_of(UnitId(2)), Some(Position::new(4, 4)));
        assert_eq!(book.target_of(UnitId(1)), Some(Position::new(7, 7)));
    }

    #[test]
    fn arrived_unit_on_depleted_cell_needs_retarget() {
        let cfg = GameConfig::default();
        let mut world = world_with_base(7, 7, Position::new(0, 0));
        for y in 0..7 {
            for x in 0..7 {
                world.cell_mut(Position::new(x, y)).resource = 200;
            }
        }
        let target = Position::new(3, 3);
        world.cell_mut(target).resource = 5;
        let arrived = unit(1, 3, 3);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), target);
        assert!(needs_retarget(&cfg, &world, &book, &arrived, ME));

        // Still rich: keep harvesting, no retarget.
        world.cell_mut(target).resource = 400;
        assert!(!needs_retarget(&cfg, &world, &book, &arrived, ME));
    }

    #[test]
    fn unit_short_of_its_target_is_not_needy() {
        let cfg = GameConfig::default();
        let world = world_with_base(7, 7, Position::new(0, 0));
        let en_route = unit(1, 1, 1);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(5, 5));
        assert!(!needs_retarget(&cfg, &world, &book, &en_route, ME));
    }
}
