//! Economic model of a single cell: what staying earns and what leaving
//! costs, including the inspired bonus regime near hostile clusters.

use gridharvest_core::{GameConfig, OwnerId, Position, WorldView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Harvest {
    pub cost_to_leave: u32,
    pub gain_of_stay: u32,
    pub inspired: bool,
}

/// Hostile units within the inspiration radius of `pos`.
pub fn hostile_census(world: &WorldView, pos: Position, owner: OwnerId, cfg: &GameConfig) -> usize {
    world.hostiles_within(pos, cfg.inspiration_radius, owner)
}

/// Pure function of the cell's resource amount and the surrounding hostile
/// census. No side effects; the planner calls this freely.
pub fn evaluate(cfg: &GameConfig, resource: u32, cargo: u32, hostile_count: usize) -> Harvest {
    let inspired = hostile_count >= cfg.inspiration_ship_count as usize;
    let (move_ratio, extract_ratio) = if inspired {
        (cfg.inspired_move_cost_ratio, cfg.inspired_extract_ratio)
    } else {
        (cfg.move_cost_ratio, cfg.extract_ratio)
    };

    let cost_to_leave = resource / move_ratio;
    let mut gain_of_stay = resource / extract_ratio;
    if inspired {
        gain_of_stay = gain_of_stay.saturating_mul(cfg.inspired_bonus_multiplier);
    }
    // Cargo never exceeds capacity.
    gain_of_stay = gain_of_stay.min(cfg.unit_capacity.saturating_sub(cargo));

    Harvest {
        cost_to_leave,
        gain_of_stay,
        inspired,
    }
}

/// Harvest numbers for a unit standing on its current cell.
pub fn evaluate_at(world: &WorldView, cfg: &GameConfig, pos: Position, owner: OwnerId, cargo: u32) -> Harvest {
    let census = hostile_census(world, pos, owner, cfg);
    evaluate(cfg, world.cell(pos).resource, cargo, census)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridharvest_core::{Unit, UnitId};

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn outputs_are_monotone_in_resource() {
        let cfg = cfg();
        let mut last = evaluate(&cfg, 0, 0, 0);
        for resource in 1..=1000 {
            let next = evaluate(&cfg, resource, 0, 0);
            assert!(next.cost_to_leave >= last.cost_to_leave, "resource={resource}");
            assert!(next.gain_of_stay >= last.gain_of_stay, "resource={resource}");
            last = next;
        }
    }

    #[test]
    fn inspiration_switches_exactly_at_threshold() {
        let cfg = cfg();
        let below = evaluate(&cfg, 400, 0, cfg.inspiration_ship_count as usize - 1);
        let at = evaluate(&cfg, 400, 0, cfg.inspiration_ship_count as usize);
        assert!(!below.inspired);
        assert!(at.inspired);
        assert_eq!(below.gain_of_stay, 100);
        assert_eq!(at.gain_of_stay, 300);
    }

    #[test]
    fn gain_is_capped_by_remaining_capacity() {
        let cfg = cfg();
        let harvest = evaluate(&cfg, 800, cfg.unit_capacity - 50, 0);
        assert_eq!(harvest.gain_of_stay, 50);
        let full = evaluate(&cfg, 800, cfg.unit_capacity, 0);
        assert_eq!(full.gain_of_stay, 0);
    }

    #[test]
    fn census_feeds_the_regime_switch() {
        let cfg = cfg();
        let mut world = WorldView::new(9, 9).unwrap();
        let me = OwnerId(0);
        let them = OwnerId(1);
        for (i, pos) in [Position::new(4, 2), Position::new(6, 4)].iter().enumerate() {
            world.add_unit(Unit {
                id: UnitId(i as u32 + 10),
                owner: them,
                position: *pos,
                cargo: 0,
            });
        }
        world.cell_mut(Position::new(4, 4)).resource = 400;
        let harvest = evaluate_at(&world, &cfg, Position::new(4, 4), me, 0);
        assert!(harvest.inspired);
        assert_eq!(harvest.gain_of_stay, 300);
    }
}
