//! Post-pass repair of colliding or deadlocked intents: direct takeover of a
//! freed cell, atomic two-unit swaps, and a last-resort escape wiggle away
//! from hostiles. One pass in ascending unit id order; every committed
//! destination is marked before later units are examined, so the order
//! dependency is deliberate and documented, not a fixed-point search.

use crate::assign::TargetBook;
use crate::planner::{fast_directions, Intent};
use gridharvest_core::{Direction, OwnerId, SeededRng, UnitId, WorldView};
use log::debug;
use std::collections::HashMap;

/// Repair softlocked intents in place. Returns the number of units left
/// softlocked after resolution (an expected outcome, not an error).
pub fn resolve_conflicts(
    world: &mut WorldView,
    book: &TargetBook,
    intents: &mut HashMap<UnitId, Intent>,
    order: &[UnitId],
    owner: OwnerId,
    rng: &mut SeededRng,
) -> u32 {
    let mut softlocked = 0u32;

    for &id in order {
        let stuck = intents.get(&id).is_some_and(Intent::is_softlocked);
        if !stuck {
            continue;
        }
        let Some(unit) = world.unit(id).copied() else {
            continue;
        };
        let Some(target) = book.target_of(id) else {
            continue;
        };

        let mut resolved = false;
        for dir in fast_directions(world, unit.position, target) {
            let dest = world.step(unit.position, dir);

            if !world.is_blocked(dest, owner) {
                // The blocker moved away earlier in this pass.
                if let Some(intent) = intents.get_mut(&id) {
                    intent.direction = dir;
                }
                world.mark_occupied(dest, id, owner);
                resolved = true;
                break;
            }

            let Some(occupant) = world.cell(dest).occupant else {
                continue;
            };
            if occupant.owner != owner {
                continue;
            }
            // Spawn placeholders are friendly but have no intent entry.
            let Some(other_intent) = intents.get(&occupant.unit).copied() else {
                continue;
            };
            if !other_intent.is_softlocked() {
                continue;
            }
            let Some(other_unit) = world.unit(occupant.unit).copied() else {
                continue;
            };
            let Some(other_target) = book.target_of(occupant.unit) else {
                continue;
            };

            // Mutual blockage: if the occupant wants to step onto this
            // unit's cell, exchange intents atomically.
            for other_dir in fast_directions(world, other_unit.position, other_target) {
                let other_dest = world.step(other_unit.position, other_dir);
                if other_dest == world.normalize(unit.position) {
                    if let Some(intent) = intents.get_mut(&id) {
                        intent.direction = dir;
                    }
                    if let Some(intent) = intents.get_mut(&occupant.unit) {
                        intent.direction = other_dir;
                    }
                    world.mark_occupied(dest, id, owner);
                    world.mark_occupied(other_dest, occupant.unit, owner);
                    debug!("swap resolved between {:?} and {:?}", id, occupant.unit);
                    resolved = true;
                    break;
                }
            }
            if resolved {
                break;
            }
        }

        // Escape wiggle, only when still blocked next to a hostile: any
        // cardinal whose destination is open and has no hostile neighbor.
        if !resolved && world.hostile_adjacent(unit.position, owner) {
            let mut dirs = Direction::CARDINALS;
            rng.shuffle(&mut dirs);
            for dir in dirs {
                let dest = world.step(unit.position, dir);
                if !world.is_blocked(dest, owner) && !world.hostile_adjacent(dest, owner) {
                    if let Some(intent) = intents.get_mut(&id) {
                        intent.direction = dir;
                    }
                    world.mark_occupied(dest, id, owner);
                    resolved = true;
                    break;
                }
            }
        }

        if !resolved {
            debug!("unit {id:?} softlocked this tick");
            softlocked += 1;
        }
    }

    softlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridharvest_core::{Base, Position, Unit};

    const ME: OwnerId = OwnerId(0);
    const THEM: OwnerId = OwnerId(1);

    fn stuck(unit: UnitId) -> Intent {
        Intent {
            unit,
            direction: Direction::Still,
            attempted_move: true,
        }
    }

    fn setup(units: &[(u32, Position)]) -> WorldView {
        let mut world = WorldView::new(9, 9).unwrap();
        world.add_base(Base {
            owner: ME,
            position: Position::new(0, 0),
        });
        for (id, pos) in units {
            world.add_unit(Unit {
                id: UnitId(*id),
                owner: ME,
                position: *pos,
                cargo: 500,
            });
        }
        world.refresh_occupancy();
        world
    }

    #[test]
    fn mutual_blockage_resolves_as_a_swap() {
        // A at (3,3) wants (5,3); B at (4,3) wants (2,3). Each can only pass
        // through the other.
        let mut world = setup(&[(1, Position::new(3, 3)), (2, Position::new(4, 3))]);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(5, 3));
        book.bind(UnitId(2), Position::new(2, 3));

        let mut intents = HashMap::new();
        intents.insert(UnitId(1), stuck(UnitId(1)));
        intents.insert(UnitId(2), stuck(UnitId(2)));
        let order = [UnitId(1), UnitId(2)];

        let mut rng = SeededRng::new(1);
        let left = resolve_conflicts(&mut world, &book, &mut intents, &order, ME, &mut rng);

        assert_eq!(left, 0);
        assert_eq!(intents[&UnitId(1)].direction, Direction::East);
        assert_eq!(intents[&UnitId(2)].direction, Direction::West);
    }

    #[test]
    fn freed_cell_is_taken_directly() {
        // The blocker is gone by resolution time: cell (4,3) is open.
        let mut world = setup(&[(1, Position::new(3, 3))]);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(6, 3));

        let mut intents = HashMap::new();
        intents.insert(UnitId(1), stuck(UnitId(1)));
        let mut rng = SeededRng::new(1);
        let left = resolve_conflicts(&mut world, &book, &mut intents, &[UnitId(1)], ME, &mut rng);

        assert_eq!(left, 0);
        assert_eq!(intents[&UnitId(1)].direction, Direction::East);
        assert!(world.cell(Position::new(4, 3)).occupant.is_some());
    }

    #[test]
    fn hostile_blockage_takes_the_escape_wiggle() {
        let mut world = setup(&[(1, Position::new(3, 3))]);
        world.add_unit(Unit {
            id: UnitId(70),
            owner: THEM,
            position: Position::new(4, 3),
            cargo: 0,
        });
        world.refresh_occupancy();
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(5, 3));

        let mut intents = HashMap::new();
        intents.insert(UnitId(1), stuck(UnitId(1)));
        let mut rng = SeededRng::new(7);
        let left = resolve_conflicts(&mut world, &book, &mut intents, &[UnitId(1)], ME, &mut rng);

        assert_eq!(left, 0);
        let dir = intents[&UnitId(1)].direction;
        assert_ne!(dir, Direction::Still);
        let dest = world.step(Position::new(3, 3), dir);
        assert!(!world.hostile_adjacent(dest, ME));
    }

    #[test]
    fn unresolvable_lock_is_counted_not_fatal() {
        // Fully walled in by friendly units that are all content to stay.
        let mut world = setup(&[
            (1, Position::new(3, 3)),
            (2, Position::new(4, 3)),
            (3, Position::new(2, 3)),
            (4, Position::new(3, 2)),
            (5, Position::new(3, 4)),
        ]);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(6, 3));

        let mut intents = HashMap::new();
        intents.insert(UnitId(1), stuck(UnitId(1)));
        for id in [2, 3, 4, 5] {
            intents.insert(UnitId(id), Intent::stay(UnitId(id)));
        }
        let mut rng = SeededRng::new(1);
        let left = resolve_conflicts(&mut world, &book, &mut intents, &[UnitId(1)], ME, &mut rng);

        assert_eq!(left, 1);
        assert_eq!(intents[&UnitId(1)].direction, Direction::Still);
    }

    #[test]
    fn no_two_final_destinations_coincide() {
        // Three units in a row all pushing east toward the same area.
        let mut world = setup(&[
            (1, Position::new(2, 3)),
            (2, Position::new(3, 3)),
            (3, Position::new(4, 3)),
        ]);
        let mut book = TargetBook::default();
        book.bind(UnitId(1), Position::new(6, 3));
        book.bind(UnitId(2), Position::new(6, 3));
        book.bind(UnitId(3), Position::new(6, 3));

        let mut intents = HashMap::new();
        for id in [1, 2, 3] {
            intents.insert(UnitId(id), stuck(UnitId(id)));
        }
        let order = [UnitId(1), UnitId(2), UnitId(3)];
        let mut rng = SeededRng::new(3);
        resolve_conflicts(&mut world, &book, &mut intents, &order, ME, &mut rng);

        let mut dests = Vec::new();
        for id in [1, 2, 3] {
            let unit_pos = world.unit(UnitId(id)).unwrap().position;
            let dir = intents[&UnitId(id)].direction;
            dests.push(world.step(unit_pos, dir));
        }
        dests.sort_by_key(|pos| (pos.x, pos.y));
        dests.dedup();
        assert_eq!(dests.len(), 3);
    }
}
