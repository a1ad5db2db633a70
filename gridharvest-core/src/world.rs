use crate::error::ScenarioError;
use crate::position::{Direction, Position};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u8);

/// Occupancy mark for a freshly requested spawn. The placeholder is friendly
/// for collision purposes but never appears in the intent table.
pub const PLACEHOLDER_UNIT: UnitId = UnitId(u32::MAX);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub unit: UnitId,
    pub owner: OwnerId,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Cell {
    pub resource: u32,
    pub occupant: Option<Occupant>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: OwnerId,
    pub position: Position,
    pub cargo: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Base {
    pub owner: OwnerId,
    pub position: Position,
}

/// Queryable snapshot of the grid for one tick.
///
/// The host feed rebuilds resource amounts and occupancy every tick; during
/// planning the engine additionally writes provisional occupancy marks for
/// destinations it has already claimed. Those marks never outlive the tick.
#[derive(Clone, Debug)]
pub struct WorldView {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    units: Vec<Unit>,
    bases: Vec<Base>,
}

impl WorldView {
    pub fn new(width: u32, height: u32) -> Result<Self, ScenarioError> {
        if width == 0 || height == 0 {
            return Err(ScenarioError::EmptyGrid { width, height });
        }
        Ok(Self {
            width: width as i32,
            height: height as i32,
            cells: vec![Cell::default(); (width * height) as usize],
            units: Vec::new(),
            bases: Vec::new(),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn normalize(&self, pos: Position) -> Position {
        Position {
            x: pos.x.rem_euclid(self.width),
            y: pos.y.rem_euclid(self.height),
        }
    }

    fn index(&self, pos: Position) -> usize {
        let p = self.normalize(pos);
        (p.y * self.width + p.x) as usize
    }

    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    /// Shortest signed delta from `a` to `b` along one axis of size `size`.
    /// Exactly-half deltas resolve to the positive direction.
    pub fn wrapped_delta(a: i32, b: i32, size: i32) -> i32 {
        let mut d = (b - a).rem_euclid(size);
        if d > size / 2 {
            d -= size;
        }
        d
    }

    /// Toroidal Manhattan distance.
    pub fn distance(&self, a: Position, b: Position) -> u32 {
        let a = self.normalize(a);
        let b = self.normalize(b);
        let dx = Self::wrapped_delta(a.x, b.x, self.width).unsigned_abs();
        let dy = Self::wrapped_delta(a.y, b.y, self.height).unsigned_abs();
        dx + dy
    }

    /// One wrapped step from `pos` in `dir`.
    pub fn step(&self, pos: Position, dir: Direction) -> Position {
        self.normalize(pos.offset(dir))
    }

    pub fn cardinal_neighbors(&self, pos: Position) -> [Position; 4] {
        Direction::CARDINALS.map(|dir| self.step(pos, dir))
    }

    /// All positions within Manhattan radius `r`, including `pos` itself.
    pub fn within_radius(&self, pos: Position, r: u32) -> Vec<Position> {
        let r = r as i32;
        let mut out = Vec::with_capacity((2 * r * r + 2 * r + 1) as usize);
        for dx in -r..=r {
            let rem = r - dx.abs();
            for dy in -rem..=rem {
                out.push(self.normalize(Position::new(pos.x + dx, pos.y + dy)));
            }
        }
        out
    }

    // ── Units and bases ─────────────────────────────────────────────

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    /// Ids of one owner's units in ascending order, the canonical iteration
    /// order for planning.
    pub fn unit_ids_of(&self, owner: OwnerId) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .units
            .iter()
            .filter(|unit| unit.owner == owner)
            .map(|unit| unit.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    pub fn remove_unit(&mut self, id: UnitId) {
        self.units.retain(|unit| unit.id != id);
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn add_base(&mut self, base: Base) {
        self.bases.push(base);
    }

    pub fn is_own_base(&self, pos: Position, owner: OwnerId) -> bool {
        let pos = self.normalize(pos);
        self.bases
            .iter()
            .any(|base| base.owner == owner && self.normalize(base.position) == pos)
    }

    /// Closest base of `owner`; ties resolve to the lowest base index.
    pub fn nearest_base(&self, pos: Position, owner: OwnerId) -> Option<(usize, Position)> {
        let mut best: Option<(usize, Position, u32)> = None;
        for (idx, base) in self.bases.iter().enumerate() {
            if base.owner != owner {
                continue;
            }
            let dist = self.distance(pos, base.position);
            match best {
                Some((_, _, best_dist)) if dist >= best_dist => {}
                _ => best = Some((idx, base.position, dist)),
            }
        }
        best.map(|(idx, base_pos, _)| (idx, base_pos))
    }

    // ── Occupancy ───────────────────────────────────────────────────

    /// Whether `pos` blocks movement for a unit of `owner`. Own base cells
    /// never block: units may always co-locate on their own base.
    pub fn is_blocked(&self, pos: Position, owner: OwnerId) -> bool {
        if self.is_own_base(pos, owner) {
            return false;
        }
        self.cell(pos).occupant.is_some()
    }

    pub fn mark_occupied(&mut self, pos: Position, unit: UnitId, owner: OwnerId) {
        self.cell_mut(pos).occupant = Some(Occupant { unit, owner });
    }

    pub fn clear_occupied(&mut self, pos: Position) {
        self.cell_mut(pos).occupant = None;
    }

    /// Drop all occupancy marks and re-derive them from unit positions.
    /// Called by the host feed at the start of every tick.
    pub fn refresh_occupancy(&mut self) {
        for cell in &mut self.cells {
            cell.occupant = None;
        }
        let marks: Vec<(Position, UnitId, OwnerId)> = self
            .units
            .iter()
            .map(|unit| (unit.position, unit.id, unit.owner))
            .collect();
        for (pos, id, owner) in marks {
            self.mark_occupied(pos, id, owner);
        }
    }

    /// Whether any cardinal neighbor of `pos` holds a unit of another owner.
    pub fn hostile_adjacent(&self, pos: Position, owner: OwnerId) -> bool {
        self.cardinal_neighbors(pos).iter().any(|nbr| {
            self.cell(*nbr)
                .occupant
                .is_some_and(|occ| occ.owner != owner)
        })
    }

    /// Count of other owners' units within Manhattan radius `r` of `pos`.
    pub fn hostiles_within(&self, pos: Position, r: u32, owner: OwnerId) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.owner != owner && self.distance(unit.position, pos) <= r)
            .count()
    }

    pub fn total_resource(&self) -> u64 {
        self.cells.iter().map(|cell| u64::from(cell.resource)).sum()
    }
}
