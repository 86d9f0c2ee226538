//! Growable cell matrix and per-cell aggregated state.
//!
//! The grid only ever grows (the game reveals coordinates append-only); cells
//! are reset in place each turn, never destroyed.

use crate::position::Position;
use fnv::FnvHashMap;

/// Straight (cardinal) neighbor offsets.
pub const STRAIGHT_DIRECTIONS: [Position; 4] = [
    Position::new(-1, 0),
    Position::new(1, 0),
    Position::new(0, -1),
    Position::new(0, 1),
];

/// Diagonal neighbor offsets.
pub const DIAGONAL_DIRECTIONS: [Position; 4] = [
    Position::new(-1, -1),
    Position::new(-1, 1),
    Position::new(1, 1),
    Position::new(1, -1),
];

/// All eight neighbor offsets.
pub const ALL_DIRECTIONS: [Position; 8] = [
    Position::new(-1, 0),
    Position::new(-1, -1),
    Position::new(-1, 1),
    Position::new(1, 0),
    Position::new(1, 1),
    Position::new(1, -1),
    Position::new(0, -1),
    Position::new(0, 1),
];

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum CellKind {
    #[default]
    Normal,
    Wall,
    Spawn,
}

/// Per-coordinate aggregated state.
///
/// The three danger components are written by disjoint propagation passes;
/// `danger_multiplier` is the only field touched by more than one pass and is
/// purely multiplicative, so pass order does not matter for it.
#[derive(Clone, Debug)]
pub struct Cell {
    pub kind: CellKind,
    pub zombie_danger: f64,
    pub spawn_danger: f64,
    pub enemy_danger: f64,
    pub danger_multiplier: f64,
    /// Damage dealt to this cell by our own attacks this turn. Every occupant
    /// of a cell absorbs every hit on the cell, so one counter is exact.
    pub damage_taken: i32,
    pub building: Option<usize>,
    pub zombies: Vec<usize>,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            kind: CellKind::Normal,
            zombie_danger: 0.0,
            spawn_danger: 0.0,
            enemy_danger: 0.0,
            danger_multiplier: 1.0,
            damage_taken: 0,
            building: None,
            zombies: Vec::new(),
        }
    }
}

impl Cell {
    pub fn reset(&mut self) {
        self.kind = CellKind::Normal;
        self.zombie_danger = 0.0;
        self.spawn_danger = 0.0;
        self.enemy_danger = 0.0;
        self.danger_multiplier = 1.0;
        self.damage_taken = 0;
        self.building = None;
        self.zombies.clear();
    }

    #[inline]
    pub fn danger_score(&self) -> f64 {
        (self.zombie_danger + self.spawn_danger + self.enemy_danger) * self.danger_multiplier
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new()
    }
}

/// Row-major flat matrix of cells, grown on demand.
#[derive(Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    width: i32,
    height: i32,
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            cells: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn on_map(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Bounds-unchecked access; callers must hold `on_map(pos)`.
    #[inline]
    pub fn at(&self, pos: Position) -> &Cell {
        &self.cells[(pos.y * self.width + pos.x) as usize]
    }

    /// Bounds-unchecked mutable access; callers must hold `on_map(pos)`.
    #[inline]
    pub fn at_mut(&mut self, pos: Position) -> &mut Cell {
        &mut self.cells[(pos.y * self.width + pos.x) as usize]
    }

    /// Grow the matrix so `pos` is addressable. Existing cell contents are
    /// preserved; new cells are default-initialized with `danger_multiplier`
    /// at 1.0. Shrinking is never supported.
    pub fn ensure_size(&mut self, pos: Position) {
        debug_assert!(pos.x >= 0 && pos.y >= 0);
        if self.on_map(pos) {
            return;
        }

        let new_width = self.width.max(pos.x + 1);
        let new_height = self.height.max(pos.y + 1);

        let mut cells = vec![Cell::default(); (new_width * new_height) as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                cells[(y * new_width + x) as usize] =
                    std::mem::take(&mut self.cells[(y * self.width + x) as usize]);
            }
        }

        self.cells = cells;
        self.width = new_width;
        self.height = new_height;
    }

    /// Reset every cell to its default state. The matrix keeps its size.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let pos = Position::new(i as i32 % width, i as i32 / width);
            (pos, cell)
        })
    }
}

/// Memoized Euclidean range disks: all offsets with `dx² + dy² ≤ r²`.
#[derive(Default)]
pub struct RangeDisks {
    cache: FnvHashMap<i32, Vec<Position>>,
}

impl RangeDisks {
    pub fn get(&mut self, range: i32) -> &[Position] {
        self.cache.entry(range).or_insert_with(|| {
            let range_squared = range * range;
            let mut tiles = Vec::new();
            for x in -range..=range {
                for y in -range..=range {
                    if x * x + y * y <= range_squared {
                        tiles.push(Position::new(x, y));
                    }
                }
            }
            tiles
        })
    }
}
