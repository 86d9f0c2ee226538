//! The per-turn world model: grid, entity arenas and derived indices.
//!
//! The map exclusively owns every entity; all of it except the prototype
//! table and the tracked view bounds is discarded and rebuilt from each
//! snapshot, so cells only ever hold plain indices into the arenas.

use crate::clusters::UnionFind;
use crate::forecast::{LOOK_AHEAD, TIME_FACTOR};
use crate::grid::{CellKind, Grid, RangeDisks};
use crate::position::Position;
use crate::units::{Building, ProtoTable, Zombie};

pub struct Map {
    pub grid: Grid,
    pub buildings: Vec<Building>,
    pub zombies: Vec<Zombie>,

    pub my_buildings: Vec<usize>,
    pub enemy_buildings: Vec<usize>,
    pub my_base: Option<usize>,
    pub walls: Vec<Position>,
    pub spawns: Vec<Position>,

    /// Buildings reachable from the head through straight adjacency.
    pub my_active_buildings: Vec<usize>,
    pub build_candidates: Vec<Position>,
    pub clusters: UnionFind,

    /// Observed view-window bounds; grown by our buildings' attack disks.
    pub view_min: Position,
    pub view_max: Position,
    pub view_zone_updated: bool,

    pub max_danger: f64,

    pub(crate) disks: RangeDisks,
    pub(crate) protos: ProtoTable,
    /// Σ γ^i over the lookahead horizon; the worst-case per-point damage an
    /// enemy building can land on a covered cell.
    pub(crate) horizon_factor: f64,
}

impl Default for Map {
    fn default() -> Self {
        Map::new()
    }
}

impl Map {
    pub fn new() -> Self {
        let mut horizon_factor = 0.0;
        let mut t = 1.0;
        for _ in 0..LOOK_AHEAD {
            horizon_factor += t;
            t *= TIME_FACTOR;
        }

        Map {
            grid: Grid::new(),
            buildings: Vec::new(),
            zombies: Vec::new(),
            my_buildings: Vec::new(),
            enemy_buildings: Vec::new(),
            my_base: None,
            walls: Vec::new(),
            spawns: Vec::new(),
            my_active_buildings: Vec::new(),
            build_candidates: Vec::new(),
            clusters: UnionFind::new(0),
            view_min: Position::default(),
            view_max: Position::default(),
            view_zone_updated: false,
            max_danger: 0.0,
            disks: RangeDisks::default(),
            protos: ProtoTable::default(),
            horizon_factor,
        }
    }

    pub fn add_wall(&mut self, pos: Position) {
        self.grid.ensure_size(pos);
        self.walls.push(pos);
        self.grid.at_mut(pos).kind = CellKind::Wall;
    }

    pub fn add_spawn(&mut self, pos: Position) {
        self.grid.ensure_size(pos);
        self.spawns.push(pos);
        self.grid.at_mut(pos).kind = CellKind::Spawn;
    }

    pub fn add_building(&mut self, building: Building) {
        self.grid.ensure_size(building.position);

        let index = self.buildings.len();
        self.grid.at_mut(building.position).building = Some(index);
        if building.is_enemy {
            self.enemy_buildings.push(index);
        } else {
            self.my_buildings.push(index);
            if building.is_head {
                self.my_base = Some(index);
            }
        }

        self.buildings.push(building);
    }

    pub fn add_zombie(&mut self, zombie: Zombie) {
        self.grid.ensure_size(zombie.position);

        let index = self.zombies.len();
        self.grid.at_mut(zombie.position).zombies.push(index);
        self.zombies.push(zombie);
    }

    /// Reset for the next snapshot. Cells are reset in place, index lists are
    /// emptied; the prototype table and view bounds persist across turns.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.buildings.clear();
        self.zombies.clear();
        self.my_buildings.clear();
        self.enemy_buildings.clear();
        self.my_base = None;
        self.walls.clear();
        self.spawns.clear();
        self.my_active_buildings.clear();
        self.build_candidates.clear();
        self.clusters = UnionFind::new(0);
    }

    /// Run the full per-turn derivation: danger propagation, clustering and
    /// the connectivity/candidate sweep. Entities must be populated first.
    pub fn update(&mut self, turn: u32) {
        self.view_zone_updated = false;

        self.update_my_buildings();
        self.update_enemy_buildings();
        self.update_zombies();
        self.update_spawn_danger(turn);
        self.update_connectivity();
    }

    /// Size of the nearest (by squared distance) cluster that does not
    /// contain the head, or 0 when every building is in the head's cluster.
    pub fn nearest_cluster_size(&mut self, base_position: Position) -> usize {
        let head = match self.my_base {
            Some(head) => head,
            None => return 0,
        };
        let base_cluster = self.clusters.find(head);

        let mut nearest_size = 0;
        let mut nearest_distance = i32::MAX;
        for index in 0..self.my_buildings.len() {
            let building_index = self.my_buildings[index];
            if self.clusters.find(building_index) == base_cluster {
                continue;
            }
            let distance = self.buildings[building_index]
                .position
                .sq_distance_to(base_position);
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest_size = self.clusters.cluster_size(building_index);
            }
        }

        nearest_size
    }
}
