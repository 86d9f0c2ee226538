//! Reachable-set BFS and build-candidate collection.
//!
//! Starting from the head building, the sweep walks straight adjacency
//! through friendly buildings; every empty visited neighbor is tested for
//! build legality on the way.

use crate::grid::{CellKind, DIAGONAL_DIRECTIONS, STRAIGHT_DIRECTIONS};
use crate::map::Map;
use crate::position::Position;
use fnv::FnvHashSet;
use log::debug;
use std::collections::VecDeque;

impl Map {
    /// Recompute `my_active_buildings` and `build_candidates`. Without a head
    /// building both stay empty; that is a normal outcome, not an error.
    pub(crate) fn update_connectivity(&mut self) {
        let head = match self.my_base {
            Some(head) => head,
            None => return,
        };

        let mut visited: FnvHashSet<Position> = FnvHashSet::default();
        let mut to_explore: VecDeque<usize> = VecDeque::new();
        to_explore.push_back(head);
        let _ = visited.insert(self.buildings[head].position);

        while let Some(current) = to_explore.pop_front() {
            self.my_active_buildings.push(current);

            let position = self.buildings[current].position;
            for dir in STRAIGHT_DIRECTIONS {
                let neighbor = position + dir;
                if !self.grid.on_map(neighbor) || !visited.insert(neighbor) {
                    continue;
                }

                let cell = self.grid.at(neighbor);
                if let Some(neighbor_index) = cell.building {
                    if !self.buildings[neighbor_index].is_enemy {
                        to_explore.push_back(neighbor_index);
                    }
                }

                if self.can_build(neighbor) {
                    self.build_candidates.push(neighbor);
                }
            }
        }

        debug!(
            "connectivity: {} of {} buildings active, {} build candidates",
            self.my_active_buildings.len(),
            self.my_buildings.len(),
            self.build_candidates.len()
        );
    }

    /// A cell is buildable iff it is an empty normal cell, none of its
    /// straight neighbors is a wall, spawn or enemy building, and none of its
    /// diagonal neighbors is an enemy building.
    pub fn can_build(&self, pos: Position) -> bool {
        let cell = self.grid.at(pos);
        if cell.kind != CellKind::Normal || cell.building.is_some() {
            return false;
        }

        for dir in STRAIGHT_DIRECTIONS {
            let adjacent = pos + dir;
            if !self.grid.on_map(adjacent) {
                continue;
            }
            let adjacent_cell = self.grid.at(adjacent);
            if adjacent_cell.kind != CellKind::Normal {
                return false;
            }
            if let Some(index) = adjacent_cell.building {
                if self.buildings[index].is_enemy {
                    return false;
                }
            }
        }

        for dir in DIAGONAL_DIRECTIONS {
            let adjacent = pos + dir;
            if !self.grid.on_map(adjacent) {
                continue;
            }
            if let Some(index) = self.grid.at(adjacent).building {
                if self.buildings[index].is_enemy {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Building;

    fn building(id: &str, pos: Position, is_enemy: bool, is_head: bool) -> Building {
        Building {
            id: id.to_string(),
            position: pos,
            attack: 10,
            health: 100,
            range: 1,
            is_head,
            is_enemy,
            last_attack: None,
            danger: 1.0,
        }
    }

    fn map_with_head(size: i32, head: Position) -> Map {
        let mut map = Map::new();
        map.grid.ensure_size(Position::new(size - 1, size - 1));
        map.add_building(building("head", head, false, true));
        map
    }

    #[test]
    fn reachable_set_follows_straight_adjacency() {
        let mut map = map_with_head(8, Position::new(3, 3));
        map.add_building(building("a", Position::new(4, 3), false, false));
        map.add_building(building("b", Position::new(5, 3), false, false));
        // Diagonal only; not connected.
        map.add_building(building("c", Position::new(1, 1), false, false));

        map.update_connectivity();

        assert_eq!(map.my_active_buildings, vec![0, 1, 2]);
    }

    #[test]
    fn enemy_buildings_are_not_traversed() {
        let mut map = map_with_head(8, Position::new(3, 3));
        map.add_building(building("e", Position::new(4, 3), true, false));
        map.add_building(building("far", Position::new(5, 3), false, false));

        map.update_connectivity();

        assert_eq!(map.my_active_buildings, vec![0]);
    }

    #[test]
    fn candidates_avoid_walls_spawns_and_enemy_vicinity() {
        let mut map = map_with_head(8, Position::new(3, 3));
        // Wall straight above the cell north of the head.
        map.add_wall(Position::new(3, 1));
        // Enemy diagonal to the cell east of the head.
        map.add_building(building("e", Position::new(5, 2), true, false));

        map.update_connectivity();

        assert!(!map.build_candidates.contains(&Position::new(3, 2)));
        assert!(!map.build_candidates.contains(&Position::new(4, 3)));
        assert!(map.build_candidates.contains(&Position::new(2, 3)));
        assert!(map.build_candidates.contains(&Position::new(3, 4)));
    }

    #[test]
    fn candidate_legality_matches_the_adjacency_rules() {
        let mut map = map_with_head(10, Position::new(4, 4));
        map.add_wall(Position::new(0, 0));
        map.add_spawn(Position::new(8, 8));
        map.add_building(building("e", Position::new(6, 6), true, false));

        map.update_connectivity();

        for &candidate in &map.build_candidates {
            for dir in STRAIGHT_DIRECTIONS {
                let adjacent = candidate + dir;
                if map.grid.on_map(adjacent) {
                    assert_eq!(map.grid.at(adjacent).kind, CellKind::Normal);
                }
            }
            for dir in STRAIGHT_DIRECTIONS.iter().chain(DIAGONAL_DIRECTIONS.iter()) {
                let adjacent = candidate + *dir;
                if map.grid.on_map(adjacent) {
                    if let Some(index) = map.grid.at(adjacent).building {
                        assert!(!map.buildings[index].is_enemy);
                    }
                }
            }
        }
    }

    #[test]
    fn no_head_means_no_candidates() {
        let mut map = Map::new();
        map.grid.ensure_size(Position::new(5, 5));
        map.add_building(building("lone", Position::new(2, 2), false, false));

        map.update_connectivity();

        assert!(map.my_active_buildings.is_empty());
        assert!(map.build_candidates.is_empty());
    }
}
