//! Danger propagation passes.
//!
//! Three additive per-cell components (`zombie_danger`, `spawn_danger`,
//! `enemy_danger`) are produced by independent passes; our own buildings'
//! coverage only attenuates the shared `danger_multiplier`. Each pass writes
//! its own field, so pass order is irrelevant to the final score.

use crate::clusters::UnionFind;
use crate::forecast::{forecast, LOOK_AHEAD, TIME_FACTOR};
use crate::grid::{CellKind, ALL_DIRECTIONS, STRAIGHT_DIRECTIONS};
use crate::map::Map;
use crate::position::Position;
use crate::units::ZombieType;
use log::debug;
use std::collections::VecDeque;

/// Attenuation applied to every cell covered by one of our attack disks.
const COVERAGE_ATTENUATION: f64 = 0.95;

/// Seed scale for the spawn-diffusion wave.
const SPAWN_SEED_SCALE: f64 = 0.1;

/// Chance that a spawn produces a zombie on the given turn. The server ramps
/// wave intensity with match progress; modelled as a saturating ramp.
pub fn spawn_probability(turn: u32) -> f64 {
    (turn as f64 / 250.0).clamp(0.1, 1.0)
}

impl Map {
    /// Own-coverage pass: attenuate covered cells, expand the tracked view
    /// window, and cluster straight-adjacent friendly buildings.
    pub(crate) fn update_my_buildings(&mut self) {
        self.clusters = UnionFind::new(self.buildings.len());

        for index in 0..self.my_buildings.len() {
            let building_index = self.my_buildings[index];
            let (position, range) = {
                let building = &self.buildings[building_index];
                (building.position, building.range)
            };

            let disk = self.disks.get(range);
            for &offset in disk {
                let target = position + offset;
                if self.grid.on_map(target) {
                    self.grid.at_mut(target).danger_multiplier *= COVERAGE_ATTENUATION;
                }

                // The view window follows our attack disks even past the
                // currently known grid; growth triggers a topology re-fetch
                // in the surrounding game loop.
                if target.x < self.view_min.x {
                    self.view_min.x = target.x;
                    self.view_zone_updated = true;
                }
                if target.y < self.view_min.y {
                    self.view_min.y = target.y;
                    self.view_zone_updated = true;
                }
                if target.x > self.view_max.x {
                    self.view_max.x = target.x;
                    self.view_zone_updated = true;
                }
                if target.y > self.view_max.y {
                    self.view_max.y = target.y;
                    self.view_zone_updated = true;
                }
            }

            for dir in STRAIGHT_DIRECTIONS {
                let neighbor = position + dir;
                if !self.grid.on_map(neighbor) {
                    continue;
                }
                if let Some(neighbor_index) = self.grid.at(neighbor).building {
                    // Enemy buildings never join a friendly cluster.
                    if !self.buildings[neighbor_index].is_enemy {
                        self.clusters.unite(building_index, neighbor_index);
                    }
                }
            }
        }
    }

    /// Enemy pass: every cell inside an enemy disk could be hit on every one
    /// of the next `LOOK_AHEAD` turns, so it accrues the full discounted sum
    /// regardless of actual target selection. Enemy buildings covering our
    /// buildings pick up a threat weight used by attack targeting.
    pub(crate) fn update_enemy_buildings(&mut self) {
        for index in 0..self.enemy_buildings.len() {
            let enemy_index = self.enemy_buildings[index];
            let (position, range, attack) = {
                let building = &self.buildings[enemy_index];
                (building.position, building.range, building.attack)
            };

            let per_cell = self.horizon_factor * attack as f64;
            let mut threat = 1.0;

            let disk = self.disks.get(range);
            for &offset in disk {
                let target = position + offset;
                if !self.grid.on_map(target) {
                    continue;
                }
                let cell = self.grid.at_mut(target);
                cell.enemy_danger += per_cell;
                // Raw additive danger, before coverage attenuation.
                let raw_danger = cell.zombie_danger + cell.spawn_danger + cell.enemy_danger;
                let covered = cell.building;
                if raw_danger > self.max_danger {
                    self.max_danger = raw_danger;
                }

                if let Some(covered_index) = covered {
                    let covered_building = &self.buildings[covered_index];
                    if !covered_building.is_enemy {
                        if covered_building.is_head {
                            threat += covered_building.health as f64 * 100.0;
                        } else {
                            threat += covered_building.health as f64;
                        }
                    }
                }
            }

            self.buildings[enemy_index].danger = threat;
        }
    }

    /// Zombie pass: walk each forecast into the grid, applying the bomber
    /// splash and liner beam on building arrivals. Plain walkers stop after
    /// their first arrival at a building (once the last sample of that time
    /// step is consumed); the heavier archetypes march through.
    pub(crate) fn update_zombies(&mut self) {
        for zombie_index in 0..self.zombies.len() {
            self.protos.observe(&self.zombies[zombie_index]);

            let zombie = self.zombies[zombie_index].clone();
            let proto = match self.protos.get(zombie.kind) {
                Some(proto) => *proto,
                None => continue,
            };

            let mut threat = 1.0;
            let mut samples = forecast(&zombie, &proto, LOOK_AHEAD).peekable();

            while let Some(sample) = samples.next() {
                if !self.grid.on_map(sample.pos) {
                    break;
                }
                if self.grid.at(sample.pos).kind != CellKind::Normal {
                    break;
                }

                let cell = self.grid.at_mut(sample.pos);
                cell.zombie_danger += sample.damage;
                let occupant = cell.building;

                let occupant = match occupant {
                    Some(occupant) => occupant,
                    None => continue,
                };

                if !self.buildings[occupant].is_enemy {
                    threat += sample.damage;
                }

                match zombie.kind {
                    ZombieType::Bomber => {
                        for shift in ALL_DIRECTIONS {
                            let splash = sample.pos + shift;
                            if !self.grid.on_map(splash) {
                                continue;
                            }
                            let splash_cell = self.grid.at_mut(splash);
                            splash_cell.zombie_danger += sample.damage;
                            let splashed = splash_cell.building;
                            if let Some(splashed_index) = splashed {
                                if !self.buildings[splashed_index].is_enemy {
                                    threat += sample.damage;
                                }
                            }
                        }
                    }
                    ZombieType::Liner => {
                        let mut beam = sample.pos + sample.dir;
                        while self.grid.on_map(beam) {
                            let beam_cell = self.grid.at_mut(beam);
                            let struck = match beam_cell.building {
                                Some(struck) => struck,
                                None => break,
                            };
                            beam_cell.zombie_danger += sample.damage;
                            if !self.buildings[struck].is_enemy {
                                threat += sample.damage;
                            }
                            beam += sample.dir;
                        }
                    }
                    _ => {}
                }

                if !zombie.kind.marches_through_buildings() {
                    // A plain walker only hits a building once per arrival;
                    // stop when no further sample shares this time step.
                    match samples.peek() {
                        Some(next) if next.step == sample.step => {}
                        _ => break,
                    }
                }
            }

            self.zombies[zombie_index].danger = threat;
        }
    }

    /// Spawn pass: a diffusion wave out of each spawn's four straight exits,
    /// carried along the exit direction, γ-decayed per step with extra
    /// attenuation when crossing a building, halted at non-normal cells or at
    /// the horizon.
    pub(crate) fn update_spawn_danger(&mut self, turn: u32) {
        let mean_attack = self.protos.mean_attack();
        let seed = mean_attack * spawn_probability(turn) * SPAWN_SEED_SCALE;
        if seed <= 0.0 {
            return;
        }

        let mut queue: VecDeque<(Position, Position, usize, f64)> = VecDeque::new();
        for index in 0..self.spawns.len() {
            let spawn = self.spawns[index];
            for dir in STRAIGHT_DIRECTIONS {
                queue.push_back((spawn + dir, dir, 0, seed));
            }
        }

        let mut touched = 0usize;
        while let Some((pos, dir, step, damage)) = queue.pop_front() {
            if step >= LOOK_AHEAD || !self.grid.on_map(pos) {
                continue;
            }
            let cell = self.grid.at_mut(pos);
            if cell.kind != CellKind::Normal {
                continue;
            }

            cell.spawn_danger += damage;
            touched += 1;

            let mut next_damage = damage * TIME_FACTOR;
            if let Some(blocking) = cell.building {
                // A standing building soaks the wave in proportion to how
                // many mean hits it takes to clear it.
                let soak = self.buildings[blocking].health as f64 / mean_attack;
                next_damage *= TIME_FACTOR.powf(soak);
            }

            queue.push_back((pos + dir, dir, step + 1, next_damage));
        }

        debug!(
            "spawn wave: {} spawns seeded {:.3} danger over {} cells",
            self.spawns.len(),
            seed,
            touched
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Building, Zombie};

    fn building(id: &str, pos: Position, is_enemy: bool, is_head: bool) -> Building {
        Building {
            id: id.to_string(),
            position: pos,
            attack: 10,
            health: if is_head { 300 } else { 100 },
            range: 1,
            is_head,
            is_enemy,
            last_attack: None,
            danger: 1.0,
        }
    }

    fn zombie(kind: ZombieType, pos: Position, dir: Position) -> Zombie {
        Zombie {
            id: "z".to_string(),
            kind,
            position: pos,
            direction: dir,
            attack: 10,
            health: 5,
            speed: 1,
            wait_turns: 1,
            danger: 1.0,
        }
    }

    fn empty_map(size: i32) -> Map {
        let mut map = Map::new();
        map.grid.ensure_size(Position::new(size - 1, size - 1));
        map
    }

    #[test]
    fn own_coverage_attenuates_exactly_the_range_disk() {
        let mut map = empty_map(5);
        let head = Position::new(2, 2);
        let mut b = building("b1", head, false, true);
        b.range = 1;
        b.attack = 10;
        b.health = 300;
        map.add_building(b);

        map.update_my_buildings();

        let mut covered = Vec::new();
        for (pos, cell) in map.grid.iter() {
            if cell.danger_multiplier < 1.0 {
                covered.push(pos);
            }
        }
        covered.sort();
        assert_eq!(
            covered,
            vec![
                Position::new(1, 2),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(2, 3),
                Position::new(3, 2),
            ]
        );
    }

    #[test]
    fn adjacent_friendly_buildings_share_a_cluster() {
        let mut map = empty_map(6);
        map.add_building(building("a", Position::new(1, 1), false, true));
        map.add_building(building("b", Position::new(2, 1), false, false));
        map.update_my_buildings();

        assert_eq!(map.clusters.find(0), map.clusters.find(1));
        assert_eq!(map.clusters.cluster_size(0), 2);
    }

    #[test]
    fn enemy_building_between_friends_splits_the_cluster() {
        let mut map = empty_map(6);
        map.add_building(building("a", Position::new(1, 1), false, true));
        map.add_building(building("e", Position::new(2, 1), true, false));
        map.add_building(building("b", Position::new(3, 1), false, false));
        map.update_my_buildings();

        assert_ne!(map.clusters.find(0), map.clusters.find(2));
    }

    #[test]
    fn enemy_pass_accrues_discounted_worst_case() {
        let mut map = empty_map(5);
        map.add_building(building("e", Position::new(2, 2), true, false));
        map.update_enemy_buildings();

        let expected = map.horizon_factor * 10.0;
        let hit = map.grid.at(Position::new(2, 3));
        assert!((hit.enemy_danger - expected).abs() < 1e-9);
        assert_eq!(map.grid.at(Position::new(0, 0)).enemy_danger, 0.0);
        assert!(map.max_danger >= expected);
    }

    #[test]
    fn max_danger_ignores_coverage_attenuation() {
        let mut map = empty_map(5);
        let mut mine = building("mine", Position::new(2, 2), false, false);
        mine.range = 2;
        map.add_building(mine);
        let mut enemy = building("e", Position::new(2, 3), true, false);
        enemy.range = 1;
        map.add_building(enemy);

        map.update_my_buildings();
        map.update_enemy_buildings();

        // Our own coverage attenuates the scored danger, but the tracked
        // maximum is the raw additive value.
        let expected = map.horizon_factor * 10.0;
        let cell = map.grid.at(Position::new(2, 3));
        assert!(cell.danger_multiplier < 1.0);
        assert!(cell.danger_score() < expected);
        assert!((map.max_danger - expected).abs() < 1e-9);
    }

    #[test]
    fn enemy_threat_weights_head_coverage() {
        let mut map = empty_map(5);
        map.add_building(building("head", Position::new(2, 2), false, true));
        let mut enemy = building("e", Position::new(2, 3), true, false);
        enemy.range = 1;
        map.add_building(enemy);
        map.update_enemy_buildings();

        // 1.0 base plus head health x100.
        assert!((map.buildings[1].danger - (1.0 + 300.0 * 100.0)).abs() < 1e-6);
    }

    #[test]
    fn walker_stops_at_first_building_arrival() {
        let mut map = empty_map(10);
        map.add_building(building("mine", Position::new(3, 1), false, false));
        map.add_zombie(zombie(
            ZombieType::Normal,
            Position::new(1, 1),
            Position::new(1, 0),
        ));

        map.update_zombies();

        assert!(map.grid.at(Position::new(3, 1)).zombie_danger > 0.0);
        // Cells past the struck building stay clean.
        assert_eq!(map.grid.at(Position::new(4, 1)).zombie_danger, 0.0);
        assert!(map.zombies[0].danger > 1.0);
    }

    #[test]
    fn juggernaut_marches_through_buildings() {
        let mut map = empty_map(10);
        map.add_building(building("mine", Position::new(3, 1), false, false));
        map.add_zombie(zombie(
            ZombieType::Juggernaut,
            Position::new(1, 1),
            Position::new(1, 0),
        ));

        map.update_zombies();

        assert!(map.grid.at(Position::new(4, 1)).zombie_danger > 0.0);
    }

    #[test]
    fn bomber_splashes_its_neighborhood() {
        let mut map = empty_map(10);
        map.add_building(building("mine", Position::new(3, 3), false, false));
        map.add_zombie(zombie(
            ZombieType::Bomber,
            Position::new(1, 3),
            Position::new(1, 0),
        ));

        map.update_zombies();

        // The zombie arrives at (2,3) then (3,3); the arrival at the building
        // splashes all 8 neighbors.
        assert!(map.grid.at(Position::new(2, 2)).zombie_danger > 0.0);
        assert!(map.grid.at(Position::new(4, 4)).zombie_danger > 0.0);
    }

    #[test]
    fn liner_beam_runs_through_consecutive_buildings() {
        let mut map = empty_map(10);
        map.add_building(building("a", Position::new(3, 1), false, false));
        map.add_building(building("b", Position::new(4, 1), false, false));
        map.add_building(building("c", Position::new(5, 1), false, false));
        map.add_zombie(zombie(
            ZombieType::Liner,
            Position::new(1, 1),
            Position::new(1, 0),
        ));

        map.update_zombies();

        // Beam contributions stack on the building cells behind the first
        // arrival; the empty cell past the chain only sees the direct walk.
        let b = map.grid.at(Position::new(4, 1)).zombie_danger;
        let c = map.grid.at(Position::new(5, 1)).zombie_danger;
        let past = map.grid.at(Position::new(6, 1)).zombie_danger;
        assert!(c > b);
        assert!(b > past);
        assert!((past - 10.0 * 0.9f64.powi(5)).abs() < 1e-9);
    }

    #[test]
    fn spawn_wave_decays_strictly_and_respects_horizon() {
        let mut map = empty_map(16);
        let spawn = Position::new(0, 0);
        map.add_spawn(spawn);
        map.update_spawn_danger(0);

        let mut previous = f64::INFINITY;
        for step in 1..=(LOOK_AHEAD as i32) {
            let danger = map.grid.at(Position::new(step, 0)).spawn_danger;
            assert!(danger > 0.0, "step {step} should be inside the wave");
            assert!(danger < previous, "wave must strictly decay");
            previous = danger;
        }
        assert_eq!(
            map.grid
                .at(Position::new(LOOK_AHEAD as i32 + 1, 0))
                .spawn_danger,
            0.0
        );
    }

    #[test]
    fn spawn_wave_halts_at_non_normal_cells() {
        let mut map = empty_map(12);
        map.add_spawn(Position::new(0, 0));
        map.add_wall(Position::new(3, 0));
        map.update_spawn_danger(0);

        assert_eq!(map.grid.at(Position::new(3, 0)).spawn_danger, 0.0);
        assert_eq!(map.grid.at(Position::new(4, 0)).spawn_danger, 0.0);
        assert!(map.grid.at(Position::new(2, 0)).spawn_danger > 0.0);
    }

    #[test]
    fn danger_scores_stay_non_negative_after_all_passes() {
        let mut map = empty_map(12);
        map.add_spawn(Position::new(0, 0));
        map.add_building(building("head", Position::new(5, 5), false, true));
        map.add_building(building("e", Position::new(9, 5), true, false));
        map.add_zombie(zombie(
            ZombieType::Fast,
            Position::new(2, 5),
            Position::new(1, 0),
        ));

        map.update(7);

        for (_, cell) in map.grid.iter() {
            assert!(cell.danger_score() >= 0.0);
        }
    }
}
