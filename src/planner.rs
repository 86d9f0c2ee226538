//! The three per-turn sub-planners: attack targeting, build-site selection
//! and base relocation.
//!
//! The sub-planners are deliberately sequential: accepting an attack updates
//! the targeted cell's `damage_taken` before the next building scores its
//! options, and gold earned from same-turn kills feeds the build budget.

use crate::map::Map;
use crate::position::Position;
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// Turn after which build scoring stops seeking the frontier and instead
/// hugs enemy territory.
const LATE_GAME_TURN: u32 = 240;

/// Turn after which the diagonal-stripe thinning filter applies.
const STRIPE_FILTER_TURN: u32 = 140;

/// Disconnected clusters larger than this stop attracting new construction.
const CLUSTER_FEED_LIMIT: usize = 10;

/// One attack instruction for the transport layer.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttackCommand {
    pub block_id: String,
    pub target: Position,
}

/// The full per-turn command handed to the transport collaborator.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Command {
    pub attack: Vec<AttackCommand>,
    pub build: Vec<Position>,
    #[serde(rename = "moveBase", skip_serializing_if = "Option::is_none")]
    pub move_base: Option<Position>,
}

impl Command {
    pub fn is_empty(&self) -> bool {
        self.attack.is_empty() && self.build.is_empty() && self.move_base.is_none()
    }
}

impl Map {
    /// Expected value of attacking `pos` with `power`: shots-to-kill times
    /// accumulated threat weight, for the enemy building (head x100) and
    /// every still-alive zombie on the cell. Entities already lethally
    /// damaged this turn score zero.
    pub fn attack_score(&self, pos: Position, power: i32) -> f64 {
        let cell = self.grid.at(pos);
        let mut score = 0.0;

        if let Some(index) = cell.building {
            let building = &self.buildings[index];
            if building.is_enemy && building.health > cell.damage_taken {
                let strikes = (building.health + power - 1) / power;
                let weight = if building.is_head { 100.0 } else { 1.0 };
                score += strikes as f64 * building.danger * weight;
            }
        }

        for &zombie_index in &cell.zombies {
            let zombie = &self.zombies[zombie_index];
            if zombie.health > cell.damage_taken {
                let strikes = (zombie.health + power - 1) / power;
                score += strikes as f64 * zombie.danger;
            }
        }

        score
    }

    /// Apply `power` damage to `pos` locally so later scoring inside the
    /// same turn sees it. Returns gold earned from zombies whose health is
    /// crossed exactly by this hit. Authoritative state still comes from the
    /// next snapshot.
    pub fn attack(&mut self, pos: Position, power: i32) -> i32 {
        let cell = self.grid.at_mut(pos);
        let before = cell.damage_taken;
        cell.damage_taken += power;
        let after = cell.damage_taken;

        let mut gold = 0;
        for index in 0..self.grid.at(pos).zombies.len() {
            let zombie_index = self.grid.at(pos).zombies[index];
            let health = self.zombies[zombie_index].health;
            if health > before && health <= after {
                gold += 1;
            }
        }
        gold
    }
}

/// Produce this turn's command. `gold` is the build budget reported by the
/// snapshot; kills made while attacking extend it.
pub fn plan_turn(map: &mut Map, turn: u32, gold: i32) -> Command {
    let mut command = Command::default();
    let mut gold = gold;

    gold += plan_attacks(map, &mut command);
    plan_builds(map, turn, gold, &mut command);
    plan_relocation(map, &mut command);

    debug!(
        "turn {}: {} attacks, {} builds, relocate: {}",
        turn,
        command.attack.len(),
        command.build.len(),
        command.move_base.is_some()
    );
    command
}

/// For every reachable building, pick the best-scoring in-range cell. A
/// building with no positive-scoring cell in range holds fire.
fn plan_attacks(map: &mut Map, command: &mut Command) -> i32 {
    let mut earned = 0;

    for index in 0..map.my_active_buildings.len() {
        let building_index = map.my_active_buildings[index];
        let (position, range, power) = {
            let building = &map.buildings[building_index];
            (building.position, building.range, building.attack)
        };

        let mut best: Option<(f64, Position)> = None;
        let disk = map.disks.get(range).to_vec();
        for offset in disk {
            let target = position + offset;
            if !map.grid.on_map(target) {
                continue;
            }
            let score = map.attack_score(target, power);
            if score <= 0.0 {
                continue;
            }
            match best {
                Some((best_score, _)) if best_score >= score => {}
                _ => best = Some((score, target)),
            }
        }

        if let Some((_, target)) = best {
            earned += map.attack(target, power);
            command.attack.push(AttackCommand {
                block_id: map.buildings[building_index].id.clone(),
                target,
            });
        }
    }

    earned
}

/// Score all candidates (lower is better), thin out the late-game stripe
/// pattern, and spend one gold per accepted site.
fn plan_builds(map: &mut Map, turn: u32, gold: i32, command: &mut Command) {
    if gold <= 0 || map.build_candidates.is_empty() {
        return;
    }

    let head_position = map.my_base.map(|head| map.buildings[head].position);

    let candidates = map.build_candidates.clone();
    let scored: Vec<(f64, Position)> = candidates
        .into_iter()
        .filter(|&pos| turn <= STRIPE_FILTER_TURN || !in_stripe_pattern(pos))
        .map(|pos| (build_score(map, turn, pos, head_position), pos))
        .sorted_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        })
        .collect();

    let mut budget = gold;
    for (_, pos) in scored {
        if budget <= 0 {
            break;
        }
        command.build.push(pos);
        budget -= 1;
    }
}

/// Anti-clustering thinning: skip a fixed family of diagonal stripes so the
/// base keeps gaps the splash archetypes cannot chain across.
fn in_stripe_pattern(pos: Position) -> bool {
    (pos.x + 2 * pos.y).rem_euclid(5) == 0
}

fn build_score(map: &mut Map, turn: u32, pos: Position, head_position: Option<Position>) -> f64 {
    let mut score = map.grid.at(pos).danger_score();

    if let Some(head) = head_position {
        score += 0.25 * pos.distance_to(head);
    }

    let nearest_spawn = nearest_distance(pos, map.spawns.iter().copied());
    let nearest_enemy = nearest_distance(
        pos,
        map.enemy_buildings
            .iter()
            .map(|&index| map.buildings[index].position),
    );

    if turn < LATE_GAME_TURN {
        score += 0.2 * nearest_spawn + 0.2 * nearest_enemy;
    } else {
        score -= 0.2 * nearest_enemy;
    }

    let cluster = map.nearest_cluster_size(pos);
    if cluster > CLUSTER_FEED_LIMIT {
        score /= cluster as f64;
    }

    score
}

fn nearest_distance(pos: Position, others: impl Iterator<Item = Position>) -> f64 {
    others
        .map(|other| pos.sq_distance_to(other))
        .min()
        .map(|sq| (sq as f64).sqrt())
        .unwrap_or(0.0)
}

/// Pick the safest reachable position near the health-weighted centroid of
/// the head's cluster. Skipped entirely when the head is gone.
fn plan_relocation(map: &mut Map, command: &mut Command) {
    let head = match map.my_base {
        Some(head) => head,
        None => return,
    };
    let head_position = map.buildings[head].position;
    let head_cluster = map.clusters.find(head);

    let mut weighted = (0.0, 0.0);
    let mut total_health = 0.0;
    for index in 0..map.my_buildings.len() {
        let building_index = map.my_buildings[index];
        if map.clusters.find(building_index) != head_cluster {
            continue;
        }
        let building = &map.buildings[building_index];
        let health = building.health as f64;
        weighted.0 += building.position.x as f64 * health;
        weighted.1 += building.position.y as f64 * health;
        total_health += health;
    }
    if total_health <= 0.0 {
        return;
    }
    let centroid = (weighted.0 / total_health, weighted.1 / total_health);

    let mut best: Option<(f64, Position)> = None;
    for index in 0..map.my_active_buildings.len() {
        let building_index = map.my_active_buildings[index];
        let position = map.buildings[building_index].position;
        let cell = map.grid.at(position);

        let centroid_distance = ((position.x as f64 - centroid.0).powi(2)
            + (position.y as f64 - centroid.1).powi(2))
        .sqrt();
        let spawn_distance = nearest_distance(position, map.spawns.iter().copied());

        let score = 10.0 * cell.danger_score() + centroid_distance - spawn_distance;
        match best {
            Some((best_score, _)) if best_score <= score => {}
            _ => best = Some((score, position)),
        }
    }

    if let Some((_, target)) = best {
        if target != head_position {
            command.move_base = Some(target);
        }
    }
}
