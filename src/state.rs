//! Game-lifetime state and per-turn snapshot ingestion.
//!
//! One `State` lives for the whole game. Every turn the surrounding loop
//! fetches a units snapshot, calls `ingest_units`, and submits the command
//! returned by `plan`. The static topology arrives separately (and again
//! whenever the view zone grows) through `ingest_world`.

use crate::map::Map;
use crate::planner::{self, Command};
use crate::position::Position;
use crate::snapshot::{BuildingSnapshot, UnitsSnapshot, WorldSnapshot, ZombieSnapshot};
use crate::units::{Building, Zombie, ZombieType};
use log::{info, warn};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TurnError {
    /// The server re-sent a turn we already processed; the caller should
    /// simply fetch again.
    #[error("snapshot for turn {turn} already processed")]
    StaleSnapshot { turn: u32 },
    /// Movement rules are type-specific; an unknown archetype cannot be
    /// defaulted without corrupting danger propagation.
    #[error("unknown zombie type `{0}`")]
    UnknownZombieType(String),
    #[error("unknown zombie direction `{0}`")]
    UnknownDirection(String),
    #[error("unknown spot type `{0}`")]
    UnknownSpotKind(String),
    /// The grid only addresses non-negative coordinates; a negative one in a
    /// payload would corrupt cell indexing if it reached the map.
    #[error("coordinate ({x}, {y}) is outside the addressable grid")]
    InvalidCoordinate { x: i32, y: i32 },
}

fn checked_position(x: i32, y: i32) -> Result<Position, TurnError> {
    if x < 0 || y < 0 {
        return Err(TurnError::InvalidCoordinate { x, y });
    }
    Ok(Position::new(x, y))
}

#[derive(Clone, Debug, Default)]
pub struct Player {
    pub name: String,
    pub gold: i32,
    pub points: i32,
    pub zombie_kills: i32,
    pub enemy_block_kills: i32,
}

/// Static topology retained across turns so the per-turn full grid reset can
/// re-apply it after `Map::clear`.
#[derive(Clone, Debug, Default)]
struct Topology {
    walls: Vec<Position>,
    spawns: Vec<Position>,
}

pub struct State {
    pub turn: Option<u32>,
    pub me: Player,
    pub map: Map,
    pub turn_deadline: Option<Instant>,
    pub game_ended_at: Option<String>,
    topology: Topology,
}

impl Default for State {
    fn default() -> Self {
        State::new()
    }
}

impl State {
    pub fn new() -> Self {
        State {
            turn: None,
            me: Player::default(),
            map: Map::new(),
            turn_deadline: None,
            game_ended_at: None,
            topology: Topology::default(),
        }
    }

    pub fn game_ended(&self) -> bool {
        self.game_ended_at.is_some()
    }

    /// Replace the stored static topology. Takes effect on the next
    /// `ingest_units` repopulation.
    pub fn ingest_world(&mut self, snapshot: &WorldSnapshot) -> Result<(), TurnError> {
        let mut topology = Topology::default();
        for spot in &snapshot.spots {
            let pos = checked_position(spot.x, spot.y)?;
            match spot.kind.as_str() {
                "default" => topology.spawns.push(pos),
                "wall" => topology.walls.push(pos),
                other => return Err(TurnError::UnknownSpotKind(other.to_string())),
            }
        }

        info!(
            "world topology: {} spawns, {} walls",
            topology.spawns.len(),
            topology.walls.len()
        );
        self.topology = topology;
        Ok(())
    }

    /// Ingest a per-turn snapshot: validate the turn number, rebuild the
    /// map's entity arenas and run the full derivation pipeline.
    pub fn ingest_units(&mut self, snapshot: &UnitsSnapshot) -> Result<(), TurnError> {
        if self.turn == Some(snapshot.turn) {
            return Err(TurnError::StaleSnapshot {
                turn: snapshot.turn,
            });
        }
        if let Some(previous) = self.turn {
            if snapshot.turn > previous + 1 {
                warn!(
                    "skipped {} turn(s): {} -> {}",
                    snapshot.turn - previous - 1,
                    previous,
                    snapshot.turn
                );
            }
        }

        // Convert every entity before touching the map, so a bad enumerant
        // cannot leave the arenas half-populated.
        let mut buildings = Vec::with_capacity(snapshot.base.len() + snapshot.enemy_blocks.len());
        for dto in &snapshot.base {
            buildings.push(convert_building(dto, false)?);
        }
        for dto in &snapshot.enemy_blocks {
            buildings.push(convert_building(dto, true)?);
        }
        let mut zombies = Vec::with_capacity(snapshot.zombies.len());
        for dto in &snapshot.zombies {
            zombies.push(convert_zombie(dto)?);
        }

        self.turn = Some(snapshot.turn);
        self.turn_deadline = Some(
            Instant::now() + Duration::from_millis(snapshot.turn_ends_in_ms.max(0) as u64),
        );
        self.game_ended_at = snapshot.game_ended_at.clone();
        self.me = Player {
            name: snapshot.player.name.clone(),
            gold: snapshot.player.gold,
            points: snapshot.player.points,
            zombie_kills: snapshot.player.zombie_kills,
            enemy_block_kills: snapshot.player.enemy_block_kills,
        };

        self.map.clear();
        for index in 0..self.topology.walls.len() {
            self.map.add_wall(self.topology.walls[index]);
        }
        for index in 0..self.topology.spawns.len() {
            self.map.add_spawn(self.topology.spawns[index]);
        }
        for building in buildings {
            self.map.add_building(building);
        }
        for zombie in zombies {
            self.map.add_zombie(zombie);
        }

        self.map.update(snapshot.turn);
        Ok(())
    }

    /// Produce this turn's command from the current derived state.
    pub fn plan(&mut self) -> Command {
        let turn = self.turn.unwrap_or(0);
        planner::plan_turn(&mut self.map, turn, self.me.gold)
    }
}

fn convert_building(dto: &BuildingSnapshot, is_enemy: bool) -> Result<Building, TurnError> {
    let position = checked_position(dto.x, dto.y)?;
    let is_head = dto.is_head.unwrap_or_else(|| Building::head_fallback(dto.attack));
    let range = dto.range.unwrap_or_else(|| Building::range_fallback(is_head));

    Ok(Building {
        id: dto.id.clone().unwrap_or_default(),
        position,
        attack: dto.attack,
        health: dto.health,
        range,
        is_head,
        is_enemy,
        last_attack: dto
            .last_attack
            .map(|point| Position::new(point.x, point.y)),
        danger: 1.0,
    })
}

fn convert_zombie(dto: &ZombieSnapshot) -> Result<Zombie, TurnError> {
    let position = checked_position(dto.x, dto.y)?;
    let kind = ZombieType::from_wire(&dto.kind)
        .ok_or_else(|| TurnError::UnknownZombieType(dto.kind.clone()))?;
    let direction = match dto.direction.as_str() {
        "up" => Position::new(0, -1),
        "down" => Position::new(0, 1),
        "left" => Position::new(-1, 0),
        "right" => Position::new(1, 0),
        other => return Err(TurnError::UnknownDirection(other.to_string())),
    };

    // The knight's stride is fixed by its movement rule regardless of the
    // reported speed stat.
    let speed = if kind == ZombieType::ChaosKnight {
        1
    } else {
        dto.speed
    };

    Ok(Zombie {
        id: dto.id.clone(),
        kind,
        position,
        direction,
        attack: dto.attack,
        health: dto.health,
        speed,
        wait_turns: dto.wait_turns,
        danger: 1.0,
    })
}
