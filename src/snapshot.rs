//! Wire-facing snapshot types for the two read interfaces.
//!
//! The transport collaborator deserializes server payloads into these and
//! hands them to `State::ingest_world` / `State::ingest_units`. Enumerant
//! strings (zombie type, direction, spot kind) stay raw here and are
//! converted fallibly during ingestion.

use serde::Deserialize;

/// Static topology: grid cell classifications keyed by coordinate.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default, rename = "zpots")]
    pub spots: Vec<SpotSnapshot>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpotSnapshot {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Per-turn dynamic state.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsSnapshot {
    pub turn: u32,
    pub turn_ends_in_ms: i64,
    pub player: PlayerSnapshot,
    #[serde(default)]
    pub base: Vec<BuildingSnapshot>,
    #[serde(default)]
    pub enemy_blocks: Vec<BuildingSnapshot>,
    #[serde(default)]
    pub zombies: Vec<ZombieSnapshot>,
    #[serde(default)]
    pub game_ended_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    #[serde(default)]
    pub name: String,
    pub gold: i32,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub zombie_kills: i32,
    #[serde(default)]
    pub enemy_block_kills: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingSnapshot {
    pub x: i32,
    pub y: i32,
    pub attack: i32,
    pub health: i32,
    /// Absent for enemy blocks on some servers; a fallback kicks in.
    #[serde(default)]
    pub is_head: Option<bool>,
    #[serde(default)]
    pub range: Option<i32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_attack: Option<PointSnapshot>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PointSnapshot {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZombieSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: i32,
    pub y: i32,
    pub direction: String,
    pub attack: i32,
    pub health: i32,
    pub speed: i32,
    pub wait_turns: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_snapshot_parses_wire_payload() {
        let snapshot: UnitsSnapshot = serde_json::from_value(serde_json::json!({
            "turn": 12,
            "turnEndsInMs": 1500,
            "player": {
                "name": "team",
                "gold": 7,
                "points": 100,
                "zombieKills": 3,
                "enemyBlockKills": 1
            },
            "base": [
                {"x": 5, "y": 5, "attack": 40, "health": 300, "isHead": true, "range": 10, "id": "h1"}
            ],
            "enemyBlocks": [
                {"x": 9, "y": 5, "attack": 10, "health": 100, "lastAttack": {"x": 5, "y": 5}}
            ],
            "zombies": [
                {"id": "z1", "type": "fast", "x": 1, "y": 2, "direction": "left",
                 "attack": 5, "health": 10, "speed": 2, "waitTurns": 1}
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.turn, 12);
        assert_eq!(snapshot.player.gold, 7);
        assert_eq!(snapshot.base[0].is_head, Some(true));
        assert!(snapshot.enemy_blocks[0].is_head.is_none());
        assert_eq!(snapshot.enemy_blocks[0].last_attack.unwrap().x, 5);
        assert_eq!(snapshot.zombies[0].kind, "fast");
        assert_eq!(snapshot.game_ended_at, None);
    }

    #[test]
    fn world_snapshot_parses_spots() {
        let world: WorldSnapshot = serde_json::from_value(serde_json::json!({
            "zpots": [
                {"x": 0, "y": 0, "type": "default"},
                {"x": 3, "y": 1, "type": "wall"}
            ]
        }))
        .unwrap();

        assert_eq!(world.spots.len(), 2);
        assert_eq!(world.spots[1].kind, "wall");
    }
}
