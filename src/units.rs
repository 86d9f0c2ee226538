//! Building and zombie records plus the per-type prototype table.
//!
//! Entities live in dense arenas on the `Map`, rebuilt from every snapshot;
//! cells refer to them by index only.

use crate::position::Position;
use fnv::FnvHashMap;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ZombieType {
    Normal,
    Fast,
    Bomber,
    Liner,
    Juggernaut,
    ChaosKnight,
}

impl ZombieType {
    /// Wire name to enum tag. Unknown names are a fatal turn error for the
    /// caller; danger propagation must not guess movement rules.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(ZombieType::Normal),
            "fast" => Some(ZombieType::Fast),
            "bomber" => Some(ZombieType::Bomber),
            "liner" => Some(ZombieType::Liner),
            "juggernaut" => Some(ZombieType::Juggernaut),
            "chaos_knight" => Some(ZombieType::ChaosKnight),
            _ => None,
        }
    }

    /// Archetypes whose forecast keeps marching after reaching a building
    /// cell instead of stopping at the first arrival.
    pub fn marches_through_buildings(self) -> bool {
        matches!(
            self,
            ZombieType::Bomber | ZombieType::Liner | ZombieType::Juggernaut | ZombieType::ChaosKnight
        )
    }
}

#[derive(Clone, Debug)]
pub struct Building {
    pub id: String,
    pub position: Position,
    pub attack: i32,
    pub health: i32,
    pub range: i32,
    pub is_head: bool,
    pub is_enemy: bool,
    pub last_attack: Option<Position>,
    /// Threat weight accumulated by the enemy-building pass; scores attack
    /// targeting. Reset to 1.0 each turn.
    pub danger: f64,
}

impl Building {
    /// Fallback for snapshots that omit `isHead`: head buildings are the only
    /// ones with large base attack.
    pub fn head_fallback(attack: i32) -> bool {
        attack > 20
    }

    /// Fallback for snapshots that omit `range`.
    pub fn range_fallback(is_head: bool) -> i32 {
        if is_head {
            10
        } else {
            8
        }
    }
}

#[derive(Clone, Debug)]
pub struct Zombie {
    pub id: String,
    pub kind: ZombieType,
    pub position: Position,
    pub direction: Position,
    pub attack: i32,
    pub health: i32,
    pub speed: i32,
    pub wait_turns: i32,
    /// Predicted impact on our buildings, accumulated by the zombie pass.
    pub danger: f64,
}

/// Historically observed worst-case stats for one archetype.
#[derive(Copy, Clone, Debug)]
pub struct ZombieProto {
    pub attack: i32,
    pub health: i32,
    pub speed: i32,
    pub wait_turns: i32,
}

impl ZombieProto {
    fn from_zombie(zombie: &Zombie) -> Self {
        ZombieProto {
            attack: zombie.attack,
            health: zombie.health,
            speed: zombie.speed,
            wait_turns: zombie.wait_turns,
        }
    }

    /// Running maximum merge; stats never decrease.
    fn merge_max(&mut self, zombie: &Zombie) {
        self.attack = self.attack.max(zombie.attack);
        self.health = self.health.max(zombie.health);
        self.speed = self.speed.max(zombie.speed);
        self.wait_turns = self.wait_turns.max(zombie.wait_turns);
    }
}

/// Assumed attack for archetypes never observed yet, so spawns are not
/// treated as danger-free before the first wave arrives.
pub const DEFAULT_PROTO_ATTACK: i32 = 10;

/// Per-type running maxima, used to forecast conservatively when a type's
/// stats were only partially observed. Owned by the map; survives `clear()`.
#[derive(Default)]
pub struct ProtoTable {
    protos: FnvHashMap<ZombieType, ZombieProto>,
}

impl ProtoTable {
    pub fn observe(&mut self, zombie: &Zombie) {
        self.protos
            .entry(zombie.kind)
            .and_modify(|proto| proto.merge_max(zombie))
            .or_insert_with(|| ZombieProto::from_zombie(zombie));
    }

    pub fn get(&self, kind: ZombieType) -> Option<&ZombieProto> {
        self.protos.get(&kind)
    }

    /// Mean of the observed prototype attacks; conservative default when
    /// nothing has been observed.
    pub fn mean_attack(&self) -> f64 {
        if self.protos.is_empty() {
            return DEFAULT_PROTO_ATTACK as f64;
        }
        let total: i32 = self.protos.values().map(|proto| proto.attack).sum();
        total as f64 / self.protos.len() as f64
    }
}
