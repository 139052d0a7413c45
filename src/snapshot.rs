//! Per-tick world view supplied by the host: actors, teams, and the
//! visibility probe the decision core uses for line-of-sight checks.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

// === Identity ===

/// Host-assigned identifier of a live actor (player, bot, or building).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// The two sides of a match. Blu walks lanes in ascending node order, Red in
/// descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Blu,
    Red,
}

impl Team {
    /// Both teams, in wave spawn order.
    pub const ALL: [Self; 2] = [Self::Blu, Self::Red];

    #[must_use]
    pub const fn opposing(self) -> Self {
        match self {
            Self::Blu => Self::Red,
            Self::Red => Self::Blu,
        }
    }

    /// Step through a lane's node indices that moves toward the enemy base.
    #[must_use]
    pub const fn lane_advance(self) -> i64 {
        match self {
            Self::Blu => 1,
            Self::Red => -1,
        }
    }
}

/// Playable classes for human players. Values match the host's class ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    Scout,
    Sniper,
    Soldier,
    Demoman,
    Medic,
    Heavy,
    Pyro,
    Spy,
    Engineer,
}

impl PlayerClass {
    /// Map a host class id to a class. Returns `None` for "no class" (0) and
    /// unknown ids.
    #[must_use]
    pub const fn from_host_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => Self::Scout,
            2 => Self::Sniper,
            3 => Self::Soldier,
            4 => Self::Demoman,
            5 => Self::Medic,
            6 => Self::Heavy,
            7 => Self::Pyro,
            8 => Self::Spy,
            9 => Self::Engineer,
            _ => return None,
        })
    }
}

// === Actors ===

/// Read-only view of one actor for the current tick.
///
/// Recreated every tick; nothing in this crate keeps an `Actor` past the tick
/// it was captured in, only its [`ActorId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub team: Team,
    /// Feet position.
    pub origin: Vec3,
    /// Offset from `origin` to the eyes.
    pub view_offset: Vec3,
    /// Horizontal unit vector the actor is facing.
    pub facing: Vec3,
    /// Height of the bounding box above `origin`.
    pub height: f32,
    pub alive: bool,
    pub is_bot: bool,
    pub observer: bool,
    pub class: Option<PlayerClass>,
    pub health: i32,
    pub max_health: i32,
}

impl Actor {
    /// A living, non-observer actor at `origin` with default dimensions.
    #[must_use]
    pub fn new(id: ActorId, team: Team, origin: Vec3) -> Self {
        Self {
            id,
            team,
            origin,
            view_offset: Vec3::new(0.0, 0.0, 64.0),
            facing: Vec3::X,
            height: 72.0,
            alive: true,
            is_bot: false,
            observer: false,
            class: None,
            health: 100,
            max_health: 100,
        }
    }

    #[must_use]
    pub fn eye_position(&self) -> Vec3 {
        self.origin + self.view_offset
    }

    /// Aim point halfway up the bounding box, so bots aim at the body rather
    /// than the feet.
    #[must_use]
    pub fn aim_point(&self) -> Vec3 {
        self.origin + Vec3::Z * (self.height * 0.5)
    }

    /// Whether this actor takes part in combat this tick.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && !self.observer
    }
}

/// All actors for one tick, captured once and shared by every consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub actors: Vec<Actor>,
}

impl WorldSnapshot {
    #[must_use]
    pub const fn new(tick: u64, actors: Vec<Actor>) -> Self {
        Self { tick, actors }
    }

    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }
}

// === Host collaborators ===

/// Supplies the actor list. Called at most once per tick.
pub trait WorldSnapshotProvider: Send + Sync {
    fn snapshot(&mut self) -> WorldSnapshot;
}

/// Outcome of a line-of-sight probe between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeResult {
    /// Something was hit before reaching the end point.
    pub hit: bool,
    /// The first hit was the intended target.
    pub hit_is_target: bool,
    /// The first hit was some other actor (not world geometry).
    pub hit_is_actor: bool,
}

impl ProbeResult {
    pub const CLEAR: Self = Self {
        hit: false,
        hit_is_target: false,
        hit_is_actor: false,
    };

    pub const WORLD: Self = Self {
        hit: true,
        hit_is_target: false,
        hit_is_actor: false,
    };

    /// World geometry sits between the two points.
    #[must_use]
    pub const fn blocked_by_world(self) -> bool {
        self.hit && !self.hit_is_target && !self.hit_is_actor
    }
}

/// Line-of-sight queries against world geometry.
pub trait VisibilityProbe: Send + Sync {
    fn probe(&self, from: Vec3, to: Vec3, target: ActorId) -> ProbeResult;
}

/// Probe for hosts without occluding geometry: every line is clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSky;

impl VisibilityProbe for OpenSky {
    fn probe(&self, _from: Vec3, _to: Vec3, _target: ActorId) -> ProbeResult {
        ProbeResult::CLEAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn teams_advance_in_opposite_directions() {
        assert_eq!(Team::Blu.lane_advance(), 1);
        assert_eq!(Team::Red.lane_advance(), -1);
        assert_eq!(Team::Blu.opposing(), Team::Red);
        assert_eq!(Team::Red.opposing(), Team::Blu);
    }

    #[test]
    fn aim_point_is_mid_body() {
        let mut actor = Actor::new(ActorId(1), Team::Blu, Vec3::new(10.0, 0.0, 5.0));
        actor.height = 80.0;
        assert_eq!(actor.aim_point(), Vec3::new(10.0, 0.0, 45.0));
    }

    #[test]
    fn observers_and_dead_are_inactive() {
        let mut actor = Actor::new(ActorId(1), Team::Red, Vec3::ZERO);
        assert!(actor.is_active());
        actor.observer = true;
        assert!(!actor.is_active());
        actor.observer = false;
        actor.alive = false;
        assert!(!actor.is_active());
    }

    #[test]
    fn probe_blocked_only_by_world() {
        assert!(ProbeResult::WORLD.blocked_by_world());
        assert!(!ProbeResult::CLEAR.blocked_by_world());
        let other_actor = ProbeResult {
            hit: true,
            hit_is_target: false,
            hit_is_actor: true,
        };
        assert!(!other_actor.blocked_by_world());
        let target = ProbeResult {
            hit: true,
            hit_is_target: true,
            hit_is_actor: true,
        };
        assert!(!target.blocked_by_world());
    }

    #[test]
    fn host_class_ids_map_to_classes() {
        assert_eq!(PlayerClass::from_host_id(3), Some(PlayerClass::Soldier));
        assert_eq!(PlayerClass::from_host_id(9), Some(PlayerClass::Engineer));
        assert_eq!(PlayerClass::from_host_id(0), None);
        assert_eq!(PlayerClass::from_host_id(42), None);
    }

    #[test]
    fn snapshot_lookup_by_id() {
        let snapshot = WorldSnapshot::new(
            7,
            vec![
                Actor::new(ActorId(1), Team::Blu, Vec3::ZERO),
                Actor::new(ActorId(2), Team::Red, Vec3::X),
            ],
        );
        assert_eq!(snapshot.get(ActorId(2)).map(|a| a.team), Some(Team::Red));
        assert!(snapshot.get(ActorId(3)).is_none());
    }
}
