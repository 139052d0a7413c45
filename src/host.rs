//! The seam to the host game: inbound notifications, outbound requests, and
//! the collaborators the host installs as resources.

use bevy::prelude::*;

use crate::bots::{Action, BotHandle};
use crate::building::SentryId;
use crate::config::BotArchetype;
use crate::map::MapLayout;
use crate::snapshot::{ActorId, OpenSky, PlayerClass, Team, VisibilityProbe, WorldSnapshot, WorldSnapshotProvider};
use crate::TickSet;

// === Inbound ===

/// A map finished loading and the host read its layout.
#[derive(Message, Debug, Clone)]
pub struct MapLoaded(pub MapLayout);

#[derive(Message, Debug, Clone, Copy)]
pub struct MapUnloaded;

/// Begin the match: build sentries, send the first wave.
#[derive(Message, Debug, Clone, Copy)]
pub struct StartMatch;

/// The host placed an actor in the world. `bot` is set when the actor was
/// created for a [`SpawnBotRequest`].
#[derive(Message, Debug, Clone, Copy)]
pub struct ActorSpawned {
    pub actor: ActorId,
    pub bot: Option<BotHandle>,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct ActorDied(pub ActorId);

/// A sentry (or other building) was destroyed.
#[derive(Message, Debug, Clone, Copy)]
pub struct BuildingDestroyed(pub ActorId);

/// The host created the actor for a [`SpawnSentryRequest`].
#[derive(Message, Debug, Clone, Copy)]
pub struct SentryBuilt {
    pub sentry: SentryId,
    pub actor: ActorId,
}

/// A human player connected.
#[derive(Message, Debug, Clone, Copy)]
pub struct ClientJoined {
    pub actor: ActorId,
    pub class: Option<PlayerClass>,
}

#[derive(Message, Debug, Clone, Copy)]
pub struct ClientLeft(pub ActorId);

/// A human player switched class.
#[derive(Message, Debug, Clone, Copy)]
pub struct ClassChanged {
    pub actor: ActorId,
    pub class: PlayerClass,
}

// === Outbound ===

/// Per-tick actuation for one bot.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct BotCommand {
    pub bot: BotHandle,
    pub actor: ActorId,
    pub action: Action,
    pub move_speed: f32,
    /// Ammo to top up to, for archetypes that carry any.
    pub refill_ammo: Option<u32>,
}

/// Ask the host to create (or respawn) the actor for a reserved bot.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SpawnBotRequest {
    pub bot: BotHandle,
    pub archetype: BotArchetype,
    pub team: Team,
    pub position: Vec3,
    pub facing: Vec3,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SpawnSentryRequest {
    pub sentry: SentryId,
    pub team: Team,
    pub lane: u32,
    pub tier: u8,
    pub position: Vec3,
    pub facing: Vec3,
    pub health: i32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealRequest {
    pub actor: ActorId,
    pub amount: i32,
}

/// Reset a freshly spawned player to their class's health.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyClassProfile {
    pub actor: ActorId,
    pub health: i32,
}

// === Resources ===

/// The host's actor enumeration. Queried exactly once per frame.
#[derive(Resource)]
pub struct HostWorld(pub Box<dyn WorldSnapshotProvider>);

impl Default for HostWorld {
    fn default() -> Self {
        Self(Box::new(EmptyWorld::default()))
    }
}

/// The host's line-of-sight trace.
#[derive(Resource)]
pub struct HostVisibility(pub Box<dyn VisibilityProbe>);

impl Default for HostVisibility {
    fn default() -> Self {
        Self(Box::new(OpenSky))
    }
}

/// This frame's snapshot, shared read-only by every consumer.
#[derive(Resource, Debug, Default)]
pub struct TickSnapshot(pub WorldSnapshot);

/// A world with no actors. Stands in until the host installs its own.
#[derive(Debug, Default)]
pub struct EmptyWorld {
    tick: u64,
}

impl WorldSnapshotProvider for EmptyWorld {
    fn snapshot(&mut self) -> WorldSnapshot {
        self.tick += 1;
        WorldSnapshot::new(self.tick, Vec::new())
    }
}

// === Systems ===

fn capture_snapshot(mut world: ResMut<HostWorld>, mut snapshot: ResMut<TickSnapshot>) {
    snapshot.0 = world.0.snapshot();
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_message::<MapLoaded>()
        .add_message::<MapUnloaded>()
        .add_message::<StartMatch>()
        .add_message::<ActorSpawned>()
        .add_message::<ActorDied>()
        .add_message::<BuildingDestroyed>()
        .add_message::<SentryBuilt>()
        .add_message::<ClientJoined>()
        .add_message::<ClientLeft>()
        .add_message::<ClassChanged>()
        .add_message::<BotCommand>()
        .add_message::<SpawnBotRequest>()
        .add_message::<SpawnSentryRequest>()
        .add_message::<HealRequest>()
        .add_message::<ApplyClassProfile>();

    if !app.world().contains_resource::<HostWorld>() {
        app.init_resource::<HostWorld>();
    }
    if !app.world().contains_resource::<HostVisibility>() {
        app.init_resource::<HostVisibility>();
    }
    app.init_resource::<TickSnapshot>();
    app.add_systems(Update, capture_snapshot.in_set(TickSet::Snapshot));
}
