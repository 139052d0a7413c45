//! Human players: class tracking, spawn-time class health, and regeneration.

use bevy::log::{debug, info};
use bevy::prelude::*;

use crate::bots::BotFleet;
use crate::config::LaneBotsConfig;
use crate::host::{ActorSpawned, ApplyClassProfile, ClassChanged, ClientJoined, ClientLeft, HealRequest, TickSnapshot};
use crate::snapshot::{ActorId, PlayerClass, WorldSnapshot};
use crate::TickSet;

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    pub actor: ActorId,
    pub class: Option<PlayerClass>,
}

// === Resources ===

/// Connected human players. Bots never appear here.
#[derive(Resource, Debug, Default)]
pub struct Users {
    users: Vec<User>,
}

impl Users {
    /// Track a newly connected player. Returns `false` if already tracked.
    pub fn add(&mut self, actor: ActorId, class: Option<PlayerClass>) -> bool {
        if self.get(actor).is_some() {
            return false;
        }
        self.users.push(User { actor, class });
        true
    }

    pub fn remove(&mut self, actor: ActorId) -> Option<User> {
        let index = self.users.iter().position(|user| user.actor == actor)?;
        Some(self.users.remove(index))
    }

    pub fn set_class(&mut self, actor: ActorId, class: PlayerClass) -> bool {
        let Some(user) = self.users.iter_mut().find(|user| user.actor == actor) else {
            return false;
        };
        user.class = Some(class);
        true
    }

    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&User> {
        self.users.iter().find(|user| user.actor == actor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }

    /// Class health to apply when `actor` (re)spawns, if it is a user with a
    /// class.
    #[must_use]
    pub fn on_spawn(&self, actor: ActorId, config: &LaneBotsConfig) -> Option<ApplyClassProfile> {
        let class = self.get(actor)?.class?;
        Some(ApplyClassProfile {
            actor,
            health: config.class_profile(class).health,
        })
    }

    /// Heal pulses due on `snapshot.tick`. Amounts never push health past max.
    #[must_use]
    pub fn regenerate(&self, snapshot: &WorldSnapshot, config: &LaneBotsConfig) -> Vec<HealRequest> {
        self.users
            .iter()
            .filter_map(|user| {
                let profile = config.class_profile(user.class?);
                if profile.regen <= 0 || profile.regen_interval == 0 {
                    return None;
                }
                if snapshot.tick % profile.regen_interval != 0 {
                    return None;
                }
                let actor = snapshot.get(user.actor)?;
                if !actor.alive || actor.health >= actor.max_health {
                    return None;
                }
                Some(HealRequest {
                    actor: user.actor,
                    amount: profile.regen.min(actor.max_health - actor.health),
                })
            })
            .collect()
    }
}

// === Systems ===

fn apply_user_events(
    mut joined: MessageReader<ClientJoined>,
    mut left: MessageReader<ClientLeft>,
    mut changed: MessageReader<ClassChanged>,
    snapshot: Res<TickSnapshot>,
    fleet: Res<BotFleet>,
    mut users: ResMut<Users>,
) {
    for event in joined.read() {
        let is_bot = fleet.by_actor(event.actor).is_some()
            || snapshot.0.get(event.actor).is_some_and(|actor| actor.is_bot);
        if is_bot {
            debug!(actor = event.actor.0, "ignoring join for bot");
            continue;
        }
        if users.add(event.actor, event.class) {
            info!(actor = event.actor.0, class = ?event.class, "user joined");
        }
    }
    for event in changed.read() {
        users.set_class(event.actor, event.class);
    }
    for ClientLeft(actor) in left.read() {
        if users.remove(*actor).is_some() {
            info!(actor = actor.0, "user left");
        }
    }
}

fn apply_class_on_spawn(
    mut spawned: MessageReader<ActorSpawned>,
    users: Res<Users>,
    config: Res<LaneBotsConfig>,
    mut profiles: MessageWriter<ApplyClassProfile>,
) {
    for event in spawned.read().filter(|event| event.bot.is_none()) {
        if let Some(profile) = users.on_spawn(event.actor, &config) {
            profiles.write(profile);
        }
    }
}

fn regenerate_users(
    snapshot: Res<TickSnapshot>,
    users: Res<Users>,
    config: Res<LaneBotsConfig>,
    mut heals: MessageWriter<HealRequest>,
) {
    heals.write_batch(users.regenerate(&snapshot.0, &config));
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Users>();
    app.add_systems(
        Update,
        (apply_user_events, apply_class_on_spawn)
            .chain()
            .in_set(TickSet::Lifecycle),
    );
    app.add_systems(Update, regenerate_users.in_set(TickSet::Upkeep));
}
