//! Damage adjustment for hits involving bots, sentries, and players.
//!
//! The host calls [`resolve_damage`] from its damage hook and applies the
//! returned values in place of the originals.

use bevy::math::Vec3;

use crate::bots::BotFleet;
use crate::building::Sentries;
use crate::config::LaneBotsConfig;
use crate::players::Users;
use crate::snapshot::ActorId;

/// A hit as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    /// `None` for world damage (falls, hazards).
    pub attacker: Option<ActorId>,
    pub victim: ActorId,
    pub damage: f32,
    pub force: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDamage {
    pub damage: f32,
    pub force: Vec3,
}

/// Rewrite a hit: pooled bots and sentries deal their configured damage,
/// players scale by their class multiplier, and bots take no knockback.
#[must_use]
pub fn resolve_damage(
    event: &DamageEvent,
    fleet: &BotFleet,
    sentries: &Sentries,
    users: &Users,
    config: &LaneBotsConfig,
) -> ResolvedDamage {
    let damage = match event.attacker {
        None => event.damage,
        Some(attacker) => {
            if let Some(bot) = fleet.by_actor(attacker) {
                bot.profile().damage
            } else if let Some(sentry) = sentries.by_actor(attacker) {
                sentry.damage()
            } else if let Some(class) = users.get(attacker).and_then(|user| user.class) {
                event.damage * config.class_profile(class).damage_multiplier
            } else {
                event.damage
            }
        }
    };
    let force = if fleet.by_actor(event.victim).is_some() {
        Vec3::ZERO
    } else {
        event.force
    };
    ResolvedDamage { damage, force }
}
