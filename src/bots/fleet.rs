//! The bot pool: capped population, reuse of dead bots, and the per-tick
//! dispatch of one shared snapshot to every bot.

use bevy::log::{debug, info};
use bevy::prelude::*;
use thiserror::Error;

use super::{Bot, BotHandle};
use crate::config::{BotArchetype, BotSettings};
use crate::host::BotCommand;
use crate::map::LaneTopology;
use crate::snapshot::{ActorId, Team, VisibilityProbe, WorldSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("bot pool exhausted ({max_bots} bots)")]
    PoolExhausted { max_bots: usize },
    #[error("no bot with handle {0:?}")]
    UnknownBot(BotHandle),
}

/// Owns every pooled bot. The only writer of pool membership.
#[derive(Resource, Debug)]
pub struct BotFleet {
    bots: Vec<Bot>,
    max_bots: usize,
    next_handle: u32,
}

impl BotFleet {
    #[must_use]
    pub const fn new(max_bots: usize) -> Self {
        Self {
            bots: Vec::new(),
            max_bots,
            next_handle: 0,
        }
    }

    #[must_use]
    pub const fn max_bots(&self) -> usize {
        self.max_bots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.bots.iter().filter(|bot| bot.is_idle()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bot> {
        self.bots.iter()
    }

    #[must_use]
    pub fn get(&self, handle: BotHandle) -> Option<&Bot> {
        self.bots.iter().find(|bot| bot.handle == handle)
    }

    #[must_use]
    pub fn by_actor(&self, actor: ActorId) -> Option<&Bot> {
        self.bots.iter().find(|bot| bot.actor == Some(actor))
    }

    fn by_actor_mut(&mut self, actor: ActorId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|bot| bot.actor == Some(actor))
    }

    /// Reserve a bot for a wave slot: reuse the first idle bot, otherwise grow
    /// the pool up to `max_bots`.
    pub fn acquire_or_create(
        &mut self,
        archetype: BotArchetype,
        team: Team,
        settings: &BotSettings,
    ) -> Result<BotHandle, FleetError> {
        let profile = settings.profile(archetype).clone();

        if let Some(bot) = self.bots.iter_mut().find(|bot| bot.is_idle()) {
            debug!(handle = bot.handle.0, ?team, archetype = archetype.display_name(), "reusing idle bot");
            bot.reinit(archetype, team, profile);
            return Ok(bot.handle);
        }

        if self.bots.len() >= self.max_bots {
            return Err(FleetError::PoolExhausted {
                max_bots: self.max_bots,
            });
        }

        let handle = BotHandle(self.next_handle);
        self.next_handle += 1;
        debug!(handle = handle.0, ?team, archetype = archetype.display_name(), "creating bot");
        self.bots.push(Bot::new(handle, archetype, team, profile));
        Ok(handle)
    }

    /// Retire a bot entirely, freeing its pool slot. Natural death recycles
    /// instead; see [`Self::on_death`].
    pub fn remove(&mut self, handle: BotHandle) -> Result<Bot, FleetError> {
        let index = self
            .bots
            .iter()
            .position(|bot| bot.handle == handle)
            .ok_or(FleetError::UnknownBot(handle))?;
        Ok(self.bots.remove(index))
    }

    /// Bind the host actor created for a reserved bot.
    pub fn attach(&mut self, handle: BotHandle, actor: ActorId) -> Result<(), FleetError> {
        let bot = self
            .bots
            .iter_mut()
            .find(|bot| bot.handle == handle)
            .ok_or(FleetError::UnknownBot(handle))?;
        bot.attach(actor);
        Ok(())
    }

    /// The host placed `actor` in the world. Returns whether it is a pooled bot.
    pub fn on_spawn(&mut self, actor: ActorId) -> bool {
        self.by_actor_mut(actor).map(Bot::on_spawn).is_some()
    }

    /// `actor` died. Its bot keeps its pool slot and becomes idle. Returns
    /// whether it is a pooled bot.
    pub fn on_death(&mut self, actor: ActorId) -> bool {
        let Some(bot) = self.by_actor_mut(actor) else {
            return false;
        };
        debug!(handle = bot.handle.0, actor = actor.0, "bot died, returning to pool");
        bot.on_death();
        true
    }

    /// Drop every bot, e.g. on map end.
    pub fn clear(&mut self) {
        if !self.bots.is_empty() {
            info!(count = self.bots.len(), "clearing bots");
        }
        self.bots.clear();
    }

    /// Run every bot, in pool order, against the tick's shared snapshot.
    pub fn tick(
        &mut self,
        snapshot: &WorldSnapshot,
        lanes: &LaneTopology,
        probe: &dyn VisibilityProbe,
    ) -> Vec<BotCommand> {
        self.bots
            .iter_mut()
            .filter_map(|bot| bot.tick(snapshot, lanes, probe))
            .collect()
    }
}

impl Default for BotFleet {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_BOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Actor, OpenSky};
    use pretty_assertions::assert_eq;

    fn settings() -> BotSettings {
        BotSettings::default()
    }

    #[test]
    fn creates_until_cap_then_exhausts() {
        let mut fleet = BotFleet::new(2);
        fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        fleet.acquire_or_create(BotArchetype::Ranged, Team::Red, &settings()).unwrap();
        let err = fleet
            .acquire_or_create(BotArchetype::Melee, Team::Blu, &settings())
            .unwrap_err();
        assert_eq!(err, FleetError::PoolExhausted { max_bots: 2 });
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn dead_bot_is_reused_before_creating() {
        let mut fleet = BotFleet::new(4);
        let first = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        fleet.attach(first, ActorId(7)).unwrap();
        assert!(fleet.on_spawn(ActorId(7)));
        assert!(fleet.on_death(ActorId(7)));

        let again = fleet
            .acquire_or_create(BotArchetype::Ranged, Team::Red, &settings())
            .unwrap();
        assert_eq!(again, first);
        assert_eq!(fleet.len(), 1);

        let bot = fleet.get(again).unwrap();
        assert_eq!(bot.archetype(), BotArchetype::Ranged);
        assert_eq!(bot.team(), Team::Red);
        assert!(bot.is_reserved());
        assert!(!bot.is_spawned());
    }

    #[test]
    fn reserved_bots_are_not_reused() {
        let mut fleet = BotFleet::new(4);
        let a = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        let b = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        assert_ne!(a, b);
        assert_eq!(fleet.idle_count(), 0);
    }

    #[test]
    fn death_recycles_when_pool_is_full() {
        let mut fleet = BotFleet::new(1);
        let handle = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        fleet.attach(handle, ActorId(1)).unwrap();
        fleet.on_spawn(ActorId(1));
        assert!(fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).is_err());

        fleet.on_death(ActorId(1));
        assert_eq!(
            fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()),
            Ok(handle)
        );
    }

    #[test]
    fn remove_frees_slot_and_retires_handle() {
        let mut fleet = BotFleet::new(1);
        let handle = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        fleet.remove(handle).unwrap();
        assert!(fleet.is_empty());
        assert_eq!(fleet.remove(handle).unwrap_err(), FleetError::UnknownBot(handle));

        let fresh = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        assert_ne!(fresh, handle);
    }

    #[test]
    fn lifecycle_events_for_unknown_actors_are_ignored() {
        let mut fleet = BotFleet::new(1);
        assert!(!fleet.on_spawn(ActorId(99)));
        assert!(!fleet.on_death(ActorId(99)));
        assert_eq!(
            fleet.attach(BotHandle(5), ActorId(1)),
            Err(FleetError::UnknownBot(BotHandle(5)))
        );
    }

    #[test]
    fn tick_commands_only_spawned_bots_in_pool_order() {
        let mut fleet = BotFleet::new(4);
        let a = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        let b = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        let c = fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        for (handle, actor) in [(a, 1), (b, 2), (c, 3)] {
            fleet.attach(handle, ActorId(actor)).unwrap();
        }
        fleet.on_spawn(ActorId(1));
        fleet.on_spawn(ActorId(3));

        let snapshot = WorldSnapshot::new(
            1,
            (1..=3)
                .map(|id| Actor::new(ActorId(id), Team::Blu, Vec3::new(0.0, 100.0 * id as f32, 0.0)))
                .collect(),
        );
        let commands = fleet.tick(&snapshot, &LaneTopology::default(), &OpenSky);
        let bots: Vec<_> = commands.iter().map(|command| command.bot).collect();
        assert_eq!(bots, vec![a, c]);
    }

    #[test]
    fn clear_empties_pool() {
        let mut fleet = BotFleet::new(3);
        fleet.acquire_or_create(BotArchetype::Melee, Team::Blu, &settings()).unwrap();
        fleet.clear();
        assert!(fleet.is_empty());
    }
}
