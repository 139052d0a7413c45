//! Lane bots: per-bot controller state, the pooled fleet, and the systems
//! that feed them the tick snapshot.

pub mod decision;
pub mod fleet;

use bevy::log::debug;
use bevy::prelude::*;

use crate::config::{BotArchetype, BotProfile};
use crate::host::{ActorDied, ActorSpawned, BotCommand, HostVisibility, TickSnapshot};
use crate::map::{ActiveMap, LaneTopology};
use crate::snapshot::{ActorId, Team, VisibilityProbe, WorldSnapshot};
use crate::TickSet;

pub use decision::{Action, BotState, BotView, Decision, decide};
pub use fleet::{BotFleet, FleetError};

// === Types ===

/// Stable identity of a pooled bot. Survives death and reuse; only
/// [`BotFleet::remove`] retires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BotHandle(pub u32);

/// Controller state for one pooled bot.
#[derive(Debug, Clone)]
pub struct Bot {
    handle: BotHandle,
    archetype: BotArchetype,
    team: Team,
    profile: BotProfile,
    /// Host actor backing this bot, once the host has created it.
    actor: Option<ActorId>,
    /// Held by a wave, waiting to spawn or alive. Idle bots can be reused.
    reserved: bool,
    spawned: bool,
    /// Last aggro target chosen. Re-validated against every new snapshot.
    aggro_target: Option<ActorId>,
    last_origin: Option<Vec3>,
    last_state: Option<BotState>,
}

impl Bot {
    pub(crate) fn new(handle: BotHandle, archetype: BotArchetype, team: Team, profile: BotProfile) -> Self {
        Self {
            handle,
            archetype,
            team,
            profile,
            actor: None,
            reserved: true,
            spawned: false,
            aggro_target: None,
            last_origin: None,
            last_state: None,
        }
    }

    /// Prepare an idle bot for a new wave slot. The host actor is kept.
    pub(crate) fn reinit(&mut self, archetype: BotArchetype, team: Team, profile: BotProfile) {
        self.archetype = archetype;
        self.team = team;
        self.profile = profile;
        self.reserved = true;
        self.spawned = false;
        self.aggro_target = None;
        self.last_origin = None;
        self.last_state = None;
    }

    #[must_use]
    pub const fn handle(&self) -> BotHandle {
        self.handle
    }

    #[must_use]
    pub const fn archetype(&self) -> BotArchetype {
        self.archetype
    }

    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    #[must_use]
    pub const fn profile(&self) -> &BotProfile {
        &self.profile
    }

    #[must_use]
    pub const fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    #[must_use]
    pub const fn aggro_target(&self) -> Option<ActorId> {
        self.aggro_target
    }

    #[must_use]
    pub const fn last_origin(&self) -> Option<Vec3> {
        self.last_origin
    }

    #[must_use]
    pub const fn last_state(&self) -> Option<BotState> {
        self.last_state
    }

    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        self.reserved
    }

    #[must_use]
    pub const fn is_spawned(&self) -> bool {
        self.spawned
    }

    /// Free for reuse by the next wave.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.reserved
    }

    pub(crate) const fn attach(&mut self, actor: ActorId) {
        self.actor = Some(actor);
    }

    pub(crate) const fn on_spawn(&mut self) {
        self.reserved = true;
        self.spawned = true;
    }

    pub(crate) const fn on_death(&mut self) {
        self.reserved = false;
        self.spawned = false;
        self.aggro_target = None;
    }

    /// Decide this tick's command. Bots that are not spawned, or whose actor
    /// is missing or dead in the snapshot, produce nothing.
    pub fn tick(
        &mut self,
        snapshot: &WorldSnapshot,
        lanes: &LaneTopology,
        probe: &dyn VisibilityProbe,
    ) -> Option<BotCommand> {
        if !self.spawned {
            return None;
        }
        let me = snapshot.get(self.actor?)?;
        if !me.alive {
            self.aggro_target = None;
            return None;
        }
        self.last_origin = Some(me.origin);

        let view = BotView::from_actor(me, &self.profile);
        let decision = decide(&view, snapshot, lanes, probe);
        self.aggro_target = decision.target;
        self.last_state = Some(decision.state);

        Some(BotCommand {
            bot: self.handle,
            actor: me.id,
            action: decision.action,
            move_speed: self.profile.move_speed,
            refill_ammo: (self.profile.ammo > 0).then_some(self.profile.ammo),
        })
    }
}

// === Systems ===

/// Applies host spawn/death notifications to the pool.
fn apply_bot_lifecycle(
    mut spawned: MessageReader<ActorSpawned>,
    mut died: MessageReader<ActorDied>,
    mut fleet: ResMut<BotFleet>,
) {
    for event in spawned.read() {
        if let Some(handle) = event.bot {
            if let Err(err) = fleet.attach(handle, event.actor) {
                debug!(actor = event.actor.0, %err, "spawn for retired bot");
                continue;
            }
        }
        fleet.on_spawn(event.actor);
    }
    for ActorDied(actor) in died.read() {
        fleet.on_death(*actor);
    }
}

/// Runs every bot's decision against the shared snapshot.
fn drive_bots(
    snapshot: Res<TickSnapshot>,
    map: Res<ActiveMap>,
    visibility: Res<HostVisibility>,
    mut fleet: ResMut<BotFleet>,
    mut commands: MessageWriter<BotCommand>,
) {
    for command in fleet.tick(&snapshot.0, map.lanes(), visibility.0.as_ref()) {
        commands.write(command);
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Update, apply_bot_lifecycle.in_set(TickSet::Lifecycle));
    app.add_systems(Update, drive_bots.in_set(TickSet::Ai));
}
