//! Lane-pushing bots for a team arena shooter.
//!
//! Bots walk their map lane toward the enemy, fight whatever they can see on
//! the way, and are pooled and respawned in waves. The host game feeds in a
//! world snapshot and lifecycle messages each tick and carries out the
//! resulting [`host::BotCommand`]s.

pub mod bots;
pub mod building;
pub mod combat;
pub mod config;
pub mod game;
pub mod geometry;
pub mod host;
pub mod map;
pub mod players;
pub mod prelude;
pub mod snapshot;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::bots::BotFleet;
use crate::config::LaneBotsConfig;

/// Per-frame ordering of the crate's systems. Configured as a chain in
/// `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    /// Capture the frame's world snapshot.
    Snapshot,
    /// Map, spawn, death, and player notifications.
    Lifecycle,
    /// Match start and wave timing.
    Match,
    /// Bot decisions.
    Ai,
    /// Regeneration and end-of-frame resets.
    Upkeep,
}

/// Installs the bots, their match flow, and the host message seam.
///
/// Hosts replace [`host::HostWorld`] and [`host::HostVisibility`] with their
/// own collaborators, either before adding the plugin or afterwards.
#[derive(Debug, Default)]
pub struct LaneBotsPlugin {
    pub config: LaneBotsConfig,
}

impl LaneBotsPlugin {
    #[must_use]
    pub const fn new(config: LaneBotsConfig) -> Self {
        Self { config }
    }
}

impl Plugin for LaneBotsPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }
        app.insert_resource(self.config.clone());
        app.insert_resource(BotFleet::new(self.config.game.max_bots));

        app.configure_sets(
            Update,
            (
                TickSet::Snapshot,
                TickSet::Lifecycle,
                TickSet::Match,
                TickSet::Ai,
                TickSet::Upkeep,
            )
                .chain(),
        );

        app.add_plugins((
            host::plugin,
            map::plugin,
            bots::plugin,
            building::plugin,
            players::plugin,
            game::plugin,
        ));
    }
}
