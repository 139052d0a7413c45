//! Match flow: start, periodic bot waves, and teardown on map unload.

use bevy::log::{debug, info, warn};
use bevy::prelude::*;

use crate::bots::{BotFleet, FleetError};
use crate::building::Sentries;
use crate::config::{BotSettings, LaneBotsConfig};
use crate::host::{MapUnloaded, SpawnBotRequest, SpawnSentryRequest, StartMatch};
use crate::map::{ActiveMap, MapLayout};
use crate::players::Users;
use crate::snapshot::Team;
use crate::TickSet;

// === States ===

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchPhase {
    /// Map loaded (or not), match not started.
    #[default]
    Waiting,
    /// Sentries built and waves spawning.
    Running,
}

// === Resources ===

/// Ticks elapsed in the running match.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchClock {
    pub tick: u64,
    pub waves: u32,
}

// === Waves ===

/// Reserve a bot for every spawn point: lanes in order, Blu before Red.
/// Slots the pool cannot fill are skipped.
pub fn spawn_bot_wave(layout: &MapLayout, fleet: &mut BotFleet, settings: &BotSettings) -> Vec<SpawnBotRequest> {
    let mut requests = Vec::new();
    for lane in layout.lanes.lanes() {
        for team in Team::ALL {
            for point in layout.spawn_points(team, lane.id) {
                match fleet.acquire_or_create(point.archetype, team, settings) {
                    Ok(bot) => requests.push(SpawnBotRequest {
                        bot,
                        archetype: point.archetype,
                        team,
                        position: point.position,
                        facing: point.facing,
                    }),
                    Err(err @ FleetError::PoolExhausted { .. }) => {
                        warn!(lane = lane.id, ?team, %err, "skipping wave slot");
                    }
                    Err(err) => warn!(lane = lane.id, ?team, %err, "wave slot failed"),
                }
            }
        }
    }
    requests
}

// === Systems ===

fn start_match(
    mut starts: MessageReader<StartMatch>,
    phase: Res<State<MatchPhase>>,
    mut next_phase: ResMut<NextState<MatchPhase>>,
    map: Res<ActiveMap>,
    config: Res<LaneBotsConfig>,
    mut clock: ResMut<MatchClock>,
    mut fleet: ResMut<BotFleet>,
    mut sentries: ResMut<Sentries>,
    mut sentry_requests: MessageWriter<SpawnSentryRequest>,
    mut bot_requests: MessageWriter<SpawnBotRequest>,
) {
    let mut running = *phase.get() == MatchPhase::Running;
    for _ in starts.read() {
        if running {
            debug!("match already running");
            continue;
        }
        let Some(layout) = map.0.as_ref() else {
            warn!("start requested with no map loaded");
            continue;
        };

        sentry_requests.write_batch(sentries.build_plots(&layout.building_plots, &config.sentry));
        let wave = spawn_bot_wave(layout, &mut fleet, &config.bots);
        info!(bots = wave.len(), sentries = sentries.len(), "match started");
        bot_requests.write_batch(wave);

        *clock = MatchClock { tick: 0, waves: 1 };
        next_phase.set(MatchPhase::Running);
        running = true;
    }
}

fn tick_match(
    map: Res<ActiveMap>,
    config: Res<LaneBotsConfig>,
    mut clock: ResMut<MatchClock>,
    mut fleet: ResMut<BotFleet>,
    mut bot_requests: MessageWriter<SpawnBotRequest>,
) {
    clock.tick += 1;
    let interval = config.game.bot_wave_interval;
    if interval == 0 || clock.tick % interval != 0 {
        return;
    }
    let Some(layout) = map.0.as_ref() else {
        return;
    };
    let wave = spawn_bot_wave(layout, &mut fleet, &config.bots);
    clock.waves += 1;
    info!(wave = clock.waves, bots = wave.len(), "wave spawned");
    bot_requests.write_batch(wave);
}

/// Runs after the frame's match tick so nothing re-advances the cleared clock.
fn reset_on_unload(
    mut unloaded: MessageReader<MapUnloaded>,
    mut next_phase: ResMut<NextState<MatchPhase>>,
    mut clock: ResMut<MatchClock>,
    mut fleet: ResMut<BotFleet>,
    mut sentries: ResMut<Sentries>,
    mut users: ResMut<Users>,
) {
    if unloaded.read().count() == 0 {
        return;
    }
    fleet.clear();
    sentries.clear();
    users.clear();
    *clock = MatchClock::default();
    next_phase.set(MatchPhase::Waiting);
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.init_state::<MatchPhase>();
    app.init_resource::<MatchClock>();
    app.add_systems(Update, reset_on_unload.in_set(TickSet::Upkeep));
    app.add_systems(
        Update,
        (start_match, tick_match.run_if(in_state(MatchPhase::Running)))
            .chain()
            .in_set(TickSet::Match),
    );
}
