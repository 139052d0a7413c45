//! Headless demo: a toy host that plays one lane for a few seconds.
//!
//! Usage: `lane-bots [config.json]`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use lane_bots::config::{LaneBotsConfig, TICK_RATE};
use lane_bots::prelude::*;

/// Frames to simulate before exiting.
const DEMO_FRAMES: u32 = 20 * TICK_RATE as u32;

type SharedActors = Arc<Mutex<Vec<Actor>>>;

/// Snapshot provider over the demo's actor list.
struct DemoWorld {
    actors: SharedActors,
    tick: u64,
}

impl WorldSnapshotProvider for DemoWorld {
    fn snapshot(&mut self) -> WorldSnapshot {
        self.tick += 1;
        let actors = self.actors.lock().unwrap_or_else(PoisonError::into_inner).clone();
        WorldSnapshot::new(self.tick, actors)
    }
}

/// Host-side bookkeeping for the toy host.
#[derive(Resource)]
struct DemoHost {
    actors: SharedActors,
    bot_actors: HashMap<BotHandle, ActorId>,
    next_actor: u32,
    frames: u32,
}

impl DemoHost {
    fn allocate(&mut self) -> ActorId {
        self.next_actor += 1;
        ActorId(self.next_actor)
    }
}

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / TICK_RATE as f64,
        ))),
    )
    .add_plugins(LogPlugin::default());

    let config = match std::env::args().nth(1) {
        Some(path) => match LaneBotsConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!(%path, %err, "failed to load settings");
                return AppExit::error();
            }
        },
        None => LaneBotsConfig::default(),
    };

    let actors = SharedActors::default();
    app.insert_resource(HostWorld(Box::new(DemoWorld {
        actors: Arc::clone(&actors),
        tick: 0,
    })))
    .insert_resource(DemoHost {
        actors,
        bot_actors: HashMap::new(),
        next_actor: 0,
        frames: 0,
    })
    .add_plugins(LaneBotsPlugin::new(config))
    .add_systems(Startup, load_demo_map)
    .add_systems(
        Update,
        (spawn_requested, apply_bot_commands, end_demo).in_set(TickSet::Upkeep),
    );
    app.run()
}

fn load_demo_map(mut loaded: MessageWriter<MapLoaded>, mut start: MessageWriter<StartMatch>) {
    let nodes = (0..5).map(|index| LaneNode {
        lane: 0,
        index,
        origin: Vec3::new(index as f32 * 400.0, 0.0, 0.0),
    });
    let lanes = match LaneTopology::from_nodes(nodes) {
        Ok(lanes) => lanes,
        Err(err) => {
            error!(%err, "demo lane is malformed");
            return;
        }
    };
    let spawn = |team: Team, archetype: BotArchetype, x: f32| SpawnPoint {
        team,
        lane: 0,
        archetype,
        position: Vec3::new(x, 0.0, 0.0),
        facing: if team == Team::Blu { Vec3::X } else { Vec3::NEG_X },
    };
    loaded.write(MapLoaded(MapLayout {
        lanes,
        bot_spawns: vec![
            spawn(Team::Blu, BotArchetype::Melee, 0.0),
            spawn(Team::Blu, BotArchetype::Ranged, -50.0),
            spawn(Team::Red, BotArchetype::Melee, 1600.0),
            spawn(Team::Red, BotArchetype::Ranged, 1650.0),
        ],
        building_plots: vec![
            BuildingPlot {
                team: Team::Blu,
                lane: 0,
                tier: 0,
                position: Vec3::new(200.0, 60.0, 0.0),
                facing: Vec3::X,
            },
            BuildingPlot {
                team: Team::Red,
                lane: 0,
                tier: 0,
                position: Vec3::new(1400.0, 60.0, 0.0),
                facing: Vec3::NEG_X,
            },
        ],
    }));
    start.write(StartMatch);
}

/// Creates (or revives) host actors for bot and sentry requests.
fn spawn_requested(
    mut bot_requests: MessageReader<SpawnBotRequest>,
    mut sentry_requests: MessageReader<SpawnSentryRequest>,
    mut host: ResMut<DemoHost>,
    mut spawned: MessageWriter<ActorSpawned>,
    mut built: MessageWriter<SentryBuilt>,
) {
    for request in bot_requests.read() {
        let actor = if let Some(actor) = host.bot_actors.get(&request.bot).copied() {
            actor
        } else {
            let actor = host.allocate();
            host.bot_actors.insert(request.bot, actor);
            actor
        };
        let mut body = Actor::new(actor, request.team, request.position);
        body.facing = request.facing;
        body.is_bot = true;
        {
            let mut actors = host.actors.lock().unwrap_or_else(PoisonError::into_inner);
            actors.retain(|existing| existing.id != actor);
            actors.push(body);
        }
        spawned.write(ActorSpawned {
            actor,
            bot: Some(request.bot),
        });
    }
    for request in sentry_requests.read() {
        let actor = host.allocate();
        let mut body = Actor::new(actor, request.team, request.position);
        body.facing = request.facing;
        body.health = request.health;
        body.max_health = request.health;
        host.actors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(body);
        built.write(SentryBuilt {
            sentry: request.sentry,
            actor,
        });
    }
}

/// Moves bots one tick's worth along their commanded heading.
fn apply_bot_commands(mut commands: MessageReader<BotCommand>, host: Res<DemoHost>) {
    let mut actors = host.actors.lock().unwrap_or_else(PoisonError::into_inner);
    for command in commands.read() {
        let Some(body) = actors.iter_mut().find(|actor| actor.id == command.actor) else {
            continue;
        };
        let heading = command.action.aim_direction.normalize_or_zero();
        if heading != Vec3::ZERO {
            body.facing = heading;
        }
        let right = body.facing.cross(Vec3::Z);
        let step = command.move_speed / TICK_RATE as f32;
        body.origin += (body.facing * command.action.forward + right * command.action.strafe) * step;
    }
}

fn end_demo(mut host: ResMut<DemoHost>, fleet: Res<BotFleet>, mut exit: MessageWriter<AppExit>) {
    host.frames += 1;
    if host.frames < DEMO_FRAMES {
        return;
    }
    for bot in fleet.iter() {
        info!(
            handle = bot.handle().0,
            team = ?bot.team(),
            state = ?bot.last_state(),
            origin = ?bot.last_origin(),
            "bot at end of demo"
        );
    }
    exit.write(AppExit::Success);
}
