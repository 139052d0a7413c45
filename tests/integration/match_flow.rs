//! Tests for the match flow as a host sees it: messages in, requests out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bevy::ecs::message::Message;
use lane_bots::config::LaneBotsConfig;
use lane_bots::prelude::*;
use pretty_assertions::assert_eq;

// === Scripted host ===

#[derive(Clone, Default)]
struct SharedWorld {
    actors: Arc<Mutex<Vec<Actor>>>,
    calls: Arc<AtomicUsize>,
}

impl SharedWorld {
    fn push(&self, actor: Actor) {
        self.actors.lock().unwrap().push(actor);
    }

    fn kill(&self, id: ActorId) {
        let mut actors = self.actors.lock().unwrap();
        if let Some(actor) = actors.iter_mut().find(|actor| actor.id == id) {
            actor.alive = false;
        }
    }
}

impl WorldSnapshotProvider for SharedWorld {
    fn snapshot(&mut self) -> WorldSnapshot {
        let tick = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        WorldSnapshot::new(tick as u64, self.actors.lock().unwrap().clone())
    }
}

#[derive(Resource)]
struct Log<M>(Vec<M>);

fn collect<M: Message + Clone>(app: &mut App) {
    app.insert_resource(Log::<M>(Vec::new()));
    app.add_systems(Last, |mut reader: MessageReader<M>, mut log: ResMut<Log<M>>| {
        log.0.extend(reader.read().cloned());
    });
}

fn create_host_app(wave_interval: u64) -> (App, SharedWorld) {
    let world = SharedWorld::default();
    let mut config = LaneBotsConfig::default();
    config.game.bot_wave_interval = wave_interval;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(HostWorld(Box::new(world.clone())));
    app.add_plugins(LaneBotsPlugin::new(config));
    collect::<SpawnBotRequest>(&mut app);
    collect::<SpawnSentryRequest>(&mut app);
    collect::<BotCommand>(&mut app);
    (app, world)
}

/// One lane along +X, nodes every 100 units, one melee and one ranged spawn
/// per team, and a sentry plot per team.
fn layout() -> MapLayout {
    let lanes = LaneTopology::from_nodes((0..3).map(|index| LaneNode {
        lane: 0,
        index,
        origin: Vec3::new(index as f32 * 100.0, 0.0, 0.0),
    }))
    .unwrap();
    let spawn = |team, archetype, x| SpawnPoint {
        team,
        lane: 0,
        archetype,
        position: Vec3::new(x, 0.0, 0.0),
        facing: Vec3::X,
    };
    let plot = |team, x| BuildingPlot {
        team,
        lane: 0,
        tier: 1,
        position: Vec3::new(x, 80.0, 0.0),
        facing: Vec3::X,
    };
    MapLayout {
        lanes,
        bot_spawns: vec![
            spawn(Team::Blu, BotArchetype::Melee, 0.0),
            spawn(Team::Blu, BotArchetype::Ranged, -20.0),
            spawn(Team::Red, BotArchetype::Melee, 200.0),
            spawn(Team::Red, BotArchetype::Ranged, 220.0),
        ],
        building_plots: vec![plot(Team::Blu, 20.0), plot(Team::Red, 180.0)],
    }
}

/// Play the host's part for this frame's bot spawn requests: create the
/// actors (first allocation only) and confirm the spawns.
fn fulfil_spawns(app: &mut App, world: &SharedWorld, already: usize) -> Vec<(BotHandle, ActorId)> {
    let requests: Vec<_> = app.world().resource::<Log<SpawnBotRequest>>().0[already..].to_vec();
    let mut spawned = Vec::new();
    for (offset, request) in requests.iter().enumerate() {
        let actor = ActorId(100 + u32::try_from(already + offset).unwrap());
        let mut body = Actor::new(actor, request.team, request.position);
        body.is_bot = true;
        world.push(body);
        app.world_mut().write_message(ActorSpawned {
            actor,
            bot: Some(request.bot),
        });
        spawned.push((request.bot, actor));
    }
    spawned
}

fn start(app: &mut App) {
    app.world_mut().write_message(MapLoaded(layout()));
    app.world_mut().write_message(StartMatch);
    app.update();
}

// === Tests ===

#[test]
fn snapshot_is_fetched_once_per_frame() {
    let (mut app, world) = create_host_app(1000);
    start(&mut app);
    for _ in 0..4 {
        app.update();
    }
    assert_eq!(world.calls.load(Ordering::SeqCst), 5);
}

#[test]
fn start_requests_sentries_and_first_wave() {
    let (mut app, _world) = create_host_app(1000);
    start(&mut app);

    let bots = &app.world().resource::<Log<SpawnBotRequest>>().0;
    let teams: Vec<_> = bots.iter().map(|request| request.team).collect();
    assert_eq!(teams, vec![Team::Blu, Team::Blu, Team::Red, Team::Red]);

    let sentries = &app.world().resource::<Log<SpawnSentryRequest>>().0;
    assert_eq!(sentries.len(), 2);
    let tier = LaneBotsConfig::default().sentry.tiers[1];
    assert_eq!(sentries[0].health, tier.health);

    app.update();
    assert_eq!(*app.world().resource::<State<MatchPhase>>().get(), MatchPhase::Running);
}

#[test]
fn spawned_bots_march_at_each_other() {
    let (mut app, world) = create_host_app(1000);
    start(&mut app);
    let spawned = fulfil_spawns(&mut app, &world, 0);
    app.update();

    let commands = &app.world().resource::<Log<BotCommand>>().0;
    assert_eq!(commands.len(), 4);

    let blu_melee = commands.iter().find(|command| command.bot == spawned[0].0).unwrap();
    assert_eq!(blu_melee.actor, spawned[0].1);
    assert!(blu_melee.action.aim_direction.x > 0.0);
    assert_eq!(blu_melee.refill_ammo, None);

    let red_ranged = commands.iter().find(|command| command.bot == spawned[3].0).unwrap();
    assert!(red_ranged.action.attack, "Blu bots are inside ranged attack range");
    assert_eq!(red_ranged.refill_ammo, Some(LaneBotsConfig::default().bots.ranged.ammo));
}

#[test]
fn dead_bot_is_reused_by_next_wave() {
    let (mut app, world) = create_host_app(5);
    start(&mut app);
    let spawned = fulfil_spawns(&mut app, &world, 0);
    app.update();

    let (dead_bot, dead_actor) = spawned[0];
    world.kill(dead_actor);
    app.world_mut().write_message(ActorDied(dead_actor));
    app.update();
    assert_eq!(app.world().resource::<BotFleet>().idle_count(), 1);

    // Running ticks start on frame 2; the second wave lands on frame 6.
    for _ in 0..3 {
        app.update();
    }
    let requests = &app.world().resource::<Log<SpawnBotRequest>>().0;
    assert_eq!(requests.len(), 8);
    assert_eq!(requests[4].bot, dead_bot);
    assert_eq!(app.world().resource::<BotFleet>().len(), 7);
}

#[test]
fn unload_clears_everything() {
    let (mut app, world) = create_host_app(1000);
    start(&mut app);
    fulfil_spawns(&mut app, &world, 0);
    app.update();

    app.world_mut().write_message(MapUnloaded);
    app.update();
    app.update();

    assert!(app.world().resource::<BotFleet>().is_empty());
    assert!(app.world().resource::<lane_bots::building::Sentries>().is_empty());
    assert!(app.world().resource::<lane_bots::map::ActiveMap>().0.is_none());
    assert_eq!(*app.world().resource::<State<MatchPhase>>().get(), MatchPhase::Waiting);
}
