//! Testing utilities for Bevy systems.

#![cfg(test)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::ecs::message::Message;
use bevy::prelude::*;

use crate::config::BotArchetype;
use crate::map::{BuildingPlot, LaneNode, LaneTopology, MapLayout, SpawnPoint};
use crate::snapshot::{Actor, Team, WorldSnapshot, WorldSnapshotProvider};

/// Creates a minimal app for testing with essential plugins.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app
}

/// Helper to advance the app by multiple frames.
pub fn tick_multiple(app: &mut App, count: usize) {
    for _ in 0..count {
        app.update();
    }
}

/// One lane along +X with nodes at x = 0, 100, 200. Blu spawns at the start,
/// Red at the end, one melee and one ranged each. One tier-0 Blu plot.
pub fn three_node_layout() -> MapLayout {
    let lanes = LaneTopology::from_nodes([0.0, 100.0, 200.0].into_iter().enumerate().map(|(index, x)| {
        LaneNode {
            lane: 0,
            index,
            origin: Vec3::new(x, 0.0, 0.0),
        }
    }))
    .expect("three-node lane is valid");

    let spawn = |team: Team, archetype: BotArchetype, x: f32| SpawnPoint {
        team,
        lane: 0,
        archetype,
        position: Vec3::new(x, 0.0, 0.0),
        facing: if team == Team::Blu { Vec3::X } else { Vec3::NEG_X },
    };

    MapLayout {
        lanes,
        bot_spawns: vec![
            spawn(Team::Blu, BotArchetype::Melee, 0.0),
            spawn(Team::Red, BotArchetype::Melee, 200.0),
            spawn(Team::Blu, BotArchetype::Ranged, 0.0),
            spawn(Team::Red, BotArchetype::Ranged, 200.0),
        ],
        building_plots: vec![BuildingPlot {
            team: Team::Blu,
            lane: 0,
            tier: 0,
            position: Vec3::new(20.0, 40.0, 0.0),
            facing: Vec3::X,
        }],
    }
}

/// Serves a fixed actor list and counts how often it is asked.
pub struct StaticWorld {
    pub actors: Vec<Actor>,
    calls: Arc<AtomicUsize>,
}

impl StaticWorld {
    /// Returns the provider and a handle to its call counter.
    pub fn new(actors: Vec<Actor>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                actors,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl WorldSnapshotProvider for StaticWorld {
    fn snapshot(&mut self) -> WorldSnapshot {
        let tick = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        WorldSnapshot::new(tick as u64, self.actors.clone())
    }
}

/// Every `M` written so far, in order.
#[derive(Resource)]
pub struct MessageLog<M>(pub Vec<M>);

impl<M> Default for MessageLog<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

/// Record every `M` into [`MessageLog<M>`] at the end of each frame.
pub fn collect_messages<M: Message + Clone>(app: &mut App) {
    app.init_resource::<MessageLog<M>>();
    app.add_systems(Last, |mut reader: MessageReader<M>, mut log: ResMut<MessageLog<M>>| {
        log.0.extend(reader.read().cloned());
    });
}
