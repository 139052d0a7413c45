//! Map layout: lanes, bot spawn points, and building plots for the loaded map.

pub mod lanes;

use bevy::log::{info, warn};
use bevy::prelude::*;

use crate::config::BotArchetype;
use crate::host::{MapLoaded, MapUnloaded};
use crate::snapshot::Team;
use crate::TickSet;

pub use lanes::{Lane, LaneNode, LaneSegment, LaneTopology, TopologyError};

// === Types ===

/// Where a wave bot appears, and which archetype it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub team: Team,
    pub lane: u32,
    pub archetype: BotArchetype,
    pub position: Vec3,
    pub facing: Vec3,
}

/// A fixed location where a sentry is built when the match starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingPlot {
    pub team: Team,
    pub lane: u32,
    pub tier: u8,
    pub position: Vec3,
    pub facing: Vec3,
}

/// Everything read from the map at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLayout {
    pub lanes: LaneTopology,
    pub bot_spawns: Vec<SpawnPoint>,
    pub building_plots: Vec<BuildingPlot>,
}

impl MapLayout {
    /// Spawn points for one team on one lane, in authored order.
    pub fn spawn_points(&self, team: Team, lane: u32) -> impl Iterator<Item = &SpawnPoint> {
        self.bot_spawns
            .iter()
            .filter(move |point| point.team == team && point.lane == lane)
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.lane_count()
    }

    /// Every spawn point and building plot must sit on a lane that has nodes.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let referenced = self
            .bot_spawns
            .iter()
            .map(|point| point.lane)
            .chain(self.building_plots.iter().map(|plot| plot.lane));
        for lane in referenced {
            if self.lanes.lane(lane).is_none_or(|lane| lane.nodes.is_empty()) {
                return Err(TopologyError::EmptyLane(lane));
            }
        }
        Ok(())
    }
}

/// Host-side reader of map entities. Invoked once per map (re)load.
pub trait MapLoader {
    fn load_map(&mut self) -> Result<MapLayout, TopologyError>;
}

// === Resources ===

/// The layout of the currently loaded map; `None` between maps.
#[derive(Resource, Debug, Default)]
pub struct ActiveMap(pub Option<MapLayout>);

impl ActiveMap {
    /// Lanes of the loaded map, or an empty topology when no map is loaded.
    #[must_use]
    pub fn lanes(&self) -> &LaneTopology {
        static NO_LANES: LaneTopology = LaneTopology::EMPTY;
        self.0.as_ref().map_or(&NO_LANES, |layout| &layout.lanes)
    }
}

// === Systems ===

fn apply_map_changes(
    mut loaded: MessageReader<MapLoaded>,
    mut unloaded: MessageReader<MapUnloaded>,
    mut active: ResMut<ActiveMap>,
) {
    for _ in unloaded.read() {
        if active.0.take().is_some() {
            info!("map unloaded");
        }
    }
    for MapLoaded(layout) in loaded.read() {
        if layout.lanes.is_empty() {
            warn!("loaded map has no lane nodes; bots will hold position");
        } else if let Err(err) = layout.validate() {
            warn!(%err, "map layout references a missing lane");
        }
        info!(
            lanes = layout.lane_count(),
            bot_spawns = layout.bot_spawns.len(),
            building_plots = layout.building_plots.len(),
            "map loaded"
        );
        active.0 = Some(layout.clone());
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ActiveMap>();
    app.add_systems(Update, apply_map_changes.in_set(TickSet::Lifecycle));
}
