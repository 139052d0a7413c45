//! Common imports for hosts embedding the bots.

pub use bevy::prelude::*;

pub use crate::bots::{Action, BotFleet, BotHandle, BotState};
pub use crate::config::{BotArchetype, LaneBotsConfig};
pub use crate::game::MatchPhase;
pub use crate::host::*;
pub use crate::map::{BuildingPlot, LaneNode, LaneTopology, MapLayout, SpawnPoint};
pub use crate::snapshot::{Actor, ActorId, PlayerClass, ProbeResult, Team, VisibilityProbe, WorldSnapshot, WorldSnapshotProvider};
pub use crate::{LaneBotsPlugin, TickSet};
