//! Sentries: tiered defensive buildings placed on the map's building plots.

use bevy::log::{info, warn};
use bevy::prelude::*;
use thiserror::Error;

use crate::config::{SentrySettings, SentryTierProfile};
use crate::host::{BuildingDestroyed, SentryBuilt, SpawnSentryRequest};
use crate::map::BuildingPlot;
use crate::snapshot::{ActorId, Team};
use crate::TickSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildingError {
    #[error("no sentry tier {tier} configured")]
    UnknownTier { tier: u8 },
    #[error("no sentry with id {0:?}")]
    UnknownSentry(SentryId),
}

// === Types ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SentryId(pub u32);

/// A sentry built on a plot. Stats are fixed by its tier.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentry {
    pub id: SentryId,
    pub team: Team,
    pub lane: u32,
    pub tier: u8,
    pub position: Vec3,
    profile: SentryTierProfile,
    actor: Option<ActorId>,
}

impl Sentry {
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.profile.range
    }

    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.profile.damage
    }

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.profile.health
    }

    #[must_use]
    pub const fn actor(&self) -> Option<ActorId> {
        self.actor
    }
}

// === Resources ===

/// Every standing sentry on the current map.
#[derive(Resource, Debug, Default)]
pub struct Sentries {
    sentries: Vec<Sentry>,
    next_id: u32,
}

impl Sentries {
    /// Register a sentry for `plot`. The host actor is bound later via
    /// [`Self::attach`].
    pub fn spawn(&mut self, plot: &BuildingPlot, settings: &SentrySettings) -> Result<SentryId, BuildingError> {
        let profile = *settings
            .tier(plot.tier)
            .ok_or(BuildingError::UnknownTier { tier: plot.tier })?;
        let id = SentryId(self.next_id);
        self.next_id += 1;
        self.sentries.push(Sentry {
            id,
            team: plot.team,
            lane: plot.lane,
            tier: plot.tier,
            position: plot.position,
            profile,
            actor: None,
        });
        Ok(id)
    }

    /// Register a sentry for every plot and build the host requests for them.
    /// Plots with an unconfigured tier are skipped.
    pub fn build_plots<'a>(
        &mut self,
        plots: impl IntoIterator<Item = &'a BuildingPlot>,
        settings: &SentrySettings,
    ) -> Vec<SpawnSentryRequest> {
        let mut requests = Vec::new();
        for plot in plots {
            match self.spawn(plot, settings) {
                Ok(id) => {
                    let health = self.get(id).map_or(0, Sentry::health);
                    info!(team = ?plot.team, lane = plot.lane, tier = plot.tier, "sentry spawned");
                    requests.push(SpawnSentryRequest {
                        sentry: id,
                        team: plot.team,
                        lane: plot.lane,
                        tier: plot.tier,
                        position: plot.position,
                        facing: plot.facing,
                        health,
                    });
                }
                Err(err) => warn!(lane = plot.lane, %err, "skipping building plot"),
            }
        }
        requests
    }

    pub fn attach(&mut self, id: SentryId, actor: ActorId) -> Result<(), BuildingError> {
        let sentry = self
            .sentries
            .iter_mut()
            .find(|sentry| sentry.id == id)
            .ok_or(BuildingError::UnknownSentry(id))?;
        sentry.actor = Some(actor);
        Ok(())
    }

    /// Forget the sentry backed by `actor`, returning it if there was one.
    pub fn on_destroyed(&mut self, actor: ActorId) -> Option<Sentry> {
        let index = self.sentries.iter().position(|sentry| sentry.actor == Some(actor))?;
        Some(self.sentries.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: SentryId) -> Option<&Sentry> {
        self.sentries.iter().find(|sentry| sentry.id == id)
    }

    #[must_use]
    pub fn by_actor(&self, actor: ActorId) -> Option<&Sentry> {
        self.sentries.iter().find(|sentry| sentry.actor == Some(actor))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sentry> {
        self.sentries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sentries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentries.is_empty()
    }

    pub fn clear(&mut self) {
        self.sentries.clear();
    }
}

// === Systems ===

fn apply_building_events(
    mut built: MessageReader<SentryBuilt>,
    mut destroyed: MessageReader<BuildingDestroyed>,
    mut sentries: ResMut<Sentries>,
) {
    for event in built.read() {
        if let Err(err) = sentries.attach(event.sentry, event.actor) {
            warn!(actor = event.actor.0, %err, "built actor for unknown sentry");
        }
    }
    for BuildingDestroyed(actor) in destroyed.read() {
        if let Some(sentry) = sentries.on_destroyed(*actor) {
            info!(team = ?sentry.team, lane = sentry.lane, tier = sentry.tier, "sentry destroyed");
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Sentries>();
    app.add_systems(Update, apply_building_events.in_set(TickSet::Lifecycle));
}
