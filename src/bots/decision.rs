//! Per-tick action selection for a lane bot.
//!
//! [`decide`] is a pure function of the bot's own state, the tick's snapshot,
//! the lane topology, and the visibility probe. Nothing is remembered between
//! calls: the aggro target is recomputed from scratch every tick.

use bevy::log::debug;
use bevy::math::Vec3;

use crate::config::BotProfile;
use crate::geometry::{closest_point_on_line_segment, planar_distance};
use crate::map::LaneTopology;
use crate::snapshot::{Actor, ActorId, Team, VisibilityProbe, WorldSnapshot};

// === Constants ===

/// Friendlies closer than this push the bot sideways.
pub const PERSONAL_SPACE_RADIUS: f32 = 24.0;

/// Strafe magnitude used to step away from a crowding friendly (half speed).
pub const AVOIDANCE_STRAFE: f32 = 0.5;

/// Farther than this from the lane, the bot walks back to it first.
pub const LANE_MARGIN: f32 = 32.0;

/// How far past a segment's end the bot aims, so it never stalls on the node.
pub const LANE_OVERSHOOT: f32 = 10.0;

/// Within this distance of the movement goal the bot stops.
pub const ARRIVAL_DISTANCE: f32 = 1.0;

// === Types ===

/// What the bot is doing this tick. Re-derived every tick, no hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BotState {
    /// Following the lane toward the enemy.
    SeekLane,
    /// Within arrival distance of the lane goal; holding position.
    Arrived,
    /// Closing in on the aggro target.
    Engage,
    /// In attack range of the aggro target.
    Attack,
    /// Too close to the aggro target; backing off while attacking.
    Retreat,
}

/// Movement and combat intent handed to the host's actuation layer.
///
/// `forward` and `strafe` are in `[-1, 1]`; positive strafe is to the bot's
/// right. `aim_direction` is a unit vector, or zero when the bot keeps its
/// current facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub forward: f32,
    pub strafe: f32,
    pub attack: bool,
    pub aim_direction: Vec3,
}

impl Action {
    pub const IDLE: Self = Self {
        forward: 0.0,
        strafe: 0.0,
        attack: false,
        aim_direction: Vec3::ZERO,
    };
}

impl Default for Action {
    fn default() -> Self {
        Self::IDLE
    }
}

/// The bot-side inputs to a decision.
#[derive(Debug, Clone, Copy)]
pub struct BotView<'a> {
    pub actor: ActorId,
    pub team: Team,
    pub profile: &'a BotProfile,
    pub origin: Vec3,
    pub eye: Vec3,
    /// Horizontal unit vector the bot currently faces.
    pub facing: Vec3,
}

impl<'a> BotView<'a> {
    /// Build a view from the bot's own snapshot entry.
    #[must_use]
    pub fn from_actor(actor: &Actor, profile: &'a BotProfile) -> Self {
        Self {
            actor: actor.id,
            team: actor.team,
            profile,
            origin: actor.origin,
            eye: actor.eye_position(),
            facing: actor.facing,
        }
    }
}

/// Result of one decision pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub state: BotState,
    pub target: Option<ActorId>,
    /// Lane goal the bot is walking to, when it has no aggro target.
    pub goal: Option<Vec3>,
}

// === Scan ===

struct Scan {
    target: Option<ActorId>,
    crowding: Option<Vec3>,
}

/// Pick the nearest visible enemy within aggro range, and the nearest
/// friendly inside personal space.
fn scan(bot: &BotView<'_>, snapshot: &WorldSnapshot, probe: &dyn VisibilityProbe) -> Scan {
    let mut enemies: Vec<(f32, &Actor)> = Vec::new();
    let mut crowding: Option<(f32, Vec3)> = None;

    for actor in snapshot.iter() {
        if actor.id == bot.actor || !actor.is_active() {
            continue;
        }
        let dist = bot.origin.distance(actor.origin);
        if actor.team == bot.team {
            if dist < PERSONAL_SPACE_RADIUS && crowding.is_none_or(|(d, _)| dist < d) {
                crowding = Some((dist, actor.origin));
            }
        } else if dist <= bot.profile.aggro_range {
            enemies.push((dist, actor));
        }
    }

    // Stable sort keeps snapshot order for equal distances.
    enemies.sort_by(|a, b| a.0.total_cmp(&b.0));
    let target = enemies
        .into_iter()
        .find(|(_, enemy)| {
            !probe
                .probe(bot.eye, enemy.aim_point(), enemy.id)
                .blocked_by_world()
        })
        .map(|(_, enemy)| enemy.id);

    Scan {
        target,
        crowding: crowding.map(|(_, origin)| origin),
    }
}

/// Sideways bias away from a crowding friendly.
fn avoidance_strafe(bot: &BotView<'_>, friendly: Vec3) -> f32 {
    let left = Vec3::Z.cross(bot.facing);
    if left.dot(friendly - bot.origin) > 0.0 {
        AVOIDANCE_STRAFE
    } else {
        -AVOIDANCE_STRAFE
    }
}

// === Decision ===

/// Choose this tick's action for one bot.
#[must_use]
pub fn decide(
    bot: &BotView<'_>,
    snapshot: &WorldSnapshot,
    lanes: &LaneTopology,
    probe: &dyn VisibilityProbe,
) -> Decision {
    let scan = scan(bot, snapshot, probe);
    let strafe = scan
        .crowding
        .map_or(0.0, |friendly| avoidance_strafe(bot, friendly));

    let mut decision = match scan.target.and_then(|id| snapshot.get(id)) {
        Some(target) => engage(bot, target),
        None => follow_lane(bot, lanes),
    };
    decision.action.strafe = strafe;
    decision
}

fn engage(bot: &BotView<'_>, target: &Actor) -> Decision {
    let dist = planar_distance(bot.origin, target.origin);
    let (state, forward, attack) = if dist < bot.profile.attack_range {
        if dist < bot.profile.attack_range_min {
            (BotState::Retreat, -1.0, true)
        } else {
            (BotState::Attack, 0.0, true)
        }
    } else {
        (BotState::Engage, 1.0, false)
    };

    Decision {
        action: Action {
            forward,
            strafe: 0.0,
            attack,
            aim_direction: (target.aim_point() - bot.eye).normalize_or_zero(),
        },
        state,
        target: Some(target.id),
        goal: None,
    }
}

fn follow_lane(bot: &BotView<'_>, lanes: &LaneTopology) -> Decision {
    let segment = match lanes.closest_lane_segment(bot.origin, bot.team) {
        Ok(segment) => segment,
        Err(err) => {
            debug!(actor = bot.actor.0, %err, "no lane to follow");
            return Decision {
                action: Action::IDLE,
                state: BotState::Arrived,
                target: None,
                goal: None,
            };
        }
    };

    let on_lane = closest_point_on_line_segment(segment.start, segment.end, bot.origin);
    let goal = if on_lane.distance(bot.origin) > LANE_MARGIN {
        on_lane
    } else {
        segment.end + segment.direction() * LANE_OVERSHOOT
    };

    let to_goal = goal - bot.origin;
    let (state, action) = if to_goal.length() > ARRIVAL_DISTANCE {
        (
            BotState::SeekLane,
            Action {
                forward: 1.0,
                strafe: 0.0,
                attack: false,
                aim_direction: to_goal.normalize_or_zero(),
            },
        )
    } else {
        (BotState::Arrived, Action::IDLE)
    };

    Decision {
        action,
        state,
        target: None,
        goal: Some(goal),
    }
}
