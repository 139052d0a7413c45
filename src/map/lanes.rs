//! Lane topology: ordered waypoint chains and nearest-segment resolution.

use std::collections::BTreeMap;

use bevy::math::Vec3;
use thiserror::Error;

use crate::snapshot::Team;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("map has no lane nodes")]
    Empty,
    #[error("lane {0} has no nodes")]
    EmptyLane(u32),
    #[error("lane {lane} has duplicate node index {index}")]
    DuplicateIndex { lane: u32, index: usize },
    #[error("lane {lane} skips node index {expected} (next index is {found})")]
    IndexGap {
        lane: u32,
        expected: usize,
        found: usize,
    },
}

/// A waypoint as authored in the map: lane id, position in the lane, origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneNode {
    pub lane: u32,
    pub index: usize,
    pub origin: Vec3,
}

/// One lane. `nodes[i]` is the node with sequence index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub id: u32,
    pub nodes: Vec<Vec3>,
}

/// The oriented piece of lane a bot should walk along: from `start` toward
/// `end` is progress toward the enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSegment {
    pub lane: u32,
    pub start: Vec3,
    pub end: Vec3,
}

impl LaneSegment {
    /// Unit direction of travel, or zero for a single-node lane.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }
}

/// All lanes of the current map. Immutable until the next map load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneTopology {
    lanes: Vec<Lane>,
}

impl LaneTopology {
    pub const EMPTY: Self = Self { lanes: Vec::new() };

    /// Group nodes into lanes, ordered by lane id then node index.
    ///
    /// Each lane's indices must run densely from zero.
    pub fn from_nodes(nodes: impl IntoIterator<Item = LaneNode>) -> Result<Self, TopologyError> {
        let mut grouped: BTreeMap<u32, Vec<LaneNode>> = BTreeMap::new();
        for node in nodes {
            grouped.entry(node.lane).or_default().push(node);
        }

        let mut lanes = Vec::with_capacity(grouped.len());
        for (id, mut nodes) in grouped {
            nodes.sort_by_key(|node| node.index);
            for (expected, node) in nodes.iter().enumerate() {
                if node.index < expected {
                    return Err(TopologyError::DuplicateIndex {
                        lane: id,
                        index: node.index,
                    });
                }
                if node.index > expected {
                    return Err(TopologyError::IndexGap {
                        lane: id,
                        expected,
                        found: node.index,
                    });
                }
            }
            lanes.push(Lane {
                id,
                nodes: nodes.into_iter().map(|node| node.origin).collect(),
            });
        }
        Ok(Self { lanes })
    }

    #[must_use]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    #[must_use]
    pub fn lane(&self, id: u32) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|lane| lane.nodes.is_empty())
    }

    /// Find the lane segment `team` should follow from `position`.
    ///
    /// The nearest node across all lanes is one endpoint. The other endpoint is
    /// its neighbor on the side `position` lies on, and the segment is oriented
    /// so the node further along `team`'s advance direction is `end`. A lane
    /// with a single node yields a zero-length segment at that node.
    pub fn closest_lane_segment(&self, position: Vec3, team: Team) -> Result<LaneSegment, TopologyError> {
        let mut closest: Option<(&Lane, usize, f32)> = None;
        for lane in &self.lanes {
            for (index, node) in lane.nodes.iter().enumerate() {
                let dist = position.distance(*node);
                if closest.is_none_or(|(_, _, best)| dist < best) {
                    closest = Some((lane, index, dist));
                }
            }
        }
        let (lane, index, _) = closest.ok_or(TopologyError::Empty)?;
        let closest_pos = lane.nodes[index];

        let advance = team.lane_advance();
        let neighbor = |offset: i64| {
            let i = i64::try_from(index).ok()? + offset;
            let i = usize::try_from(i).ok()?;
            lane.nodes.get(i).map(|pos| (i, *pos))
        };
        let next = neighbor(advance);
        let prev = neighbor(-advance);

        let second = match (next, prev) {
            (None, None) => {
                return Ok(LaneSegment {
                    lane: lane.id,
                    start: closest_pos,
                    end: closest_pos,
                });
            }
            (None, Some(prev)) => prev,
            (Some(next), None) => next,
            (Some(next), Some(prev)) => {
                let dir_next = next.1 - closest_pos;
                let dir_to_closest = closest_pos - position;
                // Negative: position lies between the closest node and next.
                if dir_next.dot(dir_to_closest) < 0.0 {
                    next
                } else {
                    prev
                }
            }
        };

        let closest_is_ahead = if advance > 0 {
            index > second.0
        } else {
            index < second.0
        };
        let (start, end) = if closest_is_ahead {
            (second.1, closest_pos)
        } else {
            (closest_pos, second.1)
        };
        Ok(LaneSegment {
            lane: lane.id,
            start,
            end,
        })
    }
}
