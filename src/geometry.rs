//! Line projection helpers shared by lane resolution and steering.

use bevy::math::Vec3;

/// Project `point` onto the infinite line through `start` and `end`.
///
/// The result is not clamped, so it can lie outside `[start, end]`. Steering
/// uses [`closest_point_on_line_segment`] instead; this variant is kept for
/// callers that explicitly want the unbounded projection.
#[must_use]
pub fn closest_point_on_infinite_line(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let direction = (end - start).normalize_or_zero();
    let along = (point - start).dot(direction);
    start + direction * along
}

/// Project `point` onto the segment `[start, end]`, clamping to its endpoints.
///
/// A zero-length segment returns `start`.
#[must_use]
pub fn closest_point_on_line_segment(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let line = end - start;
    let length_sq = line.length_squared();
    if length_sq <= f32::EPSILON {
        return start;
    }
    let fraction = ((point - start).dot(line) / length_sq).clamp(0.0, 1.0);
    start + line * fraction
}

/// Distance on the horizontal (XY) plane, ignoring height.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance(b.truncate())
}
