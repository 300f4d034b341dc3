//! Segment and swept-sphere intersection tests.

use glam::Vec3;
use lightlag_core::ColliderShape;

const PARALLEL_EPSILON: f32 = 1e-8;

/// Straight segment swept by a sphere of constant radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    /// Sphere center at the start of the tick.
    pub from: Vec3,
    /// Sphere center at the end of the tick.
    pub to: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

impl Sweep {
    /// Length of the swept segment.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Fraction of the segment at which the sphere first touches `shape`, if it does.
    ///
    /// Returns `0.0` when the sphere already overlaps the shape at the start.
    #[must_use]
    pub fn time_of_impact(&self, shape: &ColliderShape) -> Option<f32> {
        match *shape {
            ColliderShape::Sphere { center, radius } => {
                segment_sphere(self.from, self.to, center, radius + self.radius)
            }
            ColliderShape::Box {
                center,
                half_extents,
            } => segment_box(
                self.from,
                self.to,
                center - half_extents - Vec3::splat(self.radius),
                center + half_extents + Vec3::splat(self.radius),
            ),
        }
    }

    /// Fraction of the segment closest to `point` together with the distance at that fraction.
    #[must_use]
    pub fn closest_approach(&self, point: Vec3) -> (f32, f32) {
        let direction = self.to - self.from;
        let length_squared = direction.length_squared();
        let fraction = if length_squared <= PARALLEL_EPSILON {
            0.0
        } else {
            ((point - self.from).dot(direction) / length_squared).clamp(0.0, 1.0)
        };
        let closest = self.from + direction * fraction;
        (fraction, closest.distance(point))
    }
}

fn segment_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let direction = to - from;
    let offset = from - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let a = direction.length_squared();
    if a <= PARALLEL_EPSILON {
        return None;
    }
    let b = offset.dot(direction);
    if b > 0.0 {
        return None;
    }
    let discriminant = b * b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let fraction = (-b - discriminant.sqrt()) / a;
    (fraction <= 1.0).then_some(fraction.max(0.0))
}

// Expanding the box by the sphere radius is conservative near the box corners.
fn segment_box(from: Vec3, to: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let direction = to - from;
    let mut entry = 0.0f32;
    let mut exit = 1.0f32;

    for axis in 0..3 {
        let origin = from[axis];
        let delta = direction[axis];
        if delta.abs() <= PARALLEL_EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }

        let inverse = 1.0 / delta;
        let mut near = (min[axis] - origin) * inverse;
        let mut far = (max[axis] - origin) * inverse;
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        entry = entry.max(near);
        exit = exit.min(far);
        if entry > exit {
            return None;
        }
    }

    Some(entry)
}
