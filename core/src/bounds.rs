//! Axis-aligned play area with containment and toroidal wrap queries.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Axis-aligned volume that contains the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlayAreaDescriptor", into = "PlayAreaDescriptor")]
pub struct PlayAreaBounds {
    center: Vec3,
    half_extents: Vec3,
}

impl PlayAreaBounds {
    /// Creates bounds from a center and half-extents, rejecting negative or non-finite extents.
    pub fn new(center: Vec3, half_extents: Vec3) -> Result<Self, ConfigError> {
        if !center.is_finite() || !half_extents.is_finite() {
            return Err(ConfigError::NonFinite("play area"));
        }
        if half_extents.min_element() < 0.0 {
            return Err(ConfigError::NegativeHalfExtents {
                x: half_extents.x,
                y: half_extents.y,
                z: half_extents.z,
            });
        }
        Ok(Self {
            center,
            half_extents,
        })
    }

    /// Creates bounds from a center and full edge lengths.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Result<Self, ConfigError> {
        Self::new(center, size * 0.5)
    }

    /// Center of the box.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        self.center
    }

    /// Half-extents of the box along each axis.
    #[must_use]
    pub const fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Full edge lengths of the box.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// Lowest corner of the box.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    /// Highest corner of the box.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Reports whether the point lies inside the box, boundary included.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let offset = (point - self.center).abs();
        offset.cmple(self.half_extents).all()
    }

    /// Remaps the point into the box with per-axis modulo arithmetic.
    ///
    /// Axes with zero extent collapse onto the center.
    #[must_use]
    pub fn wrap(&self, point: Vec3) -> Vec3 {
        let min = self.min();
        let size = self.size();
        Vec3::new(
            wrap_axis(point.x, min.x, size.x, self.center.x),
            wrap_axis(point.y, min.y, size.y, self.center.y),
            wrap_axis(point.z, min.z, size.z, self.center.z),
        )
    }

    /// Pins the point to the nearest location inside the box.
    #[must_use]
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min(), self.max())
    }
}

impl Default for PlayAreaBounds {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::splat(DEFAULT_HALF_EXTENT),
        }
    }
}

const DEFAULT_HALF_EXTENT: f32 = 50.0;

fn wrap_axis(value: f32, min: f32, size: f32, center: f32) -> f32 {
    if size <= 0.0 {
        return center;
    }
    min + (value - min).rem_euclid(size)
}

/// Serialized form of the play area expressed as center and edge lengths.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct PlayAreaDescriptor {
    #[serde(default)]
    center: Vec3,
    size: Vec3,
}

impl TryFrom<PlayAreaDescriptor> for PlayAreaBounds {
    type Error = ConfigError;

    fn try_from(descriptor: PlayAreaDescriptor) -> Result<Self, Self::Error> {
        Self::from_center_size(descriptor.center, descriptor.size)
    }
}

impl From<PlayAreaBounds> for PlayAreaDescriptor {
    fn from(bounds: PlayAreaBounds) -> Self {
        Self {
            center: bounds.center,
            size: bounds.size(),
        }
    }
}
