//! Creation-time configuration for bodies and colliders.

use std::{
    ops::{BitAnd, BitOr},
    time::Duration,
};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MotionFunction;

/// Lifetime assigned to projectiles created through [`BodySpec::projectile`], in seconds.
pub const DEFAULT_PROJECTILE_LIFETIME: f32 = 8.0;

/// Collision radius assigned when a body does not provide one.
pub const DEFAULT_COLLISION_RADIUS: f32 = 0.25;

/// Radius used by visual-target detection when the observed body has no volume.
pub const DEFAULT_VISUAL_HIT_RADIUS: f32 = 0.5;

/// Reasons a configuration value is rejected at creation time.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The speed of light must be strictly positive.
    #[error("speed of light must be positive, got {0}")]
    NonPositiveSpeedOfLight(f32),
    /// The subjective time scale must be finite and non-negative.
    #[error("subjective time scale must be finite and non-negative, got {0}")]
    InvalidTimeScale(f32),
    /// A vector or scalar field contained NaN or infinity.
    #[error("{0} contains a non-finite value")]
    NonFinite(&'static str),
    /// Play area half-extents must be non-negative on every axis.
    #[error("play area half-extents must be non-negative, got ({x}, {y}, {z})")]
    NegativeHalfExtents {
        /// Half-extent along the x axis.
        x: f32,
        /// Half-extent along the y axis.
        y: f32,
        /// Half-extent along the z axis.
        z: f32,
    },
    /// Collision and collider radii must be non-negative.
    #[error("radius must be non-negative, got {0}")]
    NegativeRadius(f32),
    /// A maximum lifetime must be strictly positive.
    #[error("maximum lifetime must be positive, got {0}")]
    NonPositiveLifetime(f32),
    /// A hit point pool must hold at least one point.
    #[error("hit points must be at least one")]
    ZeroHitPoints,
    /// Emitters must wait a minimum interval between shots.
    #[error("emitter interval must be at least {minimum:?}, got {interval:?}")]
    EmitterIntervalTooShort {
        /// Requested interval.
        interval: Duration,
        /// Shortest accepted interval.
        minimum: Duration,
    },
}

/// Bit set of collision layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(u32);

impl LayerMask {
    /// Mask that matches nothing.
    pub const NONE: Self = Self(0);
    /// Static level geometry.
    pub const ENVIRONMENT: Self = Self(1 << 0);
    /// Dedicated layer for things projectiles are meant to hit.
    pub const TARGETS: Self = Self(1 << 1);
    /// Bodies driven by the motion system.
    pub const BODIES: Self = Self(1 << 2);
    /// Mask that matches every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits of the mask.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Reports whether the two masks share at least one layer.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for LayerMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Lifecycle category of a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Short-lived body that is destroyed when it leaves the play area.
    #[default]
    Projectile,
    /// Body under continuous patrol motion that wraps around the play area.
    Patroller,
}

impl BodyKind {
    /// Containment policy applied when no explicit policy is configured.
    #[must_use]
    pub const fn default_bounds_policy(self) -> BoundsPolicy {
        match self {
            Self::Projectile => BoundsPolicy::Destroy,
            Self::Patroller => BoundsPolicy::Wrap,
        }
    }
}

/// Reaction to a committed position outside the play area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Toroidal remap with a compensating motion-center shift.
    Wrap,
    /// Terminate the body.
    Destroy,
    /// Pin the position to the nearest point inside the box.
    Clamp,
}

/// Rules that classify what a body's swept volume hits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Dedicated target layers; `None` falls back to a generic sweep reclassified by tag or marker.
    pub target_layers: Option<LayerMask>,
    /// Tag that marks a collider as a target.
    pub target_tag: Option<String>,
    /// Layers swept by the environment pass. Trigger volumes are always ignored there.
    pub environment_layers: LayerMask,
    /// Whether other motion-driven bodies count as targets without explicit tagging.
    pub moving_bodies_are_targets: bool,
    /// Radius used by visual-target detection for bodies without a collision volume.
    pub visual_hit_radius: f32,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        Self {
            target_layers: None,
            target_tag: None,
            environment_layers: LayerMask::ALL,
            moving_bodies_are_targets: true,
            visual_hit_radius: DEFAULT_VISUAL_HIT_RADIUS,
        }
    }
}

/// Everything required to spawn a body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySpec {
    /// Lifecycle category of the body.
    pub kind: BodyKind,
    /// World position the motion is anchored at.
    pub spawn_position: Vec3,
    /// Orientation applied to the motion function's unit-space output.
    pub spawn_orientation: Quat,
    /// Path shape; `None` falls back to straight travel along `direction`.
    pub motion: Option<MotionFunction>,
    /// World units per unit-space unit per second.
    pub scale_speed: f32,
    /// Travel direction used only when no motion function is set.
    pub direction: Vec3,
    /// Seconds after which the body expires; `None` lives forever.
    pub max_lifetime: Option<f32>,
    /// Conservative radius of the swept sphere and of the body's own collider.
    pub collision_radius: f32,
    /// Hits absorbed before destruction; `None` means any hit destroys the body.
    pub hit_points: Option<u32>,
    /// Layers the body's own collider occupies.
    pub layers: LayerMask,
    /// Tag carried by the body's own collider.
    pub tag: Option<String>,
    /// Classification rules applied to what this body hits.
    pub collision: CollisionSettings,
    /// Clamp per-tick displacement to the speed of light.
    pub enforce_speed_limit: bool,
    /// Replace the physical target sweep with a test against observed positions.
    pub detect_hits_against_visuals: bool,
    /// Publish the authoritative position as the visual position.
    pub bypass_retarded_time_for_visual: bool,
    /// Containment policy; `None` uses the default for the body kind.
    pub bounds_policy: Option<BoundsPolicy>,
}

impl Default for BodySpec {
    fn default() -> Self {
        Self {
            kind: BodyKind::Projectile,
            spawn_position: Vec3::ZERO,
            spawn_orientation: Quat::IDENTITY,
            motion: None,
            scale_speed: 1.0,
            direction: Vec3::Z,
            max_lifetime: None,
            collision_radius: DEFAULT_COLLISION_RADIUS,
            hit_points: None,
            layers: LayerMask::BODIES,
            tag: None,
            collision: CollisionSettings::default(),
            enforce_speed_limit: true,
            detect_hits_against_visuals: false,
            bypass_retarded_time_for_visual: false,
            bounds_policy: None,
        }
    }
}

impl BodySpec {
    /// Projectile travelling along the orientation's forward axis.
    #[must_use]
    pub fn projectile(position: Vec3, orientation: Quat, scale_speed: f32) -> Self {
        Self {
            kind: BodyKind::Projectile,
            spawn_position: position,
            spawn_orientation: orientation,
            motion: Some(MotionFunction::Linear),
            scale_speed,
            max_lifetime: Some(DEFAULT_PROJECTILE_LIFETIME),
            ..Self::default()
        }
    }

    /// Patrolling body following the provided motion indefinitely.
    #[must_use]
    pub fn patroller(position: Vec3, motion: MotionFunction, scale_speed: f32) -> Self {
        Self {
            kind: BodyKind::Patroller,
            spawn_position: position,
            motion: Some(motion),
            scale_speed,
            ..Self::default()
        }
    }

    /// Containment policy in force for the body.
    #[must_use]
    pub fn effective_bounds_policy(&self) -> BoundsPolicy {
        self.bounds_policy
            .unwrap_or_else(|| self.kind.default_bounds_policy())
    }

    /// Checks every field for values that would corrupt per-tick math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.spawn_position.is_finite() {
            return Err(ConfigError::NonFinite("spawn position"));
        }
        if !self.spawn_orientation.is_finite() || self.spawn_orientation.length_squared() == 0.0 {
            return Err(ConfigError::NonFinite("spawn orientation"));
        }
        if !self.scale_speed.is_finite() {
            return Err(ConfigError::NonFinite("scale speed"));
        }
        if !self.direction.is_finite() {
            return Err(ConfigError::NonFinite("direction"));
        }
        if let Some(motion) = &self.motion {
            if !motion.is_finite() {
                return Err(ConfigError::NonFinite("motion function"));
            }
        }
        if let Some(lifetime) = self.max_lifetime {
            if lifetime.is_nan() || lifetime <= 0.0 {
                return Err(ConfigError::NonPositiveLifetime(lifetime));
            }
        }
        validate_radius(self.collision_radius)?;
        validate_radius(self.collision.visual_hit_radius)?;
        if self.hit_points == Some(0) {
            return Err(ConfigError::ZeroHitPoints);
        }
        Ok(())
    }
}

/// Geometry of a static collider.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderShape {
    /// Sphere around a center point.
    Sphere {
        /// Center of the sphere.
        center: Vec3,
        /// Radius of the sphere.
        radius: f32,
    },
    /// Axis-aligned box.
    Box {
        /// Center of the box.
        center: Vec3,
        /// Half-extents of the box along each axis.
        half_extents: Vec3,
    },
}

impl ColliderShape {
    /// Center point of the shape.
    #[must_use]
    pub const fn center(&self) -> Vec3 {
        match self {
            Self::Sphere { center, .. } | Self::Box { center, .. } => *center,
        }
    }
}

/// Everything required to place a static collider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColliderSpec {
    /// Geometry of the collider.
    #[serde(flatten)]
    pub shape: ColliderShape,
    /// Layers the collider occupies.
    #[serde(default = "environment_layer")]
    pub layers: LayerMask,
    /// Optional classification tag.
    #[serde(default)]
    pub tag: Option<String>,
    /// Trigger volumes are invisible to the environment pass.
    #[serde(default)]
    pub is_trigger: bool,
    /// Hits absorbed before destruction when hit as a target.
    #[serde(default)]
    pub hit_points: Option<u32>,
}

impl ColliderSpec {
    /// Solid environment collider with the provided shape.
    #[must_use]
    pub const fn solid(shape: ColliderShape) -> Self {
        Self {
            shape,
            layers: LayerMask::ENVIRONMENT,
            tag: None,
            is_trigger: false,
            hit_points: None,
        }
    }

    /// Checks the geometry for values that would corrupt sweep math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.shape {
            ColliderShape::Sphere { center, radius } => {
                if !center.is_finite() || !radius.is_finite() {
                    return Err(ConfigError::NonFinite("collider"));
                }
                validate_radius(radius)?;
            }
            ColliderShape::Box {
                center,
                half_extents,
            } => {
                if !center.is_finite() || !half_extents.is_finite() {
                    return Err(ConfigError::NonFinite("collider"));
                }
                if half_extents.min_element() < 0.0 {
                    return Err(ConfigError::NegativeHalfExtents {
                        x: half_extents.x,
                        y: half_extents.y,
                        z: half_extents.z,
                    });
                }
            }
        }
        if self.hit_points == Some(0) {
            return Err(ConfigError::ZeroHitPoints);
        }
        Ok(())
    }
}

fn environment_layer() -> LayerMask {
    LayerMask::ENVIRONMENT
}

fn validate_radius(radius: f32) -> Result<(), ConfigError> {
    if !radius.is_finite() {
        return Err(ConfigError::NonFinite("radius"));
    }
    if radius < 0.0 {
        return Err(ConfigError::NegativeRadius(radius));
    }
    Ok(())
}
