//! Simulation-wide propagation constants and the per-tick context threaded through systems.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PlayAreaBounds};

/// Speed of light applied when no configuration has been supplied.
pub const DEFAULT_SPEED_OF_LIGHT: f32 = 10.0;

/// Propagation constants shared by every body in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DilationDescriptor")]
pub struct DilationContext {
    speed_of_light: f32,
    subjective_time_scale: f32,
}

impl DilationContext {
    /// Creates a context, rejecting a non-positive speed of light or non-finite time scale.
    ///
    /// An infinite speed of light is accepted and disables both the speed cap
    /// and the retarded-time delay.
    pub fn new(speed_of_light: f32, subjective_time_scale: f32) -> Result<Self, ConfigError> {
        let context = Self {
            speed_of_light: validate_speed_of_light(speed_of_light)?,
            subjective_time_scale: 1.0,
        };
        context.with_subjective_time_scale(subjective_time_scale)
    }

    /// Returns a copy with a replaced speed of light.
    pub fn with_speed_of_light(self, speed_of_light: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            speed_of_light: validate_speed_of_light(speed_of_light)?,
            ..self
        })
    }

    /// Returns a copy with a replaced subjective time scale.
    pub fn with_subjective_time_scale(self, scale: f32) -> Result<Self, ConfigError> {
        if !scale.is_finite() || scale < 0.0 {
            return Err(ConfigError::InvalidTimeScale(scale));
        }
        Ok(Self {
            subjective_time_scale: scale,
            ..self
        })
    }

    /// Maximum displacement rate and signal propagation speed.
    #[must_use]
    pub const fn speed_of_light(&self) -> f32 {
        self.speed_of_light
    }

    /// Presentation-only clock multiplier. Never read by physics.
    #[must_use]
    pub const fn subjective_time_scale(&self) -> f32 {
        self.subjective_time_scale
    }
}

impl Default for DilationContext {
    fn default() -> Self {
        Self {
            speed_of_light: DEFAULT_SPEED_OF_LIGHT,
            subjective_time_scale: 1.0,
        }
    }
}

/// Unvalidated serialized form of a [`DilationContext`].
#[derive(Deserialize)]
struct DilationDescriptor {
    speed_of_light: f32,
    subjective_time_scale: f32,
}

impl TryFrom<DilationDescriptor> for DilationContext {
    type Error = ConfigError;

    fn try_from(descriptor: DilationDescriptor) -> Result<Self, Self::Error> {
        Self::new(descriptor.speed_of_light, descriptor.subjective_time_scale)
    }
}

fn validate_speed_of_light(speed_of_light: f32) -> Result<f32, ConfigError> {
    if speed_of_light.is_nan() || speed_of_light <= 0.0 {
        return Err(ConfigError::NonPositiveSpeedOfLight(speed_of_light));
    }
    Ok(speed_of_light)
}

/// Immutable snapshot of the simulation state every body reads during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// Propagation constants in force for the tick.
    pub dilation: DilationContext,
    /// Play area in force for the tick.
    pub bounds: PlayAreaBounds,
    /// World clock at the end of the tick.
    pub now: Duration,
    /// Length of the tick in seconds.
    pub dt: f32,
}

/// Supplies the observer position that retarded-time visuals are computed against.
pub trait ObserverProvider {
    /// Current observer position, or `None` when no observer exists yet.
    fn current_observer_position(&self) -> Option<Vec3>;
}

impl ObserverProvider for Vec3 {
    fn current_observer_position(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl ObserverProvider for Option<Vec3> {
    fn current_observer_position(&self) -> Option<Vec3> {
        *self
    }
}
