//! Parametric motion paths evaluated in unit space.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pure parametric path generator producing unit-space displacement over local time.
///
/// Evaluation is stateless, so a single value may drive any number of bodies.
/// The displacement is dimensionless: bodies scale it by their own speed and
/// rotate it by their spawn orientation before applying it to the world.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionFunction {
    /// Straight travel along the local forward axis: `t ↦ (0, 0, t)`.
    Linear,
    /// Orbit around the local vertical axis: `t ↦ (r·cos(ωt), h, r·sin(ωt))`.
    Circular {
        /// Radius of the orbit in unit space.
        radius: f32,
        /// Angular speed in radians per second of local time.
        angular_speed: f32,
        /// Constant vertical offset of the orbit plane.
        #[serde(default)]
        height: f32,
    },
    /// Forward travel with a lateral sine weave: `t ↦ (A·sin(2πft), 0, t)`.
    Weave {
        /// Lateral amplitude in unit space.
        amplitude: f32,
        /// Weave frequency in cycles per second of local time.
        frequency: f32,
    },
    /// Closed patrol loop with an independent sine per axis.
    Lissajous {
        /// Per-axis amplitude in unit space.
        amplitude: Vec3,
        /// Per-axis frequency in cycles per second of local time.
        frequency: Vec3,
    },
}

impl MotionFunction {
    /// Evaluates the unit-space displacement at local time `t`.
    #[must_use]
    pub fn evaluate_position(&self, t: f32) -> Vec3 {
        match *self {
            Self::Linear => Vec3::new(0.0, 0.0, t),
            Self::Circular {
                radius,
                angular_speed,
                height,
            } => {
                let angle = angular_speed * t;
                Vec3::new(radius * angle.cos(), height, radius * angle.sin())
            }
            Self::Weave {
                amplitude,
                frequency,
            } => Vec3::new(amplitude * (TAU * frequency * t).sin(), 0.0, t),
            Self::Lissajous {
                amplitude,
                frequency,
            } => Vec3::new(
                amplitude.x * (TAU * frequency.x * t).sin(),
                amplitude.y * (TAU * frequency.y * t).sin(),
                amplitude.z * (TAU * frequency.z * t).sin(),
            ),
        }
    }

    /// Evaluates the unit-space orientation at local time `t`.
    ///
    /// Closed loops face along their direction of travel; straight paths keep
    /// the identity orientation.
    #[must_use]
    pub fn evaluate_rotation(&self, t: f32) -> Quat {
        match *self {
            Self::Linear | Self::Weave { .. } => Quat::IDENTITY,
            Self::Circular {
                radius,
                angular_speed,
                ..
            } => {
                let angle = angular_speed * t;
                let tangent = Vec3::new(
                    -radius * angular_speed * angle.sin(),
                    0.0,
                    radius * angular_speed * angle.cos(),
                );
                facing(tangent)
            }
            Self::Lissajous {
                amplitude,
                frequency,
            } => {
                let omega = frequency * TAU;
                let tangent = Vec3::new(
                    amplitude.x * omega.x * (omega.x * t).cos(),
                    amplitude.y * omega.y * (omega.y * t).cos(),
                    amplitude.z * omega.z * (omega.z * t).cos(),
                );
                facing(tangent)
            }
        }
    }

    /// Reports whether the path is defined for local times before its start.
    #[must_use]
    pub const fn allows_negative_time(&self) -> bool {
        match self {
            Self::Linear | Self::Weave { .. } => false,
            Self::Circular { .. } | Self::Lissajous { .. } => true,
        }
    }

    /// Reports whether every parameter of the path is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Linear => true,
            Self::Circular {
                radius,
                angular_speed,
                height,
            } => radius.is_finite() && angular_speed.is_finite() && height.is_finite(),
            Self::Weave {
                amplitude,
                frequency,
            } => amplitude.is_finite() && frequency.is_finite(),
            Self::Lissajous {
                amplitude,
                frequency,
            } => amplitude.is_finite() && frequency.is_finite(),
        }
    }
}

fn facing(tangent: Vec3) -> Quat {
    tangent
        .try_normalize()
        .map_or(Quat::IDENTITY, |forward| Quat::from_rotation_arc(Vec3::Z, forward))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn linear_advances_along_forward_axis() {
        let motion = MotionFunction::Linear;
        assert_eq!(motion.evaluate_position(0.0), Vec3::ZERO);
        assert_eq!(motion.evaluate_position(2.5), Vec3::new(0.0, 0.0, 2.5));
        assert!(!motion.allows_negative_time());
        assert_eq!(motion.evaluate_rotation(3.0), Quat::IDENTITY);
    }

    #[test]
    fn circular_follows_parametric_orbit() {
        let motion = MotionFunction::Circular {
            radius: 3.0,
            angular_speed: 1.0,
            height: 0.5,
        };
        let quarter = std::f32::consts::FRAC_PI_2;
        let start = motion.evaluate_position(0.0);
        let later = motion.evaluate_position(quarter);

        assert!((start - Vec3::new(3.0, 0.5, 0.0)).length() < EPSILON);
        assert!((later - Vec3::new(0.0, 0.5, 3.0)).length() < EPSILON);
        assert!(motion.allows_negative_time());
    }

    #[test]
    fn circular_orientation_faces_tangent() {
        let motion = MotionFunction::Circular {
            radius: 2.0,
            angular_speed: 1.0,
            height: 0.0,
        };
        let forward = motion.evaluate_rotation(0.0) * Vec3::Z;
        assert!((forward - Vec3::Z).length() < EPSILON);

        let forward = motion.evaluate_rotation(std::f32::consts::FRAC_PI_2) * Vec3::Z;
        assert!((forward - Vec3::NEG_X).length() < EPSILON);
    }

    #[test]
    fn degenerate_orbit_keeps_identity_orientation() {
        let motion = MotionFunction::Circular {
            radius: 0.0,
            angular_speed: 1.0,
            height: 0.0,
        };
        assert_eq!(motion.evaluate_rotation(1.0), Quat::IDENTITY);
    }

    #[test]
    fn weave_oscillates_laterally_while_advancing() {
        let motion = MotionFunction::Weave {
            amplitude: 0.5,
            frequency: 1.0,
        };
        let quarter_cycle = motion.evaluate_position(0.25);
        assert!((quarter_cycle - Vec3::new(0.5, 0.0, 0.25)).length() < EPSILON);
        assert!(!motion.allows_negative_time());
    }

    #[test]
    fn lissajous_starts_at_origin_and_stays_within_amplitude() {
        let motion = MotionFunction::Lissajous {
            amplitude: Vec3::new(4.0, 1.0, 2.0),
            frequency: Vec3::new(0.1, 0.2, 0.3),
        };
        assert!(motion.evaluate_position(0.0).length() < EPSILON);
        for step in 0..100 {
            let position = motion.evaluate_position(step as f32 * 0.37);
            assert!(position.x.abs() <= 4.0 + EPSILON);
            assert!(position.y.abs() <= 1.0 + EPSILON);
            assert!(position.z.abs() <= 2.0 + EPSILON);
        }
    }

    #[test]
    fn non_finite_parameters_are_detected() {
        let motion = MotionFunction::Weave {
            amplitude: f32::NAN,
            frequency: 1.0,
        };
        assert!(!motion.is_finite());
        assert!(MotionFunction::Linear.is_finite());
    }
}
