//! Camera placements the headless runner can observe the simulation from.

use glam::Vec3;
use serde::Deserialize;

/// Where the observer stands over the course of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub(crate) enum Observer {
    /// No observer: every body is seen at its authoritative position.
    #[default]
    None,
    /// Observer fixed in place.
    Static {
        /// World position of the observer.
        position: Vec3,
    },
    /// Observer circling a point in the horizontal plane.
    Orbit {
        /// Center of the orbit.
        center: Vec3,
        /// Orbit radius in world units.
        radius: f32,
        /// Angular speed in radians per second.
        angular_speed: f32,
    },
}

impl Observer {
    /// Observer position at world time `now`.
    pub(crate) fn position_at(&self, now: f32) -> Option<Vec3> {
        match *self {
            Self::None => None,
            Self::Static { position } => Some(position),
            Self::Orbit {
                center,
                radius,
                angular_speed,
            } => {
                let angle = angular_speed * now;
                Some(center + Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin()))
            }
        }
    }
}
