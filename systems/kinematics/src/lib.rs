#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dual-position kinematics for motion-driven bodies.
//!
//! A [`KinematicBody`] evaluates its motion function to propose an
//! authoritative position each tick and, once the world has committed that
//! position, derives the retarded-time position an observer perceives. The
//! visual computation reads authoritative state but never writes it.

use std::time::Duration;

use glam::{Quat, Vec3};
use lightlag_core::{BodySpec, MotionFunction};

mod speed_limit;

pub use speed_limit::{Limited, SpeedLimiter, MIN_TICK_SECONDS};

/// Trajectory state of a single body.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicBody {
    spawn_time: Duration,
    spawn_position: Vec3,
    spawn_orientation: Quat,
    motion_center: Vec3,
    motion: Option<MotionFunction>,
    scale_speed: f32,
    direction: Vec3,
    previous_authoritative: Vec3,
    elapsed_lifetime: f32,
    max_lifetime: Option<f32>,
}

/// Position, local time and orientation perceived by the observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualSample {
    /// Perceived world position.
    pub position: Vec3,
    /// Local motion time the position was evaluated at.
    pub local_time: f32,
    /// Perceived orientation.
    pub orientation: Quat,
}

impl KinematicBody {
    /// Creates the trajectory state of a body spawned at world time `now`.
    ///
    /// `spec` is expected to have passed [`BodySpec::validate`].
    #[must_use]
    pub fn spawn(spec: &BodySpec, now: Duration) -> Self {
        Self {
            spawn_time: now,
            spawn_position: spec.spawn_position,
            spawn_orientation: spec.spawn_orientation.normalize(),
            motion_center: spec.spawn_position,
            motion: spec.motion,
            scale_speed: spec.scale_speed,
            direction: spec.direction,
            previous_authoritative: spec.spawn_position,
            elapsed_lifetime: 0.0,
            max_lifetime: spec.max_lifetime,
        }
    }

    /// World time the body was spawned at.
    #[must_use]
    pub const fn spawn_time(&self) -> Duration {
        self.spawn_time
    }

    /// World position the body was spawned at.
    #[must_use]
    pub const fn spawn_position(&self) -> Vec3 {
        self.spawn_position
    }

    /// Orientation applied to the motion function's output.
    #[must_use]
    pub const fn spawn_orientation(&self) -> Quat {
        self.spawn_orientation
    }

    /// Current anchor of the motion function.
    #[must_use]
    pub const fn motion_center(&self) -> Vec3 {
        self.motion_center
    }

    /// Motion function driving the body, if any.
    #[must_use]
    pub const fn motion(&self) -> Option<&MotionFunction> {
        self.motion.as_ref()
    }

    /// Authoritative position committed at the end of the last tick.
    #[must_use]
    pub const fn previous_authoritative(&self) -> Vec3 {
        self.previous_authoritative
    }

    /// Seconds the body has been alive.
    #[must_use]
    pub const fn elapsed_lifetime(&self) -> f32 {
        self.elapsed_lifetime
    }

    /// Seconds after which the body expires, if it expires at all.
    #[must_use]
    pub const fn max_lifetime(&self) -> Option<f32> {
        self.max_lifetime
    }

    /// Seconds since spawn in the motion function's own frame.
    ///
    /// The world clock stays a [`Duration`]; only the offset from spawn is
    /// narrowed to `f32`, so long runs keep tick resolution.
    #[must_use]
    pub fn local_time(&self, now: Duration) -> f32 {
        match now.checked_sub(self.spawn_time) {
            Some(elapsed) => elapsed.as_secs_f32(),
            None => -(self.spawn_time - now).as_secs_f32(),
        }
    }

    /// Whether the body's path is defined before its start.
    ///
    /// Bodies without a motion function travel a straight line that only
    /// exists forward in time.
    #[must_use]
    pub fn allows_negative_time(&self) -> bool {
        self.motion
            .as_ref()
            .map_or(false, MotionFunction::allows_negative_time)
    }

    /// World-space displacement from the motion center at the provided local time.
    #[must_use]
    pub fn displacement_at(&self, local_time: f32) -> Vec3 {
        match &self.motion {
            Some(motion) => {
                self.spawn_orientation * (motion.evaluate_position(local_time) * self.scale_speed)
            }
            None => self.direction * self.scale_speed * local_time,
        }
    }

    /// World-space orientation at the provided local time.
    #[must_use]
    pub fn orientation_at(&self, local_time: f32) -> Quat {
        match &self.motion {
            Some(motion) => self.spawn_orientation * motion.evaluate_rotation(local_time),
            None => self.spawn_orientation,
        }
    }

    /// Proposed authoritative position at world time `now`, before speed limiting and collision.
    #[must_use]
    pub fn candidate_position(&self, now: Duration) -> Vec3 {
        self.motion_center + self.displacement_at(self.local_time(now))
    }

    /// Candidate the motion function proposed one tick of `dt` seconds before `now`.
    ///
    /// Paths that do not exist before their start are evaluated no earlier
    /// than local time zero.
    #[must_use]
    pub fn prior_candidate_position(&self, now: Duration, dt: f32) -> Vec3 {
        let mut local_time = self.local_time(now) - dt;
        if !self.allows_negative_time() {
            local_time = local_time.max(0.0);
        }
        self.motion_center + self.displacement_at(local_time)
    }

    /// Records the authoritative position committed for the current tick.
    pub fn commit(&mut self, position: Vec3) {
        self.previous_authoritative = position;
    }

    /// Moves the motion function's anchor so its local frame stays continuous.
    pub fn shift_motion_center(&mut self, delta: Vec3) {
        self.motion_center += delta;
    }

    /// Accumulates lifetime and reports whether the body has now expired.
    pub fn advance_lifetime(&mut self, dt: f32) -> bool {
        self.elapsed_lifetime += dt;
        self.lifetime_expired()
    }

    /// Reports whether the body has outlived its maximum lifetime.
    #[must_use]
    pub fn lifetime_expired(&self) -> bool {
        self.max_lifetime
            .map_or(false, |max_lifetime| self.elapsed_lifetime > max_lifetime)
    }

    /// Derives what an observer perceives at world time `now`.
    ///
    /// The delay is measured from the committed authoritative position. The
    /// perceived local time never exceeds the authoritative local time, and is
    /// floored at zero for paths that do not exist before their start. Without
    /// an observer, or when `bypass` is set, the authoritative position is
    /// returned unchanged.
    #[must_use]
    pub fn visual_sample(
        &self,
        observer: Option<Vec3>,
        now: Duration,
        speed_of_light: f32,
        bypass: bool,
    ) -> VisualSample {
        let local_now = self.local_time(now);
        let observer = match observer {
            Some(observer) if !bypass => observer,
            _ => {
                return VisualSample {
                    position: self.previous_authoritative,
                    local_time: local_now,
                    orientation: self.orientation_at(local_now),
                };
            }
        };

        let distance = observer.distance(self.previous_authoritative);
        let mut local_time = (local_now - distance / speed_of_light).min(local_now);
        if !self.allows_negative_time() {
            local_time = local_time.max(0.0);
        }

        VisualSample {
            position: self.motion_center + self.displacement_at(local_time),
            local_time,
            orientation: self.orientation_at(local_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightlag_core::BodyKind;

    fn secs(seconds: f32) -> Duration {
        Duration::from_secs_f32(seconds)
    }

    fn linear_fallback(direction: Vec3, scale_speed: f32) -> BodySpec {
        BodySpec {
            kind: BodyKind::Projectile,
            motion: None,
            direction,
            scale_speed,
            ..BodySpec::default()
        }
    }

    #[test]
    fn missing_motion_falls_back_to_direction() {
        let body = KinematicBody::spawn(&linear_fallback(Vec3::X, 2.0), secs(1.0));
        assert_eq!(body.candidate_position(secs(3.0)), Vec3::new(4.0, 0.0, 0.0));
        assert!(!body.allows_negative_time());
    }

    #[test]
    fn spawn_orientation_rotates_motion_output() {
        let spec = BodySpec::projectile(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            4.0,
        );
        let body = KinematicBody::spawn(&spec, Duration::ZERO);
        let candidate = body.candidate_position(secs(0.5));
        assert!((candidate - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn lifetime_expires_strictly_after_maximum() {
        let mut spec = linear_fallback(Vec3::Z, 1.0);
        spec.max_lifetime = Some(1.0);
        let mut body = KinematicBody::spawn(&spec, Duration::ZERO);
        assert!(!body.advance_lifetime(0.5));
        assert!(!body.advance_lifetime(0.5));
        assert!(body.advance_lifetime(0.5));
    }

    #[test]
    fn missing_observer_sees_authoritative_position() {
        let mut body = KinematicBody::spawn(&linear_fallback(Vec3::Z, 1.0), Duration::ZERO);
        body.commit(Vec3::new(0.0, 0.0, 2.0));
        let sample = body.visual_sample(None, secs(2.0), 1.0, false);
        assert_eq!(sample.position, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(sample.local_time, 2.0);
    }

    #[test]
    fn bypass_ignores_observer() {
        let mut body = KinematicBody::spawn(&linear_fallback(Vec3::Z, 1.0), Duration::ZERO);
        body.commit(Vec3::new(0.0, 0.0, 2.0));
        let sample = body.visual_sample(Some(Vec3::new(0.0, 100.0, 0.0)), secs(2.0), 1.0, true);
        assert_eq!(sample.position, Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn prior_candidate_never_precedes_a_forward_only_start() {
        let body = KinematicBody::spawn(&linear_fallback(Vec3::X, 2.0), secs(1.0));
        assert_eq!(body.prior_candidate_position(secs(1.05), 0.1), Vec3::ZERO);
        let prior = body.prior_candidate_position(secs(1.5), 0.1);
        assert!((prior - Vec3::new(0.8, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn local_time_keeps_tick_resolution_after_long_runs() {
        let spawn_time = Duration::from_secs(2 * 24 * 60 * 60);
        let body = KinematicBody::spawn(&linear_fallback(Vec3::Z, 1.0), spawn_time);
        let local = body.local_time(spawn_time + Duration::from_millis(16));
        assert!((local - 0.016).abs() < 1e-6);
        assert!(body.local_time(spawn_time - Duration::from_millis(500)) < 0.0);
    }
}
