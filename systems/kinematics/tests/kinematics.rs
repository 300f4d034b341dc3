use std::time::Duration;

use glam::{Quat, Vec3};
use lightlag_core::{BodySpec, MotionFunction};
use lightlag_system_kinematics::{KinematicBody, SpeedLimiter};
use proptest::prelude::*;

const EPSILON: f32 = 1e-4;

fn secs(seconds: f32) -> Duration {
    Duration::from_secs_f32(seconds)
}

fn circular_patroller() -> BodySpec {
    BodySpec::patroller(
        Vec3::ZERO,
        MotionFunction::Circular {
            radius: 3.0,
            angular_speed: 1.0,
            height: 0.0,
        },
        1.0,
    )
}

fn step(body: &mut KinematicBody, limiter: Option<SpeedLimiter>, now: f32, dt: f32) -> Vec3 {
    let now = secs(now);
    let candidate = body.candidate_position(now);
    let committed = match limiter {
        Some(limiter) => {
            let prior = body.prior_candidate_position(now, dt);
            limiter
                .limit(body.previous_authoritative(), candidate, prior, dt)
                .position
        }
        None => candidate,
    };
    body.commit(committed);
    committed
}

#[test]
fn linear_displacement_is_capped_at_light_speed() {
    let mut spec = BodySpec::default();
    spec.motion = None;
    spec.direction = Vec3::Z;
    spec.scale_speed = 25.0;
    let mut body = KinematicBody::spawn(&spec, secs(0.0));
    let limiter = SpeedLimiter::new(10.0);

    let start = body.previous_authoritative();
    let naive = body.candidate_position(secs(0.1));
    assert!((naive.distance(start) - 2.5).abs() < EPSILON);

    let committed = step(&mut body, Some(limiter), 0.1, 0.1);
    assert!((committed.distance(start) - 1.0).abs() < EPSILON);
}

#[test]
fn observer_distance_delays_visual_local_time() {
    let mut body = KinematicBody::spawn(&circular_patroller(), secs(0.0));
    let now = 10.0;
    let authoritative = step(&mut body, None, now, 0.1);
    let observer = authoritative + Vec3::new(0.0, 30.0, 0.0);

    let sample = body.visual_sample(Some(observer), secs(now), 10.0, false);
    assert!((sample.local_time - 7.0).abs() < EPSILON);

    let motion = body.motion().copied().expect("circular motion");
    let expected = motion.evaluate_position(now - 3.0);
    assert!(
        (sample.position - expected).length() < EPSILON,
        "visual {:?} != {expected:?}",
        sample.position
    );
}

#[test]
fn retarded_time_may_precede_spawn_for_closed_loops() {
    let mut body = KinematicBody::spawn(&circular_patroller(), secs(0.0));
    let authoritative = step(&mut body, None, 1.0, 0.1);
    let observer = authoritative + Vec3::new(0.0, 0.0, 30.0);

    let sample = body.visual_sample(Some(observer), secs(1.0), 10.0, false);
    assert!((sample.local_time + 2.0).abs() < EPSILON);
}

#[test]
fn straight_paths_are_never_seen_before_spawn() {
    let spec = BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 1.0);
    let mut body = KinematicBody::spawn(&spec, secs(5.0));
    let authoritative = step(&mut body, None, 6.0, 0.1);
    let observer = authoritative + Vec3::new(0.0, 0.0, -50.0);

    let sample = body.visual_sample(Some(observer), secs(6.0), 10.0, false);
    assert_eq!(sample.local_time, 0.0);
    assert_eq!(sample.position, Vec3::ZERO);
}

#[test]
fn wrap_shift_keeps_velocity_continuous() {
    let spec = BodySpec::patroller(Vec3::ZERO, MotionFunction::Linear, 2.0);
    let mut body = KinematicBody::spawn(&spec, secs(0.0));
    let before = body.candidate_position(secs(1.0)) - body.candidate_position(secs(0.9));

    body.shift_motion_center(Vec3::new(0.0, 0.0, -10.0));
    let after = body.candidate_position(secs(1.0)) - body.candidate_position(secs(0.9));

    assert!((before - after).length() < EPSILON);
    assert_eq!(body.motion_center(), Vec3::new(0.0, 0.0, -10.0));
}

proptest! {
    #[test]
    fn committed_displacement_never_exceeds_light_speed(
        scale_speed in 0.0f32..40.0,
        speed_of_light in 0.5f32..50.0,
        dt in 0.001f32..0.2,
        radius in 0.1f32..5.0,
    ) {
        let spec = BodySpec::patroller(
            Vec3::ZERO,
            MotionFunction::Circular { radius, angular_speed: 2.0, height: 0.0 },
            scale_speed,
        );
        let mut body = KinematicBody::spawn(&spec, secs(0.0));
        let limiter = SpeedLimiter::new(speed_of_light);
        let mut previous = body.previous_authoritative();
        for tick in 1..=120 {
            let now = tick as f32 * dt;
            let committed = step(&mut body, Some(limiter), now, dt);
            let moved = committed.distance(previous);
            prop_assert!(moved <= speed_of_light * dt + 1e-3, "moved {moved} in {dt}s");
            previous = committed;
        }
    }

    #[test]
    fn visual_local_time_never_runs_ahead(
        ox in -100.0f32..100.0,
        oy in -100.0f32..100.0,
        oz in -100.0f32..100.0,
        now in 0.0f32..50.0,
        speed_of_light in 0.1f32..1_000.0,
    ) {
        let spec = BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 3.0);
        let mut body = KinematicBody::spawn(&spec, secs(0.0));
        let _ = step(&mut body, None, now, 0.016);

        let observer = Some(Vec3::new(ox, oy, oz));
        let sample = body.visual_sample(observer, secs(now), speed_of_light, false);
        prop_assert!(sample.local_time <= body.local_time(secs(now)));
        prop_assert!(sample.local_time >= 0.0);
    }

    #[test]
    fn visual_converges_to_authoritative_for_fast_light(
        ox in -100.0f32..100.0,
        oz in -100.0f32..100.0,
        now in 0.0f32..20.0,
    ) {
        let mut body = KinematicBody::spawn(&circular_patroller(), secs(0.0));
        let authoritative = step(&mut body, None, now, 0.016);

        let sample = body.visual_sample(Some(Vec3::new(ox, 0.0, oz)), secs(now), 1.0e9, false);
        prop_assert!((sample.position - authoritative).length() < 1e-3);
    }
}
