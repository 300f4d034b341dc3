use std::{cell::Cell, f32::consts::FRAC_PI_2, time::Duration};

use glam::{Quat, Vec3};
use lightlag_core::{
    BodyId, BodySpec, ColliderRef, ColliderShape, ColliderSpec, Command, DestroyReason, Event,
    HitPoints, LayerMask, MotionFunction, ObserverProvider, PlayAreaBounds,
};
use lightlag_world::{apply, query, tick, World};
use proptest::prelude::*;

const EPSILON: f32 = 1e-4;

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(world, command, &mut events);
    events
}

fn spawn(world: &mut World, spec: BodySpec) -> BodyId {
    let events = run(world, Command::SpawnBody { spec });
    match events.as_slice() {
        [Event::BodySpawned { body, .. }] => *body,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn step(world: &mut World, seconds: f32, observer: Option<Vec3>) -> Vec<Event> {
    run(
        world,
        Command::Tick {
            dt: Duration::from_secs_f32(seconds),
            observer,
        },
    )
}

fn destroyed(events: &[Event], body: BodyId) -> Option<DestroyReason> {
    events.iter().find_map(|event| match event {
        Event::BodyDestroyed {
            body: destroyed,
            reason,
            ..
        } if *destroyed == body => Some(*reason),
        _ => None,
    })
}

fn stationary_target(position: Vec3, hit_points: u32) -> BodySpec {
    let mut spec = BodySpec::patroller(position, MotionFunction::Linear, 0.0);
    spec.collision_radius = 0.5;
    spec.hit_points = Some(hit_points);
    spec
}

#[test]
fn projectile_expires_on_the_tick_lifetime_is_exceeded() {
    let mut world = World::new();
    let projectile = spawn(
        &mut world,
        BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 1.0),
    );

    for _ in 0..16 {
        let events = step(&mut world, 0.5, None);
        assert_eq!(destroyed(&events, projectile), None);
    }
    let snapshot = query::body(&world, projectile).expect("alive at exactly eight seconds");
    assert_eq!(snapshot.elapsed_lifetime, 8.0);

    let events = step(&mut world, 0.5, None);
    assert_eq!(
        destroyed(&events, projectile),
        Some(DestroyReason::LifetimeExpired)
    );
    assert!(query::body(&world, projectile).is_none());
}

#[test]
fn patroller_wraps_to_the_opposite_face() {
    let mut world = World::new();
    let bounds = PlayAreaBounds::from_center_size(Vec3::ZERO, Vec3::splat(10.0))
        .expect("valid bounds");
    let _ = run(&mut world, Command::ConfigurePlayArea { bounds });

    let mut spec = BodySpec::patroller(Vec3::new(5.5, 0.0, 0.0), MotionFunction::Linear, 5.0);
    spec.spawn_orientation = Quat::from_rotation_y(FRAC_PI_2);
    let patroller = spawn(&mut world, spec);

    let events = step(&mut world, 0.1, None);
    let delta = events
        .iter()
        .find_map(|event| match event {
            Event::BodyWrapped { body, delta } if *body == patroller => Some(*delta),
            _ => None,
        })
        .expect("body crossed x = 5");
    assert!((delta - Vec3::new(-10.0, 0.0, 0.0)).length() < EPSILON);

    let snapshot = query::body(&world, patroller).expect("wrapping keeps the body alive");
    assert!((snapshot.authoritative.x + 4.0).abs() < EPSILON);
    assert!((snapshot.motion_center.x + 4.5).abs() < EPSILON);

    let before = snapshot.authoritative;
    let _ = step(&mut world, 0.1, None);
    let after = query::body(&world, patroller)
        .expect("still alive")
        .authoritative;
    assert!(((after - before) - Vec3::new(0.5, 0.0, 0.0)).length() < EPSILON);
}

#[test]
fn projectile_leaving_the_play_area_is_destroyed() {
    let mut world = World::new();
    let projectile = spawn(
        &mut world,
        BodySpec::projectile(Vec3::new(0.0, 0.0, 49.0), Quat::IDENTITY, 5.0),
    );

    let events = step(&mut world, 0.5, None);
    assert_eq!(
        destroyed(&events, projectile),
        Some(DestroyReason::LeftPlayArea)
    );
}

#[test]
fn projectile_wears_down_a_patroller() {
    let mut world = World::new();
    let target = spawn(&mut world, stationary_target(Vec3::new(0.0, 0.0, 5.0), 2));

    let first = spawn(
        &mut world,
        BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 8.0),
    );
    let events = step(&mut world, 1.0, None);
    assert!(events.contains(&Event::TargetHit {
        body: first,
        target: ColliderRef::Body(target),
        destroyed: false,
    }));
    assert_eq!(destroyed(&events, first), Some(DestroyReason::HitTarget));
    assert_eq!(
        query::body(&world, target).and_then(|body| body.hit_points),
        Some(HitPoints::new(1))
    );

    let second = spawn(
        &mut world,
        BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 8.0),
    );
    let events = step(&mut world, 1.0, None);
    assert!(events.contains(&Event::TargetHit {
        body: second,
        target: ColliderRef::Body(target),
        destroyed: true,
    }));
    assert_eq!(destroyed(&events, target), Some(DestroyReason::Struck));
    assert!(query::body_view(&world).is_empty());
}

#[test]
fn walls_stop_projectiles_without_tunnelling() {
    let mut world = World::new();
    let _ = run(
        &mut world,
        Command::PlaceCollider {
            spec: ColliderSpec::solid(ColliderShape::Box {
                center: Vec3::new(0.0, 0.0, 3.0),
                half_extents: Vec3::new(5.0, 5.0, 0.01),
            }),
        },
    );
    let projectile = spawn(
        &mut world,
        BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 9.0),
    );

    let events = step(&mut world, 1.0, None);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnvironmentHit { body, .. } if *body == projectile)));
    assert_eq!(
        destroyed(&events, projectile),
        Some(DestroyReason::HitEnvironment)
    );
}

#[test]
fn destructible_static_target_is_removed_on_its_last_hit() {
    let mut world = World::new();
    let events = run(
        &mut world,
        Command::PlaceCollider {
            spec: ColliderSpec {
                layers: LayerMask::TARGETS,
                hit_points: Some(1),
                ..ColliderSpec::solid(ColliderShape::Sphere {
                    center: Vec3::new(0.0, 0.0, 4.0),
                    radius: 1.0,
                })
            },
        },
    );
    let [Event::ColliderPlaced { collider }] = events.as_slice() else {
        panic!("unexpected events: {events:?}");
    };
    let collider = *collider;

    let mut spec = BodySpec::projectile(Vec3::ZERO, Quat::IDENTITY, 8.0);
    spec.collision.target_layers = Some(LayerMask::TARGETS);
    let projectile = spawn(&mut world, spec);

    let events = step(&mut world, 1.0, None);
    assert!(events.contains(&Event::TargetHit {
        body: projectile,
        target: ColliderRef::Static(collider),
        destroyed: true,
    }));
    assert!(events.contains(&Event::ColliderRemoved { collider }));
    assert!(query::colliders(&world).is_empty());
}

#[test]
fn visuals_match_authoritative_without_an_observer() {
    let mut world = World::new();
    let _ = spawn(
        &mut world,
        BodySpec::patroller(
            Vec3::ZERO,
            MotionFunction::Circular {
                radius: 3.0,
                angular_speed: 1.0,
                height: 0.0,
            },
            1.0,
        ),
    );

    for _ in 0..10 {
        for event in step(&mut world, 0.1, None) {
            if let Event::BodyAdvanced {
                authoritative,
                visual,
                ..
            } = event
            {
                assert_eq!(authoritative, visual);
            }
        }
    }
}

#[test]
fn distant_observer_sees_the_past() {
    let mut world = World::new();
    let patroller = spawn(
        &mut world,
        BodySpec::patroller(
            Vec3::ZERO,
            MotionFunction::Circular {
                radius: 3.0,
                angular_speed: 1.0,
                height: 0.0,
            },
            1.0,
        ),
    );

    let observer = Some(Vec3::new(0.0, 30.0, 0.0));
    for _ in 0..100 {
        let _ = step(&mut world, 0.1, observer);
    }
    let snapshot = query::body(&world, patroller).expect("patrollers persist");
    let lag = query::now(&world) - snapshot.visual_local_time;
    let expected = snapshot.authoritative.distance(Vec3::new(0.0, 30.0, 0.0)) / 10.0;
    assert!((lag - expected).abs() < 1e-3, "lag {lag} != {expected}");
}

#[test]
fn observer_is_polled_once_per_surviving_body() {
    struct CountingObserver(Cell<u32>);

    impl ObserverProvider for CountingObserver {
        fn current_observer_position(&self) -> Option<Vec3> {
            self.0.set(self.0.get() + 1);
            Some(Vec3::ZERO)
        }
    }

    let mut world = World::new();
    for offset in 0..3 {
        let _ = spawn(
            &mut world,
            BodySpec::patroller(Vec3::splat(offset as f32), MotionFunction::Linear, 0.0),
        );
    }
    let _ = spawn(
        &mut world,
        BodySpec::projectile(Vec3::new(0.0, 0.0, 49.9), Quat::IDENTITY, 5.0),
    );

    let observer = CountingObserver(Cell::new(0));
    let mut events = Vec::new();
    tick(&mut world, Duration::from_millis(100), &observer, &mut events);
    assert_eq!(observer.0.get(), 3);
}

#[test]
fn identical_scripts_replay_identically() {
    fn script() -> Vec<Event> {
        let mut world = World::new();
        let mut events = Vec::new();
        let mut spec = BodySpec::patroller(
            Vec3::new(2.0, 0.0, 0.0),
            MotionFunction::Lissajous {
                amplitude: Vec3::new(8.0, 1.0, 6.0),
                frequency: Vec3::new(0.2, 0.5, 0.3),
            },
            4.0,
        );
        spec.collision_radius = 0.5;
        apply(&mut world, Command::SpawnBody { spec }, &mut events);
        for tick in 0..120 {
            if tick % 10 == 0 {
                let yaw = tick as f32 * 0.1;
                apply(
                    &mut world,
                    Command::SpawnBody {
                        spec: BodySpec::projectile(Vec3::ZERO, Quat::from_rotation_y(yaw), 12.0),
                    },
                    &mut events,
                );
            }
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(50),
                    observer: Some(Vec3::new(0.0, 5.0, -20.0)),
                },
                &mut events,
            );
        }
        events
    }

    assert_eq!(script(), script());
}

fn orbiting_patroller() -> BodySpec {
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

#[test]
fn orbit_spawned_at_its_center_catches_up_at_light_speed() {
    let mut world = World::new();
    let patroller = spawn(&mut world, orbiting_patroller());

    let events = step(&mut world, 0.1, None);
    let intended_speed = events
        .iter()
        .find_map(|event| match event {
            Event::SpeedClamped {
                body,
                intended_speed,
            } if *body == patroller => Some(*intended_speed),
            _ => None,
        })
        .expect("the first step is clamped");
    let expected = 2.0 * 3.0 * 0.05f32.sin() / 0.1;
    assert!((intended_speed - expected).abs() < 1e-3, "{intended_speed}");

    let snapshot = query::body(&world, patroller).expect("alive");
    assert!((snapshot.authoritative.length() - 1.0).abs() < EPSILON);
}

#[test]
fn zero_length_tick_leaves_bodies_in_place() {
    let mut world = World::new();
    let patroller = spawn(&mut world, orbiting_patroller());
    let _ = step(&mut world, 0.1, None);
    let before = query::body(&world, patroller).expect("alive");

    let events = run(
        &mut world,
        Command::Tick {
            dt: Duration::ZERO,
            observer: Some(Vec3::new(0.0, 0.0, 50.0)),
        },
    );
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::SpeedClamped { .. })));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::BodyAdvanced { body, authoritative, .. }
            if *body == patroller && *authoritative == before.authoritative
    )));

    let after = query::body(&world, patroller).expect("alive");
    assert_eq!(after.authoritative, before.authoritative);
    assert_eq!(after.visual, before.visual);
    assert_eq!(after.elapsed_lifetime, before.elapsed_lifetime);
    assert_eq!(after.motion_center, before.motion_center);

    let _ = step(&mut world, 0.1, None);
    let next = query::body(&world, patroller).expect("alive");
    assert!(next.authoritative.distance(after.authoritative) <= 1.0 + EPSILON);
}

proptest! {
    #[test]
    fn committed_positions_respect_light_speed(
        scale_speed in 0.5f32..10.0,
        angular_speed in 0.5f32..8.0,
        speed_of_light in 1.0f32..30.0,
        dt_ms in 5u64..100,
    ) {
        let mut world = World::new();
        let _ = run(&mut world, Command::ConfigureSpeedOfLight { speed_of_light });
        let patroller = spawn(
            &mut world,
            BodySpec::patroller(
                Vec3::ZERO,
                MotionFunction::Circular { radius: 3.0, angular_speed, height: 0.0 },
                scale_speed,
            ),
        );

        let dt = Duration::from_millis(dt_ms);
        let mut previous = Vec3::ZERO;
        for _ in 0..60 {
            let _ = run(&mut world, Command::Tick { dt, observer: None });
            let current = query::body(&world, patroller)
                .expect("patroller stays inside the default area")
                .authoritative;
            prop_assert!(current.distance(previous) <= speed_of_light * dt.as_secs_f32() + 1e-3);
            previous = current;
        }
    }
}
