#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Light Lag.
//!
//! The world owns every body and static collider. Adapters mutate it only
//! through [`apply`], and every observable change is reported as an
//! [`Event`]. A tick evaluates bodies in identifier order against snapshots
//! captured when the tick began.

use std::time::Duration;

use lightlag_core::{
    deliver_hit, BodyId, BoundsPolicy, ColliderId, ColliderRef, CollisionOutcome, Command,
    ConfigError, DestroyReason, DilationContext, Event, ObserverProvider, PlayAreaBounds,
    TickContext, WELCOME_BANNER,
};
use lightlag_system_collision::{
    ColliderSnapshot, CollisionResolver, Sweep, SweepRequest, VisualSnapshot,
};
use lightlag_system_kinematics::{SpeedLimiter, MIN_TICK_SECONDS};
use tracing::{debug, info, warn};

mod body;

use body::{Body, StaticCollider};

/// Represents the authoritative Light Lag world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    dilation: DilationContext,
    bounds: PlayAreaBounds,
    clock: Duration,
    tick_index: u64,
    bodies: Vec<Body>,
    colliders: Vec<StaticCollider>,
    next_body_id: u32,
    next_collider_id: u32,
    resolver: CollisionResolver,
}

impl World {
    /// Creates a new, empty world with the default speed of light and play area.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            dilation: DilationContext::default(),
            bounds: PlayAreaBounds::default(),
            clock: Duration::ZERO,
            tick_index: 0,
            bodies: Vec::new(),
            colliders: Vec::new(),
            next_body_id: 0,
            next_collider_id: 0,
            resolver: CollisionResolver::new(),
        }
    }

    fn body_index(&self, id: BodyId) -> Option<usize> {
        self.bodies.binary_search_by_key(&id, |body| body.id).ok()
    }

    fn now(&self) -> f32 {
        self.clock.as_secs_f32()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureSpeedOfLight { speed_of_light } => {
            match world.dilation.with_speed_of_light(speed_of_light) {
                Ok(dilation) => {
                    world.dilation = dilation;
                    out_events.push(Event::SpeedOfLightChanged { speed_of_light });
                }
                Err(reason) => reject_configuration(reason, out_events),
            }
        }
        Command::ConfigureTimeScale {
            subjective_time_scale,
        } => match world.dilation.with_subjective_time_scale(subjective_time_scale) {
            Ok(dilation) => {
                world.dilation = dilation;
                out_events.push(Event::TimeScaleChanged {
                    subjective_time_scale,
                });
            }
            Err(reason) => reject_configuration(reason, out_events),
        },
        Command::ConfigurePlayArea { bounds } => {
            world.bounds = bounds;
            out_events.push(Event::PlayAreaChanged { bounds });
        }
        Command::Tick { dt, observer } => tick(world, dt, &observer, out_events),
        Command::SpawnBody { spec } => {
            if let Err(reason) = spec.validate() {
                warn!(kind = ?spec.kind, %reason, "spawn rejected");
                out_events.push(Event::BodySpawnRejected {
                    kind: spec.kind,
                    reason,
                });
                return;
            }

            let id = BodyId::new(world.next_body_id);
            world.next_body_id = world.next_body_id.saturating_add(1);
            let body = Body::spawn(id, spec, world.clock);
            let position = body.position();
            debug!(body = id.get(), kind = ?body.kind, ?position, "body spawned");
            out_events.push(Event::BodySpawned {
                body: id,
                kind: body.kind,
                position,
            });
            world.bodies.push(body);
        }
        Command::DespawnBody { body } => {
            let Some(index) = world.body_index(body) else {
                debug!(body = body.get(), "despawn ignored for unknown body");
                return;
            };
            let removed = world.bodies.remove(index);
            info!(body = body.get(), "body despawned");
            out_events.push(Event::BodyDestroyed {
                body,
                position: removed.position(),
                reason: DestroyReason::Despawned,
            });
        }
        Command::PlaceCollider { spec } => {
            if let Err(reason) = spec.validate() {
                reject_configuration(reason, out_events);
                return;
            }

            let id = ColliderId::new(world.next_collider_id);
            world.next_collider_id = world.next_collider_id.saturating_add(1);
            debug!(collider = id.get(), shape = ?spec.shape, "collider placed");
            world.colliders.push(StaticCollider::new(id, spec));
            out_events.push(Event::ColliderPlaced { collider: id });
        }
        Command::RemoveCollider { collider } => {
            let before = world.colliders.len();
            world.colliders.retain(|existing| existing.id != collider);
            if world.colliders.len() != before {
                out_events.push(Event::ColliderRemoved { collider });
            }
        }
    }
}

fn reject_configuration(reason: ConfigError, out_events: &mut Vec<Event>) {
    warn!(%reason, "configuration rejected");
    out_events.push(Event::ConfigurationRejected { reason });
}

/// Advances the simulation by `dt`, evaluating every body once.
///
/// Per body, in identifier order: the motion function proposes a candidate,
/// the speed limiter caps it, the swept path is classified, the result is
/// committed and contained, lifetime is accumulated and finally the visual
/// position is derived for the observer. The observer is polled once per
/// surviving body. A tick no longer than [`MIN_TICK_SECONDS`] leaves every
/// body where it is and only republishes its current state.
pub fn tick<O>(world: &mut World, dt: Duration, observer: &O, out_events: &mut Vec<Event>)
where
    O: ObserverProvider + ?Sized,
{
    world.clock = world.clock.saturating_add(dt);
    world.tick_index = world.tick_index.saturating_add(1);
    let context = TickContext {
        dilation: world.dilation,
        bounds: world.bounds,
        now: world.clock,
        dt: dt.as_secs_f32(),
    };
    out_events.push(Event::TimeAdvanced {
        dt,
        now: world.now(),
    });

    let mut frame = TickFrame::capture(world);
    for index in 0..world.bodies.len() {
        if frame.destroyed[index] {
            continue;
        }
        advance_body(world, index, &context, observer, &mut frame, out_events);
    }

    let destroyed = frame.destroyed;
    let mut index = 0;
    world.bodies.retain(|_| {
        let keep = !destroyed[index];
        index += 1;
        keep
    });
}

/// State captured when a tick begins and pruned as entities are destroyed.
struct TickFrame {
    colliders: Vec<ColliderSnapshot>,
    visuals: Vec<VisualSnapshot>,
    destroyed: Vec<bool>,
}

impl TickFrame {
    fn capture(world: &World) -> Self {
        let colliders = world
            .colliders
            .iter()
            .map(StaticCollider::snapshot)
            .chain(world.bodies.iter().map(Body::collider_snapshot))
            .collect();
        let visuals = world.bodies.iter().map(Body::visual_snapshot).collect();
        Self {
            colliders,
            visuals,
            destroyed: vec![false; world.bodies.len()],
        }
    }

    fn forget(&mut self, collider: ColliderRef) {
        self.colliders.retain(|snapshot| snapshot.id != collider);
        if let ColliderRef::Body(body) = collider {
            self.visuals.retain(|visual| visual.body != body);
        }
    }
}

fn advance_body<O>(
    world: &mut World,
    index: usize,
    context: &TickContext,
    observer: &O,
    frame: &mut TickFrame,
    out_events: &mut Vec<Event>,
) where
    O: ObserverProvider + ?Sized,
{
    if context.dt <= MIN_TICK_SECONDS {
        out_events.push(world.bodies[index].advanced());
        return;
    }

    let speed_of_light = context.dilation.speed_of_light();
    let body = &mut world.bodies[index];
    let id = body.id;
    let candidate = body.kinematic.candidate_position(context.now);
    if !candidate.is_finite() {
        warn!(body = id.get(), "motion produced a non-finite position");
        destroy_body(world, index, DestroyReason::Faulted, frame, out_events);
        return;
    }

    let previous = body.position();
    let proposed = if body.enforce_speed_limit {
        let prior = body.kinematic.prior_candidate_position(context.now, context.dt);
        let limited =
            SpeedLimiter::new(speed_of_light).limit(previous, candidate, prior, context.dt);
        if limited.clamped {
            debug!(
                body = id.get(),
                intended_speed = limited.intended_speed,
                "speed clamped"
            );
            out_events.push(Event::SpeedClamped {
                body: id,
                intended_speed: limited.intended_speed,
            });
        }
        limited.position
    } else {
        candidate
    };

    let request = SweepRequest {
        sweep: Sweep {
            from: previous,
            to: proposed,
            radius: body.collision_radius,
        },
        settings: &body.collision,
        owner: Some(ColliderRef::Body(id)),
        detect_hits_against_visuals: body.detect_hits_against_visuals,
    };
    let outcome = world
        .resolver
        .resolve(&request, &frame.colliders, &frame.visuals);
    match outcome {
        CollisionOutcome::HitTarget(target) => {
            let destroyed = strike(world, target);
            info!(body = id.get(), ?target, destroyed, "target hit");
            out_events.push(Event::TargetHit {
                body: id,
                target,
                destroyed,
            });
            if destroyed {
                remove_target(world, target, frame, out_events);
            }
            destroy_body(world, index, DestroyReason::HitTarget, frame, out_events);
            return;
        }
        CollisionOutcome::HitEnvironment(collider) => {
            out_events.push(Event::EnvironmentHit { body: id, collider });
            destroy_body(world, index, DestroyReason::HitEnvironment, frame, out_events);
            return;
        }
        CollisionOutcome::None => {}
    }

    let body = &mut world.bodies[index];
    let mut committed = proposed;
    if !context.bounds.contains(committed) {
        match body.bounds_policy {
            BoundsPolicy::Wrap => {
                let wrapped = context.bounds.wrap(committed);
                let delta = wrapped - committed;
                body.kinematic.shift_motion_center(delta);
                committed = wrapped;
                debug!(body = id.get(), ?delta, "body wrapped");
                out_events.push(Event::BodyWrapped { body: id, delta });
            }
            BoundsPolicy::Destroy => {
                body.kinematic.commit(committed);
                destroy_body(world, index, DestroyReason::LeftPlayArea, frame, out_events);
                return;
            }
            BoundsPolicy::Clamp => committed = context.bounds.clamp(committed),
        }
    }
    body.kinematic.commit(committed);

    if body.kinematic.advance_lifetime(context.dt) {
        destroy_body(world, index, DestroyReason::LifetimeExpired, frame, out_events);
        return;
    }

    let sample = body.kinematic.visual_sample(
        observer.current_observer_position(),
        context.now,
        speed_of_light,
        body.bypass_retarded_time_for_visual,
    );
    body.visual = sample;
    out_events.push(body.advanced());
}

fn strike(world: &mut World, target: ColliderRef) -> bool {
    match target {
        ColliderRef::Body(id) => match world.body_index(id) {
            Some(index) => deliver_hit(world.bodies[index].receiver()),
            None => true,
        },
        ColliderRef::Static(id) => world
            .colliders
            .iter_mut()
            .find(|collider| collider.id == id)
            .map_or(true, |collider| deliver_hit(collider.receiver())),
    }
}

fn remove_target(
    world: &mut World,
    target: ColliderRef,
    frame: &mut TickFrame,
    out_events: &mut Vec<Event>,
) {
    match target {
        ColliderRef::Body(id) => {
            if let Some(index) = world.body_index(id) {
                destroy_body(world, index, DestroyReason::Struck, frame, out_events);
            }
        }
        ColliderRef::Static(id) => {
            world.colliders.retain(|collider| collider.id != id);
            frame.forget(target);
            info!(collider = id.get(), "collider destroyed");
            out_events.push(Event::ColliderRemoved { collider: id });
        }
    }
}

fn destroy_body(
    world: &World,
    index: usize,
    reason: DestroyReason,
    frame: &mut TickFrame,
    out_events: &mut Vec<Event>,
) {
    let body = &world.bodies[index];
    frame.destroyed[index] = true;
    frame.forget(ColliderRef::Body(body.id));
    let position = body.position();
    info!(body = body.id.get(), ?reason, ?position, "body destroyed");
    out_events.push(Event::BodyDestroyed {
        body: body.id,
        position,
        reason,
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use lightlag_core::{
        BodyId, BodySnapshot, BodyView, ColliderId, DilationContext, HitPoints, PlayAreaBounds,
    };
    use lightlag_system_collision::ColliderSnapshot;

    use super::{StaticCollider, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Propagation constants currently in force.
    #[must_use]
    pub fn dilation(world: &World) -> DilationContext {
        world.dilation
    }

    /// Play area currently in force.
    #[must_use]
    pub fn play_area(world: &World) -> PlayAreaBounds {
        world.bounds
    }

    /// Total simulated time.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// World clock in seconds.
    #[must_use]
    pub fn now(world: &World) -> f32 {
        world.now()
    }

    /// Presentation clock: the world clock scaled by the subjective time scale.
    #[must_use]
    pub fn subjective_time(world: &World) -> f32 {
        world.now() * world.dilation.subjective_time_scale()
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only snapshot of every live body.
    #[must_use]
    pub fn body_view(world: &World) -> BodyView {
        BodyView::from_snapshots(world.bodies.iter().map(|body| body.snapshot()).collect())
    }

    /// Snapshot of a single body, if it is alive.
    #[must_use]
    pub fn body(world: &World, id: BodyId) -> Option<BodySnapshot> {
        world
            .body_index(id)
            .map(|index| world.bodies[index].snapshot())
    }

    /// Static colliders currently placed, in placement order.
    #[must_use]
    pub fn colliders(world: &World) -> Vec<ColliderSnapshot> {
        world
            .colliders
            .iter()
            .map(StaticCollider::snapshot)
            .collect()
    }

    /// Hits a static collider can still absorb, if it absorbs hits at all.
    #[must_use]
    pub fn collider_hit_points(world: &World, id: ColliderId) -> Option<HitPoints> {
        world
            .colliders
            .iter()
            .find(|collider| collider.id == id)
            .and_then(|collider| collider.hit_points)
    }
}
