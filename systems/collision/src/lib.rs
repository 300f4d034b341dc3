#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure swept-volume collision resolution against authoritative positions.
//!
//! Each tick a body sweeps a sphere from its previously committed position to
//! its speed-limited candidate. Two independent passes classify the path: a
//! target pass and an environment pass. Target classification always takes
//! precedence over environment classification.

use glam::Vec3;
use lightlag_core::{
    BodyId, ColliderRef, ColliderShape, CollisionOutcome, CollisionSettings, LayerMask,
};

mod sweep;

pub use sweep::Sweep;

/// Paths shorter than this are treated as stationary and never collide.
pub const SWEEP_EPSILON: f32 = 1e-5;

/// Collider state captured once at the start of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderSnapshot {
    /// Identity of the collider.
    pub id: ColliderRef,
    /// Geometry of the collider.
    pub shape: ColliderShape,
    /// Layers the collider occupies.
    pub layers: LayerMask,
    /// Optional classification tag.
    pub tag: Option<String>,
    /// Trigger volumes are invisible to the environment pass.
    pub is_trigger: bool,
    /// Marker carried by colliders owned by motion-driven bodies.
    pub moving_entity: bool,
}

/// Previously committed visual position of a tracked body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualSnapshot {
    /// Identifier of the observed body.
    pub body: BodyId,
    /// Position the observer perceived at the end of the previous tick.
    pub position: Vec3,
    /// Collision radius of the observed body; zero selects the fallback radius.
    pub radius: f32,
}

/// Everything the resolver needs to know about the sweeping body.
#[derive(Clone, Copy, Debug)]
pub struct SweepRequest<'a> {
    /// Swept path of the body for this tick.
    pub sweep: Sweep,
    /// Classification rules of the sweeping body.
    pub settings: &'a CollisionSettings,
    /// The body's own collider, which is never hit.
    pub owner: Option<ColliderRef>,
    /// Replace the physical target pass with a test against visual positions.
    pub detect_hits_against_visuals: bool,
}

/// Classifies what a body's swept path hits during one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionResolver;

impl CollisionResolver {
    /// Creates a new resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the target and environment passes for the request.
    #[must_use]
    pub fn resolve(
        &self,
        request: &SweepRequest<'_>,
        colliders: &[ColliderSnapshot],
        visuals: &[VisualSnapshot],
    ) -> CollisionOutcome {
        if request.sweep.length() <= SWEEP_EPSILON {
            return CollisionOutcome::None;
        }

        let target = if request.detect_hits_against_visuals {
            self.visual_target(request, visuals)
        } else {
            self.physical_target(request, colliders)
        };
        if let Some(target) = target {
            return CollisionOutcome::HitTarget(target);
        }

        let environment = nearest(request, colliders, |collider| {
            !collider.is_trigger
                && collider
                    .layers
                    .intersects(request.settings.environment_layers)
                && !(request.detect_hits_against_visuals && collider.moving_entity)
        });
        match environment {
            Some(collider) if is_target(collider, request.settings) => {
                CollisionOutcome::HitTarget(collider.id)
            }
            Some(collider) => CollisionOutcome::HitEnvironment(collider.id),
            None => CollisionOutcome::None,
        }
    }

    fn physical_target(
        &self,
        request: &SweepRequest<'_>,
        colliders: &[ColliderSnapshot],
    ) -> Option<ColliderRef> {
        match request.settings.target_layers {
            Some(mask) => nearest(request, colliders, |collider| {
                collider.layers.intersects(mask)
            })
            .map(|collider| collider.id),
            None => nearest(request, colliders, |_| true)
                .filter(|collider| is_target(collider, request.settings))
                .map(|collider| collider.id),
        }
    }

    fn visual_target(
        &self,
        request: &SweepRequest<'_>,
        visuals: &[VisualSnapshot],
    ) -> Option<ColliderRef> {
        let mut best: Option<(f32, BodyId)> = None;
        for visual in visuals {
            if request.owner == Some(ColliderRef::Body(visual.body)) {
                continue;
            }

            let radius = if visual.radius > 0.0 {
                visual.radius
            } else {
                request.settings.visual_hit_radius
            };
            let (fraction, distance) = request.sweep.closest_approach(visual.position);
            if distance > radius + request.sweep.radius {
                continue;
            }

            if best.map_or(true, |(best_fraction, _)| fraction < best_fraction) {
                best = Some((fraction, visual.body));
            }
        }
        best.map(|(_, body)| ColliderRef::Body(body))
    }
}

/// Reports whether a collider qualifies as a target under the provided rules.
#[must_use]
pub fn is_target(collider: &ColliderSnapshot, settings: &CollisionSettings) -> bool {
    let layer_match = settings
        .target_layers
        .map_or(false, |mask| collider.layers.intersects(mask));
    let tag_match = match (&settings.target_tag, &collider.tag) {
        (Some(wanted), Some(tag)) => wanted == tag,
        _ => false,
    };
    let marker_match = collider.moving_entity && settings.moving_bodies_are_targets;
    layer_match || tag_match || marker_match
}

fn nearest<'c, F>(
    request: &SweepRequest<'_>,
    colliders: &'c [ColliderSnapshot],
    filter: F,
) -> Option<&'c ColliderSnapshot>
where
    F: Fn(&ColliderSnapshot) -> bool,
{
    let mut best: Option<(f32, &ColliderSnapshot)> = None;
    for collider in colliders {
        if request.owner == Some(collider.id) || !filter(collider) {
            continue;
        }
        let Some(fraction) = request.sweep.time_of_impact(&collider.shape) else {
            continue;
        };
        if best.map_or(true, |(best_fraction, _)| fraction < best_fraction) {
            best = Some((fraction, collider));
        }
    }
    best.map(|(_, collider)| collider)
}
