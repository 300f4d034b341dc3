//! Records the world keeps for bodies and static colliders.

use std::time::Duration;

use glam::Vec3;
use lightlag_core::{
    BodyId, BodyKind, BodySnapshot, BodySpec, BoundsPolicy, ColliderId, ColliderRef,
    ColliderShape, ColliderSpec, CollisionSettings, Event, HitPoints, HitReceiver, LayerMask,
};
use lightlag_system_collision::{ColliderSnapshot, VisualSnapshot};
use lightlag_system_kinematics::{KinematicBody, VisualSample};

#[derive(Clone, Debug)]
pub(crate) struct Body {
    pub(crate) id: BodyId,
    pub(crate) kind: BodyKind,
    pub(crate) kinematic: KinematicBody,
    pub(crate) collision_radius: f32,
    pub(crate) layers: LayerMask,
    pub(crate) tag: Option<String>,
    pub(crate) collision: CollisionSettings,
    pub(crate) enforce_speed_limit: bool,
    pub(crate) detect_hits_against_visuals: bool,
    pub(crate) bypass_retarded_time_for_visual: bool,
    pub(crate) bounds_policy: BoundsPolicy,
    pub(crate) hit_points: Option<HitPoints>,
    pub(crate) visual: VisualSample,
}

impl Body {
    pub(crate) fn spawn(id: BodyId, spec: BodySpec, now: Duration) -> Self {
        let kinematic = KinematicBody::spawn(&spec, now);
        let visual = VisualSample {
            position: kinematic.previous_authoritative(),
            local_time: 0.0,
            orientation: kinematic.orientation_at(0.0),
        };
        let bounds_policy = spec.effective_bounds_policy();
        Self {
            id,
            kind: spec.kind,
            kinematic,
            collision_radius: spec.collision_radius,
            layers: spec.layers,
            tag: spec.tag,
            collision: spec.collision,
            enforce_speed_limit: spec.enforce_speed_limit,
            detect_hits_against_visuals: spec.detect_hits_against_visuals,
            bypass_retarded_time_for_visual: spec.bypass_retarded_time_for_visual,
            bounds_policy,
            hit_points: spec.hit_points.map(HitPoints::new),
            visual,
        }
    }

    pub(crate) fn position(&self) -> Vec3 {
        self.kinematic.previous_authoritative()
    }

    /// Publishes the committed position alongside the last visual sample.
    pub(crate) fn advanced(&self) -> Event {
        Event::BodyAdvanced {
            body: self.id,
            authoritative: self.position(),
            visual: self.visual.position,
            visual_local_time: self.visual.local_time,
            orientation: self.visual.orientation,
        }
    }

    pub(crate) fn receiver(&mut self) -> Option<&mut dyn HitReceiver> {
        self.hit_points
            .as_mut()
            .map(|points| points as &mut dyn HitReceiver)
    }

    pub(crate) fn collider_snapshot(&self) -> ColliderSnapshot {
        ColliderSnapshot {
            id: ColliderRef::Body(self.id),
            shape: ColliderShape::Sphere {
                center: self.position(),
                radius: self.collision_radius,
            },
            layers: self.layers,
            tag: self.tag.clone(),
            is_trigger: false,
            moving_entity: true,
        }
    }

    pub(crate) fn visual_snapshot(&self) -> VisualSnapshot {
        VisualSnapshot {
            body: self.id,
            position: self.visual.position,
            radius: self.collision_radius,
        }
    }

    pub(crate) fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            kind: self.kind,
            authoritative: self.position(),
            visual: self.visual.position,
            visual_local_time: self.visual.local_time,
            orientation: self.visual.orientation,
            motion_center: self.kinematic.motion_center(),
            elapsed_lifetime: self.kinematic.elapsed_lifetime(),
            collision_radius: self.collision_radius,
            hit_points: self.hit_points,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct StaticCollider {
    pub(crate) id: ColliderId,
    pub(crate) spec: ColliderSpec,
    pub(crate) hit_points: Option<HitPoints>,
}

impl StaticCollider {
    pub(crate) fn new(id: ColliderId, spec: ColliderSpec) -> Self {
        let hit_points = spec.hit_points.map(HitPoints::new);
        Self {
            id,
            spec,
            hit_points,
        }
    }

    pub(crate) fn receiver(&mut self) -> Option<&mut dyn HitReceiver> {
        self.hit_points
            .as_mut()
            .map(|points| points as &mut dyn HitReceiver)
    }

    pub(crate) fn snapshot(&self) -> ColliderSnapshot {
        ColliderSnapshot {
            id: ColliderRef::Static(self.id),
            shape: self.spec.shape,
            layers: self.spec.layers,
            tag: self.spec.tag.clone(),
            is_trigger: self.spec.is_trigger,
            moving_entity: false,
        }
    }
}
