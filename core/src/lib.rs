#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Light Lag engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Every body carries two positions: the
//! authoritative one used for collision and containment, and the visual one
//! an observer perceives after the signal has travelled at the speed of
//! light. Data only ever flows from the former to the latter.

use std::time::Duration;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

mod bounds;
mod config;
mod context;
mod motion;

pub use bounds::PlayAreaBounds;
pub use config::{
    BodyKind, BodySpec, BoundsPolicy, ColliderShape, ColliderSpec, CollisionSettings,
    ConfigError, LayerMask, DEFAULT_COLLISION_RADIUS, DEFAULT_PROJECTILE_LIFETIME,
    DEFAULT_VISUAL_HIT_RADIUS,
};
pub use context::{DilationContext, ObserverProvider, TickContext, DEFAULT_SPEED_OF_LIGHT};
pub use motion::MotionFunction;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Light Lag: what you see already happened.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the propagation speed shared by every body.
    ConfigureSpeedOfLight {
        /// New speed of light in world units per second.
        speed_of_light: f32,
    },
    /// Replaces the presentation-only subjective time scale.
    ConfigureTimeScale {
        /// Multiplier applied to the world clock for presentation.
        subjective_time_scale: f32,
    },
    /// Replaces the play area.
    ConfigurePlayArea {
        /// Bounds that contain the simulation.
        bounds: PlayAreaBounds,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Observer position for the tick, if an observer exists.
        observer: Option<Vec3>,
    },
    /// Requests that a new body be spawned at the current world time.
    SpawnBody {
        /// Configuration of the body.
        spec: BodySpec,
    },
    /// Requests removal of a body without a hit.
    DespawnBody {
        /// Identifier of the body to remove.
        body: BodyId,
    },
    /// Requests placement of a static collider.
    PlaceCollider {
        /// Configuration of the collider.
        spec: ColliderSpec,
    },
    /// Requests removal of a static collider.
    RemoveCollider {
        /// Identifier of the collider to remove.
        collider: ColliderId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// World clock after the tick, in seconds.
        now: f32,
    },
    /// Confirms that a body was created.
    BodySpawned {
        /// Identifier assigned to the body.
        body: BodyId,
        /// Lifecycle category of the body.
        kind: BodyKind,
        /// Authoritative position at spawn.
        position: Vec3,
    },
    /// Reports that a spawn request was rejected.
    BodySpawnRejected {
        /// Lifecycle category requested.
        kind: BodyKind,
        /// Specific reason the configuration was rejected.
        reason: ConfigError,
    },
    /// Publishes the state a body committed for the tick.
    BodyAdvanced {
        /// Identifier of the body.
        body: BodyId,
        /// Position used for collision and containment.
        authoritative: Vec3,
        /// Position the observer perceives.
        visual: Vec3,
        /// Local motion time the visual position was evaluated at.
        visual_local_time: f32,
        /// Orientation of the body as perceived by the observer.
        orientation: Quat,
    },
    /// Reports that the speed limiter shortened a body's displacement.
    SpeedClamped {
        /// Identifier of the body.
        body: BodyId,
        /// Speed the motion function asked for before clamping.
        intended_speed: f32,
    },
    /// Reports that a body was remapped to the opposite side of the play area.
    BodyWrapped {
        /// Identifier of the body.
        body: BodyId,
        /// Displacement applied to the position and the motion center.
        delta: Vec3,
    },
    /// Reports that a body's swept volume struck a target.
    TargetHit {
        /// Identifier of the body that struck the target.
        body: BodyId,
        /// Collider that was struck.
        target: ColliderRef,
        /// Whether the hit destroyed the target.
        destroyed: bool,
    },
    /// Reports that a body's swept volume struck the environment.
    EnvironmentHit {
        /// Identifier of the body.
        body: BodyId,
        /// Collider that was struck.
        collider: ColliderRef,
    },
    /// Signals that a body was destroyed and will never be evaluated again.
    BodyDestroyed {
        /// Identifier of the body.
        body: BodyId,
        /// Last committed authoritative position.
        position: Vec3,
        /// Why the body was destroyed.
        reason: DestroyReason,
    },
    /// Confirms that a static collider was placed.
    ColliderPlaced {
        /// Identifier assigned to the collider.
        collider: ColliderId,
    },
    /// Confirms that a static collider was removed.
    ColliderRemoved {
        /// Identifier of the collider.
        collider: ColliderId,
    },
    /// Announces a new speed of light.
    SpeedOfLightChanged {
        /// Speed of light now in force.
        speed_of_light: f32,
    },
    /// Announces a new subjective time scale.
    TimeScaleChanged {
        /// Time scale now in force.
        subjective_time_scale: f32,
    },
    /// Announces a new play area.
    PlayAreaChanged {
        /// Bounds now in force.
        bounds: PlayAreaBounds,
    },
    /// Reports that a configuration command was rejected.
    ConfigurationRejected {
        /// Specific reason the configuration was rejected.
        reason: ConfigError,
    },
}

/// Why a body stopped existing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestroyReason {
    /// The body's swept volume struck a target.
    HitTarget,
    /// The body's swept volume struck the environment.
    HitEnvironment,
    /// Another body struck this one and it had no hits left.
    Struck,
    /// The body's committed position left the play area.
    LeftPlayArea,
    /// The body outlived its maximum lifetime.
    LifetimeExpired,
    /// The body's motion produced a non-finite position.
    Faulted,
    /// The body was removed by command.
    Despawned,
}

/// Unique identifier assigned to a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Creates a new body identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a static collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(u32);

impl ColliderId {
    /// Creates a new collider identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Anything a swept volume can strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColliderRef {
    /// Collider owned by a motion-driven body.
    Body(BodyId),
    /// Static collider placed in the world.
    Static(ColliderId),
}

/// Classification of what a body's swept volume hit during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionOutcome {
    /// The path was clear.
    None,
    /// The path crossed solid environment.
    HitEnvironment(ColliderRef),
    /// The path crossed a target.
    HitTarget(ColliderRef),
}

/// Capability of an entity to absorb hits.
pub trait HitReceiver {
    /// Registers one hit and reports whether the entity is now destroyed.
    fn apply_hit(&mut self) -> bool;
}

/// Hit point pool that is destroyed once it reaches zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitPoints(u32);

impl HitPoints {
    /// Creates a pool holding the provided number of hits.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Hits remaining before destruction.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.0
    }
}

impl HitReceiver for HitPoints {
    fn apply_hit(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 == 0
    }
}

/// Delivers a hit to an optional receiver; entities without one are destroyed outright.
pub fn deliver_hit(receiver: Option<&mut dyn HitReceiver>) -> bool {
    receiver.map_or(true, |receiver| receiver.apply_hit())
}

/// Immutable representation of a single body's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySnapshot {
    /// Unique identifier assigned to the body.
    pub id: BodyId,
    /// Lifecycle category of the body.
    pub kind: BodyKind,
    /// Position committed at the end of the last tick.
    pub authoritative: Vec3,
    /// Position the observer perceived at the end of the last tick.
    pub visual: Vec3,
    /// Local motion time of the visual position.
    pub visual_local_time: f32,
    /// Orientation perceived by the observer.
    pub orientation: Quat,
    /// Current anchor of the motion function.
    pub motion_center: Vec3,
    /// Seconds the body has been alive.
    pub elapsed_lifetime: f32,
    /// Collision radius of the body.
    pub collision_radius: f32,
    /// Hits remaining, if the body absorbs hits.
    pub hit_points: Option<HitPoints>,
}

/// Read-only snapshot describing all bodies in the world.
#[derive(Clone, Debug, Default)]
pub struct BodyView {
    snapshots: Vec<BodySnapshot>,
}

impl BodyView {
    /// Creates a new view from the provided snapshots, sorted by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BodySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured body snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &BodySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single body.
    #[must_use]
    pub fn get(&self, id: BodyId) -> Option<&BodySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of bodies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BodySnapshot> {
        self.snapshots
    }
}
