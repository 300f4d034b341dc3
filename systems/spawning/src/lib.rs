#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic emitter system responsible for firing projectile spawn commands.

use std::time::Duration;

use glam::{Quat, Vec3};
use lightlag_core::{BodySpec, Command, ConfigError, Event};
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use tracing::debug;

/// Shortest interval an emitter may fire at; shorter intervals never fire.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration of a single emitter.
#[derive(Clone, Debug)]
pub struct Config {
    origin: Vec3,
    interval: Duration,
    seed: u64,
    yaws_degrees: Vec<f32>,
    jitter_degrees: f32,
    template: BodySpec,
}

impl Config {
    /// Creates an emitter firing straight ahead from `origin` once per `interval`.
    #[must_use]
    pub fn new(origin: Vec3, interval: Duration, seed: u64) -> Self {
        Self {
            origin,
            interval,
            seed,
            yaws_degrees: Vec::new(),
            jitter_degrees: 0.0,
            template: BodySpec::projectile(origin, Quat::IDENTITY, 1.0),
        }
    }

    /// Aim yaws, in degrees around the vertical axis, cycled through shot by shot.
    #[must_use]
    pub fn with_yaws(mut self, yaws_degrees: Vec<f32>) -> Self {
        self.yaws_degrees = yaws_degrees;
        self
    }

    /// Maximum random deviation, in degrees, added to every aim yaw.
    ///
    /// A non-finite deviation is kept so [`Config::validate`] can report it,
    /// but never applied.
    #[must_use]
    pub fn with_jitter(mut self, jitter_degrees: f32) -> Self {
        self.jitter_degrees = jitter_degrees.abs();
        self
    }

    /// Body template every shot starts from; position and orientation are overwritten.
    #[must_use]
    pub fn with_template(mut self, template: BodySpec) -> Self {
        self.template = template;
        self
    }

    /// Rejects emitters that would fire faster than [`MIN_INTERVAL`] or aim with non-finite values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval < MIN_INTERVAL {
            return Err(ConfigError::EmitterIntervalTooShort {
                interval: self.interval,
                minimum: MIN_INTERVAL,
            });
        }
        if !self.origin.is_finite() {
            return Err(ConfigError::NonFinite("emitter origin"));
        }
        if !self.jitter_degrees.is_finite() {
            return Err(ConfigError::NonFinite("emitter jitter"));
        }
        if self.yaws_degrees.iter().any(|yaw| !yaw.is_finite()) {
            return Err(ConfigError::NonFinite("emitter yaws"));
        }
        self.template.validate()
    }
}

#[derive(Debug)]
struct Emitter {
    config: Config,
    accumulator: Duration,
    next_yaw: usize,
    rng: ChaCha8Rng,
}

impl Emitter {
    fn new(config: Config) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            accumulator: Duration::ZERO,
            next_yaw: 0,
            rng,
        }
    }

    fn resolve_shots(&mut self) -> usize {
        if self.config.interval < MIN_INTERVAL {
            return 0;
        }

        let mut shots = 0;
        while self.accumulator >= self.config.interval {
            self.accumulator -= self.config.interval;
            shots += 1;
        }
        shots
    }

    fn next_aim(&mut self) -> f32 {
        let base = if self.config.yaws_degrees.is_empty() {
            0.0
        } else {
            let yaw = self.config.yaws_degrees[self.next_yaw % self.config.yaws_degrees.len()];
            self.next_yaw = (self.next_yaw + 1) % self.config.yaws_degrees.len();
            yaw
        };
        let jitter_degrees = self.config.jitter_degrees;
        let jitter = if jitter_degrees.is_finite() && jitter_degrees > 0.0 {
            self.rng.gen_range(-jitter_degrees..=jitter_degrees)
        } else {
            0.0
        };
        base + jitter
    }

    fn fire(&mut self) -> BodySpec {
        let yaw = self.next_aim();
        let mut spec = self.config.template.clone();
        spec.spawn_position = self.config.origin;
        spec.spawn_orientation = Quat::from_rotation_y(yaw.to_radians());
        debug!(origin = ?self.config.origin, yaw, "emitter fired");
        spec
    }
}

/// Pure system that converts elapsed time into projectile spawn commands.
#[derive(Debug)]
pub struct Spawning {
    emitters: Vec<Emitter>,
}

impl Spawning {
    /// Creates a new spawning system driving the supplied emitters.
    #[must_use]
    pub fn new(configs: Vec<Config>) -> Self {
        Self {
            emitters: configs.into_iter().map(Emitter::new).collect(),
        }
    }

    /// Number of emitters driven by the system.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// Reports whether the system drives no emitters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Consumes events and emits one spawn command per elapsed emitter interval.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt, .. } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        for emitter in &mut self.emitters {
            emitter.accumulator = emitter.accumulator.saturating_add(accumulated);
            for _ in 0..emitter.resolve_shots() {
                out.push(Command::SpawnBody {
                    spec: emitter.fire(),
                });
            }
        }
    }
}
