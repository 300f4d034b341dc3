//! TOML scenario files describing the initial world and its emitters.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use lightlag_core::{
    BodySpec, ColliderSpec, CollisionSettings, Command, PlayAreaBounds, DEFAULT_SPEED_OF_LIGHT,
};
use lightlag_system_spawning::{Config, Spawning};
use serde::Deserialize;

use crate::observer::Observer;

const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.toml");

/// Initial world configuration loaded from a scenario file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default = "default_speed_of_light")]
    pub(crate) speed_of_light: f32,
    #[serde(default = "default_time_scale")]
    subjective_time_scale: f32,
    #[serde(default)]
    play_area: PlayAreaBounds,
    #[serde(default)]
    pub(crate) observer: Observer,
    #[serde(default)]
    bodies: Vec<BodySpec>,
    #[serde(default)]
    colliders: Vec<ColliderSpec>,
    #[serde(default)]
    emitters: Vec<EmitterSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EmitterSection {
    origin: Vec3,
    interval: f32,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    yaws: Vec<f32>,
    #[serde(default)]
    jitter: f32,
    #[serde(default = "default_projectile_speed")]
    speed: f32,
    #[serde(default)]
    lifetime: Option<f32>,
    #[serde(default)]
    collision: CollisionSettings,
    #[serde(default)]
    detect_hits_against_visuals: bool,
}

fn default_speed_of_light() -> f32 {
    DEFAULT_SPEED_OF_LIGHT
}

fn default_time_scale() -> f32 {
    1.0
}

fn default_projectile_speed() -> f32 {
    5.0
}

impl Scenario {
    /// Loads and parses the scenario stored at `path`.
    pub(crate) fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Built-in scenario used when no file is supplied.
    pub(crate) fn demo() -> Result<Self> {
        Self::parse(DEMO_SCENARIO).context("built-in demo scenario is invalid")
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Commands that configure the world and populate it with the scenario's entities.
    pub(crate) fn setup_commands(&self) -> Vec<Command> {
        let mut commands = vec![
            Command::ConfigureSpeedOfLight {
                speed_of_light: self.speed_of_light,
            },
            Command::ConfigureTimeScale {
                subjective_time_scale: self.subjective_time_scale,
            },
            Command::ConfigurePlayArea {
                bounds: self.play_area,
            },
        ];
        commands.extend(
            self.colliders
                .iter()
                .cloned()
                .map(|spec| Command::PlaceCollider { spec }),
        );
        commands.extend(
            self.bodies
                .iter()
                .cloned()
                .map(|spec| Command::SpawnBody { spec }),
        );
        commands
    }

    /// Spawning system driving every emitter in the scenario.
    pub(crate) fn spawning(&self) -> Result<Spawning> {
        let configs = self
            .emitters
            .iter()
            .enumerate()
            .map(|(index, emitter)| {
                emitter
                    .config()
                    .with_context(|| format!("invalid emitter #{index}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Spawning::new(configs))
    }
}

impl EmitterSection {
    fn config(&self) -> Result<Config> {
        let interval = Duration::try_from_secs_f32(self.interval)
            .with_context(|| format!("interval {} is not a valid duration", self.interval))?;
        let mut template = BodySpec::projectile(self.origin, Quat::IDENTITY, self.speed);
        if self.lifetime.is_some() {
            template.max_lifetime = self.lifetime;
        }
        template.collision = self.collision.clone();
        template.detect_hits_against_visuals = self.detect_hits_against_visuals;

        let config = Config::new(self.origin, interval, self.seed)
            .with_yaws(self.yaws.clone())
            .with_jitter(self.jitter)
            .with_template(template);
        config.validate().context("emitter rejected")?;
        Ok(config)
    }
}
