//! Human-readable and JSON renderings of the event stream.

use std::{collections::BTreeMap, io::Write};

use anyhow::{Context, Result};
use clap::ValueEnum;
use glam::Vec3;
use lightlag_core::{BodyKind, ColliderRef, DestroyReason, Event};
use lightlag_world::{query, World};
use serde::Serialize;

/// Output encoding selected on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// One line of prose per notable event.
    #[default]
    Text,
    /// One JSON object per notable event, then a JSON summary.
    Json,
}

/// Notable event flattened into a serialisable line.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct Record {
    tick: u64,
    time: f32,
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    other: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl Record {
    fn new(tick: u64, time: f32, event: &'static str) -> Self {
        Self {
            tick,
            time,
            event,
            body: None,
            other: None,
            position: None,
            detail: None,
        }
    }

    /// Flattens a world event; per-tick bookkeeping events yield `None`.
    pub(crate) fn from_event(tick: u64, time: f32, event: &Event) -> Option<Self> {
        let record = match event {
            Event::TimeAdvanced { .. } | Event::BodyAdvanced { .. } => return None,
            Event::BodySpawned {
                body,
                kind,
                position,
            } => Self {
                body: Some(body.get()),
                position: Some(*position),
                detail: Some(kind_label(*kind).to_owned()),
                ..Self::new(tick, time, "spawned")
            },
            Event::BodySpawnRejected { kind, reason } => Self {
                detail: Some(format!("{}: {reason}", kind_label(*kind))),
                ..Self::new(tick, time, "spawn_rejected")
            },
            Event::SpeedClamped {
                body,
                intended_speed,
            } => Self {
                body: Some(body.get()),
                detail: Some(format!("intended speed {intended_speed:.2}")),
                ..Self::new(tick, time, "speed_clamped")
            },
            Event::BodyWrapped { body, delta } => Self {
                body: Some(body.get()),
                position: Some(*delta),
                ..Self::new(tick, time, "wrapped")
            },
            Event::TargetHit {
                body,
                target,
                destroyed,
            } => Self {
                body: Some(body.get()),
                other: Some(collider_label(*target)),
                detail: destroyed.then(|| "destroyed".to_owned()),
                ..Self::new(tick, time, "target_hit")
            },
            Event::EnvironmentHit { body, collider } => Self {
                body: Some(body.get()),
                other: Some(collider_label(*collider)),
                ..Self::new(tick, time, "environment_hit")
            },
            Event::BodyDestroyed {
                body,
                position,
                reason,
            } => Self {
                body: Some(body.get()),
                position: Some(*position),
                detail: Some(reason_label(*reason).to_owned()),
                ..Self::new(tick, time, "destroyed")
            },
            Event::ColliderPlaced { collider } => Self {
                other: Some(format!("collider {}", collider.get())),
                ..Self::new(tick, time, "collider_placed")
            },
            Event::ColliderRemoved { collider } => Self {
                other: Some(format!("collider {}", collider.get())),
                ..Self::new(tick, time, "collider_removed")
            },
            Event::SpeedOfLightChanged { speed_of_light } => Self {
                detail: Some(format!("c = {speed_of_light}")),
                ..Self::new(tick, time, "speed_of_light")
            },
            Event::TimeScaleChanged {
                subjective_time_scale,
            } => Self {
                detail: Some(format!("scale = {subjective_time_scale}")),
                ..Self::new(tick, time, "time_scale")
            },
            Event::PlayAreaChanged { bounds } => Self {
                position: Some(bounds.size()),
                ..Self::new(tick, time, "play_area")
            },
            Event::ConfigurationRejected { reason } => Self {
                detail: Some(reason.to_string()),
                ..Self::new(tick, time, "configuration_rejected")
            },
        };
        Some(record)
    }

    fn to_text(&self) -> String {
        let mut line = format!("[{:>5} {:>8.3}s] {}", self.tick, self.time, self.event);
        if let Some(body) = self.body {
            line.push_str(&format!(" body {body}"));
        }
        if let Some(other) = &self.other {
            line.push_str(&format!(" -> {other}"));
        }
        if let Some(position) = self.position {
            line.push_str(&format!(
                " ({:.2}, {:.2}, {:.2})",
                position.x, position.y, position.z
            ));
        }
        if let Some(detail) = &self.detail {
            line.push_str(&format!(" [{detail}]"));
        }
        line
    }
}

fn kind_label(kind: BodyKind) -> &'static str {
    match kind {
        BodyKind::Projectile => "projectile",
        BodyKind::Patroller => "patroller",
    }
}

fn reason_label(reason: DestroyReason) -> &'static str {
    match reason {
        DestroyReason::HitTarget => "hit_target",
        DestroyReason::HitEnvironment => "hit_environment",
        DestroyReason::Struck => "struck",
        DestroyReason::LeftPlayArea => "left_play_area",
        DestroyReason::LifetimeExpired => "lifetime_expired",
        DestroyReason::Faulted => "faulted",
        DestroyReason::Despawned => "despawned",
    }
}

fn collider_label(collider: ColliderRef) -> String {
    match collider {
        ColliderRef::Body(body) => format!("body {}", body.get()),
        ColliderRef::Static(collider) => format!("collider {}", collider.get()),
    }
}

#[derive(Debug, Serialize)]
struct BodyLine {
    id: u32,
    kind: &'static str,
    authoritative: Vec3,
    visual: Vec3,
    lag: f32,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    ticks: u64,
    time: f32,
    subjective_time: f32,
    speed_of_light: f32,
    spawned: u32,
    hits: u32,
    wraps: u32,
    clamps: u32,
    destroyed: BTreeMap<&'static str, u32>,
    bodies: Vec<BodyLine>,
}

/// Streams records to a writer and tallies a run summary.
pub(crate) struct Reporter<W> {
    format: Format,
    out: W,
    summary: Summary,
}

impl<W: Write> Reporter<W> {
    pub(crate) fn new(format: Format, out: W) -> Self {
        Self {
            format,
            out,
            summary: Summary::default(),
        }
    }

    /// Writes a free-form line in text mode; JSON output stays machine-readable.
    pub(crate) fn banner(&mut self, banner: &str) -> Result<()> {
        if self.format == Format::Text {
            writeln!(self.out, "{banner}").context("failed to write banner")?;
        }
        Ok(())
    }

    /// Records every notable event emitted during one tick.
    pub(crate) fn observe(&mut self, tick: u64, time: f32, events: &[Event]) -> Result<()> {
        for event in events {
            self.tally(event);
            let Some(record) = Record::from_event(tick, time, event) else {
                continue;
            };
            match self.format {
                Format::Text => writeln!(self.out, "{}", record.to_text()),
                Format::Json => {
                    let line =
                        serde_json::to_string(&record).context("failed to encode record")?;
                    writeln!(self.out, "{line}")
                }
            }
            .context("failed to write record")?;
        }
        Ok(())
    }

    fn tally(&mut self, event: &Event) {
        match event {
            Event::BodySpawned { .. } => self.summary.spawned += 1,
            Event::TargetHit { .. } => self.summary.hits += 1,
            Event::BodyWrapped { .. } => self.summary.wraps += 1,
            Event::SpeedClamped { .. } => self.summary.clamps += 1,
            Event::BodyDestroyed { reason, .. } => {
                *self
                    .summary
                    .destroyed
                    .entry(reason_label(*reason))
                    .or_insert(0) += 1;
            }
            _ => {}
        }
    }

    /// Writes the end-of-run summary, including every surviving body.
    pub(crate) fn finish(mut self, world: &World) -> Result<W> {
        let now = query::now(world);
        self.summary.ticks = query::tick_index(world);
        self.summary.time = now;
        self.summary.subjective_time = query::subjective_time(world);
        self.summary.speed_of_light = query::dilation(world).speed_of_light();
        self.summary.bodies = query::body_view(world)
            .iter()
            .map(|body| BodyLine {
                id: body.id.get(),
                kind: kind_label(body.kind),
                authoritative: body.authoritative,
                visual: body.visual,
                lag: body.authoritative.distance(body.visual),
            })
            .collect();

        match self.format {
            Format::Text => {
                let summary = &self.summary;
                writeln!(
                    self.out,
                    "{} ticks, {:.3}s world, {:.3}s subjective, c = {}",
                    summary.ticks, summary.time, summary.subjective_time, summary.speed_of_light
                )?;
                writeln!(
                    self.out,
                    "spawned {}, hits {}, wraps {}, clamps {}",
                    summary.spawned, summary.hits, summary.wraps, summary.clamps
                )?;
                for (reason, count) in &summary.destroyed {
                    writeln!(self.out, "destroyed ({reason}): {count}")?;
                }
                for body in &summary.bodies {
                    writeln!(
                        self.out,
                        "body {} {}: at ({:.2}, {:.2}, {:.2}), seen {:.2} behind",
                        body.id,
                        body.kind,
                        body.authoritative.x,
                        body.authoritative.y,
                        body.authoritative.z,
                        body.lag
                    )?;
                }
            }
            Format::Json => {
                let line =
                    serde_json::to_string(&self.summary).context("failed to encode summary")?;
                writeln!(self.out, "{line}")?;
            }
        }
        Ok(self.out)
    }
}
