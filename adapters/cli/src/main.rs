#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Light Lag scenario headlessly.

mod observer;
mod report;
mod scenario;

use std::{io, io::Write, path::PathBuf, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use lightlag_core::{Command, Event};
use lightlag_world::{apply, query, World};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use report::{Format, Reporter};
use scenario::Scenario;

/// Headless light-lag simulation runner.
#[derive(Parser, Debug)]
#[command(name = "lightlag")]
#[command(about = "Run a light-lag scenario and report what happened")]
struct Args {
    /// Scenario file; the built-in demo runs when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Tick length in milliseconds
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Override the scenario's speed of light
    #[arg(long)]
    speed_of_light: Option<f32>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Extra log directive, e.g. `lightlag_world=debug`
    #[arg(long)]
    log: Option<String>,
}

/// Entry point for the Light Lag command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::demo()?,
    };
    let stdout = io::stdout();
    let _ = run(&args, &scenario, stdout.lock())?;
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if let Some(directive) = directive {
        filter = filter.add_directive(
            directive
                .parse()
                .with_context(|| format!("invalid log directive `{directive}`"))?,
        );
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn run<W: Write>(args: &Args, scenario: &Scenario, out: W) -> Result<W> {
    let dt = Duration::from_millis(args.dt_ms);
    ensure!(!dt.is_zero(), "--dt-ms must be at least 1");

    let mut world = World::new();
    let mut reporter = Reporter::new(args.format, out);
    reporter.banner(query::welcome_banner(&world))?;

    let mut events = Vec::new();
    let mut setup = scenario.setup_commands();
    if let Some(speed_of_light) = args.speed_of_light {
        setup.push(Command::ConfigureSpeedOfLight { speed_of_light });
    }
    for command in setup {
        apply(&mut world, command, &mut events);
    }
    reject_setup(&events)?;
    reporter.observe(0, 0.0, &events)?;

    let mut spawning = scenario.spawning()?;
    info!(
        ticks = args.ticks,
        dt_ms = args.dt_ms,
        emitters = spawning.len(),
        speed_of_light = query::dilation(&world).speed_of_light(),
        "running scenario"
    );

    let mut commands = Vec::new();
    for tick in 1..=args.ticks {
        events.clear();
        let now = (query::clock(&world) + dt).as_secs_f32();
        apply(
            &mut world,
            Command::Tick {
                dt,
                observer: scenario.observer.position_at(now),
            },
            &mut events,
        );
        spawning.handle(&events, &mut commands);
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
        }
        reporter.observe(tick, query::now(&world), &events)?;
    }

    reporter.finish(&world)
}

fn reject_setup(events: &[Event]) -> Result<()> {
    for event in events {
        match event {
            Event::ConfigurationRejected { reason } => {
                bail!("scenario configuration rejected: {reason}")
            }
            Event::BodySpawnRejected { kind, reason } => {
                bail!("scenario body ({kind:?}) rejected: {reason}")
            }
            _ => {}
        }
    }
    Ok(())
}
