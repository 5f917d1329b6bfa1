// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Axolemma Run Tool

Runs the membrane simulator for a fixed stretch of simulated time, applies
stimulus pulses at requested simulated times and writes the final history
to stdout.

Usage:
  cargo run --bin axolemma-run -- --duration 50 --stim1-at 5 --format csv
  cargo run --bin axolemma-run -- --stim1-at 5,20 --ttx-block 1.0
  cargo run --bin axolemma-run -- --realtime --tick-hz 60 --stim2-at 10

Logs go to stderr so the output can be piped.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use tracing::{info, warn};

use axolemma::config::{load_config, AxolemmaConfig};
use axolemma::engine::{
    HistorySnapshot, RealtimeRunner, SharedEngine, SimulationEngine, StimulusChannel,
};
use axolemma::observability::{self, CrateDebugFlags, LoggingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "axolemma-run", version, about = "Run the Hodgkin-Huxley membrane simulator")]
struct Args {
    /// Configuration file (default: search for axolemma.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated time to run (ms)
    #[arg(long, default_value_t = 50.0)]
    duration: f64,

    /// Simulated times (ms) at which to fire stimulus 1
    #[arg(long = "stim1-at", value_delimiter = ',')]
    stim1_at: Vec<f64>,

    /// Simulated times (ms) at which to fire stimulus 2
    #[arg(long = "stim2-at", value_delimiter = ',')]
    stim2_at: Vec<f64>,

    /// Stimulus 1 amplitude (µA/cm²)
    #[arg(long, allow_hyphen_values = true)]
    stim1_amplitude: Option<f64>,

    /// Stimulus 1 duration (ms)
    #[arg(long)]
    stim1_duration: Option<f64>,

    /// Stimulus 2 amplitude (µA/cm²)
    #[arg(long, allow_hyphen_values = true)]
    stim2_amplitude: Option<f64>,

    /// Stimulus 2 duration (ms)
    #[arg(long)]
    stim2_duration: Option<f64>,

    /// Fraction of sodium channels blocked (0-1)
    #[arg(long)]
    ttx_block: Option<f64>,

    /// Fraction of potassium channels blocked (0-1)
    #[arg(long)]
    tea_block: Option<f64>,

    /// Remove sodium inactivation
    #[arg(long)]
    pronase: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Pace against the wall clock on a dedicated thread
    #[arg(long)]
    realtime: bool,

    /// Tick frequency (Hz); also sets the synthetic frame length
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (text or json)
    #[arg(long)]
    log_format: Option<String>,

    /// Enable debug logging for a crate (repeatable; `all` for every crate)
    #[arg(long = "debug", value_name = "CRATE")]
    debug: Vec<String>,
}

impl Args {
    /// Overrides in the key format understood by the config loader
    fn config_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };
        put("stim1_amplitude", self.stim1_amplitude.map(|v| v.to_string()));
        put("stim1_duration", self.stim1_duration.map(|v| v.to_string()));
        put("stim2_amplitude", self.stim2_amplitude.map(|v| v.to_string()));
        put("stim2_duration", self.stim2_duration.map(|v| v.to_string()));
        put("ttx_block", self.ttx_block.map(|v| v.to_string()));
        put("tea_block", self.tea_block.map(|v| v.to_string()));
        put("pronase", self.pronase.then(|| "true".to_string()));
        put("tick_hz", self.tick_hz.map(|v| v.to_string()));
        put("log_level", self.log_level.clone());
        put("log_format", self.log_format.clone());
        overrides
    }

    fn debug_flags(&self) -> CrateDebugFlags {
        let mut flags = CrateDebugFlags::from_args(
            self.debug.iter().map(|crate_name| format!("--debug-{}", crate_name)),
        );
        if let Ok(value) = std::env::var("AXOLEMMA_DEBUG") {
            flags.merge_env_value(&value);
        }
        flags
    }
}

/// A pulse to fire once simulated time reaches `time`
#[derive(Debug, Clone, Copy)]
struct ScheduledStimulus {
    time: f64,
    channel: StimulusChannel,
}

fn build_schedule(args: &Args) -> Result<Vec<ScheduledStimulus>> {
    let mut schedule = Vec::new();
    for (channel, times) in [
        (StimulusChannel::One, &args.stim1_at),
        (StimulusChannel::Two, &args.stim2_at),
    ] {
        for &time in times {
            if !(time.is_finite() && time >= 0.0) {
                bail!("{} time must be finite and >= 0, got {}", channel, time);
            }
            schedule.push(ScheduledStimulus { time, channel });
        }
    }
    schedule.sort_by(|a, b| a.time.total_cmp(&b.time));
    Ok(schedule)
}

/// Wall time worth `sim_gap_ms` of simulation, never longer than `frame`.
/// Clamped in f64 so huge gaps cannot overflow `Duration`.
fn wall_delta_until(sim_gap_ms: f64, sim_ms_per_wall_ms: f64, frame: Duration) -> Duration {
    let wall_secs = (sim_gap_ms / sim_ms_per_wall_ms / 1000.0).max(0.0);
    if wall_secs >= frame.as_secs_f64() {
        frame
    } else {
        Duration::from_secs_f64(wall_secs)
    }
}

/// Synthetic frame length for a tick frequency
fn frame_for_frequency(tick_hz: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(1.0 / tick_hz)
        .with_context(|| format!("tick frequency {} Hz gives no usable frame length", tick_hz))
}

/// Drive the engine with synthetic frames, shortening a frame whenever a
/// scheduled pulse falls inside it so onsets land on the requested step.
fn run_headless(
    engine: &mut SimulationEngine,
    schedule: &[ScheduledStimulus],
    duration: f64,
    frame: Duration,
) -> Result<usize> {
    let dt = engine.model().dt();
    let pacing = engine.settings().sim_ms_per_wall_ms;
    let due_tolerance = dt / 2.0;
    let mut pending = schedule.iter().peekable();
    let mut ticks = 0;

    engine.run_for(duration)?;
    loop {
        let now = engine.model().time();
        while let Some(stim) = pending.next_if(|s| s.time <= now + due_tolerance) {
            engine.apply_stimulus(stim.channel, None, None)?;
        }
        if now + due_tolerance >= duration {
            break;
        }
        if !engine.is_running() {
            engine.run_for(duration - now)?;
        }

        let next_stop = pending.peek().map_or(duration, |s| s.time.min(duration));
        engine.tick(wall_delta_until(next_stop - now, pacing, frame));
        ticks += 1;
    }
    engine.stop();
    Ok(ticks)
}

/// Drive the engine from a RealtimeRunner thread, firing pulses as the
/// simulated clock passes their time. Onsets are quantised to ticks.
fn run_realtime(
    engine: SimulationEngine,
    schedule: &[ScheduledStimulus],
    duration: f64,
    tick_hz: f64,
) -> Result<HistorySnapshot> {
    let shared = SharedEngine::new(engine);
    shared.run_for(duration)?;

    let mut runner = RealtimeRunner::new(shared.clone(), tick_hz)?;
    runner.start()?;
    let started = Instant::now();

    let mut pending = schedule.iter().peekable();
    loop {
        let now = shared.with_engine(|e| e.model().time())?;
        while let Some(stim) = pending.next_if(|s| s.time <= now) {
            shared.apply_stimulus(stim.channel, None, None)?;
        }
        if now >= duration {
            break;
        }
        if !shared.with_engine(|e| e.is_running())? {
            shared.run_for(duration - now)?;
        }
        thread::sleep(Duration::from_millis(1));
    }

    runner.stop();
    shared.stop()?;
    info!(
        "[AXOLEMMA-RUN] Realtime run finished: {} ticks in {:.2}s",
        runner.tick_count(),
        started.elapsed().as_secs_f64()
    );
    Ok(shared.snapshot()?)
}

fn write_csv<W: Write>(out: &mut W, snapshot: &HistorySnapshot) -> io::Result<()> {
    writeln!(out, "time_ms,voltage_mv,i_na,i_k,i_l,m,h,n")?;
    for i in 0..snapshot.len() {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            snapshot.time[i],
            snapshot.voltage[i],
            snapshot.i_na[i],
            snapshot.i_k[i],
            snapshot.i_l[i],
            snapshot.gating.m[i],
            snapshot.gating.h[i],
            snapshot.gating.n[i]
        )?;
    }
    Ok(())
}

fn write_output(format: OutputFormat, snapshot: &HistorySnapshot) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, snapshot)
                .context("Failed to write JSON output")?;
            writeln!(out)?;
        }
        OutputFormat::Csv => write_csv(&mut out, snapshot).context("Failed to write CSV output")?,
    }
    out.flush()?;
    Ok(())
}

fn init_logging(args: &Args, config: &AxolemmaConfig) -> Result<()> {
    let logging = LoggingConfig::from_level_and_format(&config.logging.level, &config.logging.format)?;
    observability::init_console_logging(&args.debug_flags(), &logging)
}

fn main() -> Result<()> {
    let matches = Args::command()
        .after_help(observability::debug_flags_help())
        .get_matches();
    let args = Args::from_arg_matches(&matches)?;

    if !(args.duration.is_finite() && args.duration > 0.0) {
        bail!("--duration must be finite and > 0, got {}", args.duration);
    }

    let config = load_config(args.config.as_deref(), Some(&args.config_overrides()))
        .context("Failed to load configuration")?;
    init_logging(&args, &config)?;

    let schedule = build_schedule(&args)?;
    let mut engine = SimulationEngine::from_config(&config)?;
    let tick_hz = config.engine.tick_frequency_hz;

    info!(
        "[AXOLEMMA-RUN] {} ms simulated, {} scheduled pulses, {} mode",
        args.duration,
        schedule.len(),
        if args.realtime { "realtime" } else { "headless" }
    );

    let snapshot = if args.realtime {
        run_realtime(engine, &schedule, args.duration, tick_hz)?
    } else {
        let frame = frame_for_frequency(tick_hz)?;
        let ticks = run_headless(&mut engine, &schedule, args.duration, frame)?;
        info!("[AXOLEMMA-RUN] Headless run finished after {} ticks", ticks);
        engine.snapshot()
    };

    if snapshot.len() >= config.engine.history_capacity {
        warn!(
            "[AXOLEMMA-RUN] ⚠️ History is full ({} samples); the start of the run was dropped",
            snapshot.len()
        );
    }

    write_output(args.format, &snapshot)
}
