//! CLI Entry Point for breath-pattern
//!
//! Runs the breathing analysis engine over a sample source and reports
//! classification changes as they happen:
//! - `simulate`: a synthetic triangle or sine breathing signal
//! - `replay`: a recorded `timestamp_ms,value` CSV trace
//! - `config`: print the effective configuration
//!
//! By default samples are processed as fast as possible. With `--realtime` they
//! are paced at the source's nominal interval until the source ends or Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! breath-pattern simulate --period 8 --cycles 10
//! breath-pattern --json replay session.csv
//! BREATH_PATTERN_ANALYSIS__CAPACITY=450 breath-pattern simulate
//! ```

use anyhow::{Context, Result};
use breath_pattern::analysis::phases::BreathPhase;
use breath_pattern::analysis::{Breathing, BreathingType};
use breath_pattern::config::Settings;
use breath_pattern::engine::{AnalysisSnapshot, BreathingEngine};
use breath_pattern::logging;
use breath_pattern::source::synthetic::{SyntheticBreath, Waveform};
use breath_pattern::source::{step, PumpStats, SampleSource, Step};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Cycles simulated when neither a count nor real-time pacing is requested.
const DEFAULT_CYCLES: f64 = 6.0;

#[derive(Parser)]
#[command(name = "breath-pattern")]
#[command(about = "Streaming breathing-pattern analysis", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/breath_pattern.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON lines instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Pace samples at the source's nominal interval
    #[arg(long, global = true)]
    realtime: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a synthetic breathing signal
    Simulate {
        /// Breath period in seconds
        #[arg(long)]
        period: Option<f64>,

        /// Peak amplitude
        #[arg(long)]
        amplitude: Option<f64>,

        /// Half-width of uniform noise
        #[arg(long)]
        noise: Option<f64>,

        /// Number of breath cycles to generate
        #[arg(long)]
        cycles: Option<f64>,

        /// Noise RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Waveform shape
        #[arg(long, value_enum)]
        waveform: Option<WaveformArg>,
    },

    /// Analyze a recorded CSV trace
    Replay {
        /// CSV file with `timestamp_ms,value` columns
        file: PathBuf,

        /// Nominal sample spacing used with --realtime
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum WaveformArg {
    Triangle,
    Sine,
}

impl From<WaveformArg> for Waveform {
    fn from(arg: WaveformArg) -> Self {
        match arg {
            WaveformArg::Triangle => Waveform::Triangle,
            WaveformArg::Sine => Waveform::Sine,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;
    logging::init_from_settings(&settings)?;

    if let Commands::Config = cli.command {
        print!("{}", settings.to_toml_string()?);
        return Ok(());
    }

    let (mut source, origin_ms) = build_source(&cli, &settings)?;
    let mut engine = BreathingEngine::new(settings.analysis.clone(), origin_ms)?;
    info!(source = %source.describe(), realtime = cli.realtime, "Starting analysis");

    let mut reporter = Reporter::new(cli.json);
    let stats = drive(source.as_mut(), &mut engine, &mut reporter, cli.realtime).await?;
    reporter.finish(&engine.snapshot(), stats)?;
    Ok(())
}

fn build_source(cli: &Cli, settings: &Settings) -> Result<(Box<dyn SampleSource>, i64)> {
    match &cli.command {
        Commands::Simulate {
            period,
            amplitude,
            noise,
            cycles,
            seed,
            waveform,
        } => {
            let mut config = settings.source.clone();
            if let Some(period) = period {
                config.period_s = *period;
            }
            if let Some(amplitude) = amplitude {
                config.amplitude = *amplitude;
            }
            if let Some(noise) = noise {
                config.noise = *noise;
            }
            if let Some(seed) = seed {
                config.seed = *seed;
            }
            if let Some(waveform) = waveform {
                config.waveform = (*waveform).into();
            }
            match cycles {
                Some(cycles) => config.samples = Some(config.samples_for_cycles(*cycles)),
                None if config.samples.is_none() && !cli.realtime => {
                    config.samples = Some(config.samples_for_cycles(DEFAULT_CYCLES));
                }
                None => {}
            }
            let origin_ms = config.start_ms;
            Ok((Box::new(SyntheticBreath::new(config)?), origin_ms))
        }
        Commands::Replay { file, interval_ms } => {
            replay_source(file, *interval_ms).map(|source| (source, 0))
        }
        Commands::Config => anyhow::bail!("the config command has no sample source"),
    }
}

#[cfg(feature = "csv_replay")]
fn replay_source(file: &std::path::Path, interval_ms: u64) -> Result<Box<dyn SampleSource>> {
    use breath_pattern::source::csv_replay::CsvReplay;
    let replay = CsvReplay::open(file, interval_ms)
        .with_context(|| format!("failed to open trace {}", file.display()))?;
    Ok(Box::new(replay))
}

#[cfg(not(feature = "csv_replay"))]
fn replay_source(_file: &std::path::Path, _interval_ms: u64) -> Result<Box<dyn SampleSource>> {
    Err(breath_pattern::BreathError::FeatureNotEnabled("csv_replay".to_string()).into())
}

async fn drive(
    source: &mut dyn SampleSource,
    engine: &mut BreathingEngine,
    reporter: &mut Reporter,
    realtime: bool,
) -> Result<PumpStats> {
    let mut stats = PumpStats::default();

    if !realtime {
        while let Some(outcome) = step(source, engine, &mut stats)? {
            reporter.observe(&outcome)?;
        }
        return Ok(stats);
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(source.nominal_interval_ms().max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match step(source, engine, &mut stats)? {
                    Some(outcome) => reporter.observe(&outcome)?,
                    None => break,
                }
            }
            result = &mut shutdown => {
                result?;
                info!("Interrupted, stopping");
                break;
            }
        }
    }
    Ok(stats)
}

/// One line of `--json` output.
#[derive(Serialize)]
struct Report<'a> {
    event: &'static str,
    sequence: u64,
    timestamp_ms: Option<i64>,
    breathing: &'a Breathing,
    current_phase: Option<BreathPhase>,
    maxima: usize,
    minima: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<PumpStats>,
}

impl<'a> Report<'a> {
    fn new(event: &'static str, snapshot: &'a AnalysisSnapshot) -> Self {
        Self {
            event,
            sequence: snapshot.sequence,
            timestamp_ms: snapshot.latest_sample().map(|s| s.timestamp_ms),
            breathing: &snapshot.breathing,
            current_phase: snapshot.current_phase,
            maxima: snapshot.extrema.maxima.len(),
            minima: snapshot.extrema.minima.len(),
            stats: None,
        }
    }
}

struct Reporter {
    json: bool,
    last_kind: BreathingType,
}

impl Reporter {
    fn new(json: bool) -> Self {
        Self {
            json,
            last_kind: BreathingType::Calculating,
        }
    }

    fn observe(&mut self, outcome: &Step) -> Result<()> {
        let Step::Accepted(snapshot) = outcome else {
            return Ok(());
        };
        if snapshot.breathing.kind == self.last_kind {
            return Ok(());
        }
        self.last_kind = snapshot.breathing.kind;
        self.emit_change(snapshot)
    }

    fn emit_change(&self, snapshot: &Arc<AnalysisSnapshot>) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&Report::new("classification", snapshot))?);
            return Ok(());
        }
        let breathing = &snapshot.breathing;
        if breathing.kind.is_determined() {
            println!(
                "[sample {:>5}] {} ({}, period {:.1}s)",
                snapshot.sequence, breathing.kind, breathing.detail, breathing.period
            );
        } else {
            println!("[sample {:>5}] {}", snapshot.sequence, breathing.kind);
        }
        Ok(())
    }

    fn finish(&self, snapshot: &AnalysisSnapshot, stats: PumpStats) -> Result<()> {
        if self.json {
            let report = Report {
                stats: Some(stats),
                ..Report::new("summary", snapshot)
            };
            println!("{}", serde_json::to_string(&report)?);
            return Ok(());
        }

        println!();
        println!("Samples accepted: {}", stats.accepted);
        if stats.rejected > 0 {
            println!("Samples rejected: {}", stats.rejected);
        }
        println!(
            "Extrema in window: {} maxima, {} minima",
            snapshot.extrema.maxima.len(),
            snapshot.extrema.minima.len()
        );
        println!("Final classification: {}", snapshot.breathing.kind);
        if let Some(rate) = snapshot.breathing.rate_per_minute() {
            println!("Breathing rate: {:.1} breaths/min", rate);
        }
        Ok(())
    }
}
