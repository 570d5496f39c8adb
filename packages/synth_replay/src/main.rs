use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use synth_replay::{Capture, ReplayReport, replay};
use synth_tracker::{SessionEvent, load_tracker_config};
use tracing::info;

#[derive(Parser)]
#[command(name = "synth-replay")]
#[command(version)]
#[command(about = "Replay a recorded crafting capture through the session tracker")]
struct Args {
    /// Capture file (JSONL)
    capture: PathBuf,

    /// Tracker config file (default: synth.toml, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Exit with an error if the replay recorded any diagnostics
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = if args.debug {
        "synth_replay=debug,synth_tracker=debug"
    } else {
        "synth_replay=info,synth_tracker=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_tracker_config(args.config.as_deref()).context("Failed to load config")?;
    let capture = Capture::read(&args.capture)
        .with_context(|| format!("Failed to read capture {}", args.capture.display()))?;
    info!("Loaded capture {}", args.capture.display());

    let report = replay(&capture, config);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    if args.strict && report.diagnostics_total > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_text(report: &ReplayReport) {
    for timed in &report.events {
        let line = match &timed.event {
            SessionEvent::PhaseChanged { from, to } => format!("{from} -> {to}"),
            SessionEvent::Started {
                recipe_id,
                step,
                trial,
                ..
            } => format!(
                "started recipe #{recipe_id}{}: {step}",
                if *trial { " (trial)" } else { "" }
            ),
            SessionEvent::Advanced { step, .. } => format!("advanced: {step}"),
            SessionEvent::Finished {
                step, cancelled, ..
            } => format!(
                "{}: {step}",
                if *cancelled { "cancelled" } else { "finished" }
            ),
            SessionEvent::Interrupted { recipe_id, .. } => match recipe_id {
                Some(id) => format!("interrupted recipe #{id}"),
                None => "interrupted".to_string(),
            },
            SessionEvent::QuickSynthProgress { current, max } => {
                format!("quick synthesis {current}/{max}")
            }
        };
        println!("{:>8}ms  {}", timed.at_ms, line);
    }

    if !report.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for record in &report.diagnostics {
            println!("  [{}] {}", record.phase, record.diagnostic);
        }
    }

    let summary = &report.summary;
    println!();
    println!("Final phase: {}", report.final_phase);
    println!(
        "Sessions: {} started, {} finished ({} cancelled), {} interrupted",
        summary.started, summary.finished, summary.cancelled, summary.interrupted
    );
    println!("Steps advanced: {}", summary.advanced);
    println!("Quick synthesis updates: {}", summary.quick_synth_updates);
    println!("Diagnostics: {}", report.diagnostics_total);
}
