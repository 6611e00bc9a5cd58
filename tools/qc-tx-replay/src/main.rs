//! QC-Tx-Replay: replay a chain event log through the transaction lifecycle
//! tracker and print the resulting notification log.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QC_JSON_LOGS` | `false` | JSON log lines on stderr |
//! | `QC_TRACKER_MEMOIZE` | `true` | Memoize collaborator predicates |
//! | `QC_TRACKER_UNPIN` | `true` | Unpin removed blocks |
//! | `QC_TRACKER_MAX_DEPTH` | `100000` | Ancestry walk bound |

mod replay;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qc_18_tx_lifecycle::{TrackerConfig, TxNotification};
use replay::{replay, Comparison, Scenario};

/// Replay a chain event log through the transaction lifecycle tracker
#[derive(Parser, Debug)]
#[command(name = "qc-tx-replay")]
#[command(about = "Replay chain events and print settled/done notifications")]
struct Args {
    /// Scenario file: scripted chain answers plus the event log
    #[arg(short, long)]
    input: PathBuf,

    /// Write the notification log here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Expected notification log to score the replay against
    #[arg(short, long)]
    expected: Option<PathBuf>,

    /// Query the chain reader directly, without memoization
    #[arg(long)]
    no_memoize: bool,
}

fn init_tracing() -> Result<()> {
    let level = env::var("QC_LOG_LEVEL")
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let json_logs = env::var("QC_JSON_LOGS")
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_new(&level).context("Invalid log filter")?;

    // stdout carries the notification log
    if json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing()?;

    let mut config = TrackerConfig::from_env();
    if args.no_memoize {
        config = config.with_memoization(false);
    }
    info!(?config, input = %args.input.display(), "Starting replay");

    let scenario = Scenario::from_json(&read_file(&args.input)?)?;
    let outcome = replay(scenario, config)?;

    let log = serde_json::to_string_pretty(&outcome.notifications)
        .context("Failed to serialize notification log")?;
    match &args.output {
        Some(path) => fs::write(path, log)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", log),
    }

    eprintln!(
        "Collaborator calls: get_body={} is_tx_valid={} is_tx_successful={} (redundant: {})",
        outcome.calls.get_body,
        outcome.calls.is_tx_valid,
        outcome.calls.is_tx_successful,
        outcome.calls.redundant
    );

    let Some(expected_path) = &args.expected else {
        return Ok(ExitCode::SUCCESS);
    };

    let expected: Vec<TxNotification> = serde_json::from_str(&read_file(expected_path)?)
        .with_context(|| format!("Failed to parse {}", expected_path.display()))?;
    let comparison = Comparison::compare(&expected, &outcome.notifications);

    eprintln!(
        "Score: {:.3} ({}/{} matched, {} emitted)",
        comparison.score(),
        comparison.matched,
        comparison.expected,
        comparison.actual
    );

    match &comparison.first_mismatch {
        None => Ok(ExitCode::SUCCESS),
        Some(mismatch) => {
            warn!(index = mismatch.index, "Notification log differs");
            eprintln!("First mismatch at #{}:", mismatch.index);
            eprintln!("  expected: {:?}", mismatch.expected);
            eprintln!("  actual:   {:?}", mismatch.actual);
            Ok(ExitCode::FAILURE)
        }
    }
}
