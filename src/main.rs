/*============================================================
  Synavera Project: Syn-Apk
  Module: synapk_probe::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for the Syn-Apk probe. Registers the probe,
    drives measurement cycles against the apk solver, and
    emits upgradable-package gauges for the monitoring layer.

  Security / Safety Notes:
    Operates within user privileges. Executes the apk binary
    in read-only, no-cache, simulate mode only; no network
    requests are issued by the probe itself.

  Dependencies:
    clap for CLI parsing, tokio for the cycle scheduler,
    chrono for session timestamps.

  Operational Scope:
    Invoked by a monitoring agent per tick, or run standalone
    with --interval as its own scheduler.

  Revision History:
    2026-07-28 COD  Authored Syn-Apk probe runtime.
    2026-08-03 COD  Added OS identity enrichment and dry-run.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod change;
mod collect;
mod config;
mod error;
mod logger;
mod os_release;
mod payload;
mod probe;
mod solver;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::ProbeConfig;
use error::{ProbeError, Result};
use logger::Logger;
use probe::{MetricSink, Probe, StdoutSink};
use solver::{ApkCli, PackageBackend};

/// Command-line arguments for the Syn-Apk probe.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Apk-Probe",
    version,
    author = "Synavera Systems",
    about = "Upgradable-package measurement probe for Syn-Apk"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Alternate installation root handed to the solver.
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,
    /// Seconds between cycles; 0 runs a single cycle and exits.
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,
    /// Override the metric plugin instance name.
    #[arg(long, value_name = "NAME")]
    instance: Option<String>,
    /// Print the measurement instead of dispatching it.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Apk-Probe] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref();
    let mut config = ProbeConfig::load_from_optional_path(config_path)?;
    if let Some(root) = cli.root {
        config.apk.root = Some(root);
    }
    if let Some(interval) = cli.interval {
        config.probe.interval_secs = interval;
    }
    if let Some(instance) = cli.instance {
        config.probe.instance = instance;
    }

    if config.probe.instance.trim().is_empty() {
        return Err(ProbeError::Config(
            "Metric instance name cannot be empty".into(),
        ));
    }

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .or_else(|| Some(config.log_dir().join(format!("probe_{session_stamp}.log"))));
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.info("INIT", "Syn-Apk probe awakening.");

    let probe = Probe::register(&config, &logger);
    let backend = ApkCli::new(&config.apk);

    if cli.dry_run {
        run_cycles(&probe, &backend, &DryRunSink, &config, &logger).await?;
    } else {
        run_cycles(&probe, &backend, &StdoutSink, &config, &logger).await?;
    }

    logger.info("COMPLETE", "Measurement duty discharged.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

/// Run a single cycle, or act as the scheduler when an interval is set.
/// In scheduled mode a failed cycle is logged and the next one starts
/// fresh; no error state is carried over.
async fn run_cycles<B, S>(
    probe: &Probe,
    backend: &B,
    sink: &S,
    config: &ProbeConfig,
    logger: &Logger,
) -> Result<()>
where
    B: PackageBackend,
    S: MetricSink,
{
    if config.probe.interval_secs == 0 {
        return probe.read_cycle(backend, sink, logger).await;
    }

    let interval = Duration::from_secs(config.probe.interval_secs);
    loop {
        if let Err(err) = probe.read_cycle(backend, sink, logger).await {
            logger.error("CYCLE", format!("cycle failed: {err}"));
        }
        tokio::time::sleep(interval).await;
    }
}

/// Sink used by --dry-run: shows what would be dispatched.
struct DryRunSink;

impl MetricSink for DryRunSink {
    fn dispatch_gauge(
        &self,
        instance: &str,
        type_name: &str,
        value: f64,
        meta: &str,
    ) -> Result<()> {
        println!("→ Measurement dry-run. {instance}/{type_name} value={value} meta={meta}");
        Ok(())
    }
}
