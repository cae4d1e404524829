/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use tickdemo::app::{self, System};
use tickdemo::config::DemoConfig;
use tickdemo::hal::sim::{CaptureSerial, ConsoleSerial};
use tickdemo::hal::{Board, SerialPort};
use tickdemo::kernel::Tick;
use tickdemo::runtime::{self, StopReason};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Fixed-priority periodic task demo on a simulated board.
///
/// Example:
///   tickdemo --config config/saturation.yaml --hyperperiods 20
#[derive(Debug, Parser)]
#[command(
    name = "tickdemo",
    about = "Fixed-priority periodic task demo – tick-driven scheduler on a simulated board",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML task-set configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Number of ticks to run (overrides --hyperperiods).
    #[arg(short = 't', long = "ticks")]
    ticks: Option<Tick>,

    /// Number of hyperperiods to run (default 10; unlimited with --realtime).
    #[arg(short = 'H', long = "hyperperiods")]
    hyperperiods: Option<u64>,

    /// Pace ticks against wall-clock time; stop with Ctrl-C.
    #[arg(short = 'r', long = "realtime", default_value_t = false)]
    realtime: bool,

    /// Capture serial output in memory instead of printing it.
    #[arg(short = 'q', long = "quiet-serial", default_value_t = false)]
    quiet_serial: bool,
}

const DEFAULT_HYPERPERIODS: u64 = 10;

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("tickdemo starting up...");

    let cli = Cli::parse();

    info!(
        config       = ?cli.config,
        ticks        = ?cli.ticks,
        hyperperiods = ?cli.hyperperiods,
        realtime     = cli.realtime,
        quiet_serial = cli.quiet_serial,
        "Command line"
    );

    // ── Load task-set configuration ───────────────────────────────────────────
    let config = match &cli.config {
        Some(path) => match DemoConfig::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to load configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, running the stock task set");
            DemoConfig::default()
        }
    };

    info!(
        tick_rate_hz = config.tick_rate_hz,
        queue_length = config.queue_length,
        baud_rate = config.baud_rate,
        "Board configuration"
    );
    app::log_feasibility(&config);

    let limit = match run_length(&cli, &config) {
        Ok(limit) => limit,
        Err(e) => {
            error!("Cannot determine run length: {:#}", e);
            process::exit(1);
        }
    };

    let result = if cli.quiet_serial {
        run(&cli, &config, CaptureSerial::new(), limit).await
    } else {
        run(&cli, &config, ConsoleSerial, limit).await
    };
    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        process::exit(1);
    }
}

/// Tick limit for this run; `None` means "until Ctrl-C".
fn run_length(cli: &Cli, config: &DemoConfig) -> anyhow::Result<Option<Tick>> {
    if let Some(ticks) = cli.ticks {
        return Ok(Some(ticks));
    }
    let hyperperiods = match (cli.hyperperiods, cli.realtime) {
        (Some(n), _) => n,
        (None, true) => return Ok(None),
        (None, false) => DEFAULT_HYPERPERIODS,
    };
    let hyper = app::hyperperiod_of(config)?;
    info!(hyperperiod = hyper, hyperperiods, "Run length derived from task periods");
    Ok(Some(hyper.saturating_mul(hyperperiods)))
}

async fn run<S: SerialPort>(
    cli: &Cli,
    config: &DemoConfig,
    serial: S,
    limit: Option<Tick>,
) -> anyhow::Result<()> {
    let board = app::sim_board(config, serial);
    let mut system = match app::build_system(config, board) {
        Ok(system) => system,
        Err(e) => {
            error!("Fatal startup error: {e}");
            app::halt();
        }
    };
    info!(startup_timer = system.startup_timer, "System running");

    if cli.realtime {
        let reason = runtime::run_realtime(
            &mut system.scheduler,
            config.tick_rate_hz,
            limit,
            Duration::from_secs(1),
        )
        .await?;
        if reason == StopReason::Interrupted {
            info!("Interrupted after {} ticks", system.scheduler.now());
        }
    } else {
        // `limit` is always set outside real-time mode.
        system.scheduler.run_for(limit.unwrap_or_default());
    }

    // Terminate the last forwarded line.
    system.scheduler.board_mut().serial().put_char(b'\n');
    print_summary(&system);
    Ok(())
}

fn print_summary<B: Board>(system: &System<B>) {
    let stats = system.scheduler.stats();
    let queue = system.queue.counters();

    info!(
        total_ticks = stats.total_ticks,
        busy_ticks = stats.busy_ticks(),
        idle_ticks = stats.idle_ticks,
        utilization = %format!("{:.1}%", stats.utilization() * 100.0),
        "Runtime stats"
    );
    info!(
        accepted = queue.accepted,
        dropped = queue.dropped,
        delivered = queue.delivered,
        occupancy = system.queue.len(),
        capacity = system.queue.capacity(),
        "Message queue"
    );

    info!("{} task(s):", system.scheduler.tasks().len());
    for task in system.scheduler.tasks() {
        info!(
            "  [{name}]  prio={prio}  period={period}  deadline={deadline}  releases={rel}  executed={exec}  next={next}",
            name = task.name,
            prio = task.priority,
            period = task.period,
            deadline = task.deadline,
            rel = task.releases,
            exec = task.executed_ticks,
            next = task.next_release,
        );
    }
}
