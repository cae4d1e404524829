/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Wall-clock pacing of the simulated scheduler.
//!
//! The scheduler advances one tick per `1 / tick_rate_hz` seconds on the
//! calling task.  Tick `n` is due `n / tick_rate_hz` seconds after the run
//! starts, computed from the start instant each time so rates that do not
//! divide a second evenly do not accumulate rounding error.  A spawned
//! reporter observes [`RuntimeStats`] snapshots through a `watch` channel and
//! logs them periodically.  The loop ends after an optional tick limit or on
//! Ctrl-C.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::hal::Board;
use crate::kernel::{RuntimeStats, Scheduler, Tick};

/// Why [`run_realtime`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickLimit,
    Interrupted,
}

/// Offset of tick `n` from the start of a run at `tick_rate_hz`, rounded down
/// to the nanosecond.  A zero rate is treated as 1 Hz.
pub fn tick_offset(n: Tick, tick_rate_hz: u32) -> Duration {
    let nanos = u128::from(n) * 1_000_000_000 / u128::from(tick_rate_hz.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Drive `scheduler` in real time until `limit` ticks have run (`None` runs
/// until Ctrl-C).  Stats are logged every `report_every`.
///
/// Late ticks run back to back so the tick count keeps up with wall time.
///
/// # Errors
/// Fails if the Ctrl-C handler cannot be installed.
pub async fn run_realtime<B: Board>(
    scheduler: &mut Scheduler<B>,
    tick_rate_hz: u32,
    limit: Option<Tick>,
    report_every: Duration,
) -> Result<StopReason> {
    let start = Instant::now();
    let first_tick = scheduler.now();

    let (stats_tx, stats_rx) = watch::channel(scheduler.stats());
    let reporter = tokio::spawn(report_stats(stats_rx, report_every));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(tick_rate_hz, ?limit, "Real-time run started");

    let reason = loop {
        if limit.is_some_and(|l| scheduler.now() >= l) {
            break StopReason::TickLimit;
        }
        let due = start + tick_offset(scheduler.now() - first_tick, tick_rate_hz);
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                info!("Shutdown requested");
                break StopReason::Interrupted;
            }
            _ = time::sleep_until(due) => {
                scheduler.tick();
                stats_tx.send_replace(scheduler.stats());
            }
        }
    };

    // Closing the channel stops the reporter.
    drop(stats_tx);
    if let Err(e) = reporter.await {
        debug!("Stats reporter ended abnormally: {e}");
    }
    Ok(reason)
}

async fn report_stats(mut rx: watch::Receiver<RuntimeStats>, every: Duration) {
    let mut ticker = time::interval(every);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let s = *rx.borrow();
                info!(
                    total_ticks = s.total_ticks,
                    idle_ticks = s.idle_ticks,
                    utilization = %format!("{:.1}%", s.utilization() * 100.0),
                    "Runtime stats"
                );
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
