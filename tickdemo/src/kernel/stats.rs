/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Tick hook: trace pulse and coarse CPU-utilization accounting.
//!
//! [`TickHook::on_tick`] is called by the scheduler once per tick and is the
//! only writer of [`RuntimeStats`].  Everyone else reads a `Copy` snapshot.

use crate::hal::{DigitalIo, Level, PinId};

/// Total vs. idle tick counters.
///
/// Invariant: `idle_ticks <= total_ticks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub total_ticks: u64,
    pub idle_ticks: u64,
}

impl RuntimeStats {
    /// Fraction of ticks in which some task executed, in `[0, 1]`.
    ///
    /// `0.0` before the first tick.
    pub fn utilization(&self) -> f64 {
        if self.total_ticks == 0 {
            return 0.0;
        }
        1.0 - self.idle_ticks as f64 / self.total_ticks as f64
    }

    pub fn busy_ticks(&self) -> u64 {
        self.total_ticks - self.idle_ticks
    }

    fn record(&mut self, busy: bool) {
        self.total_ticks += 1;
        if !busy {
            self.idle_ticks += 1;
        }
    }
}

/// Raises then lowers a dedicated trace line once per tick.
#[derive(Debug, Clone, Copy)]
pub struct TickTracer {
    pin: PinId,
}

impl TickTracer {
    pub fn new(pin: PinId) -> Self {
        Self { pin }
    }

    pub fn pulse(&self, io: &mut dyn DigitalIo) {
        io.write(self.pin, Level::High);
        io.write(self.pin, Level::Low);
    }
}

/// Everything that runs synchronously on each tick.
#[derive(Debug)]
pub struct TickHook {
    tracer: TickTracer,
    stats: RuntimeStats,
}

impl TickHook {
    pub fn new(tracer: TickTracer) -> Self {
        Self {
            tracer,
            stats: RuntimeStats::default(),
        }
    }

    /// `busy` tells whether any task executed in the slot that just ended.
    pub fn on_tick(&mut self, io: &mut dyn DigitalIo, busy: bool) {
        self.tracer.pulse(io);
        self.stats.record(busy);
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
