/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Absolute-time release schedule for one periodic task.
//!
//! The next release is always `previous release + period`, never
//! `completion time + period`.  Execution jitter therefore never accumulates
//! into the period:
//!
//! ```text
//! release:   0         P         2P        3P
//!            |▇▇▇      |▇        |▇▇▇▇▇    |▇▇
//!            └─ run ─┘ └─ run ─┘  ...        (start times stay on the grid)
//! ```
//!
//! When a job overruns past its next release, [`ReleaseClock::delay_until`]
//! returns a tick that is already in the past, so the task is released again
//! at once.  Only one period is added per completion, so the schedule catches
//! up one release at a time.  The miss itself is not recorded.

use super::Tick;

/// Tracks the last wake time of a task and computes its next release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseClock {
    last_wake: Tick,
    period: Tick,
}

impl ReleaseClock {
    /// A schedule whose first release is `start`.
    pub fn new(start: Tick, period: Tick) -> Self {
        Self {
            last_wake: start,
            period,
        }
    }

    pub fn period(&self) -> Tick {
        self.period
    }

    /// The release the task is currently waiting for (or last received).
    pub fn release_at(&self) -> Tick {
        self.last_wake
    }

    /// `true` once the clock has reached the pending release.
    pub fn is_due(&self, now: Tick) -> bool {
        now >= self.last_wake
    }

    /// Advance to the next absolute release and return it.
    ///
    /// The result may be `<= now` after an overrun; the caller then releases
    /// the task immediately.
    pub fn delay_until(&mut self) -> Tick {
        self.last_wake = self.last_wake.saturating_add(self.period);
        self.last_wake
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
