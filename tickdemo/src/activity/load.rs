/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Synthetic CPU load.
//!
//! Each release burns a calibrated number of loop iterations.  On the
//! reference target 33 200 iterations take about 5 ms and 80 000 about 12 ms;
//! at a 1 kHz tick those are 5 and 12 tick slots on the simulated dispatcher.

use std::hint::black_box;

use super::{Activity, ActivityContext};
use crate::kernel::Tick;

/// Iterations for roughly 5 ms of work on the reference target.
pub const LOAD_1_ITERATIONS: u64 = 33_200;

/// Iterations for roughly 12 ms of work on the reference target.
pub const LOAD_2_ITERATIONS: u64 = 80_000;

/// Spin for `iterations` rounds of an accumulation the optimiser cannot
/// remove.  Returns the accumulator so callers can keep it observable.
pub fn simulated_work(iterations: u64) -> u64 {
    let mut acc: u64 = 0;
    for i in 0..iterations {
        acc = black_box(acc.wrapping_add(black_box(i)));
    }
    acc
}

/// Consumes CPU time on every release; no I/O, no queue traffic.
#[derive(Debug, Clone)]
pub struct LoadSimulator {
    iterations: u64,
    execution_ticks: Tick,
    last_result: u64,
}

impl LoadSimulator {
    /// `iterations` of real work per release, declared to the dispatcher as
    /// `execution_ticks` tick slots.
    pub fn new(iterations: u64, execution_ticks: Tick) -> Self {
        Self {
            iterations,
            execution_ticks,
            last_result: 0,
        }
    }

    /// Accumulator of the most recent release.
    pub fn last_result(&self) -> u64 {
        self.last_result
    }
}

impl Activity for LoadSimulator {
    fn run(&mut self, _ctx: &mut ActivityContext<'_>) {
        self.last_result = simulated_work(self.iterations);
    }

    fn execution_ticks(&self) -> Tick {
        self.execution_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::testing::run_once;
    use crate::hal::sim::SimBoard;

    #[test]
    fn simulated_work_is_deterministic() {
        // Sum of 0..n
        assert_eq!(simulated_work(0), 0);
        assert_eq!(simulated_work(10), 45);
        assert_eq!(simulated_work(LOAD_1_ITERATIONS), simulated_work(LOAD_1_ITERATIONS));
        assert_eq!(
            simulated_work(LOAD_2_ITERATIONS),
            LOAD_2_ITERATIONS * (LOAD_2_ITERATIONS - 1) / 2
        );
    }

    #[test]
    fn load_touches_no_peripherals() {
        let mut load = LoadSimulator::new(LOAD_1_ITERATIONS, 5);
        let mut board = SimBoard::capture(1_000_000);
        run_once(&mut load, &mut board, 0);

        assert_eq!(load.execution_ticks(), 5);
        assert_eq!(load.last_result(), simulated_work(LOAD_1_ITERATIONS));
        assert_eq!(board.gpio.write_count(), 0);
        assert!(board.serial.tx_buffer().is_empty());
    }
}
