/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic activities: the work a task performs once per release.
//!
//! An [`Activity`] is the entry function of a periodic task.  The scheduler
//! calls [`Activity::run`] when the task's job is first dispatched; the task
//! then stays busy for [`Activity::execution_ticks`] tick slots before it
//! suspends until its next absolute release.
//!
//! | Activity | Queue role | Execution demand |
//! |---|---|---|
//! | [`DigitalInputMonitor`] | producer (edge events) | < 1 tick |
//! | [`PeriodicTransmitter`] | producer (fixed message) | < 1 tick |
//! | [`QueueForwarder`] | consumer → serial | < 1 tick |
//! | [`LoadSimulator`] | none | calibrated, several ticks |

pub mod forwarder;
pub mod load;
pub mod monitor;
pub mod transmitter;

pub use forwarder::QueueForwarder;
pub use load::{simulated_work, LoadSimulator};
pub use monitor::DigitalInputMonitor;
pub use transmitter::PeriodicTransmitter;

use crate::hal::{Board, DigitalIo, SerialPort};
use crate::kernel::Tick;

/// Entry function of a periodic task.
pub trait Activity {
    /// Perform one release worth of work.
    fn run(&mut self, ctx: &mut ActivityContext<'_>);

    /// Whole tick slots of CPU one release consumes on the simulated
    /// dispatcher.  `0` means the work finishes inside the slot it starts in.
    fn execution_ticks(&self) -> Tick {
        0
    }
}

/// What an activity can reach while it runs: the current tick and the board
/// peripherals.  Queue handles are owned by the activities themselves.
pub struct ActivityContext<'a> {
    now: Tick,
    board: &'a mut dyn Board,
}

impl<'a> ActivityContext<'a> {
    pub(crate) fn new(now: Tick, board: &'a mut dyn Board) -> Self {
        Self { now, board }
    }

    /// Tick at which this job was dispatched.
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn gpio(&mut self) -> &mut dyn DigitalIo {
        self.board.gpio()
    }

    pub fn serial(&mut self) -> &mut dyn SerialPort {
        self.board.serial()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for activity tests.

    use super::*;
    use crate::hal::sim::SimBoard;

    /// Run `activity` once against `board` at tick `now`.
    pub fn run_once(activity: &mut dyn Activity, board: &mut SimBoard, now: Tick) {
        let mut ctx = ActivityContext::new(now, board);
        activity.run(&mut ctx);
    }
}
