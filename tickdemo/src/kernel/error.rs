/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Startup failures of the task manager.
//!
//! Every variant is raised before the scheduler starts running.  The
//! application treats all of them as fatal: it logs the error and halts.

use thiserror::Error;

use super::Tick;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The fixed task table has no free entry.
    #[error("task table is full ({max} tasks) — cannot create '{task}'")]
    TaskTableFull { task: String, max: usize },

    /// The kernel heap cannot satisfy an allocation (task stack + control
    /// block, queue storage, or the idle task stack).
    #[error("heap exhausted allocating {what}: requested {requested} bytes, {available} available")]
    HeapExhausted {
        what: String,
        requested: usize,
        available: usize,
    },

    /// Another task already holds this priority.
    #[error("priority {priority} for task '{task}' is already used by '{holder}'")]
    DuplicatePriority {
        task: String,
        priority: u8,
        holder: String,
    },

    /// Priority outside `1..max_priorities` (0 belongs to the idle task).
    #[error("priority {priority} for task '{task}' is out of range 1..{max_priorities}")]
    InvalidPriority {
        task: String,
        priority: u8,
        max_priorities: u8,
    },

    /// A periodic task needs a period of at least one tick.
    #[error("task '{task}' has period {period} ticks — must be at least 1")]
    InvalidPeriod { task: String, period: Tick },

    /// A queue needs at least one slot.
    #[error("queue length must be at least 1")]
    InvalidQueueLength,
}
