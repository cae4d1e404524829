/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! tickdemo – fixed-priority periodic task demo
//!
//! Six periodic tasks share one bounded message queue on a tick-driven,
//! preemptive, single-core scheduler.
//!
//! ```text
//! lib.rs
//! ├── kernel/        – task manager, dispatcher, release clock, tick hook
//! ├── queue.rs       – bounded FIFO of fixed-size messages
//! ├── activity/      – monitors, transmitter, forwarder, load simulators
//! ├── hal/           – GPIO / serial / timer traits + host simulation
//! ├── config/        – YAML task-set configuration
//! ├── app.rs         – wiring of the six tasks into a running system
//! ├── runtime.rs     – wall-clock pacing (tokio)
//! ├── hyperperiod/   – LCM / GCD of task periods
//! └── feasibility.rs – Liu & Layland bound, response-time analysis
//! ```

pub mod activity;
pub mod app;
pub mod config;
pub mod feasibility;
pub mod hal;
pub mod hyperperiod;
pub mod kernel;
pub mod queue;
pub mod runtime;
