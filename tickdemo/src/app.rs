/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Application wiring: one queue, six periodic tasks, one running scheduler.
//!
//! ```text
//!  Button_1_Monitor ─┐
//!  Button_2_Monitor ─┼─► MessageQueue (10 × 20 B) ──► Uart_Receiver ──► serial
//!  Periodic_Transmitter ┘
//!  Load_1, Load_2       (CPU only)
//! ```
//!
//! Every handle the application needs afterwards lives in the [`System`]
//! returned by [`build_system`].  A failure while building it is fatal: the
//! caller logs it and calls [`halt`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::activity::{
    Activity, DigitalInputMonitor, LoadSimulator, PeriodicTransmitter, QueueForwarder,
};
use crate::config::{DemoConfig, LoadConfig, MonitorConfig, TaskConfig};
use crate::feasibility::{self, TaskTiming};
use crate::hal::sim::SimBoard;
use crate::hal::{Board, SerialPort};
use crate::hyperperiod::{self, HyperperiodError};
use crate::kernel::{KernelError, PeriodicTaskManager, Scheduler, TaskHandle, Tick};
use crate::queue::{MessageError, QueueHandle};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Anything that stops the system from reaching the running state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("task '{task}': {source}")]
    Message {
        task: String,
        #[source]
        source: MessageError,
    },
}

// ── System ────────────────────────────────────────────────────────────────────

/// Handles of the six created tasks.
#[derive(Debug, Clone, Copy)]
pub struct TaskHandles {
    pub button_1: TaskHandle,
    pub button_2: TaskHandle,
    pub transmitter: TaskHandle,
    pub forwarder: TaskHandle,
    pub load_1: TaskHandle,
    pub load_2: TaskHandle,
}

/// The running application.
pub struct System<B: Board> {
    pub scheduler: Scheduler<B>,
    pub queue: QueueHandle,
    pub handles: TaskHandles,
    /// Hardware timer value sampled before any task was created.
    pub startup_timer: u32,
}

/// Create the queue and the six tasks on `board`, then start the scheduler.
///
/// # Errors
/// * [`StartupError::Kernel`] – queue or task creation, or idle-task
///   allocation, failed.
/// * [`StartupError::Message`] – an event or periodic text does not fit in a
///   message.
pub fn build_system<B: Board>(config: &DemoConfig, board: B) -> Result<System<B>, StartupError> {
    let startup_timer = board.timer().counter();
    debug!(startup_timer, "Hardware timer sampled");

    let mut mgr = PeriodicTaskManager::new(config.kernel.clone(), board);
    let queue = mgr.create_queue(config.queue_length)?;

    let button_1 = spawn_monitor(&mut mgr, &config.button_1, &queue)?;
    let button_2 = spawn_monitor(&mut mgr, &config.button_2, &queue)?;

    let tx = &config.transmitter;
    let transmitter = PeriodicTransmitter::new(&tx.message, Arc::clone(&queue))
        .map_err(|source| message_error(&tx.task, source))?;
    let transmitter = spawn(&mut mgr, Box::new(transmitter), &tx.task)?;

    let forwarder = spawn(
        &mut mgr,
        Box::new(QueueForwarder::new(Arc::clone(&queue))),
        &config.forwarder,
    )?;

    let load_1 = spawn_load(&mut mgr, &config.load_1, config.tick_rate_hz)?;
    let load_2 = spawn_load(&mut mgr, &config.load_2, config.tick_rate_hz)?;

    let scheduler = mgr.start_scheduler()?;

    Ok(System {
        scheduler,
        queue,
        handles: TaskHandles {
            button_1,
            button_2,
            transmitter,
            forwarder,
            load_1,
            load_2,
        },
        startup_timer,
    })
}

fn message_error(task: &TaskConfig, source: MessageError) -> StartupError {
    StartupError::Message {
        task: task.name.clone(),
        source,
    }
}

fn spawn<B: Board>(
    mgr: &mut PeriodicTaskManager<B>,
    activity: Box<dyn Activity>,
    task: &TaskConfig,
) -> Result<TaskHandle, KernelError> {
    let handle =
        mgr.create_periodic_task(activity, &task.name, task.stack_words, task.priority, task.period)?;
    if let Some(deadline) = task.deadline {
        mgr.set_deadline(handle, deadline);
    }
    Ok(handle)
}

fn spawn_load<B: Board>(
    mgr: &mut PeriodicTaskManager<B>,
    load: &LoadConfig,
    tick_rate_hz: u32,
) -> Result<TaskHandle, KernelError> {
    let activity = LoadSimulator::new(load.iterations, load.execution_ticks(tick_rate_hz));
    spawn(mgr, Box::new(activity), &load.task)
}

fn spawn_monitor<B: Board>(
    mgr: &mut PeriodicTaskManager<B>,
    monitor: &MonitorConfig,
    queue: &QueueHandle,
) -> Result<TaskHandle, StartupError> {
    let activity = DigitalInputMonitor::new(monitor.pin, &monitor.label, Arc::clone(queue))
        .map_err(|source| message_error(&monitor.task, source))?;
    Ok(spawn(mgr, Box::new(activity), &monitor.task)?)
}

/// Permanently stop after a fatal startup error.  Never returns.
pub fn halt() -> ! {
    warn!("System halted");
    loop {
        std::thread::park();
    }
}

// ── Simulated board ───────────────────────────────────────────────────────────

/// Host board with `serial` attached and the configured input stimuli loaded
/// onto the monitored pins.
pub fn sim_board<S: SerialPort>(config: &DemoConfig, serial: S) -> SimBoard<S> {
    let mut board = SimBoard::with_serial(serial, config.timer_counts_per_sec);
    for monitor in [&config.button_1, &config.button_2] {
        let stimulus = &monitor.stimulus;
        if !stimulus.levels.is_empty() {
            board
                .gpio
                .script_input(monitor.pin, stimulus.levels.clone(), stimulus.cycle);
        }
    }
    board
}

// ── Analysis ──────────────────────────────────────────────────────────────────

/// Timing model of the configured task set.  Monitors, the transmitter and
/// the forwarder take less than a tick and are modelled with zero cost.
pub fn task_timings(config: &DemoConfig) -> Vec<TaskTiming> {
    let timing = |task: &TaskConfig, execution: Tick| TaskTiming {
        name: task.name.clone(),
        period: task.period,
        execution,
        priority: task.priority,
        deadline: task.deadline.unwrap_or(task.period),
    };
    vec![
        timing(&config.button_1.task, 0),
        timing(&config.button_2.task, 0),
        timing(&config.transmitter.task, 0),
        timing(&config.forwarder, 0),
        timing(&config.load_1.task, config.load_1.execution_ticks(config.tick_rate_hz)),
        timing(&config.load_2.task, config.load_2.execution_ticks(config.tick_rate_hz)),
    ]
}

/// LCM of the six task periods.
pub fn hyperperiod_of(config: &DemoConfig) -> Result<Tick, HyperperiodError> {
    let periods: Vec<Tick> = config.task_configs().iter().map(|(_, t)| t.period).collect();
    hyperperiod::hyperperiod(&periods)
}

/// Log the schedulability of the task set.  Purely informational.
pub fn log_feasibility(config: &DemoConfig) {
    let timings = task_timings(config);
    let utilization = feasibility::total_utilization(&timings);

    match feasibility::check_liu_layland(&timings) {
        Some(u) => warn!(
            utilization = u,
            "Task set exceeds the Liu & Layland bound; rate-monotonic schedulability not guaranteed"
        ),
        None => info!(utilization, "Task set within the Liu & Layland bound"),
    }

    for rt in feasibility::response_times(&timings) {
        match rt.response {
            Some(response) => debug!(task = %rt.name, response, deadline = rt.deadline, "worst-case response"),
            None => warn!(
                task = %rt.name,
                deadline = rt.deadline,
                "worst-case response exceeds the deadline under the configured priorities"
            ),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
