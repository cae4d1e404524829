/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic task manager and simulated fixed-priority dispatcher.
//!
//! Two types model the two phases of the system:
//!
//! ```text
//! PeriodicTaskManager ──start_scheduler()──►  Scheduler
//!   create_queue()                              tick() / run_for()
//!   create_periodic_task()                      stats() / task_info()
//!   (setup: heap + task table)                  (running: no creation possible)
//! ```
//!
//! `start_scheduler` consumes the manager, so creating a task after startup
//! cannot be expressed.
//!
//! # Dispatch model
//! One [`Scheduler::tick`] call is one tick slot on a single core:
//!
//! 1. Every suspended task whose absolute release has been reached is
//!    released.
//! 2. The highest-priority released job runs.  The first time a job is
//!    dispatched its [`Activity::run`] executes; the job then needs
//!    [`Activity::execution_ticks`] whole slots.  A job needing `0` slots
//!    completes immediately and the next released job is considered within the
//!    same slot.
//! 3. A completed job advances its [`ReleaseClock`] by one period and
//!    suspends.  A job that overran its period is released again at once.
//! 4. The [`TickHook`] emits the trace pulse and records whether the slot was
//!    busy or idle.
//!
//! Higher-priority releases at a tick boundary preempt a partially executed
//! lower-priority job.  Priorities are fixed and distinct.

pub mod error;
pub mod release;
pub mod stats;

pub use error::KernelError;
pub use release::ReleaseClock;
pub use stats::{RuntimeStats, TickHook, TickTracer};

use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::activity::{Activity, ActivityContext};
use crate::hal::{Board, PinId};
use crate::queue::{MessageQueue, QueueHandle};

/// Scheduler time unit.
///
/// 64-bit so the tick count never wraps within any realistic run.
pub type Tick = u64;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Bytes per stack word.
pub const WORD_BYTES: usize = 4;

/// Heap cost of one task control block.
pub const TCB_BYTES: usize = 96;

/// Heap cost of a queue's bookkeeping, on top of its slot storage.
pub const QUEUE_HEADER_BYTES: usize = 76;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Static kernel limits, fixed before any task is created.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Capacity of the task table (user tasks only).
    pub max_tasks: usize,
    /// Number of priority levels.  User tasks use `1..max_priorities`.
    pub max_priorities: u8,
    /// Total heap available for stacks, control blocks and queues, in bytes.
    pub heap_bytes: usize,
    /// Stack of the idle task, in words, allocated by `start_scheduler`.
    pub idle_stack_words: usize,
    /// Line pulsed by the tick tracer.
    pub trace_pin: PinId,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_tasks: 16,
            max_priorities: 7,
            heap_bytes: 13 * 1024,
            idle_stack_words: 90,
            trace_pin: PinId::new(0, 0),
        }
    }
}

// ── Heap accounting ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct HeapBudget {
    total: usize,
    used: usize,
}

impl HeapBudget {
    fn new(total: usize) -> Self {
        Self { total, used: 0 }
    }

    fn available(&self) -> usize {
        self.total - self.used
    }

    fn allocate(&mut self, what: &str, bytes: usize) -> Result<(), KernelError> {
        if bytes > self.available() {
            return Err(KernelError::HeapExhausted {
                what: what.to_string(),
                requested: bytes,
                available: self.available(),
            });
        }
        self.used += bytes;
        Ok(())
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

/// Opaque handle to a created task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(usize);

/// Where a task is in its release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for the next absolute release.
    Suspended,
    /// Released; its activity has not run yet for this release.
    Released,
    /// Activity has run; `remaining` tick slots of execution are left.
    Executing { remaining: Tick },
}

struct TaskControlBlock {
    name: String,
    priority: u8,
    stack_words: usize,
    /// Advisory only; never compared against completion time.
    deadline: Tick,
    clock: ReleaseClock,
    state: TaskState,
    activity: Box<dyn Activity>,
    releases: u64,
    last_release: Option<Tick>,
    executed_ticks: u64,
}

impl TaskControlBlock {
    fn info(&self) -> TaskInfo {
        let next_release = match self.state {
            TaskState::Suspended => self.clock.release_at(),
            _ => self.clock.release_at().saturating_add(self.clock.period()),
        };
        TaskInfo {
            name: self.name.clone(),
            priority: self.priority,
            period: self.clock.period(),
            stack_words: self.stack_words,
            deadline: self.deadline,
            state: self.state,
            releases: self.releases,
            last_release: self.last_release,
            next_release,
            executed_ticks: self.executed_ticks,
        }
    }
}

/// Snapshot of one task's configuration and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    pub priority: u8,
    pub period: Tick,
    pub stack_words: usize,
    /// Advisory deadline in ticks (defaults to the period).
    pub deadline: Tick,
    pub state: TaskState,
    /// Number of releases so far.
    pub releases: u64,
    /// Nominal tick of the most recent release.
    pub last_release: Option<Tick>,
    /// Nominal tick of the next release.
    pub next_release: Tick,
    /// Tick slots consumed by this task.
    pub executed_ticks: u64,
}

// ── PeriodicTaskManager ───────────────────────────────────────────────────────

/// Setup phase: owns the board, the heap and the task table until
/// [`start_scheduler`](Self::start_scheduler) hands them to a [`Scheduler`].
pub struct PeriodicTaskManager<B: Board> {
    config: KernelConfig,
    board: B,
    heap: HeapBudget,
    tasks: Vec<TaskControlBlock>,
}

impl<B: Board> PeriodicTaskManager<B> {
    pub fn new(config: KernelConfig, board: B) -> Self {
        let heap = HeapBudget::new(config.heap_bytes);
        Self {
            config,
            board,
            heap,
            tasks: Vec::new(),
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Bytes of heap still free.
    pub fn heap_available(&self) -> usize {
        self.heap.available()
    }

    /// Create a bounded message queue with `capacity` slots.
    ///
    /// # Errors
    /// * [`KernelError::InvalidQueueLength`] for a zero capacity.
    /// * [`KernelError::HeapExhausted`] if the slot storage does not fit.
    pub fn create_queue(&mut self, capacity: usize) -> Result<QueueHandle, KernelError> {
        if capacity == 0 {
            return Err(KernelError::InvalidQueueLength);
        }
        let bytes = capacity
            .saturating_mul(MessageQueue::item_size())
            .saturating_add(QUEUE_HEADER_BYTES);
        self.heap.allocate("message queue", bytes)?;

        debug!(
            capacity,
            item_size = MessageQueue::item_size(),
            heap_bytes = bytes,
            "Created message queue"
        );
        Ok(Arc::new(MessageQueue::with_capacity(capacity)))
    }

    /// Register a periodic task released every `period` ticks from tick 0.
    ///
    /// The advisory deadline defaults to `period`; see
    /// [`set_deadline`](Self::set_deadline).
    ///
    /// # Errors
    /// * [`KernelError::InvalidPeriod`] – `period == 0`.
    /// * [`KernelError::InvalidPriority`] – outside `1..max_priorities`.
    /// * [`KernelError::DuplicatePriority`] – priority already taken.
    /// * [`KernelError::TaskTableFull`] – no free table entry.
    /// * [`KernelError::HeapExhausted`] – stack + control block do not fit.
    pub fn create_periodic_task(
        &mut self,
        entry: Box<dyn Activity>,
        name: &str,
        stack_words: usize,
        priority: u8,
        period: Tick,
    ) -> Result<TaskHandle, KernelError> {
        if period == 0 {
            return Err(KernelError::InvalidPeriod {
                task: name.to_string(),
                period,
            });
        }
        if priority == 0 || priority >= self.config.max_priorities {
            return Err(KernelError::InvalidPriority {
                task: name.to_string(),
                priority,
                max_priorities: self.config.max_priorities,
            });
        }
        if let Some(holder) = self.tasks.iter().find(|t| t.priority == priority) {
            return Err(KernelError::DuplicatePriority {
                task: name.to_string(),
                priority,
                holder: holder.name.clone(),
            });
        }
        if self.tasks.len() >= self.config.max_tasks {
            return Err(KernelError::TaskTableFull {
                task: name.to_string(),
                max: self.config.max_tasks,
            });
        }
        let bytes = stack_words
            .saturating_mul(WORD_BYTES)
            .saturating_add(TCB_BYTES);
        self.heap.allocate(&format!("task '{name}'"), bytes)?;

        let handle = TaskHandle(self.tasks.len());
        self.tasks.push(TaskControlBlock {
            name: name.to_string(),
            priority,
            stack_words,
            deadline: period,
            clock: ReleaseClock::new(0, period),
            state: TaskState::Suspended,
            activity: entry,
            releases: 0,
            last_release: None,
            executed_ticks: 0,
        });

        info!(
            task = %name,
            priority,
            period,
            stack_words,
            heap_free = self.heap.available(),
            "✓ task created"
        );
        Ok(handle)
    }

    /// Override the advisory deadline of a task.  Returns `false` for an
    /// unknown handle.
    pub fn set_deadline(&mut self, handle: TaskHandle, deadline: Tick) -> bool {
        match self.tasks.get_mut(handle.0) {
            Some(tcb) => {
                tcb.deadline = deadline;
                true
            }
            None => false,
        }
    }

    pub fn task_info(&self, handle: TaskHandle) -> Option<TaskInfo> {
        self.tasks.get(handle.0).map(TaskControlBlock::info)
    }

    /// Allocate the idle task and hand everything to a running [`Scheduler`].
    ///
    /// # Errors
    /// [`KernelError::HeapExhausted`] if the idle task does not fit.
    pub fn start_scheduler(mut self) -> Result<Scheduler<B>, KernelError> {
        let idle_bytes = self
            .config
            .idle_stack_words
            .saturating_mul(WORD_BYTES)
            .saturating_add(TCB_BYTES);
        self.heap.allocate("idle task", idle_bytes)?;

        info!(
            tasks = self.tasks.len(),
            heap_used = self.heap.used,
            heap_total = self.heap.total,
            "Scheduler started"
        );

        Ok(Scheduler {
            now: 0,
            hook: TickHook::new(TickTracer::new(self.config.trace_pin)),
            board: self.board,
            heap: self.heap,
            tasks: self.tasks,
        })
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Running phase: advances the virtual clock and dispatches tasks.
pub struct Scheduler<B: Board> {
    now: Tick,
    hook: TickHook,
    board: B,
    heap: HeapBudget,
    tasks: Vec<TaskControlBlock>,
}

impl<B: Board> Scheduler<B> {
    /// Number of ticks executed so far (= the tick about to run).
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Consistent copy of the runtime counters.
    pub fn stats(&self) -> RuntimeStats {
        self.hook.stats()
    }

    pub fn heap_available(&self) -> usize {
        self.heap.available()
    }

    pub fn task_info(&self, handle: TaskHandle) -> Option<TaskInfo> {
        self.tasks.get(handle.0).map(TaskControlBlock::info)
    }

    /// Snapshots of every task, in creation order.
    pub fn tasks(&self) -> Vec<TaskInfo> {
        self.tasks.iter().map(TaskControlBlock::info).collect()
    }

    /// Execute one tick slot.
    pub fn tick(&mut self) {
        let now = self.now;
        let busy = self.dispatch(now);
        self.hook.on_tick(self.board.gpio(), busy);
        self.now += 1;
    }

    /// Execute `ticks` tick slots.
    pub fn run_for(&mut self, ticks: Tick) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn release_due(&mut self, now: Tick) {
        for tcb in &mut self.tasks {
            if tcb.state == TaskState::Suspended && tcb.clock.is_due(now) {
                tcb.state = TaskState::Released;
                tcb.releases += 1;
                tcb.last_release = Some(tcb.clock.release_at());
                trace!(task = %tcb.name, release = tcb.clock.release_at(), now, "released");
            }
        }
    }

    fn highest_priority_ready(&self) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.state != TaskState::Suspended)
            .max_by_key(|(_, t)| t.priority)
            .map(|(idx, _)| idx)
    }

    /// Run the slot starting at `now`.  Returns `true` if any task executed.
    fn dispatch(&mut self, now: Tick) -> bool {
        let mut busy = false;

        loop {
            // Re-checked every iteration: a zero-length job that overran its
            // period is due again before the slot ends.
            self.release_due(now);
            let Some(idx) = self.highest_priority_ready() else {
                break;
            };
            busy = true;

            let tcb = &mut self.tasks[idx];
            if tcb.state == TaskState::Released {
                let mut ctx = ActivityContext::new(now, &mut self.board);
                tcb.activity.run(&mut ctx);
                tcb.state = TaskState::Executing {
                    remaining: tcb.activity.execution_ticks(),
                };
            }

            let TaskState::Executing { remaining } = tcb.state else {
                break;
            };
            if remaining == 0 {
                tcb.clock.delay_until();
                tcb.state = TaskState::Suspended;
                continue;
            }

            // The job occupies this slot.
            tcb.executed_ticks += 1;
            if remaining == 1 {
                tcb.clock.delay_until();
                tcb.state = TaskState::Suspended;
            } else {
                tcb.state = TaskState::Executing {
                    remaining: remaining - 1,
                };
            }
            break;
        }

        busy
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
