/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-set configuration loading and validation.
//!
//! Every value has a default equal to the stock demo, so an absent file (or
//! an empty one) runs the reference task set:
//!
//! | Task | Period | Priority |
//! |---|---|---|
//! | `button_1` | 50 | 1 |
//! | `button_2` | 50 | 2 |
//! | `transmitter` | 100 | 3 |
//! | `forwarder` | 20 | 4 |
//! | `load_1` | 10 | 5 |
//! | `load_2` | 100 | 6 |
//!
//! The priorities do not follow rate-monotonic order (the longest-period load
//! has the highest priority).  They are kept as given and can be overridden
//! per task.
//!
//! The expected YAML structure is:
//! ```yaml
//! tick_rate_hz: 1000
//! queue_length: 10
//! trace_pin: { port: 0, pin: 0 }
//! kernel:
//!   heap_bytes: 13312
//! tasks:
//!   button_1:
//!     period: 50
//!     priority: 1
//!     pin: { port: 1, pin: 0 }
//!     stimulus: { levels: [low, high], cycle: true }
//!   load_2:
//!     period: 100
//!     iterations: 80000
//!     execution_us: 12000
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::activity::load::{LOAD_1_ITERATIONS, LOAD_2_ITERATIONS};
use crate::hal::{Level, PinId};
use crate::kernel::{KernelConfig, Tick};
use crate::queue::{DEFAULT_QUEUE_CAPACITY, MAX_MESSAGE_LEN};

// ── Task keys ─────────────────────────────────────────────────────────────────

pub const BUTTON_1: &str = "button_1";
pub const BUTTON_2: &str = "button_2";
pub const TRANSMITTER: &str = "transmitter";
pub const FORWARDER: &str = "forwarder";
pub const LOAD_1: &str = "load_1";
pub const LOAD_2: &str = "load_2";

// ── Errors ────────────────────────────────────────────────────────────────────

/// A configuration that parsed but cannot describe a valid task set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("tick_rate_hz must be greater than zero")]
    ZeroTickRate,

    #[error("queue_length must be greater than zero")]
    ZeroQueueLength,

    #[error("task '{task}' has a zero period")]
    ZeroPeriod { task: String },

    #[error("tasks '{first}' and '{second}' share priority {priority}")]
    DuplicatePriority {
        priority: u8,
        first: String,
        second: String,
    },

    #[error("task '{task}': text '{text}' is longer than {MAX_MESSAGE_LEN} bytes")]
    MessageTooLong { task: String, text: String },

    #[error("unknown task '{0}' (valid: button_1, button_2, transmitter, forwarder, load_1, load_2)")]
    UnknownTask(String),
}

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfigFile {
    tick_rate_hz: Option<u32>,
    queue_length: Option<usize>,
    baud_rate: Option<u32>,
    timer_counts_per_sec: Option<u64>,
    trace_pin: Option<PinId>,
    kernel: KernelEntry,
    tasks: HashMap<String, TaskEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KernelEntry {
    max_tasks: Option<usize>,
    max_priorities: Option<u8>,
    heap_bytes: Option<usize>,
    idle_stack_words: Option<usize>,
}

/// Per-task fields.  Which ones apply depends on the task kind; the rest are
/// ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaskEntry {
    name: Option<String>,
    period: Option<Tick>,
    priority: Option<u8>,
    stack_words: Option<usize>,
    deadline: Option<Tick>,
    // monitors
    pin: Option<PinId>,
    label: Option<String>,
    stimulus: Option<Stimulus>,
    // transmitter
    message: Option<String>,
    // loads
    iterations: Option<u64>,
    execution_us: Option<u64>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Scheduling parameters shared by every periodic task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: String,
    pub period: Tick,
    pub priority: u8,
    pub stack_words: usize,
    /// Advisory deadline; `None` means "equal to the period".
    pub deadline: Option<Tick>,
}

impl TaskConfig {
    fn new(name: &str, period: Tick, priority: u8) -> Self {
        Self {
            name: name.to_string(),
            period,
            priority,
            stack_words: 100,
            deadline: None,
        }
    }

    fn merge(&mut self, entry: &TaskEntry) {
        if let Some(name) = &entry.name {
            self.name = name.clone();
        }
        if let Some(period) = entry.period {
            self.period = period;
        }
        if let Some(priority) = entry.priority {
            self.priority = priority;
        }
        if let Some(stack_words) = entry.stack_words {
            self.stack_words = stack_words;
        }
        if entry.deadline.is_some() {
            self.deadline = entry.deadline;
        }
    }
}

/// Input levels fed to a simulated pin, one per read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Stimulus {
    #[serde(default)]
    pub levels: Vec<Level>,
    #[serde(default)]
    pub cycle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub task: TaskConfig,
    pub pin: PinId,
    /// Event tag: messages read "rising {label}" / "falling {label}".
    pub label: String,
    pub stimulus: Stimulus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitterConfig {
    pub task: TaskConfig,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub task: TaskConfig,
    /// Busy-loop iterations per release.
    pub iterations: u64,
    /// Wall-clock time the iterations take on the reference target.
    pub execution_us: u64,
}

impl LoadConfig {
    /// Execution demand in whole tick slots (rounded up).
    pub fn execution_ticks(&self, tick_rate_hz: u32) -> Tick {
        let ticks = (u128::from(self.execution_us) * u128::from(tick_rate_hz)).div_ceil(1_000_000);
        Tick::try_from(ticks).unwrap_or(Tick::MAX)
    }
}

/// Complete description of the demo: kernel limits, queue and the six tasks.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub tick_rate_hz: u32,
    pub queue_length: usize,
    pub baud_rate: u32,
    pub timer_counts_per_sec: u64,
    pub kernel: KernelConfig,
    pub button_1: MonitorConfig,
    pub button_2: MonitorConfig,
    pub transmitter: TransmitterConfig,
    pub forwarder: TaskConfig,
    pub load_1: LoadConfig,
    pub load_2: LoadConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 1_000,
            queue_length: DEFAULT_QUEUE_CAPACITY,
            baud_rate: 115_200,
            timer_counts_per_sec: 60_000,
            kernel: KernelConfig::default(),
            button_1: MonitorConfig {
                task: TaskConfig::new("Button_1_Monitor", 50, 1),
                pin: PinId::new(1, 0),
                label: "button 1".into(),
                stimulus: Stimulus::default(),
            },
            button_2: MonitorConfig {
                task: TaskConfig::new("Button_2_Monitor", 50, 2),
                pin: PinId::new(1, 1),
                label: "button 2".into(),
                stimulus: Stimulus::default(),
            },
            transmitter: TransmitterConfig {
                task: TaskConfig::new("Periodic_Transmitter", 100, 3),
                message: "Periodic msg".into(),
            },
            forwarder: TaskConfig::new("Uart_Receiver", 20, 4),
            load_1: LoadConfig {
                task: TaskConfig::new("Load_1", 10, 5),
                iterations: LOAD_1_ITERATIONS,
                execution_us: 5_000,
            },
            load_2: LoadConfig {
                task: TaskConfig::new("Load_2", 100, 6),
                iterations: LOAD_2_ITERATIONS,
                execution_us: 12_000,
            },
        }
    }
}

impl DemoConfig {
    /// Parse `path` on top of the defaults, then validate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is structurally
    /// invalid, or the resulting task set fails [`validate`](Self::validate).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading task-set configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Parse YAML text on top of the defaults, then validate.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserialises to `null`; treat it as "all defaults".
        let file: DemoConfigFile = if content.trim().is_empty() {
            DemoConfigFile::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };

        let mut cfg = Self::default();
        cfg.apply(file)?;
        cfg.validate()?;

        debug!(
            tick_rate_hz = cfg.tick_rate_hz,
            queue_length = cfg.queue_length,
            heap_bytes = cfg.kernel.heap_bytes,
            "Configuration parsed"
        );
        Ok(cfg)
    }

    fn apply(&mut self, file: DemoConfigFile) -> Result<(), ConfigError> {
        if let Some(v) = file.tick_rate_hz {
            self.tick_rate_hz = v;
        }
        if let Some(v) = file.queue_length {
            self.queue_length = v;
        }
        if let Some(v) = file.baud_rate {
            self.baud_rate = v;
        }
        if let Some(v) = file.timer_counts_per_sec {
            self.timer_counts_per_sec = v;
        }
        if let Some(v) = file.trace_pin {
            self.kernel.trace_pin = v;
        }

        let k = file.kernel;
        if let Some(v) = k.max_tasks {
            self.kernel.max_tasks = v;
        }
        if let Some(v) = k.max_priorities {
            self.kernel.max_priorities = v;
        }
        if let Some(v) = k.heap_bytes {
            self.kernel.heap_bytes = v;
        }
        if let Some(v) = k.idle_stack_words {
            self.kernel.idle_stack_words = v;
        }

        for (key, entry) in &file.tasks {
            match key.as_str() {
                BUTTON_1 => merge_monitor(&mut self.button_1, entry),
                BUTTON_2 => merge_monitor(&mut self.button_2, entry),
                TRANSMITTER => {
                    self.transmitter.task.merge(entry);
                    if let Some(m) = &entry.message {
                        self.transmitter.message = m.clone();
                    }
                }
                FORWARDER => self.forwarder.merge(entry),
                LOAD_1 => merge_load(&mut self.load_1, entry),
                LOAD_2 => merge_load(&mut self.load_2, entry),
                other => return Err(ConfigError::UnknownTask(other.to_string())),
            }
        }
        Ok(())
    }

    /// The six tasks' scheduling parameters, keyed by their config key.
    pub fn task_configs(&self) -> [(&'static str, &TaskConfig); 6] {
        [
            (BUTTON_1, &self.button_1.task),
            (BUTTON_2, &self.button_2.task),
            (TRANSMITTER, &self.transmitter.task),
            (FORWARDER, &self.forwarder),
            (LOAD_1, &self.load_1.task),
            (LOAD_2, &self.load_2.task),
        ]
    }

    /// Check the task set for values the kernel would reject.
    ///
    /// # Errors
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.queue_length == 0 {
            return Err(ConfigError::ZeroQueueLength);
        }

        let tasks = self.task_configs();
        for (i, (_, task)) in tasks.iter().enumerate() {
            if task.period == 0 {
                return Err(ConfigError::ZeroPeriod {
                    task: task.name.clone(),
                });
            }
            if let Some((_, other)) = tasks[..i].iter().find(|(_, o)| o.priority == task.priority) {
                return Err(ConfigError::DuplicatePriority {
                    priority: task.priority,
                    first: other.name.clone(),
                    second: task.name.clone(),
                });
            }
        }

        let texts = [
            (&self.button_1.task.name, format!("falling {}", self.button_1.label)),
            (&self.button_2.task.name, format!("falling {}", self.button_2.label)),
            (&self.transmitter.task.name, self.transmitter.message.clone()),
        ];
        for (task, text) in texts {
            if text.len() > MAX_MESSAGE_LEN {
                return Err(ConfigError::MessageTooLong {
                    task: task.clone(),
                    text,
                });
            }
        }
        Ok(())
    }
}

fn merge_monitor(cfg: &mut MonitorConfig, entry: &TaskEntry) {
    cfg.task.merge(entry);
    if let Some(pin) = entry.pin {
        cfg.pin = pin;
    }
    if let Some(label) = &entry.label {
        cfg.label = label.clone();
    }
    if let Some(stimulus) = &entry.stimulus {
        cfg.stimulus = stimulus.clone();
    }
}

fn merge_load(cfg: &mut LoadConfig, entry: &TaskEntry) {
    cfg.task.merge(entry);
    if let Some(v) = entry.iterations {
        cfg.iterations = v;
    }
    if let Some(v) = entry.execution_us {
        cfg.execution_us = v;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn defaults_match_reference_demo() {
        let cfg = DemoConfig::default();
        let periods: Vec<Tick> = cfg.task_configs().iter().map(|(_, t)| t.period).collect();
        let prios: Vec<u8> = cfg.task_configs().iter().map(|(_, t)| t.priority).collect();
        assert_eq!(periods, vec![50, 50, 100, 20, 10, 100]);
        assert_eq!(prios, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(cfg.queue_length, 10);
        assert_eq!(cfg.transmitter.message, "Periodic msg");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_execution_ticks_follow_tick_rate() {
        let cfg = DemoConfig::default();
        assert_eq!(cfg.load_1.execution_ticks(1_000), 5);
        assert_eq!(cfg.load_2.execution_ticks(1_000), 12);
        // 100 Hz tick = 10 ms slots: 5 ms rounds up to one slot.
        assert_eq!(cfg.load_1.execution_ticks(100), 1);
        assert_eq!(cfg.load_2.execution_ticks(100), 2);
    }

    #[test]
    fn load_execution_ticks_are_exact_at_uneven_rates() {
        let cfg = DemoConfig::default();
        // 3 kHz: 5 ms is exactly 15 ticks, 12 ms exactly 36.
        assert_eq!(cfg.load_1.execution_ticks(3_000), 15);
        assert_eq!(cfg.load_2.execution_ticks(3_000), 36);
        // 7 kHz: 35.0 and 84.0 ticks.
        assert_eq!(cfg.load_1.execution_ticks(7_000), 35);
        assert_eq!(cfg.load_2.execution_ticks(7_000), 84);
        // Sub-microsecond ticks.
        assert_eq!(cfg.load_1.execution_ticks(2_000_000), 10_000);
        // 5 ms at 333 Hz is 1.665 ticks, rounded up.
        assert_eq!(cfg.load_1.execution_ticks(333), 2);
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = DemoConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg.forwarder, DemoConfig::default().forwarder);
    }

    #[test]
    fn partial_task_override_keeps_other_defaults() {
        let yaml = r#"
tasks:
  button_2:
    period: 25
    stimulus:
      levels: [low, high]
      cycle: true
"#;
        let cfg = DemoConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.button_2.task.period, 25);
        assert_eq!(cfg.button_2.task.priority, 2);
        assert_eq!(cfg.button_2.pin, PinId::new(1, 1));
        assert_eq!(cfg.button_2.stimulus.levels, vec![Level::Low, Level::High]);
        assert!(cfg.button_2.stimulus.cycle);
        // Untouched task
        assert_eq!(cfg.button_1.task.period, 50);
    }

    #[test]
    fn load_full_file() {
        let yaml = r#"
tick_rate_hz: 500
queue_length: 4
trace_pin: { port: 0, pin: 7 }
kernel:
  heap_bytes: 20000
  max_priorities: 10
tasks:
  forwarder:
    name: "Drain"
    period: 8
    priority: 9
    deadline: 6
  load_2:
    iterations: 1000
    execution_us: 4000
  transmitter:
    message: "hello"
"#;
        let f = yaml_tempfile(yaml);
        let cfg = DemoConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.tick_rate_hz, 500);
        assert_eq!(cfg.queue_length, 4);
        assert_eq!(cfg.kernel.trace_pin, PinId::new(0, 7));
        assert_eq!(cfg.kernel.heap_bytes, 20_000);
        assert_eq!(cfg.kernel.max_priorities, 10);
        assert_eq!(cfg.forwarder.name, "Drain");
        assert_eq!(cfg.forwarder.priority, 9);
        assert_eq!(cfg.forwarder.deadline, Some(6));
        assert_eq!(cfg.load_2.iterations, 1_000);
        assert_eq!(cfg.load_2.execution_ticks(cfg.tick_rate_hz), 2);
        assert_eq!(cfg.transmitter.message, "hello");
    }

    #[test]
    fn shipped_configs_parse() {
        let stock = DemoConfig::from_yaml_str(include_str!("../../config/stock.yaml")).unwrap();
        let defaults = DemoConfig::default();
        for ((_, a), (_, b)) in stock.task_configs().iter().zip(defaults.task_configs().iter()) {
            assert_eq!(a, b);
        }
        assert_eq!(stock.load_2.iterations, LOAD_2_ITERATIONS);

        let sat = DemoConfig::from_yaml_str(include_str!("../../config/saturation.yaml")).unwrap();
        assert_eq!(sat.button_1.task.period, 5);
        assert_eq!(sat.forwarder.deadline, Some(20));
        assert!(sat.button_2.stimulus.cycle);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = DemoConfig::load_from_file(Path::new("/nonexistent/tickdemo.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let f = yaml_tempfile("tasks: [this is: not a map");
        assert!(DemoConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn unknown_task_key_is_rejected() {
        let err = DemoConfig::from_yaml_str("tasks:\n  button_3:\n    period: 5\n").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownTask("button_3".into()))
        );
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn zero_period_fails_validation() {
        let err = DemoConfig::from_yaml_str("tasks:\n  load_1:\n    period: 0\n").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::ZeroPeriod {
                task: "Load_1".into()
            })
        );
    }

    #[test]
    fn duplicate_priority_fails_validation() {
        let mut cfg = DemoConfig::default();
        cfg.load_2.task.priority = 1;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicatePriority {
                priority: 1,
                first: "Button_1_Monitor".into(),
                second: "Load_2".into(),
            })
        );
    }

    #[test]
    fn zero_tick_rate_and_queue_length_fail_validation() {
        let mut cfg = DemoConfig::default();
        cfg.tick_rate_hz = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTickRate));

        let mut cfg = DemoConfig::default();
        cfg.queue_length = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroQueueLength));
    }

    #[test]
    fn oversized_label_fails_validation() {
        let mut cfg = DemoConfig::default();
        cfg.button_1.label = "the big red button".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MessageTooLong { .. })
        ));
    }
}
