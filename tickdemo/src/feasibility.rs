/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Schedulability analysis of the configured task set.
//!
//! # Status: advisory
//! Results are **logged** before the scheduler starts.  Nothing is rejected:
//! the task set runs even when the analysis predicts misses, and the
//! dispatcher silently absorbs them.
//!
//! Two checks are provided:
//!
//! * **Liu & Layland (1973)** – `U ≤ n(2^(1/n) − 1)` guarantees
//!   schedulability under *rate-monotonic* priorities.  The demo's priorities
//!   are not rate-monotonic, so this bound alone can be misleading.
//! * **Response-time analysis** – exact worst-case response time under the
//!   *actual* fixed priorities:
//!
//!   `R = C_i + Σ_{j ∈ hp(i)} ⌈R / T_j⌉ · C_j`
//!
//!   iterated to a fixed point.  A task whose response exceeds its deadline
//!   (its period unless overridden) can miss.
//!
//! | n | L&L bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |

use crate::kernel::Tick;

/// Timing parameters of one task, in ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTiming {
    pub name: String,
    pub period: Tick,
    /// Worst-case execution demand in tick slots.
    pub execution: Tick,
    pub priority: u8,
    pub deadline: Tick,
}

impl TaskTiming {
    /// `execution / period`, `0.0` for a zero period.
    pub fn utilization(&self) -> f64 {
        if self.period == 0 {
            0.0
        } else {
            self.execution as f64 / self.period as f64
        }
    }
}

/// Worst-case response of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTime {
    pub name: String,
    /// `None` when the response exceeds the deadline.
    pub response: Option<Tick>,
    pub deadline: Tick,
}

impl ResponseTime {
    pub fn meets_deadline(&self) -> bool {
        self.response.is_some()
    }
}

/// `U_bound(n) = n × (2^(1/n) − 1)`; `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// Sum of the per-task utilizations.
pub fn total_utilization(tasks: &[TaskTiming]) -> f64 {
    tasks.iter().map(TaskTiming::utilization).sum()
}

/// `Some(total_utilization)` if the L&L bound is exceeded, `None` if the set
/// is provably schedulable under rate-monotonic priorities.
///
/// Tasks with a zero period or zero execution demand are excluded.
pub fn check_liu_layland(tasks: &[TaskTiming]) -> Option<f64> {
    let loaded: Vec<&TaskTiming> = tasks
        .iter()
        .filter(|t| t.period > 0 && t.execution > 0)
        .collect();
    if loaded.is_empty() {
        return None;
    }

    let total_u: f64 = loaded.iter().map(|t| t.utilization()).sum();
    if total_u > liu_layland_bound(loaded.len()) {
        Some(total_u)
    } else {
        None
    }
}

/// Worst-case response time of every task under its configured priority.
///
/// Results are returned in input order.
pub fn response_times(tasks: &[TaskTiming]) -> Vec<ResponseTime> {
    tasks
        .iter()
        .map(|task| {
            let higher: Vec<&TaskTiming> = tasks
                .iter()
                .filter(|o| o.priority > task.priority && o.period > 0)
                .collect();
            ResponseTime {
                name: task.name.clone(),
                response: response_time(task, &higher),
                deadline: task.deadline,
            }
        })
        .collect()
}

/// A zero-cost job still needs a slot free of higher-priority work, so the
/// iteration starts at one tick.  Its fixed point is then the slot the job
/// runs in.
fn response_time(task: &TaskTiming, higher: &[&TaskTiming]) -> Option<Tick> {
    let mut r = task.execution.max(1);
    loop {
        let interference: Tick = higher
            .iter()
            .map(|h| r.div_ceil(h.period).saturating_mul(h.execution))
            .fold(0, Tick::saturating_add);
        let next = task.execution.saturating_add(interference);
        if next > task.deadline {
            return None;
        }
        if next == r {
            return Some(r);
        }
        r = next;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(name: &str, period: Tick, execution: Tick, priority: u8) -> TaskTiming {
        TaskTiming {
            name: name.into(),
            period,
            execution,
            priority,
            deadline: period,
        }
    }

    #[test]
    fn bound_values() {
        assert_eq!(liu_layland_bound(0), 0.0);
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-10);
        assert!((liu_layland_bound(2) - 0.8284).abs() < 1e-3);
        assert!((liu_layland_bound(1000) - 2.0_f64.ln()).abs() < 1e-3);
    }

    #[test]
    fn demo_loads_pass_liu_layland() {
        // 5/10 + 12/100 = 0.62 < bound(2)
        let tasks = [timing("Load_1", 10, 5, 5), timing("Load_2", 100, 12, 6)];
        assert!(check_liu_layland(&tasks).is_none());
        assert!((total_utilization(&tasks) - 0.62).abs() < 1e-9);
    }

    #[test]
    fn overloaded_set_exceeds_bound() {
        let tasks = [
            timing("a", 10, 4, 1),
            timing("b", 10, 4, 2),
            timing("c", 10, 4, 3),
        ];
        let u = check_liu_layland(&tasks).unwrap();
        assert!((u - 1.2).abs() < 1e-9);
    }

    #[test]
    fn zero_cost_tasks_are_ignored_by_the_bound() {
        let tasks = [timing("mon", 50, 0, 1), timing("load", 10, 5, 2)];
        assert!(check_liu_layland(&tasks).is_none());
    }

    #[test]
    fn inverted_priorities_make_the_short_load_miss() {
        // Load_2 (T=100, C=12) outranks Load_1 (T=10, C=5): R(Load_1) = 5 + 12 > 10.
        let tasks = [timing("Load_1", 10, 5, 5), timing("Load_2", 100, 12, 6)];
        let rt = response_times(&tasks);
        assert_eq!(rt[0].response, None);
        assert!(!rt[0].meets_deadline());
        assert_eq!(rt[1].response, Some(12));
    }

    #[test]
    fn rate_monotonic_order_is_schedulable() {
        let tasks = [timing("Load_1", 10, 5, 6), timing("Load_2", 100, 12, 5)];
        let rt = response_times(&tasks);
        assert_eq!(rt[0].response, Some(5));
        // 12 + ceil(R/10)*5 → 17 → 22 → 27 → 27
        assert_eq!(rt[1].response, Some(27));
    }

    #[test]
    fn zero_cost_task_waits_for_higher_priority_work() {
        // 1 → 5 + 12 = 17 → 10 + 12 = 22 → 15 + 12 = 27 → 27
        let tasks = [
            timing("mon", 50, 0, 1),
            timing("Load_1", 10, 5, 5),
            timing("Load_2", 100, 12, 6),
        ];
        assert_eq!(response_times(&tasks)[0].response, Some(27));

        // Nothing above it: runs in the release slot.
        let alone = [timing("mon", 50, 0, 1)];
        assert_eq!(response_times(&alone)[0].response, Some(0));
    }

    #[test]
    fn classic_three_task_example() {
        // T=(10,20,50), C=(3,5,8), RM priorities.
        let tasks = [
            timing("a", 10, 3, 3),
            timing("b", 20, 5, 2),
            timing("c", 50, 8, 1),
        ];
        let rt = response_times(&tasks);
        assert_eq!(rt[0].response, Some(3));
        assert_eq!(rt[1].response, Some(8));
        // 8 + ceil(R/10)*3 + ceil(R/20)*5: 16 → 19 → 22 → 27 → 27
        assert_eq!(rt[2].response, Some(27));
    }
}
