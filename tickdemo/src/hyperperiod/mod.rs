/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Hyperperiod of the task set.
//!
//! The LCM of all periods is the window after which the release pattern
//! repeats.  The CLI runs whole hyperperiods by default so the reported
//! utilization covers a complete pattern.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::kernel::Tick;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HyperperiodError {
    /// No non-zero period to work with.
    #[error("no tasks with a valid (non-zero) period")]
    NoValidPeriods,

    /// LCM computation overflowed.
    #[error("LCM overflow computing lcm({a}, {b})")]
    Overflow { a: Tick, b: Tick },
}

/// LCM of the non-zero `periods`.
///
/// # Errors
/// * [`HyperperiodError::NoValidPeriods`] – every period is zero, or none given.
/// * [`HyperperiodError::Overflow`] – LCM exceeds [`Tick`].
pub fn hyperperiod(periods: &[Tick]) -> Result<Tick, HyperperiodError> {
    let distinct: BTreeSet<Tick> = periods.iter().copied().filter(|&p| p > 0).collect();
    if distinct.is_empty() {
        return Err(HyperperiodError::NoValidPeriods);
    }

    let h = distinct.iter().try_fold(1, |acc, &p| stretch(acc, p))?;
    debug!(hyperperiod = h, unique_periods = ?distinct, "Calculated hyperperiod");
    Ok(h)
}

/// Smallest multiple of `window` that `period` also divides.
fn stretch(window: Tick, period: Tick) -> Result<Tick, HyperperiodError> {
    let factor = period / common_divisor(window, period);
    window.checked_mul(factor).ok_or(HyperperiodError::Overflow {
        a: window,
        b: period,
    })
}

/// Euclid, recursive on the remainder.
fn common_divisor(a: Tick, b: Tick) -> Tick {
    match b {
        0 => a,
        _ => common_divisor(b, a % b),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_task_set_repeats_every_100_ticks() {
        assert_eq!(hyperperiod(&[50, 50, 100, 20, 10, 100]).unwrap(), 100);
    }

    #[test]
    fn zero_periods_are_ignored() {
        assert_eq!(hyperperiod(&[0, 6, 4]).unwrap(), 12);
    }

    #[test]
    fn coprime_and_nested_periods() {
        assert_eq!(hyperperiod(&[7, 3]).unwrap(), 21);
        assert_eq!(hyperperiod(&[10, 20, 40]).unwrap(), 40);
        assert_eq!(hyperperiod(&[13]).unwrap(), 13);
    }

    #[test]
    fn common_divisor_cases() {
        assert_eq!(common_divisor(50, 20), 10);
        assert_eq!(common_divisor(7, 3), 1);
        assert_eq!(common_divisor(0, 5), 5);
    }

    #[test]
    fn overflow_is_reported() {
        let a = Tick::MAX / 2 + 1;
        let b = Tick::MAX / 2 + 3;
        assert!(matches!(
            hyperperiod(&[a, b]),
            Err(HyperperiodError::Overflow { .. })
        ));
    }

    #[test]
    fn empty_or_all_zero_is_an_error() {
        assert_eq!(hyperperiod(&[]), Err(HyperperiodError::NoValidPeriods));
        assert_eq!(hyperperiod(&[0, 0]), Err(HyperperiodError::NoValidPeriods));
    }
}
