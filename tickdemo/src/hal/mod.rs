/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Peripheral services consumed by the scheduler and the activities.
//!
//! The core never touches hardware directly.  Digital I/O, the serial port
//! and the free-running timer are reached through the traits below and
//! bundled per target into a [`Board`].  [`sim`] provides host-side
//! implementations used by the CLI and the tests.

pub mod sim;

use serde::Deserialize;

// ── Digital I/O ───────────────────────────────────────────────────────────────

/// Logical level of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    High,
}

/// A (port, pin) pair identifying one digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl std::fmt::Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}.{}", self.port, self.pin)
    }
}

/// Digital I/O service.
pub trait DigitalIo {
    /// Sample the current level of `pin`.
    fn read(&mut self, pin: PinId) -> Level;

    /// Drive `pin` to `level`.
    fn write(&mut self, pin: PinId, level: Level);
}

// ── Serial ────────────────────────────────────────────────────────────────────

/// Serial output service.
pub trait SerialPort {
    fn put_char(&mut self, byte: u8);

    fn put_string(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put_char(b);
        }
    }
}

// ── Timer ─────────────────────────────────────────────────────────────────────

/// Free-running hardware counter.  Sampled once at startup for diagnostics;
/// the scheduler never uses it.
pub trait HardwareTimer {
    fn counter(&self) -> u32;
}

// ── Board ─────────────────────────────────────────────────────────────────────

/// The full set of peripherals one target exposes.
pub trait Board {
    fn gpio(&mut self) -> &mut dyn DigitalIo;
    fn serial(&mut self) -> &mut dyn SerialPort;
    fn timer(&self) -> &dyn HardwareTimer;
}
