/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host-side peripherals.
//!
//! * [`SimGpio`] – scripted input levels, recorded output writes.
//! * [`CaptureSerial`] – in-memory transmit buffer.
//! * [`ConsoleSerial`] – forwards serial output to stdout.
//! * [`SimTimer`] – free-running counter derived from [`Instant`].
//! * [`SimBoard`] – the three bundled as a [`Board`].

use std::collections::HashMap;
use std::io::Write;
use std::time::Instant;

use super::{Board, DigitalIo, HardwareTimer, Level, PinId, SerialPort};

// ── GPIO ──────────────────────────────────────────────────────────────────────

/// Sequence of levels an input pin reports, one per read.
#[derive(Debug, Clone)]
struct InputScript {
    levels: Vec<Level>,
    next: usize,
    cycle: bool,
}

impl InputScript {
    fn sample(&mut self) -> Level {
        let Some(&last) = self.levels.last() else {
            return Level::Low;
        };
        if self.next >= self.levels.len() {
            if !self.cycle {
                return last;
            }
            self.next = 0;
        }
        let level = self.levels[self.next];
        self.next += 1;
        level
    }
}

/// Simulated GPIO block.
///
/// Inputs are driven by per-pin scripts (each `read` consumes one entry; once
/// exhausted the script either restarts or keeps reporting its last level).
/// Unscripted pins read back the last level written to them, `Low` if never
/// written.
#[derive(Debug, Default)]
pub struct SimGpio {
    inputs: HashMap<PinId, InputScript>,
    outputs: HashMap<PinId, Level>,
    pulses: HashMap<PinId, u64>,
    writes: u64,
}

impl SimGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `pin` at a constant level.
    pub fn set_input(&mut self, pin: PinId, level: Level) {
        self.script_input(pin, vec![level], false);
    }

    /// Feed `levels` to successive reads of `pin`.
    pub fn script_input(&mut self, pin: PinId, levels: Vec<Level>, cycle: bool) {
        self.inputs.insert(
            pin,
            InputScript {
                levels,
                next: 0,
                cycle,
            },
        );
    }

    /// Last level written to `pin`.
    pub fn output_level(&self, pin: PinId) -> Level {
        self.outputs.get(&pin).copied().unwrap_or_default()
    }

    /// Number of Low→High transitions written to `pin`.
    pub fn pulse_count(&self, pin: PinId) -> u64 {
        self.pulses.get(&pin).copied().unwrap_or(0)
    }

    /// Total number of writes across all pins.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl DigitalIo for SimGpio {
    fn read(&mut self, pin: PinId) -> Level {
        match self.inputs.get_mut(&pin) {
            Some(script) => script.sample(),
            None => self.output_level(pin),
        }
    }

    fn write(&mut self, pin: PinId, level: Level) {
        let previous = self.outputs.insert(pin, level).unwrap_or_default();
        if previous == Level::Low && level == Level::High {
            *self.pulses.entry(pin).or_insert(0) += 1;
        }
        self.writes += 1;
    }
}

// ── Serial ────────────────────────────────────────────────────────────────────

/// Collects every transmitted byte in memory.
#[derive(Debug, Default)]
pub struct CaptureSerial {
    tx: Vec<u8>,
}

impl CaptureSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything transmitted so far.
    pub fn tx_buffer(&self) -> &[u8] {
        &self.tx
    }

    /// Transmitted bytes split into the lines the forwarder emits
    /// (each message is preceded by `'\n'`).
    pub fn lines(&self) -> Vec<String> {
        self.tx
            .split(|&b| b == b'\n')
            .filter(|l| !l.is_empty())
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }
}

impl SerialPort for CaptureSerial {
    fn put_char(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn put_string(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}

/// Writes serial output straight to stdout.
///
/// Write errors are ignored: a UART has no way to report them either.
#[derive(Debug, Default)]
pub struct ConsoleSerial;

impl SerialPort for ConsoleSerial {
    fn put_char(&mut self, byte: u8) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(&[byte]);
        if byte == b'\n' {
            let _ = out.flush();
        }
    }

    fn put_string(&mut self, bytes: &[u8]) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }
}

// ── Timer ─────────────────────────────────────────────────────────────────────

/// Free-running 32-bit counter that advances at `counts_per_sec` from the
/// moment it is created, wrapping like a hardware timer register.
#[derive(Debug, Clone)]
pub struct SimTimer {
    start: Instant,
    counts_per_sec: u64,
}

impl SimTimer {
    pub fn new(counts_per_sec: u64) -> Self {
        Self {
            start: Instant::now(),
            counts_per_sec,
        }
    }
}

impl HardwareTimer for SimTimer {
    fn counter(&self) -> u32 {
        let counts = self.start.elapsed().as_nanos() * u128::from(self.counts_per_sec)
            / 1_000_000_000;
        counts as u32
    }
}

// ── Board ─────────────────────────────────────────────────────────────────────

/// Simulated board: GPIO, a serial port of choice and a timer.
#[derive(Debug)]
pub struct SimBoard<S = CaptureSerial> {
    pub gpio: SimGpio,
    pub serial: S,
    pub timer: SimTimer,
}

impl SimBoard<CaptureSerial> {
    /// Board with an in-memory serial port, as used by the tests.
    pub fn capture(timer_counts_per_sec: u64) -> Self {
        Self::with_serial(CaptureSerial::new(), timer_counts_per_sec)
    }
}

impl<S: SerialPort> SimBoard<S> {
    pub fn with_serial(serial: S, timer_counts_per_sec: u64) -> Self {
        Self {
            gpio: SimGpio::new(),
            serial,
            timer: SimTimer::new(timer_counts_per_sec),
        }
    }
}

impl<S: SerialPort> Board for SimBoard<S> {
    fn gpio(&mut self) -> &mut dyn DigitalIo {
        &mut self.gpio
    }

    fn serial(&mut self) -> &mut dyn SerialPort {
        &mut self.serial
    }

    fn timer(&self) -> &dyn HardwareTimer {
        &self.timer
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const PIN: PinId = PinId::new(1, 0);
    const OUT: PinId = PinId::new(0, 0);

    #[test]
    fn unscripted_input_reads_low() {
        let mut gpio = SimGpio::new();
        assert_eq!(gpio.read(PIN), Level::Low);
    }

    #[test]
    fn script_is_consumed_one_level_per_read_then_holds() {
        let mut gpio = SimGpio::new();
        gpio.script_input(PIN, vec![Level::Low, Level::High], false);
        assert_eq!(gpio.read(PIN), Level::Low);
        assert_eq!(gpio.read(PIN), Level::High);
        assert_eq!(gpio.read(PIN), Level::High);
        assert_eq!(gpio.read(PIN), Level::High);
    }

    #[test]
    fn cyclic_script_restarts() {
        let mut gpio = SimGpio::new();
        gpio.script_input(PIN, vec![Level::High, Level::Low], true);
        let seen: Vec<Level> = (0..5).map(|_| gpio.read(PIN)).collect();
        assert_eq!(
            seen,
            vec![Level::High, Level::Low, Level::High, Level::Low, Level::High]
        );
    }

    #[test]
    fn empty_script_reads_low() {
        let mut gpio = SimGpio::new();
        gpio.script_input(PIN, Vec::new(), true);
        assert_eq!(gpio.read(PIN), Level::Low);
    }

    #[test]
    fn pulses_count_rising_writes_only() {
        let mut gpio = SimGpio::new();
        for _ in 0..3 {
            gpio.write(OUT, Level::High);
            gpio.write(OUT, Level::Low);
        }
        // A repeated High is not a new pulse.
        gpio.write(OUT, Level::High);
        gpio.write(OUT, Level::High);

        assert_eq!(gpio.pulse_count(OUT), 4);
        assert_eq!(gpio.write_count(), 8);
        assert_eq!(gpio.output_level(OUT), Level::High);
    }

    #[test]
    fn capture_serial_splits_lines() {
        let mut serial = CaptureSerial::new();
        serial.put_char(b'\n');
        serial.put_string(b"Periodic msg");
        serial.put_char(b'\n');
        serial.put_string(b"rising button 1");
        assert_eq!(serial.lines(), vec!["Periodic msg", "rising button 1"]);
    }

    #[test]
    fn sim_timer_is_monotonic() {
        let timer = SimTimer::new(1_000_000);
        let a = timer.counter();
        let b = timer.counter();
        assert!(b >= a);
    }
}
