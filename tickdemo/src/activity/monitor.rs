/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Digital input edge monitor.

use tracing::{debug, trace};

use super::{Activity, ActivityContext};
use crate::hal::{Level, PinId};
use crate::queue::{Message, MessageError, QueueHandle};

/// Polls one input line per release and enqueues an event on every edge.
///
/// The previous level is private to the monitor and starts `Low`.  It is
/// updated only when an edge is detected.  Events are sent zero-wait; a full
/// queue drops the event, which can hide a real transition.
pub struct DigitalInputMonitor {
    pin: PinId,
    previous: Level,
    rising: Message,
    falling: Message,
    queue: QueueHandle,
}

impl DigitalInputMonitor {
    /// Monitor `pin`, tagging events with `label` ("rising {label}" /
    /// "falling {label}").
    ///
    /// # Errors
    /// [`MessageError::TooLong`] if the tagged event text does not fit in a
    /// message.
    pub fn new(pin: PinId, label: &str, queue: QueueHandle) -> Result<Self, MessageError> {
        Ok(Self {
            pin,
            previous: Level::Low,
            rising: Message::new(format!("rising {label}").as_bytes())?,
            falling: Message::new(format!("falling {label}").as_bytes())?,
            queue,
        })
    }

    pub fn previous_level(&self) -> Level {
        self.previous
    }
}

impl Activity for DigitalInputMonitor {
    fn run(&mut self, ctx: &mut ActivityContext<'_>) {
        let current = ctx.gpio().read(self.pin);
        if current == self.previous {
            return;
        }

        let event = match current {
            Level::High => self.rising,
            Level::Low => self.falling,
        };
        if self.queue.try_send(event).is_err() {
            trace!(pin = %self.pin, now = ctx.now(), "queue full, edge event dropped");
        } else {
            debug!(pin = %self.pin, level = ?current, now = ctx.now(), "edge event queued");
        }
        self.previous = current;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
