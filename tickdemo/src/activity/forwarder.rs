/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Queue consumer: forwards at most one message per release to the serial
//! port.

use tracing::trace;

use super::{Activity, ActivityContext};
use crate::queue::QueueHandle;

/// Drains one message per release and writes it to the serial sink, preceded
/// by a line separator.
///
/// If producers outpace the drain rate the queue saturates and further sends
/// are dropped until this task frees a slot.
pub struct QueueForwarder {
    queue: QueueHandle,
}

impl QueueForwarder {
    pub fn new(queue: QueueHandle) -> Self {
        Self { queue }
    }
}

impl Activity for QueueForwarder {
    fn run(&mut self, ctx: &mut ActivityContext<'_>) {
        let Some(msg) = self.queue.try_receive() else {
            return;
        };
        trace!(now = ctx.now(), len = msg.len(), "forwarding message");
        let serial = ctx.serial();
        serial.put_char(b'\n');
        serial.put_string(msg.as_bytes());
    }
}
