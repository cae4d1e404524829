/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-message periodic producer.

use tracing::trace;

use super::{Activity, ActivityContext};
use crate::queue::{Message, MessageError, QueueHandle};

/// Sends the same message on every release, zero-wait, drop-if-full.
pub struct PeriodicTransmitter {
    message: Message,
    queue: QueueHandle,
}

impl PeriodicTransmitter {
    /// # Errors
    /// [`MessageError::TooLong`] if `text` does not fit in a message.
    pub fn new(text: &str, queue: QueueHandle) -> Result<Self, MessageError> {
        Ok(Self {
            message: Message::new(text.as_bytes())?,
            queue,
        })
    }
}

impl Activity for PeriodicTransmitter {
    fn run(&mut self, ctx: &mut ActivityContext<'_>) {
        if self.queue.try_send(self.message).is_err() {
            trace!(now = ctx.now(), "queue full, periodic message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::testing::run_once;
    use crate::hal::sim::SimBoard;
    use crate::queue::MessageQueue;
    use std::sync::Arc;

    #[test]
    fn sends_once_per_release_until_full() {
        let queue = Arc::new(MessageQueue::with_capacity(3));
        let mut tx = PeriodicTransmitter::new("Periodic msg", Arc::clone(&queue)).unwrap();
        let mut board = SimBoard::capture(1_000_000);

        for now in 0..5 {
            run_once(&mut tx, &mut board, now * 100);
        }

        let c = queue.counters();
        assert_eq!(queue.len(), 3);
        assert_eq!(c.accepted, 3);
        assert_eq!(c.dropped, 2);
        assert_eq!(queue.try_receive().unwrap().as_bytes(), b"Periodic msg");
    }
}
