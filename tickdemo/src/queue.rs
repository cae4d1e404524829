/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bounded inter-task message queue.
//!
//! One [`MessageQueue`] is shared by every producer (input monitors, periodic
//! transmitter) and the single consumer (queue forwarder).  Both directions
//! are **zero-wait**: a send on a full queue fails immediately and the message
//! is lost, a receive on an empty queue returns `None` and changes nothing.
//!
//! ```text
//! monitor ─┐
//! monitor ─┼──try_send──►  [ slot | slot | … | slot ]  ──try_receive──►  forwarder
//! transmit ┘                 capacity fixed at creation
//! ```
//!
//! Mutations are serialised by an internal mutex, so producers and the
//! consumer never lock anything themselves.  The lock is only held for the
//! duration of one push/pop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Maximum payload length of a single [`Message`], in bytes.
pub const MAX_MESSAGE_LEN: usize = 20;

/// Default number of slots in the demo queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

// ── Message ───────────────────────────────────────────────────────────────────

/// Error building a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message payload is {len} bytes, maximum is {MAX_MESSAGE_LEN}")]
    TooLong { len: usize },
}

/// Fixed-size queue item: a length plus up to [`MAX_MESSAGE_LEN`] payload
/// bytes.
///
/// The queue stores messages by value; a sender keeps its own copy.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Message {
    len: u32,
    payload: [u8; MAX_MESSAGE_LEN],
}

impl Message {
    /// Build a message from raw bytes.
    ///
    /// # Errors
    /// [`MessageError::TooLong`] if `bytes` exceeds [`MAX_MESSAGE_LEN`].
    pub fn new(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() > MAX_MESSAGE_LEN {
            return Err(MessageError::TooLong { len: bytes.len() });
        }
        let mut payload = [0u8; MAX_MESSAGE_LEN];
        payload[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            len: bytes.len() as u32,
            payload,
        })
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid payload bytes, bounded by the length field.
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload[..self.len()]
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("len", &self.len)
            .field("text", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

// ── Queue ─────────────────────────────────────────────────────────────────────

/// Returned by [`MessageQueue::try_send`] when every slot is occupied.
///
/// The rejected message is not handed back: delivery is at-most-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("message queue is full")]
pub struct QueueFull;

/// Shared handle to the queue.  Producers and the consumer each own a clone.
pub type QueueHandle = Arc<MessageQueue>;

/// Bounded FIFO of [`Message`] slots.
#[derive(Debug)]
pub struct MessageQueue {
    slots: Mutex<VecDeque<Message>>,
    capacity: usize,

    // Observational counters.  They never influence queue behaviour.
    accepted: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
}

impl MessageQueue {
    /// Create an empty queue with `capacity` slots.
    ///
    /// Callers go through
    /// [`PeriodicTaskManager::create_queue`](crate::kernel::PeriodicTaskManager::create_queue),
    /// which rejects a zero capacity and charges the storage to the kernel
    /// heap.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    /// Size of one slot in bytes.
    pub const fn item_size() -> usize {
        std::mem::size_of::<Message>()
    }

    // push_back / pop_front are the only mutations; a poisoned deque is intact.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Zero-wait send: append `msg` to the tail.
    ///
    /// # Errors
    /// [`QueueFull`] when the queue already holds `capacity` messages.  The
    /// message is discarded and occupancy is unchanged.
    pub fn try_send(&self, msg: Message) -> Result<(), QueueFull> {
        let mut slots = self.lock();
        if slots.len() >= self.capacity {
            drop(slots);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(QueueFull);
        }
        slots.push_back(msg);
        drop(slots);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Zero-wait receive: remove and return the head, or `None` when empty.
    pub fn try_receive(&self) -> Option<Message> {
        let msg = self.lock().pop_front();
        if msg.is_some() {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        msg
    }

    /// Current occupancy.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the observational counters.
    pub fn counters(&self) -> QueueCounters {
        QueueCounters {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
        }
    }
}

/// Lifetime send/receive totals for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounters {
    /// Sends that found a free slot.
    pub accepted: u64,
    /// Sends rejected with [`QueueFull`].
    pub dropped: u64,
    /// Successful receives.
    pub delivered: u64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
