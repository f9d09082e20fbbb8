//! Bounded inter-task queues.
//!
//! Uses `embassy-sync` bounded MPMC channels to hand owned values from a
//! polling producer to a blocking consumer thread. Producers never block:
//! a full queue either rejects the item or, for loss-tolerant traffic,
//! evicts the oldest one.
//!
//! ```text
//! ┌──────────────┐  RawLine   ┌──────────────┐
//! │ Input Reader │──────────▶│  Dispatcher  │
//! │  (polling)   │  try_send  │  (blocking)  │
//! └──────────────┘            └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future;

use super::context::ShutdownSignal;

/// Largest command line accepted, in bytes.
pub const MAX_LINE_LEN: usize = 80;

/// Channel depth for command lines.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

// ── RawLine ───────────────────────────────────────────────────

/// One terminated line from the serial console, owned by exactly one task
/// at a time and moved through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub text: heapless::String<MAX_LINE_LEN>,
    /// Controller uptime when the terminator arrived.
    pub received_at_us: u64,
}

impl RawLine {
    /// Build a line from `text`, truncating at a char boundary if needed.
    pub fn new(text: &str, received_at_us: u64) -> Self {
        let mut line = heapless::String::new();
        for c in text.chars() {
            if line.push(c).is_err() {
                break;
            }
        }
        Self {
            text: line,
            received_at_us,
        }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

// ── BoundedQueue ──────────────────────────────────────────────

/// FIFO with non-blocking producers and a shutdown-aware blocking consumer.
pub struct BoundedQueue<T, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> BoundedQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking. Hands the item back if the queue is full.
    pub fn push(&self, item: T) -> Result<(), T> {
        self.channel.try_send(item).map_err(|e| match e {
            embassy_sync::channel::TrySendError::Full(item) => item,
        })
    }

    /// Enqueue without blocking, evicting the oldest entry when full.
    /// Returns `true` if something was evicted.
    pub fn push_evicting(&self, item: T) -> bool {
        let mut item = item;
        let mut evicted = false;
        loop {
            match self.push(item) {
                Ok(()) => return evicted,
                Err(back) => {
                    // Another producer may refill the slot; retry until it sticks.
                    evicted |= self.channel.try_receive().is_ok();
                    item = back;
                }
            }
        }
    }

    /// Dequeue without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Block the calling thread until an item arrives.
    ///
    /// Returns `None` once `shutdown` has been triggered; items still queued
    /// at that point are left in place.
    pub fn pop_blocking(&self, shutdown: &ShutdownSignal) -> Option<T> {
        if shutdown.is_requested() {
            return None;
        }
        future::block_on(future::or(
            async { Some(self.channel.receive().await) },
            async {
                shutdown.wait().await;
                None
            },
        ))
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Queue between the input reader and the dispatcher.
pub type CommandQueue = BoundedQueue<RawLine, COMMAND_QUEUE_DEPTH>;
