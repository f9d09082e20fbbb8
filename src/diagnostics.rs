//! Diagnostics channel.
//!
//! Tasks on the timing-critical path format a short record and hand it to
//! [`Diagnostics::report`], which never blocks: when the queue is full the
//! oldest record is evicted. A low-priority [`DiagnosticsSink`] task drains
//! the queue and forwards each record to the status channel, but only while
//! the debug flag is set. Records are always formatted and queued; the
//! flag is checked at emission time.
//!
//! ```text
//!  Actuators ─┐
//!             ├─▶ DiagnosticsQueue ──▶ DiagnosticsSink ──▶ StatusSink
//!  Dispatcher ┘   (evict oldest)       (debug flag gate)
//! ```

use core::fmt::{self, Write as _};
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::adapters::time::MonotonicClock;
use crate::app::context::SharedContext;
use crate::app::ports::StatusSink;
use crate::app::queue::BoundedQueue;

/// Records buffered between producers and the sink.
pub const DIAGNOSTICS_QUEUE_DEPTH: usize = 16;

/// Longest record text; longer records are truncated.
pub const RECORD_LEN: usize = 128;

/// One status message, stamped when it was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub at_us: u64,
    pub text: heapless::String<RECORD_LEN>,
}

pub type DiagnosticsQueue = BoundedQueue<DiagnosticRecord, DIAGNOSTICS_QUEUE_DEPTH>;

/// Counters shared by the producers and the sink.
#[derive(Debug, Default)]
pub struct DiagnosticsStats {
    emitted: AtomicU64,
    discarded: AtomicU64,
    evicted: AtomicU64,
    max_latency_us: AtomicU64,
}

impl DiagnosticsStats {
    /// Records written to the status channel.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Records dropped because the debug flag was off.
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Records pushed out of a full queue before the sink saw them.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Worst observed time between report and emission.
    pub fn max_latency_us(&self) -> u64 {
        self.max_latency_us.load(Ordering::Relaxed)
    }
}

// ── Producer ──────────────────────────────────────────────────

/// Cheap, cloneable producer handle.
#[derive(Clone)]
pub struct Diagnostics {
    queue: Arc<DiagnosticsQueue>,
    stats: Arc<DiagnosticsStats>,
    clock: MonotonicClock,
}

impl Diagnostics {
    pub fn new(
        queue: Arc<DiagnosticsQueue>,
        stats: Arc<DiagnosticsStats>,
        clock: MonotonicClock,
    ) -> Self {
        Self {
            queue,
            stats,
            clock,
        }
    }

    /// Format and enqueue a record. Never blocks.
    pub fn report(&self, args: fmt::Arguments<'_>) {
        let mut text = heapless::String::new();
        // Overflow leaves a truncated record, which is still worth sending.
        let _ = Truncating(&mut text).write_fmt(args);
        let record = DiagnosticRecord {
            at_us: self.clock.uptime_us(),
            text,
        };
        if self.queue.push_evicting(record) {
            self.stats.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Writes as many chars as fit, then reports overflow.
struct Truncating<'a>(&'a mut heapless::String<RECORD_LEN>);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.0.push(c).map_err(|()| fmt::Error)?;
        }
        Ok(())
    }
}

// ── Sink task ─────────────────────────────────────────────────

pub struct DiagnosticsSink<O: StatusSink> {
    queue: Arc<DiagnosticsQueue>,
    stats: Arc<DiagnosticsStats>,
    ctx: Arc<SharedContext>,
    output: Arc<O>,
    clock: MonotonicClock,
}

impl<O: StatusSink> DiagnosticsSink<O> {
    pub fn new(
        queue: Arc<DiagnosticsQueue>,
        stats: Arc<DiagnosticsStats>,
        ctx: Arc<SharedContext>,
        output: Arc<O>,
        clock: MonotonicClock,
    ) -> Self {
        Self {
            queue,
            stats,
            ctx,
            output,
            clock,
        }
    }

    /// Drain the queue until shutdown.
    pub fn run(&self) {
        while let Some(record) = self.queue.pop_blocking(&self.ctx.shutdown) {
            self.handle(&record);
        }
        log::debug!("Diagnostics sink stopped");
    }

    /// Emit `record` if the debug flag is set. Returns whether it was emitted.
    pub fn handle(&self, record: &DiagnosticRecord) -> bool {
        if !self.ctx.debug.is_enabled() {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.output.emit(record.text.as_str());
        self.stats.emitted.fetch_add(1, Ordering::Relaxed);
        self.stats
            .max_latency_us
            .fetch_max(self.clock.elapsed_us(record.at_us), Ordering::Relaxed);
        true
    }
}
