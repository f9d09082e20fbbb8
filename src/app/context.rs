//! Process-wide state shared by every task.
//!
//! Owned by the controller and handed to each task at construction as an
//! `Arc<SharedContext>`; nothing here is a global.

use core::cell::RefCell;
use core::future::{Future, poll_fn};
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

/// Upper bound on tasks parked in [`ShutdownSignal::wait`] at once.
const SHUTDOWN_WAITERS: usize = 8;

// ── Debug flag ────────────────────────────────────────────────

/// Whether diagnostic records are printed.
///
/// Single writer (the input reader), best-effort readers. Relaxed ordering
/// is enough: a reader may see the old value for at most one poll interval.
pub struct DebugFlag(AtomicBool);

impl DebugFlag {
    pub const fn new(enabled: bool) -> Self {
        Self(AtomicBool::new(enabled))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

// ── Shutdown signal ───────────────────────────────────────────

/// One-shot, multi-waiter stop request.
///
/// Blocking tasks poll [`is_requested`](Self::is_requested) between waits;
/// queue receivers race their receive against [`wait`](Self::wait).
pub struct ShutdownSignal {
    requested: AtomicBool,
    waiters: BlockingMutex<CriticalSectionRawMutex, RefCell<MultiWakerRegistration<SHUTDOWN_WAITERS>>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            waiters: BlockingMutex::new(RefCell::new(MultiWakerRegistration::new())),
        }
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Request shutdown and wake every parked waiter.
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::Release);
        self.waiters.lock(|w| w.borrow_mut().wake());
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub fn wait(&self) -> impl Future<Output = ()> + '_ {
        poll_fn(move |cx| {
            if self.is_requested() {
                return Poll::Ready(());
            }
            self.waiters.lock(|w| w.borrow_mut().register(cx.waker()));
            // Re-check: trigger may have run between the first load and register.
            if self.is_requested() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
    }
}

// ── Shared context ────────────────────────────────────────────

/// State every task receives at construction.
pub struct SharedContext {
    pub debug: DebugFlag,
    pub shutdown: ShutdownSignal,
}

impl SharedContext {
    pub fn new(debug_at_boot: bool) -> Self {
        Self {
            debug: DebugFlag::new(debug_at_boot),
            shutdown: ShutdownSignal::new(),
        }
    }
}
