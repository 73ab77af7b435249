//! Deferred, coalescing work scheduling.
//!
//! At most one worker execution is pending at any time. Scheduling while a
//! run is pending replaces its delay instead of queueing a second run.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

/// A single-slot work queue with interrupt gating.
///
/// The slot holds `Some(delay)` for a request and `None` for a
/// cancellation, so a worker already waiting out a delay sees both.
pub struct WorkQueue {
    pending: Signal<CriticalSectionRawMutex, Option<Duration>>,
    queued: AtomicBool,
    irq_enabled: AtomicBool,
    int_state: AtomicBool,
}

impl WorkQueue {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
            queued: AtomicBool::new(false),
            irq_enabled: AtomicBool::new(false),
            int_state: AtomicBool::new(false),
        }
    }

    /// Requests a worker run after `delay`, replacing any pending request.
    pub fn schedule(&self, delay: Duration) {
        log::trace!("schedule work in {} ms", delay.as_millis());
        self.queued.store(true, Ordering::Release);
        self.pending.signal(Some(delay));
    }

    /// Drops a pending request, including one whose delay is running.
    pub fn cancel(&self) {
        self.queued.store(false, Ordering::Release);
        self.pending.signal(None);
    }

    pub fn is_pending(&self) -> bool {
        self.queued.load(Ordering::Acquire)
    }

    /// Unmasks interrupt delivery.
    pub fn enable_irq(&self) {
        self.irq_enabled.store(true, Ordering::Release);
    }

    /// Masks interrupt delivery. Interrupts arriving while masked are lost.
    pub fn disable_irq(&self) {
        self.irq_enabled.store(false, Ordering::Release);
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn mark_interrupt(&self) {
        self.int_state.store(true, Ordering::Release);
    }

    /// Returns `true` once an interrupt has led to a scheduled run.
    pub fn interrupt_seen(&self) -> bool {
        self.int_state.load(Ordering::Acquire)
    }

    /// Waits until the pending request is due and consumes it.
    ///
    /// A request scheduled while waiting restarts the wait with its delay.
    /// A cancellation sends it back to waiting for the next request.
    pub async fn next(&self) {
        let mut slot = self.pending.wait().await;
        loop {
            let Some(delay) = slot else {
                slot = self.pending.wait().await;
                continue;
            };
            if delay.as_ticks() == 0 {
                break;
            }
            match select(Timer::after(delay), self.pending.wait()).await {
                Either::First(()) => break,
                Either::Second(replaced) => slot = replaced,
            }
        }
        self.queued.store(false, Ordering::Release);
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
