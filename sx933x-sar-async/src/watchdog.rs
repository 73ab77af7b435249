//! Bus health monitoring.
//!
//! The watchdog reads the identity register periodically. Three consecutive
//! failures trigger a full reinitialization of the device.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

/// Probe period while the bus is healthy.
pub const WATCHDOG_PERIOD: Duration = Duration::from_millis(10_000);
/// Probe period after a failure, and right after resume.
pub const WATCHDOG_PERIOD_ERR: Duration = Duration::from_millis(2_000);
/// Consecutive failures that trigger a reinitialization.
pub const FAILURE_THRESHOLD: u8 = 3;

/// The result of recording one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    /// The probe failed, carrying the consecutive failure count.
    Failing(u8),
    /// The threshold was reached and the count was cleared.
    Recover,
}

impl Verdict {
    /// Delay until the next probe.
    pub const fn next_delay(self) -> Duration {
        match self {
            Verdict::Failing(_) => WATCHDOG_PERIOD_ERR,
            Verdict::Healthy | Verdict::Recover => WATCHDOG_PERIOD,
        }
    }
}

/// Counts consecutive probe failures.
pub struct FailureCounter {
    count: AtomicU8,
}

impl FailureCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU8::new(0),
        }
    }

    pub fn count(&self) -> u8 {
        self.count.load(Ordering::Acquire)
    }

    /// Records the result of one probe.
    pub fn record(&self, ok: bool) -> Verdict {
        if ok {
            self.count.store(0, Ordering::Release);
            return Verdict::Healthy;
        }
        let count = self.count().saturating_add(1);
        if count >= FAILURE_THRESHOLD {
            self.count.store(0, Ordering::Release);
            Verdict::Recover
        } else {
            self.count.store(count, Ordering::Release);
            Verdict::Failing(count)
        }
    }
}

impl Default for FailureCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Stop,
    Start(Duration),
}

/// Scheduling state of the watchdog task.
pub struct Watchdog {
    pub(crate) failures: FailureCounter,
    control: Signal<CriticalSectionRawMutex, Control>,
    busy: Mutex<CriticalSectionRawMutex, ()>,
}

impl Watchdog {
    pub const fn new() -> Self {
        Self {
            failures: FailureCounter::new(),
            control: Signal::new(),
            busy: Mutex::new(()),
        }
    }

    /// Arms the watchdog to probe after `delay`.
    pub fn start(&self, delay: Duration) {
        self.control.signal(Control::Start(delay));
    }

    /// Disarms the watchdog and waits for a probe in progress to finish.
    pub async fn stop(&self) {
        self.control.signal(Control::Stop);
        let _probe = self.busy.lock().await;
    }

    /// Waits for the next due probe.
    ///
    /// `delay` holds the current arming state and is updated by start and
    /// stop requests. The returned guard must be held while probing.
    pub(crate) async fn next_tick<'s>(
        &'s self,
        delay: &mut Option<Duration>,
    ) -> MutexGuard<'s, CriticalSectionRawMutex, ()> {
        loop {
            let control = match *delay {
                None => self.control.wait().await,
                Some(period) => match select(Timer::after(period), self.control.wait()).await {
                    Either::First(()) => return self.busy.lock().await,
                    Either::Second(control) => control,
                },
            };
            *delay = match control {
                Control::Start(period) => Some(period),
                Control::Stop => None,
            };
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
