//! Recovery of a device that stopped answering.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::device::SarController;
use crate::event::EventSink;
use crate::power::PowerControl;
use crate::watchdog::Verdict;

/// Time the supply stays off, and the time given to it after switching on.
const POWER_CYCLE_DELAY: Duration = Duration::from_millis(100);

/// What a reinitialization request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReinitOutcome {
    Completed,
    /// Another reinitialization was in progress, nothing was done.
    AlreadyRunning,
    /// Reinitialization is not enabled in the configuration.
    Disabled,
}

/// Exclusive right to run a reinitialization, released on drop.
struct ReinitToken<'t> {
    busy: &'t AtomicBool,
}

impl<'t> ReinitToken<'t> {
    fn acquire(busy: &'t AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for ReinitToken<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Power cycles, resets and reprograms the device, restoring the
    /// enabled channels.
    ///
    /// At most one reinitialization runs at a time, concurrent requests
    /// return [`ReinitOutcome::AlreadyRunning`] without touching the device.
    pub async fn reinitialize(&self) -> ReinitOutcome {
        if !self.config.reinit_on_i2c_failure {
            log::debug!("reinitialization disabled");
            return ReinitOutcome::Disabled;
        }
        let Some(token) = ReinitToken::acquire(&self.reinit_busy) else {
            log::info!("reinitialization already running");
            return ReinitOutcome::AlreadyRunning;
        };
        log::info!("reinitialize");

        self.work.disable_irq();
        self.power_cycle().await;
        self.soft_reset().await;
        self.program_registers().await;
        self.restore_flip_overlay().await;
        self.work.enable_irq();
        self.flush_status().await;

        {
            let mut bus = self.bus.lock().await;
            if self.buttons.any_enabled() {
                if let Ok(val) = bus.enable_phases().await {
                    log::info!("restored phase enable, GNRLCTRL2 = {val:#x}");
                }
            }
            let _ = bus.compensate().await;
        }

        drop(token);
        let count = self.reset_count.fetch_add(1, Ordering::AcqRel) + 1;
        log::info!("reinitialize done, reset count {count}");
        ReinitOutcome::Completed
    }

    async fn power_cycle(&self) {
        if let Err(err) = self.power.lock(|power| power.borrow_mut().disable()) {
            log::error!("power off failed: {err:?}");
        }
        Timer::after(POWER_CYCLE_DELAY).await;
        if let Err(err) = self.power.lock(|power| power.borrow_mut().enable()) {
            log::error!("power on failed: {err:?}");
        }
        Timer::after(POWER_CYCLE_DELAY).await;
    }

    /// Probes the device once and returns the delay until the next probe.
    ///
    /// Nothing is probed while suspended.
    pub async fn watchdog_probe(&self) -> Duration {
        if self.is_suspended() {
            log::debug!("suspended, watchdog probe skipped");
            return Verdict::Healthy.next_delay();
        }
        let ok = self.bus.lock().await.read_whoami().await.is_ok();
        let verdict = self.watchdog.failures.record(ok);
        match verdict {
            Verdict::Healthy => log::trace!("watchdog probe ok"),
            Verdict::Failing(count) => log::error!("i2c watchdog failure count {count}"),
            Verdict::Recover => {
                log::error!("i2c watchdog failure threshold reached, reinitializing");
                self.reinitialize().await;
            }
        }
        verdict.next_delay()
    }

    /// Runs the watchdog forever. Spawn this in its own task.
    ///
    /// Returns at once if reinitialization is disabled.
    pub async fn run_watchdog(&self) {
        if !self.config.reinit_on_i2c_failure {
            log::debug!("watchdog disabled");
            return;
        }
        let mut delay = None;
        loop {
            let _probe = self.watchdog.next_tick(&mut delay).await;
            delay = Some(self.watchdog_probe().await);
        }
    }
}
