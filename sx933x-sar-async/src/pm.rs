//! Attach, detach and power management.

use core::sync::atomic::Ordering;

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use sx933x_async::op::Command;

use crate::button::Distance;
use crate::device::{HardwareFault, SarController};
use crate::error::SarError;
use crate::event::EventSink;
use crate::power::PowerControl;
use crate::watchdog::{WATCHDOG_PERIOD, WATCHDOG_PERIOD_ERR};

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Brings the sensor up.
    ///
    /// Used channels are reported as [`Distance::Unknown`], the supply is
    /// switched on, the device is initialized and its identity checked. A
    /// failed identity check is logged and returned but does not fail the
    /// attach. The watchdog is armed if reinitialization is enabled.
    pub async fn attach(&self) -> Result<HardwareFault, SarError<I2C::Error>> {
        log::info!("attach");
        self.buttons.mark_used(self.config.button_used_flag);
        for (channel, button) in self.buttons.iter().filter(|(_, b)| b.is_used()) {
            self.report(channel, button, Distance::Unknown);
        }

        self.power.lock(|power| power.borrow_mut().enable())?;
        let startup = self.power.lock(|power| power.borrow().startup_delay());
        if startup.as_ticks() > 0 {
            Timer::after(startup).await;
        }

        self.initialize().await;
        let fault = self.hardware_check().await;
        if fault != HardwareFault::None {
            log::error!("hardware check failed: {fault:?}");
        }

        if self.config.reinit_on_i2c_failure {
            self.watchdog.start(WATCHDOG_PERIOD);
        }
        self.restore_flip_overlay().await;
        log::info!("attach done");
        Ok(fault)
    }

    /// Masks interrupts, drops pending work, stops the watchdog and removes
    /// power.
    pub async fn detach(&self) {
        log::info!("detach");
        self.work.disable_irq();
        self.work.cancel();
        self.watchdog.stop().await;
        if let Err(err) = self.power.lock(|power| power.borrow_mut().disable()) {
            log::warn!("power off failed: {err:?}");
        }
    }

    /// Puts the device to sleep and masks interrupts.
    pub async fn suspend(&self) {
        log::debug!("suspend");
        if self.config.reinit_on_i2c_failure {
            self.watchdog.stop().await;
        }
        let _ = self.bus.lock().await.command(Command::EnterSleep).await;
        self.work.disable_irq();
        self.suspended.store(true, Ordering::Release);
    }

    /// Wakes the device and schedules a worker run to catch up on events
    /// missed while asleep.
    pub async fn resume(&self) {
        log::debug!("resume");
        self.work.schedule(Duration::from_ticks(0));
        self.work.enable_irq();
        let _ = self.bus.lock().await.command(Command::ExitSleep).await;
        self.suspended.store(false, Ordering::Release);
        if self.config.reinit_on_i2c_failure {
            self.watchdog.start(WATCHDOG_PERIOD_ERR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{controller, controller_with_supply};
    use crate::Config;
    use embassy_futures::block_on;
    use sx933x_async::reg;

    #[test]
    fn attach_reports_unknown_and_checks_identity() {
        let (ctrl, bus, _line, regulator) = controller_with_supply(Config {
            button_used_flag: 0b0_0011,
            ..Default::default()
        });
        bus.set(reg::INFO, reg::WHOAMI_VALUE);
        assert_eq!(block_on(ctrl.attach()).unwrap(), HardwareFault::None);
        assert!(regulator.is_enabled());

        let events = ctrl.sink().take();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.distance == Distance::Unknown));
        assert_eq!(events[1].name, "CapSense Ch1");
        assert!(!ctrl.buttons().any_enabled());
        assert!(ctrl.work.irq_enabled());
    }

    #[test]
    fn attach_survives_unknown_identity() {
        let (ctrl, bus, _line) = controller(Default::default());
        bus.set(reg::INFO, 0xBEEF);
        assert_eq!(block_on(ctrl.attach()).unwrap(), HardwareFault::IdMismatch);
        assert_eq!(ctrl.fault(), HardwareFault::IdMismatch);
    }

    #[test]
    fn attach_fails_without_power() {
        let (ctrl, bus, _line, regulator) = controller_with_supply(Default::default());
        regulator.fail_enable(true);
        assert!(matches!(block_on(ctrl.attach()), Err(SarError::Power(_))));
        assert_eq!(bus.writes_to(reg::RESET), 0);
    }

    #[test]
    fn suspend_and_resume() {
        let (ctrl, bus, _line) = controller(Default::default());
        block_on(ctrl.attach()).unwrap();
        bus.clear_log();

        block_on(ctrl.suspend());
        assert!(ctrl.is_suspended());
        assert!(!ctrl.work.irq_enabled());
        ctrl.handle_interrupt();
        assert!(!ctrl.work.is_pending());

        block_on(ctrl.resume());
        assert!(!ctrl.is_suspended());
        assert!(ctrl.work.irq_enabled());
        assert!(ctrl.work.is_pending());
        assert_eq!(bus.written(reg::CMD), [0x0D, 0x0C]);
    }

    #[test]
    fn detach_powers_down() {
        let (ctrl, _bus, _line, regulator) = controller_with_supply(Default::default());
        block_on(ctrl.attach()).unwrap();
        ctrl.work.schedule(Duration::from_ticks(0));
        block_on(ctrl.detach());
        assert!(!regulator.is_enabled());
        assert!(!ctrl.work.is_pending());
        assert!(!ctrl.work.irq_enabled());
    }

    #[test]
    fn detach_cancels_delayed_work() {
        use embassy_futures::join::join;
        use embassy_futures::select::{select, Either};

        let (ctrl, _bus, _line, _regulator) = controller_with_supply(Default::default());
        block_on(ctrl.attach()).unwrap();
        ctrl.work.schedule(Duration::from_millis(50));
        let worker = async {
            matches!(
                select(ctrl.work.next(), Timer::after(Duration::from_millis(300))).await,
                Either::Second(())
            )
        };
        let teardown = async {
            Timer::after(Duration::from_millis(5)).await;
            ctrl.detach().await;
        };
        let (still_waiting, ()) = block_on(join(worker, teardown));
        assert!(still_waiting);
    }
}
