//! Device initialization and identity check.

use core::sync::atomic::Ordering;

use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use sx933x_async::conf::RegSetting;
use sx933x_async::op::{Command, ResetOutcome, RetryPolicy};
use sx933x_async::reg::{WHOAMI_DFN_VALUE, WHOAMI_VALUE};

use crate::device::{HardwareFault, SarController};
use crate::event::EventSink;
use crate::power::PowerControl;

/// Time the device needs after a soft reset.
pub const RESET_SETTLE: Duration = Duration::from_millis(100);
/// Interval between two status flushes while the line is stuck.
const NIRQ_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Status flushes before the line is declared stuck.
const NIRQ_POLL_ATTEMPTS: u8 = 10;

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Resets the device and programs the register table.
    ///
    /// Interrupts are masked for the whole sequence and the pending status
    /// is flushed before returning.
    pub async fn initialize(&self) -> ResetOutcome {
        log::info!("initialize");
        self.work.disable_irq();
        let outcome = self.soft_reset().await;
        self.fault.store(HardwareFault::None as u8, Ordering::Release);
        self.program_registers().await;
        self.work.enable_irq();
        self.flush_status().await;
        outcome
    }

    /// Soft reset with the default retry policy followed by the settle time.
    pub(crate) async fn soft_reset(&self) -> ResetOutcome {
        let outcome = self.bus.lock().await.soft_reset(RetryPolicy::default()).await;
        if !outcome.acknowledged {
            log::error!("soft reset not acknowledged after {} attempts", outcome.attempts);
        }
        Timer::after(RESET_SETTLE).await;
        outcome
    }

    /// Programs the register table, the board overrides and the headset
    /// snapshot, then issues the phase control command.
    pub(crate) async fn program_registers(&self) {
        let mut bus = self.bus.lock().await;
        let failed = bus.program(self.config.register_table).await;
        if failed > 0 {
            log::warn!("{failed} register writes failed");
        }
        for setting in self.config.register_overrides {
            log::debug!("override {:#06x} = {:#010x}", setting.reg, setting.val);
            // Failures are logged by the transport.
            let _ = bus.write_register(setting.reg, setting.val).await;
        }

        let mut snapshot = heapless::Vec::<RegSetting, { crate::device::MAX_HEADSET_REGS }>::new();
        for setting in self.config.headset_regs {
            let Ok(val) = bus.read_register(setting.reg).await else {
                continue;
            };
            if snapshot.push(RegSetting::new(setting.reg, val)).is_err() {
                log::warn!("headset snapshot full, {:#06x} not saved", setting.reg);
            }
        }
        self.headset_backup.lock(|backup| *backup.borrow_mut() = snapshot);

        let _ = bus.command(Command::PhaseControl).await;
    }

    /// Checks that the device answers with a known identity.
    ///
    /// While the interrupt line stays asserted the status is flushed every
    /// 100 ms, giving up after one second. The result is stored and
    /// returned.
    pub async fn hardware_check(&self) -> HardwareFault {
        let mut fault = HardwareFault::None;
        let mut polls = 0;
        while self.nirq_asserted() == Some(true) {
            if polls >= NIRQ_POLL_ATTEMPTS {
                log::error!("nirq stuck asserted");
                fault = HardwareFault::IrqStuck;
                break;
            }
            polls += 1;
            self.flush_status().await;
            Timer::after(NIRQ_POLL_INTERVAL).await;
        }

        match self.bus.lock().await.read_whoami().await {
            Err(_) => fault = HardwareFault::BusError,
            Ok(id) if id == WHOAMI_DFN_VALUE => {
                log::info!("idcode = {id:#x}");
                fault = HardwareFault::None;
            }
            Ok(id) if id != WHOAMI_VALUE => {
                log::error!("unexpected idcode = {id:#x}");
                fault = HardwareFault::IdMismatch;
            }
            Ok(id) => log::info!("idcode = {id:#x}"),
        }
        log::info!("hardware check: {fault:?}");
        self.fault.store(fault as u8, Ordering::Release);
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::controller;
    use embassy_futures::block_on;
    use sx933x_async::conf::DEFAULT_REGISTER_TABLE;
    use sx933x_async::reg;

    #[test]
    fn initialize_resets_and_programs() {
        let (ctrl, bus, _line) = controller(Default::default());
        let outcome = block_on(ctrl.initialize());
        assert!(outcome.acknowledged);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(bus.writes_to(reg::RESET), 1);
        for setting in DEFAULT_REGISTER_TABLE {
            assert_eq!(bus.get(setting.reg), setting.effective_value());
        }
        assert_eq!(bus.get(reg::CMD), 0x0F);
        assert!(ctrl.work.irq_enabled());
    }

    #[test]
    fn initialize_gives_up_after_ten_resets() {
        let (ctrl, bus, _line) = controller(Default::default());
        bus.fail_writes_to(reg::RESET, usize::MAX);
        let outcome = block_on(ctrl.initialize());
        assert!(!outcome.acknowledged);
        assert_eq!(outcome.attempts, 10);
        assert_eq!(bus.get(reg::GNRLCTRL2) & 0x3F, 0x3F);
    }

    #[test]
    fn overrides_are_written_as_is() {
        let overrides = [RegSetting::new(reg::GNRLCTRL2, 0x00FF_0000)];
        let (ctrl, bus, _line) = controller(crate::Config {
            register_overrides: &overrides,
            ..Default::default()
        });
        block_on(ctrl.initialize());
        assert_eq!(bus.get(reg::GNRLCTRL2), 0x00FF_0000);
    }

    #[test]
    fn headset_registers_are_snapshot() {
        let headset = [RegSetting::new(reg::PROXCTRL0PH0, 0x1234)];
        let table = [RegSetting::new(reg::PROXCTRL0PH0, 0x0808)];
        let (ctrl, _bus, _line) = controller(crate::Config {
            headset_regs: &headset,
            register_table: &table,
            ..Default::default()
        });
        block_on(ctrl.initialize());
        let backup = ctrl.headset_backup.lock(|b| b.borrow().clone());
        assert_eq!(backup.as_slice(), [RegSetting::new(reg::PROXCTRL0PH0, 0x0808)]);
    }

    fn checked(id: u32, fail: bool) -> HardwareFault {
        let (ctrl, bus, _line) = controller(Default::default());
        bus.set(reg::INFO, id);
        if fail {
            bus.fail_reads(1);
        }
        block_on(ctrl.hardware_check())
    }

    #[test]
    fn identity_check() {
        assert_eq!(checked(WHOAMI_VALUE, false), HardwareFault::None);
        assert_eq!(checked(WHOAMI_DFN_VALUE, false), HardwareFault::None);
        assert_eq!(checked(0x1234, false), HardwareFault::IdMismatch);
        assert_eq!(checked(WHOAMI_VALUE, true), HardwareFault::BusError);
    }

    #[test]
    fn stuck_line_is_reported() {
        let (ctrl, bus, line) = controller(Default::default());
        bus.set(reg::INFO, WHOAMI_VALUE);
        line.drive_low(true);
        assert_eq!(block_on(ctrl.hardware_check()), HardwareFault::IrqStuck);
        assert_eq!(ctrl.fault(), HardwareFault::IrqStuck);
        assert_eq!(bus.reads_of(reg::HOSTIRQSRC), 10);
    }

    #[test]
    fn other_identity_clears_stuck_line() {
        let (ctrl, bus, line) = controller(Default::default());
        bus.set(reg::INFO, WHOAMI_DFN_VALUE);
        line.drive_low(true);
        assert_eq!(block_on(ctrl.hardware_check()), HardwareFault::None);
    }
}
