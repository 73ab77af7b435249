//! The core implementation of the SX933x driver.

pub(crate) mod err;

use embassy_time::Timer;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::conf::RegSetting;
use crate::op::*;
use crate::reg;

pub use self::err::SxError;

/// Default 7-bit bus address of the SX933x.
pub const DEFAULT_ADDRESS: SevenBitAddress = 0x28;

/// A wrapper around a Semtech SX933x capacitive proximity controller.
///
/// Each register access is a single bus transaction: writes send the 16-bit
/// address followed by the big-endian 32-bit value, reads send the address
/// and receive four big-endian bytes. Failures are logged and returned, no
/// retry happens at this level.
pub struct Sx933x<TI2C> {
    i2c: TI2C,
    address: SevenBitAddress,
}

impl<TI2C, TI2CERR> Sx933x<TI2C>
where
    TI2C: I2c<SevenBitAddress, Error = TI2CERR>,
    TI2CERR: embedded_hal_async::i2c::Error,
{
    /// Creates a new driver talking to the device at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: TI2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Creates a new driver talking to the device at `address`.
    pub fn with_address(i2c: TI2C, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// Releases the underlying bus.
    pub fn release(self) -> TI2C {
        self.i2c
    }

    /// Writes `val` to the register at `reg`.
    pub async fn write_register(&mut self, reg: u16, val: u32) -> Result<(), SxError<TI2CERR>> {
        let [addr_hi, addr_lo] = reg.to_be_bytes();
        let [b0, b1, b2, b3] = val.to_be_bytes();
        self.i2c
            .write(self.address, &[addr_hi, addr_lo, b0, b1, b2, b3])
            .await
            .map_err(|err| {
                log::error!("i2c write reg {reg:#06x} error {err:?}");
                SxError::Write { reg, err }
            })
    }

    /// Reads the register at `reg`.
    pub async fn read_register(&mut self, reg: u16) -> Result<u32, SxError<TI2CERR>> {
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(self.address, &reg.to_be_bytes(), &mut buf)
            .await
            .map_err(|err| {
                log::error!("i2c read reg {reg:#06x} error {err:?}");
                SxError::Read { reg, err }
            })?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Reads the pending interrupt bits.
    ///
    /// Reading the host interrupt source also clears it on the device.
    pub async fn read_status(&mut self) -> Result<IrqStatus, SxError<TI2CERR>> {
        self.read_register(reg::HOSTIRQSRC).await.map(IrqStatus::from)
    }

    /// Reads the proximity and body flags of every phase.
    pub async fn read_phase_status(&mut self) -> Result<PhaseStatus, SxError<TI2CERR>> {
        self.read_register(reg::STAT0).await.map(PhaseStatus::from)
    }

    /// Reads the device identity.
    pub async fn read_whoami(&mut self) -> Result<u32, SxError<TI2CERR>> {
        self.read_register(reg::INFO).await
    }

    /// Issues a command.
    pub async fn command(&mut self, cmd: Command) -> Result<(), SxError<TI2CERR>> {
        log::trace!("sx933x::command {cmd:?}");
        self.write_register(reg::CMD, cmd.into()).await
    }

    /// Starts a baseline recalibration of all phases.
    pub async fn compensate(&mut self) -> Result<(), SxError<TI2CERR>> {
        self.command(Command::Compensate).await
    }

    /// Sets the phase-enable bits of `GNRLCTRL2`, returning the value written.
    pub async fn enable_phases(&mut self) -> Result<u32, SxError<TI2CERR>> {
        let val = self.read_register(reg::GNRLCTRL2).await? | reg::PHASE_ENABLE_MASK;
        self.write_register(reg::GNRLCTRL2, val).await?;
        Ok(val)
    }

    /// Clears the phase-enable bits of `GNRLCTRL2`, returning the value written.
    pub async fn disable_phases(&mut self) -> Result<u32, SxError<TI2CERR>> {
        let val = self.read_register(reg::GNRLCTRL2).await? & !reg::PHASE_ENABLE_MASK;
        self.write_register(reg::GNRLCTRL2, val).await?;
        Ok(val)
    }

    /// Returns `true` if at least one phase is enabled in `GNRLCTRL2`.
    pub async fn phases_enabled(&mut self) -> Result<bool, SxError<TI2CERR>> {
        Ok(self.read_register(reg::GNRLCTRL2).await? & reg::PHASE_ENABLE_MASK != 0)
    }

    /// Issues a soft reset, retrying failed writes according to `policy`.
    ///
    /// This is best effort: when every attempt fails the outcome says so but
    /// no error is returned, callers are expected to carry on.
    pub async fn soft_reset(&mut self, policy: RetryPolicy) -> ResetOutcome {
        let mut attempts = 0;
        while attempts < policy.attempts {
            attempts += 1;
            if self
                .write_register(reg::RESET, reg::SOFT_RESET_VALUE)
                .await
                .is_ok()
            {
                return ResetOutcome {
                    attempts,
                    acknowledged: true,
                };
            }
            log::info!("sx933x::soft_reset retry: {attempts}");
            if attempts < policy.attempts {
                Timer::after(policy.backoff).await;
            }
        }
        log::warn!("sx933x::soft_reset not acknowledged after {attempts} attempts");
        ResetOutcome {
            attempts,
            acknowledged: false,
        }
    }

    /// Writes every entry of `table` in order.
    ///
    /// Failed writes are logged and skipped. Returns the number of entries
    /// that could not be written.
    pub async fn program(&mut self, table: &[RegSetting]) -> usize {
        let mut failed = 0;
        for setting in table {
            let val = setting.effective_value();
            log::debug!("sx933x::program reg {:#06x} value {val:#010x}", setting.reg);
            if self.write_register(setting.reg, val).await.is_err() {
                failed += 1;
            }
        }
        failed
    }

    /// Reads the raw measurement values of `phase`.
    pub async fn read_phase_raw(&mut self, phase: u8) -> Result<PhaseRaw, SxError<TI2CERR>> {
        let useful = measurement(self.read_register(reg::useful(phase)).await?);
        let average = measurement(self.read_register(reg::average(phase)).await?);
        let diff = measurement(self.read_register(reg::diff(phase)).await?);
        let offset = phase_offset(self.read_register(reg::offset(phase)).await?);
        Ok(PhaseRaw {
            phase,
            useful,
            average,
            diff,
            offset,
        })
    }

    /// Reads the values of the phase routed to the debug readout.
    pub async fn read_debug_raw(&mut self) -> Result<DebugRaw, SxError<TI2CERR>> {
        let phase = debug_phase(self.read_register(reg::DBG_PHASE_SEL).await?);
        let adc_min = measurement(self.read_register(reg::DBG_PROX_ADC_MIN).await?);
        let adc_max = measurement(self.read_register(reg::DBG_PROX_ADC_MAX).await?);
        let raw = measurement(self.read_register(reg::DBG_PROX_RAW).await?);
        let delta_var = (self.read_register(reg::DBG_DLT_VAR).await? as i32) >> 3;
        Ok(DebugRaw {
            phase,
            raw,
            adc_min,
            adc_max,
            delta_var,
        })
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_time::Duration;

    use super::*;
    use crate::mock::{Bus, Transfer};

    #[test]
    fn write_sends_address_then_big_endian_value() {
        let bus = Bus::new();
        let mut sx = Sx933x::new(bus.clone());
        block_on(sx.write_register(0x8024, 0x1122_3344)).unwrap();
        assert_eq!(
            bus.transfers(),
            [Transfer::Write(vec![0x80, 0x24, 0x11, 0x22, 0x33, 0x44])]
        );
    }

    #[test]
    fn read_assembles_big_endian_value() {
        let bus = Bus::new();
        bus.set(reg::INFO, 0x0000_3113);
        let mut sx = Sx933x::new(bus.clone());
        assert_eq!(block_on(sx.read_whoami()).unwrap(), 0x3113);
        assert_eq!(bus.transfers(), [Transfer::WriteRead(vec![0x42, 0xCC], 4)]);
    }

    #[test]
    fn failed_read_is_reported_with_its_register() {
        let bus = Bus::new();
        bus.fail_reads(1);
        let mut sx = Sx933x::new(bus.clone());
        let err = block_on(sx.read_status()).unwrap_err();
        assert!(matches!(err, SxError::Read { reg: reg::HOSTIRQSRC, .. }));
        // A failure is never retried here.
        assert_eq!(bus.transfers().len(), 1);
    }

    #[test]
    fn status_read_distinguishes_empty_from_failed() {
        let bus = Bus::new();
        let mut sx = Sx933x::new(bus.clone());
        let status = block_on(sx.read_status()).unwrap();
        assert!(status.is_empty());
    }

    #[test]
    fn soft_reset_retries_until_acknowledged() {
        let bus = Bus::new();
        bus.fail_writes_to(reg::RESET, 9);
        let mut sx = Sx933x::new(bus.clone());
        let policy = RetryPolicy::new(10, Duration::from_millis(1));
        let outcome = block_on(sx.soft_reset(policy));
        assert_eq!(
            outcome,
            ResetOutcome {
                attempts: 10,
                acknowledged: true
            }
        );
        assert_eq!(bus.writes_to(reg::RESET), 10);
    }

    #[test]
    fn soft_reset_gives_up_after_policy_attempts() {
        let bus = Bus::new();
        bus.fail_writes_to(reg::RESET, usize::MAX);
        let mut sx = Sx933x::new(bus.clone());
        let policy = RetryPolicy::new(10, Duration::from_millis(1));
        let outcome = block_on(sx.soft_reset(policy));
        assert_eq!(outcome.attempts, 10);
        assert!(!outcome.acknowledged);
        assert_eq!(bus.writes_to(reg::RESET), 10);
    }

    #[test]
    fn program_applies_control_register_correction() {
        let bus = Bus::new();
        let mut sx = Sx933x::new(bus.clone());
        let table = [
            RegSetting::new(reg::GNRLCTRL1, 0),
            RegSetting::new(reg::GNRLCTRL2, 0x00FF_0000),
        ];
        assert_eq!(block_on(sx.program(&table)), 0);
        assert_eq!(bus.get(reg::GNRLCTRL1), 0);
        assert_eq!(bus.get(reg::GNRLCTRL2), 0x00FF_003F);

        let table = [RegSetting::new(reg::GNRLCTRL2, 0x00FF_0003)];
        block_on(sx.program(&table));
        assert_eq!(bus.get(reg::GNRLCTRL2), 0x00FF_0003);
    }

    #[test]
    fn program_continues_past_failed_writes() {
        let bus = Bus::new();
        bus.fail_writes_to(reg::GNRLCTRL0, 1);
        let mut sx = Sx933x::new(bus.clone());
        let table = [
            RegSetting::new(reg::GNRLCTRL0, 0x32),
            RegSetting::new(reg::GNRLCTRL1, 0x01),
        ];
        assert_eq!(block_on(sx.program(&table)), 1);
        assert_eq!(bus.get(reg::GNRLCTRL1), 0x01);
    }

    #[test]
    fn phase_enable_bits_are_toggled_in_place() {
        let bus = Bus::new();
        bus.set(reg::GNRLCTRL2, 0x00FF_0020);
        let mut sx = Sx933x::new(bus.clone());
        assert_eq!(block_on(sx.enable_phases()).unwrap(), 0x00FF_003F);
        assert!(block_on(sx.phases_enabled()).unwrap());
        assert_eq!(block_on(sx.disable_phases()).unwrap(), 0x00FF_0020);
        assert!(!block_on(sx.phases_enabled()).unwrap());
    }

    #[test]
    fn phase_raw_is_decoded() {
        let bus = Bus::new();
        bus.set(reg::useful(2), 100 << 10);
        bus.set(reg::average(2), 90 << 10);
        bus.set(reg::diff(2), (-5i32 << 10) as u32);
        bus.set(reg::offset(2), 0xFFFF_8123);
        let mut sx = Sx933x::new(bus);
        let raw = block_on(sx.read_phase_raw(2)).unwrap();
        assert_eq!(
            raw,
            PhaseRaw {
                phase: 2,
                useful: 100,
                average: 90,
                diff: -5,
                offset: 0x0123,
            }
        );
    }
}
