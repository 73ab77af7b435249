//! Diagnostic attributes.
//!
//! Each attribute can be shown, stored, or both. Shown values are written
//! as text to any [`core::fmt::Write`] sink. Stored values are parsed from
//! text the way a host shell would send them.

use core::fmt::Write;

use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use sx933x_async::reg;

use crate::device::SarController;
use crate::error::SarError;
use crate::event::EventSink;
use crate::power::PowerControl;

/// A diagnostic attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Store `reset` or `1` to recalibrate.
    Reset,
    /// Store `1` or `0` to apply or revert the headset registers.
    Headset,
    /// Show the measurements of every phase.
    RawData,
    /// Store `reg,val` in hex to write a register.
    RegisterWrite,
    /// Store `reg` in hex to log a register.
    RegisterRead,
    /// Show the status register, store a non-zero number to recalibrate.
    ManualCalibrate,
    /// Show whether an interrupt was ever seen.
    IntState,
    /// Store anything to reinitialize the device.
    Reinitialize,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Reset,
        Attribute::Headset,
        Attribute::RawData,
        Attribute::RegisterWrite,
        Attribute::RegisterRead,
        Attribute::ManualCalibrate,
        Attribute::IntState,
        Attribute::Reinitialize,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Attribute::Reset => "reset",
            Attribute::Headset => "headset",
            Attribute::RawData => "raw_data",
            Attribute::RegisterWrite => "register_write",
            Attribute::RegisterRead => "register_read",
            Attribute::ManualCalibrate => "manual_calibrate",
            Attribute::IntState => "int_state",
            Attribute::Reinitialize => "reinitialize",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }

    pub const fn readable(self) -> bool {
        matches!(
            self,
            Attribute::RawData | Attribute::ManualCalibrate | Attribute::IntState
        )
    }

    pub const fn writable(self) -> bool {
        !matches!(self, Attribute::RawData | Attribute::IntState)
    }
}

fn parse_hex(input: &str) -> Option<u32> {
    let input = input.trim();
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u32::from_str_radix(digits, 16).ok()
}

fn parse_reg(input: &str) -> Option<u16> {
    parse_hex(input).and_then(|reg| u16::try_from(reg).ok())
}

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Writes the value of `attr` to `out`.
    pub async fn show<W: Write>(
        &self,
        attr: Attribute,
        out: &mut W,
    ) -> Result<(), SarError<I2C::Error>> {
        match attr {
            Attribute::RawData => {
                for phase in self.raw_data().await? {
                    writeln!(out, "{phase}")?;
                }
            }
            Attribute::ManualCalibrate => {
                let status = self.read_register(reg::HOSTIRQSRC).await?;
                writeln!(out, "{status}")?;
            }
            Attribute::IntState => {
                writeln!(out, "{}", u8::from(self.work.interrupt_seen()))?;
            }
            _ => return Err(SarError::Unsupported),
        }
        Ok(())
    }

    /// Parses `input` and applies it to `attr`.
    pub async fn store(&self, attr: Attribute, input: &str) -> Result<(), SarError<I2C::Error>> {
        match attr {
            Attribute::Reset => {
                if input.is_empty() {
                    return Err(SarError::InvalidInput);
                }
                if input.starts_with("reset") || input.starts_with('1') {
                    self.recalibrate_if_active().await?;
                }
            }
            Attribute::Headset => self.store_headset(input).await?,
            Attribute::RegisterWrite => {
                let (reg, val) = input.split_once(',').ok_or(SarError::InvalidInput)?;
                let reg = parse_reg(reg).ok_or(SarError::InvalidInput)?;
                let val = parse_hex(val).ok_or(SarError::InvalidInput)?;
                self.write_register(reg, val).await?;
                log::info!("register write {reg:#06x} = {val:#010x}");
            }
            Attribute::RegisterRead => {
                let reg = parse_reg(input).ok_or(SarError::InvalidInput)?;
                let val = self.read_register(reg).await?;
                let nirq = self.nirq_asserted();
                log::info!("register read {reg:#06x} = {val:#010x}, nirq asserted: {nirq:?}");
            }
            Attribute::ManualCalibrate => {
                let val: u64 = input.trim().parse().map_err(|_| SarError::InvalidInput)?;
                if val != 0 {
                    log::info!("performing manual compensation");
                    self.bus.lock().await.compensate().await?;
                }
            }
            Attribute::Reinitialize => {
                let outcome = self.reinitialize().await;
                log::info!("reinitialize requested: {outcome:?}");
            }
            Attribute::RawData | Attribute::IntState => return Err(SarError::Unsupported),
        }
        Ok(())
    }

    async fn store_headset(&self, input: &str) -> Result<(), SarError<I2C::Error>> {
        if self.config.headset_regs.is_empty() {
            return Err(SarError::Unsupported);
        }
        let insert = match input.trim() {
            "1" => true,
            "0" => false,
            _ => return Ok(()),
        };
        {
            let mut bus = self.bus.lock().await;
            if insert {
                log::info!("headset inserted");
                for setting in self.config.headset_regs {
                    bus.write_register(setting.reg, setting.val).await?;
                }
            } else {
                log::info!("headset removed");
                let backup = self.headset_backup.lock(|backup| backup.borrow().clone());
                for setting in &backup {
                    bus.write_register(setting.reg, setting.val).await?;
                }
            }
        }
        self.recalibrate_if_active().await?;
        Ok(())
    }
}
