//! Register programming tables.

use crate::reg;

/// A single register/value pair written while configuring the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegSetting {
    /// Register address.
    pub reg: u16,
    /// Value to write.
    pub val: u32,
}

impl RegSetting {
    /// Creates a new register/value pair.
    pub const fn new(reg: u16, val: u32) -> Self {
        Self { reg, val }
    }

    /// Returns the value that is actually written for this entry.
    ///
    /// A [`reg::GNRLCTRL2`] entry whose phase configuration bits are all
    /// clear would leave every phase disabled after a reset, so those bits
    /// are forced on. Any other entry is written as is.
    pub const fn effective_value(&self) -> u32 {
        if self.reg == reg::GNRLCTRL2 && self.val & reg::PHASE_CONFIG_MASK == 0 {
            self.val | reg::PHASE_CONFIG_MASK
        } else {
            self.val
        }
    }
}

impl From<(u16, u32)> for RegSetting {
    fn from((reg, val): (u16, u32)) -> Self {
        Self { reg, val }
    }
}

/// Register table programmed after every soft reset, before any board
/// specific overrides.
pub const DEFAULT_REGISTER_TABLE: &[RegSetting] = &[
    RegSetting::new(reg::IRQ_ENABLE, 0x0000_0074),
    RegSetting::new(reg::HOSTIRQCTRL, 0x0000_0000),
    RegSetting::new(reg::PINCFG, 0x0000_0001),
    RegSetting::new(reg::IRQCFG0, 0x0000_0000),
    RegSetting::new(reg::IRQCFG1, 0x8000_0000),
    RegSetting::new(reg::IRQCFG2, 0x0000_0000),
    RegSetting::new(reg::IRQCFG3, 0x0000_0000),
    RegSetting::new(reg::GNRLCTRL0, 0x0000_0032),
    RegSetting::new(reg::GNRLCTRL1, 0x0000_0000),
    RegSetting::new(reg::GNRLCTRL2, 0x00FF_0000),
    RegSetting::new(reg::AFEPARAMSPH0, 0x0000_0020),
    RegSetting::new(reg::AFEPHPH0, 0x0000_003D),
    RegSetting::new(reg::AFEPARAMSPH0 + 8, 0x0000_0020),
    RegSetting::new(reg::AFEPHPH0 + 8, 0x0000_00F7),
    RegSetting::new(reg::AFEPARAMSPH0 + 16, 0x0000_0020),
    RegSetting::new(reg::AFEPHPH0 + 16, 0x0000_0DDF),
    RegSetting::new(reg::AFEPARAMSPH0 + 24, 0x0000_0020),
    RegSetting::new(reg::AFEPHPH0 + 24, 0x0000_377D),
    RegSetting::new(reg::AFEPARAMSPH0 + 32, 0x0000_0020),
    RegSetting::new(reg::AFEPHPH0 + 32, 0x0001_DF7D),
    RegSetting::new(reg::ADCFILTPH0, 0x0520_0000),
    RegSetting::new(reg::AVGBFILTPH0, 0x2000_0000),
    RegSetting::new(reg::PROXCTRL0PH0, 0x1010_1010),
];
