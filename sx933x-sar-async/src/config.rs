//! Board configuration of a SAR sensor.

use embassy_time::Duration;
use sx933x_async::conf::{RegSetting, DEFAULT_REGISTER_TABLE};

/// Register overlays applied when a foldable device opens or closes.
#[derive(Debug, Clone, Copy)]
pub struct FlipConfig<'a> {
    /// Mechanical state value reported when the device is open.
    pub open_state: u32,
    /// Mechanical state at attach time.
    pub initial_state: u32,
    /// Registers written when the device opens.
    pub open_regs: &'a [RegSetting],
    /// Registers written when the device closes.
    pub closed_regs: &'a [RegSetting],
}

impl<'a> FlipConfig<'a> {
    /// Returns the overlay matching the mechanical `state`.
    pub fn regs_for(&self, state: u32) -> &'a [RegSetting] {
        if state == self.open_state {
            self.open_regs
        } else {
            self.closed_regs
        }
    }
}

/// Configuration of a [`crate::SarController`].
#[derive(Debug, Clone)]
pub struct Config<'a> {
    /// Register table programmed after every soft reset.
    pub register_table: &'a [RegSetting],
    /// Board specific registers written after the table, as is.
    pub register_overrides: &'a [RegSetting],
    /// Bit `n` set marks phase `n` as wired to a channel.
    pub button_used_flag: u8,
    /// First reference phase, only used for diagnostics.
    pub ref_phase_a: Option<u8>,
    /// Second reference phase, only used for diagnostics.
    pub ref_phase_b: Option<u8>,
    /// Poll the device periodically and reinitialize it after repeated
    /// bus failures.
    pub reinit_on_i2c_failure: bool,
    /// Re-run the worker after this timeout while the interrupt line stays
    /// asserted. Only needed by parts that do not report releases.
    pub irq_timer: Option<Duration>,
    /// Registers written while a headset is plugged in.
    pub headset_regs: &'a [RegSetting],
    /// Open/closed register overlays of foldable devices.
    pub flip: Option<FlipConfig<'a>>,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            register_table: DEFAULT_REGISTER_TABLE,
            register_overrides: &[],
            button_used_flag: 0x1F,
            ref_phase_a: None,
            ref_phase_b: None,
            reinit_on_i2c_failure: false,
            irq_timer: None,
            headset_regs: &[],
            flip: None,
        }
    }
}
