//! Register map of the SX933x.
//!
//! Every register is 16-bit addressed and 32-bit wide. Per-phase registers
//! are laid out with a fixed stride from the phase 0 address, use the
//! helpers at the bottom of this module to compute them.

/// Host interrupt source. The low byte holds the pending status bits.
pub const HOSTIRQSRC: u16 = 0x4000;
/// Interrupt enable mask.
pub const IRQ_ENABLE: u16 = 0x4004;
/// Host interrupt control.
pub const HOSTIRQCTRL: u16 = 0x4008;
/// Soft-reset register.
pub const RESET: u16 = 0x4240;
/// Command register, see [`crate::op::Command`].
pub const CMD: u16 = 0x4280;
/// Top-level status.
pub const TOPSTAT0: u16 = 0x4284;
/// Pin configuration.
pub const PINCFG: u16 = 0x42C0;
/// Device identity (WHOAMI).
pub const INFO: u16 = 0x42CC;

/// Proximity and body status of every phase.
pub const STAT0: u16 = 0x8000;
pub const STAT1: u16 = 0x8004;
pub const STAT2: u16 = 0x8008;
pub const IRQCFG0: u16 = 0x800C;
pub const IRQCFG1: u16 = 0x8010;
pub const IRQCFG2: u16 = 0x8014;
pub const IRQCFG3: u16 = 0x8018;
pub const GNRLCTRL0: u16 = 0x801C;
pub const GNRLCTRL1: u16 = 0x8020;
/// General control 2. The low bits are the per-phase enables.
pub const GNRLCTRL2: u16 = 0x8024;

/// AFE parameters of phase 0, stride 8.
pub const AFEPARAMSPH0: u16 = 0x8028;
/// AFE phase configuration of phase 0, stride 8. Carries the phase offset.
pub const AFEPHPH0: u16 = 0x802C;
/// ADC filter of phase 0, stride 16.
pub const ADCFILTPH0: u16 = 0x8054;
/// Averaging filter of phase 0, stride 16.
pub const AVGBFILTPH0: u16 = 0x8058;
/// Proximity thresholds of phase 0, stride 16.
pub const PROXCTRL0PH0: u16 = 0x805C;

/// Phase selected for the debug readout in bits [5:3].
pub const DBG_PHASE_SEL: u16 = 0x81A4;
pub const DBG_PROX_ADC_MIN: u16 = 0x81A8;
pub const DBG_PROX_ADC_MAX: u16 = 0x81AC;
pub const DBG_PROX_RAW: u16 = 0x81B0;
pub const DBG_DLT_VAR: u16 = 0x81B4;

/// Useful (filtered) value of phase 0, stride 4.
pub const USEPH0: u16 = 0x81C0;
/// Average (baseline) of phase 0, stride 4.
pub const AVGPH0: u16 = 0x81E0;
/// Difference of phase 0, stride 4.
pub const DIFFPH0: u16 = 0x8200;

/// Value written to [`RESET`] to trigger a soft reset.
pub const SOFT_RESET_VALUE: u32 = 0xDE;

/// Identity of the SX9331 family.
pub const WHOAMI_VALUE: u32 = 0x0000_3113;
/// Identity of the SX9338 DFN package, register compatible with [`WHOAMI_VALUE`].
pub const WHOAMI_DFN_VALUE: u32 = 0x0000_3118;

/// Bits of [`GNRLCTRL2`] that enable the sensing phases.
pub const PHASE_ENABLE_MASK: u32 = 0x0000_001F;
/// Low bits of [`GNRLCTRL2`] checked when programming the register table.
pub const PHASE_CONFIG_MASK: u32 = 0x0000_003F;

/// Number of sensing phases.
pub const NUM_PHASES: u8 = 5;

/// Address of the useful value of `phase`.
pub const fn useful(phase: u8) -> u16 {
    USEPH0 + phase as u16 * 4
}

/// Address of the average of `phase`.
pub const fn average(phase: u8) -> u16 {
    AVGPH0 + phase as u16 * 4
}

/// Address of the difference of `phase`.
pub const fn diff(phase: u8) -> u16 {
    DIFFPH0 + phase as u16 * 4
}

/// Address of the offset (AFE phase) register of `phase`.
pub const fn offset(phase: u8) -> u16 {
    AFEPHPH0 + phase as u16 * 8
}
