//! Per-phase raw measurement values.

/// Sign-extends the 22-bit measurement stored in the upper bits of a register.
pub const fn measurement(reg: u32) -> i32 {
    (reg as i32) >> 10
}

/// Extracts the 15-bit phase offset from an AFE phase register.
pub const fn phase_offset(reg: u32) -> u16 {
    (reg & 0x7FFF) as u16
}

/// Raw values of one phase, used for diagnostics and tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseRaw {
    /// The phase these values belong to.
    pub phase: u8,
    /// Filtered measurement.
    pub useful: i32,
    /// Baseline.
    pub average: i32,
    /// `useful - average` as computed by the device.
    pub diff: i32,
    /// Compensation offset.
    pub offset: u16,
}

impl core::fmt::Display for PhaseRaw {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[PH: {}] Useful = {}, Average = {}, DIFF = {} Offset = {} ",
            self.phase, self.useful, self.average, self.diff, self.offset
        )
    }
}

/// Values of the phase currently routed to the debug readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugRaw {
    /// Phase selected in `DBG_PHASE_SEL`, `None` if the selection is invalid.
    pub phase: Option<u8>,
    /// Unfiltered measurement.
    pub raw: i32,
    /// Minimum ADC value.
    pub adc_min: i32,
    /// Maximum ADC value.
    pub adc_max: i32,
    /// Filtered delta variation.
    pub delta_var: i32,
}

/// Decodes the phase selected for debugging from `DBG_PHASE_SEL`.
pub const fn debug_phase(reg: u32) -> Option<u8> {
    let phase = ((reg >> 3) & 0x7) as u8;
    if phase < crate::reg::NUM_PHASES {
        Some(phase)
    } else {
        None
    }
}
