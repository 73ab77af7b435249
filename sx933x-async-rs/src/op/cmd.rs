//! Commands accepted by the command register.

/// A command written to [`crate::reg::CMD`].
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Leave sleep mode.
    ExitSleep = 0x0C,
    /// Enter sleep mode.
    EnterSleep = 0x0D,
    /// Start an offset compensation (baseline recalibration) on all phases.
    Compensate = 0x0E,
    /// Activate the phases enabled in `GNRLCTRL2`.
    PhaseControl = 0x0F,
}

impl From<Command> for u32 {
    fn from(val: Command) -> Self {
        val as u32
    }
}
