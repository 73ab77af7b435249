//! Error types for the SX933x driver.

use core::fmt::{self, Debug};

/// A failed register transaction.
///
/// Carries the register that was addressed so that callers can log a
/// useful message without keeping track of it themselves.
pub enum SxError<TI2CERR> {
    /// Writing a register failed.
    Write {
        /// The register address.
        reg: u16,
        /// The underlying bus error.
        err: TI2CERR,
    },
    /// Reading a register failed.
    Read {
        /// The register address.
        reg: u16,
        /// The underlying bus error.
        err: TI2CERR,
    },
}

impl<TI2CERR> SxError<TI2CERR> {
    /// The register addressed by the failed transaction.
    pub fn reg(&self) -> u16 {
        match self {
            Self::Write { reg, .. } | Self::Read { reg, .. } => *reg,
        }
    }
}

impl<TI2CERR: Debug> Debug for SxError<TI2CERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { reg, err } => write!(f, "Write({reg:#06x}, {err:?})"),
            Self::Read { reg, err } => write!(f, "Read({reg:#06x}, {err:?})"),
        }
    }
}
