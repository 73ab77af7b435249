//! Error types for the SAR device layer.

use core::fmt::{self, Debug};

use sx933x_async::SxError;

use crate::power::PowerError;

/// The main error type of the device layer.
pub enum SarError<TI2CERR> {
    /// A register transaction failed.
    Bus(SxError<TI2CERR>),
    /// Switching the supply failed.
    Power(PowerError),
    /// No channel carries the requested name.
    UnknownChannel,
    /// An attribute value could not be parsed.
    InvalidInput,
    /// The operation is not available with the current configuration.
    Unsupported,
    /// The output buffer of an attribute was too small.
    Format,
}

impl<TI2CERR: Debug> Debug for SarError<TI2CERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::Power(err) => write!(f, "Power({err:?})"),
            Self::UnknownChannel => write!(f, "UnknownChannel"),
            Self::InvalidInput => write!(f, "InvalidInput"),
            Self::Unsupported => write!(f, "Unsupported"),
            Self::Format => write!(f, "Format"),
        }
    }
}

impl<TI2CERR> From<SxError<TI2CERR>> for SarError<TI2CERR> {
    fn from(err: SxError<TI2CERR>) -> Self {
        SarError::Bus(err)
    }
}

impl<TI2CERR> From<PowerError> for SarError<TI2CERR> {
    fn from(err: PowerError) -> Self {
        SarError::Power(err)
    }
}

impl<TI2CERR> From<fmt::Error> for SarError<TI2CERR> {
    fn from(_: fmt::Error) -> Self {
        SarError::Format
    }
}
