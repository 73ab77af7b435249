//! Supply control of the sensor.
//!
//! The board picks one of three supply arrangements by handing the matching
//! [`PowerControl`] implementation to the controller: a PMIC regulator, an
//! external LDO switched by a GPIO, or a supply that is always on.

use core::fmt::Debug;

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

/// Time an external LDO needs before the sensor answers.
const EXTERNAL_LDO_STARTUP: Duration = Duration::from_millis(20);

/// Failure to switch the sensor supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    /// The regulator refused the request.
    Regulator,
    /// The LDO enable pin could not be driven.
    Gpio,
}

/// A voltage regulator that can be switched on and off.
pub trait Regulator {
    /// Error reported by the regulator.
    type Error: Debug;

    /// Turns the output on.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Turns the output off.
    fn disable(&mut self) -> Result<(), Self::Error>;
}

/// Switches the sensor's supply.
pub trait PowerControl {
    /// Powers the sensor.
    fn enable(&mut self) -> Result<(), PowerError>;

    /// Removes power from the sensor.
    fn disable(&mut self) -> Result<(), PowerError>;

    /// Time to wait after [`PowerControl::enable`] before talking to the sensor.
    fn startup_delay(&self) -> Duration {
        Duration::from_ticks(0)
    }
}

/// A supply that is always on and cannot be switched.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOn;

impl PowerControl for AlwaysOn {
    fn enable(&mut self) -> Result<(), PowerError> {
        log::info!("using always on power supply");
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PowerError> {
        Ok(())
    }
}

/// A supply provided by a PMIC regulator.
pub struct PmicLdo<R> {
    regulator: R,
}

impl<R: Regulator> PmicLdo<R> {
    /// Wraps `regulator`.
    pub fn new(regulator: R) -> Self {
        Self { regulator }
    }

    /// Releases the regulator.
    pub fn release(self) -> R {
        self.regulator
    }
}

impl<R: Regulator> PowerControl for PmicLdo<R> {
    fn enable(&mut self) -> Result<(), PowerError> {
        self.regulator.enable().map_err(|err| {
            log::error!("Error {err:?} enable regulator");
            PowerError::Regulator
        })
    }

    fn disable(&mut self) -> Result<(), PowerError> {
        self.regulator.disable().map_err(|err| {
            log::error!("Error {err:?} disable regulator");
            PowerError::Regulator
        })
    }
}

/// An external LDO whose enable input is driven by a GPIO.
pub struct ExternalLdo<P> {
    en: P,
}

impl<P: OutputPin> ExternalLdo<P> {
    /// Wraps the LDO enable pin.
    pub fn new(en: P) -> Self {
        Self { en }
    }
}

impl<P: OutputPin> PowerControl for ExternalLdo<P> {
    fn enable(&mut self) -> Result<(), PowerError> {
        self.en.set_high().map_err(|err| {
            log::error!("can not enable external LDO: {err:?}");
            PowerError::Gpio
        })
    }

    fn disable(&mut self) -> Result<(), PowerError> {
        self.en.set_low().map_err(|err| {
            log::error!("can not disable external LDO: {err:?}");
            PowerError::Gpio
        })
    }

    fn startup_delay(&self) -> Duration {
        EXTERNAL_LDO_STARTUP
    }
}
