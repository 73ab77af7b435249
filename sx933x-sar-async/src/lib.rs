//! An asynchronous, `no_std` SAR proximity sensor built on the SX933x.
//!
//! [`SarController`] ties an [`sx933x_async::Sx933x`] to an interrupt line,
//! a supply and an [`EventSink`]. It reports per-channel proximity, keeps
//! the device configured across resets and recovers it when the bus stops
//! answering.
//!
//! The controller is shared by reference between three parts of the
//! firmware:
//!
//! - the interrupt handler calls [`SarController::handle_interrupt`],
//! - a worker task runs [`SarController::run_worker`],
//! - a watchdog task runs [`SarController::run_watchdog`].
//!
//! # Usage
//!
//! ```ignore
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embassy_sync::channel::Channel;
//! use sx933x_async::Sx933x;
//! use sx933x_sar_async::{AlwaysOn, Config, ProximityEvent, SarController};
//!
//! static EVENTS: Channel<CriticalSectionRawMutex, ProximityEvent, 8> = Channel::new();
//!
//! let sar = SarController::new(Sx933x::new(i2c), Some(nirq), AlwaysOn, &EVENTS, Config {
//!     reinit_on_i2c_failure: true,
//!     ..Default::default()
//! });
//! sar.attach().await?;
//! sar.set_enable("CapSense Ch0", true).await?;
//!
//! loop {
//!     let event = EVENTS.receive().await;
//!     log::info!("{}: {}", event.name, event.distance.value());
//! }
//! ```

#![cfg_attr(not(test), no_std)]

mod button;
mod config;
mod control;
mod device;
mod diag;
mod dispatch;
mod error;
mod event;
mod init;
#[cfg(test)]
mod mock;
mod notify;
mod pin;
mod pm;
mod power;
mod reinit;
mod sched;
mod watchdog;

pub use button::{next_state, Button, ButtonSet, ButtonState, Distance, BUTTON_NAMES, NUM_BUTTONS};
pub use config::{Config, FlipConfig};
pub use device::{HardwareFault, SarController, MAX_HEADSET_REGS};
pub use diag::Attribute;
pub use dispatch::{DispatchTable, StatusHandler};
pub use error::SarError;
pub use event::{EventSink, ProximityEvent};
pub use init::RESET_SETTLE;
pub use notify::Supply;
pub use pin::NoPin;
pub use power::{AlwaysOn, ExternalLdo, PmicLdo, PowerControl, PowerError, Regulator};
pub use reinit::ReinitOutcome;
pub use sched::WorkQueue;
pub use watchdog::{
    FailureCounter, Verdict, Watchdog, FAILURE_THRESHOLD, WATCHDOG_PERIOD, WATCHDOG_PERIOD_ERR,
};
