//! An asynchronous, `no_std` driver for the Semtech SX933x family of
//! capacitive proximity (SAR) controllers.
//!
//! This crate provides register level access to the SX9331/SX9338 over
//! I2C: typed 32-bit register reads and writes, the chip's command set,
//! a bounded soft reset, register table programming and decoding of the
//! status and raw measurement registers. It is built upon
//! `embedded-hal-async` traits.
//!
//! # Usage
//!
//! See the `sx933x-sar-async` crate for the interrupt handling, button
//! state machines and recovery logic built on top of this driver.

#![cfg_attr(not(test), no_std)]

pub mod conf;
pub mod op;
pub mod reg;

#[cfg(test)]
mod mock;

mod sx;
pub use sx::*;
