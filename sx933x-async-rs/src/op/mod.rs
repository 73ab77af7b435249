//! Typed views of the SX933x registers and commands.

pub mod cmd;
pub mod irq;
pub mod raw;
pub mod reset;
pub mod stat;

pub use cmd::*;
pub use irq::*;
pub use raw::*;
pub use reset::*;
pub use stat::*;
