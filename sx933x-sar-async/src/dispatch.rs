//! Routing of pending status bits to their handlers.

use sx933x_async::op::{IrqBit, IrqStatus, MAX_STATUS_BITS};

/// Work done for a pending status bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusHandler {
    /// Re-evaluate every channel from `STAT0`.
    TouchProcess,
    /// Log the raw measurements of every phase.
    RawData,
}

/// Maps status bit positions to handlers.
#[derive(Debug, Clone)]
pub struct DispatchTable<H = StatusHandler> {
    slots: [Option<H>; MAX_STATUS_BITS],
}

impl<H: Copy> DispatchTable<H> {
    /// A table without handlers.
    pub fn empty() -> Self {
        Self {
            slots: [None; MAX_STATUS_BITS],
        }
    }

    /// Installs `handler` for `bit`.
    pub fn with(mut self, bit: IrqBit, handler: H) -> Self {
        self.slots[bit.index()] = Some(handler);
        self
    }

    /// Sets or clears the handler of the bit at `index`. Out of range
    /// indices are ignored.
    pub fn set(&mut self, index: usize, handler: Option<H>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = handler;
        }
    }

    pub fn get(&self, index: usize) -> Option<H> {
        self.slots.get(index).copied().flatten()
    }

    /// Yields the handlers of the bits set in `status`, lowest bit first.
    /// Set bits without a handler are skipped.
    pub fn pending(&self, status: IrqStatus) -> impl Iterator<Item = (usize, H)> + '_ {
        status
            .iter()
            .filter_map(move |index| self.get(index).map(|handler| (index, handler)))
    }
}

impl Default for DispatchTable<StatusHandler> {
    fn default() -> Self {
        Self::empty()
            .with(IrqBit::Body, StatusHandler::TouchProcess)
            .with(IrqBit::Conversion, StatusHandler::RawData)
            .with(IrqBit::Compensation, StatusHandler::TouchProcess)
            .with(IrqBit::Release, StatusHandler::TouchProcess)
            .with(IrqBit::Touch, StatusHandler::TouchProcess)
    }
}
