//! A scripted SX933x register file for driver tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

/// A bus transaction as seen by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Write(Vec<u8>),
    WriteRead(Vec<u8>, usize),
}

#[derive(Default)]
struct State {
    regs: HashMap<u16, u32>,
    transfers: Vec<Transfer>,
    failing_reads: usize,
    failing_writes: HashMap<u16, usize>,
}

/// Cloneable handle to a fake device, clones share the register file.
#[derive(Clone, Default)]
pub struct Bus {
    state: Rc<RefCell<State>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, reg: u16, val: u32) {
        self.state.borrow_mut().regs.insert(reg, val);
    }

    pub fn get(&self, reg: u16) -> u32 {
        self.state.borrow().regs.get(&reg).copied().unwrap_or(0)
    }

    /// Makes the next `count` reads fail.
    pub fn fail_reads(&self, count: usize) {
        self.state.borrow_mut().failing_reads = count;
    }

    /// Makes the next `count` writes to `reg` fail.
    pub fn fail_writes_to(&self, reg: u16, count: usize) {
        self.state.borrow_mut().failing_writes.insert(reg, count);
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.borrow().transfers.clone()
    }

    pub fn writes_to(&self, reg: u16) -> usize {
        let [hi, lo] = reg.to_be_bytes();
        self.state
            .borrow()
            .transfers
            .iter()
            .filter(|t| matches!(t, Transfer::Write(data) if data[..2] == [hi, lo]))
            .count()
    }
}

impl ErrorType for Bus {
    type Error = ErrorKind;
}

impl I2c for Bus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        match operations {
            [Operation::Write(data)] => {
                state.transfers.push(Transfer::Write(data.to_vec()));
                let reg = u16::from_be_bytes([data[0], data[1]]);
                if let Some(left) = state.failing_writes.get_mut(&reg) {
                    if *left > 0 {
                        *left -= 1;
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }
                }
                let val = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
                state.regs.insert(reg, val);
                Ok(())
            }
            [Operation::Write(addr), Operation::Read(buf)] => {
                state
                    .transfers
                    .push(Transfer::WriteRead(addr.to_vec(), buf.len()));
                if state.failing_reads > 0 {
                    state.failing_reads -= 1;
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                let reg = u16::from_be_bytes([addr[0], addr[1]]);
                let val = state.regs.get(&reg).copied().unwrap_or(0);
                buf.copy_from_slice(&val.to_be_bytes());
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }
}
