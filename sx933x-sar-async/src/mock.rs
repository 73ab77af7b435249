//! Fake hardware for controller tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use sx933x_async::Sx933x;

use crate::config::Config;
use crate::device::SarController;
use crate::event::{EventSink, ProximityEvent};
use crate::power::{PowerControl, PowerError, Regulator};

#[derive(Default)]
struct BusState {
    regs: HashMap<u16, u32>,
    writes: Vec<(u16, u32)>,
    reads: Vec<u16>,
    failing_reads: usize,
    failing_writes: HashMap<u16, usize>,
}

/// A fake register file, clones share state.
#[derive(Clone, Default)]
pub struct Bus {
    state: Rc<RefCell<BusState>>,
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

    /// Values written to `reg`, oldest first.
    pub fn written(&self, reg: u16) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, val)| *val)
            .collect()
    }

    pub fn writes_to(&self, reg: u16) -> usize {
        self.written(reg).len()
    }

    pub fn reads_of(&self, reg: u16) -> usize {
        self.state.borrow().reads.iter().filter(|r| **r == reg).count()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.borrow_mut();
        state.writes.clear();
        state.reads.clear();
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
                let reg = u16::from_be_bytes([data[0], data[1]]);
                let val = u32::from_be_bytes([data[2], data[3], data[4], data[5]]);
                state.writes.push((reg, val));
                if let Some(left) = state.failing_writes.get_mut(&reg) {
                    if *left > 0 {
                        *left -= 1;
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                    }
                }
                state.regs.insert(reg, val);
                Ok(())
            }
            [Operation::Write(addr), Operation::Read(buf)] => {
                let reg = u16::from_be_bytes([addr[0], addr[1]]);
                state.reads.push(reg);
                if state.failing_reads > 0 {
                    state.failing_reads -= 1;
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                let val = state.regs.get(&reg).copied().unwrap_or(0);
                buf.copy_from_slice(&val.to_be_bytes());
                Ok(())
            }
            _ => Err(ErrorKind::Other),
        }
    }
}

/// A GPIO line, clones share the level.
#[derive(Clone, Default)]
pub struct Line {
    high: Rc<Cell<bool>>,
}

impl Line {
    pub fn new(high: bool) -> Self {
        Self {
            high: Rc::new(Cell::new(high)),
        }
    }

    pub fn drive_low(&self, low: bool) {
        self.high.set(!low);
    }

    pub fn level(&self) -> bool {
        self.high.get()
    }
}

impl PinErrorType for Line {
    type Error = Infallible;
}

impl InputPin for Line {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.get())
    }
}

impl OutputPin for Line {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high.set(true);
        Ok(())
    }
}

#[derive(Default)]
struct RegulatorState {
    enabled: bool,
    fail_enable: bool,
    enables: usize,
    disables: usize,
}

/// A regulator recording its switching, clones share state.
#[derive(Clone, Default)]
pub struct FakeRegulator {
    state: Rc<RefCell<RegulatorState>>,
}

impl FakeRegulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_enable(&self, fail: bool) {
        self.state.borrow_mut().fail_enable = fail;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn cycles(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.enables, state.disables)
    }
}

impl Regulator for FakeRegulator {
    type Error = ();

    fn enable(&mut self) -> Result<(), ()> {
        let mut state = self.state.borrow_mut();
        if state.fail_enable {
            return Err(());
        }
        state.enabled = true;
        state.enables += 1;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ()> {
        let mut state = self.state.borrow_mut();
        state.enabled = false;
        state.disables += 1;
        Ok(())
    }
}

/// A supply backed by a [`FakeRegulator`].
pub struct FakeSupply(pub FakeRegulator);

impl PowerControl for FakeSupply {
    fn enable(&mut self) -> Result<(), PowerError> {
        self.0.enable().map_err(|_| PowerError::Regulator)
    }

    fn disable(&mut self) -> Result<(), PowerError> {
        self.0.disable().map_err(|_| PowerError::Regulator)
    }
}

/// Collects every reported event.
#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<ProximityEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ProximityEvent> {
        self.events.take()
    }
}

impl EventSink for RecordingSink {
    fn report(&self, event: ProximityEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub type TestController<'a> = SarController<'a, Bus, Line, FakeSupply, RecordingSink>;

/// Builds a controller on a fresh fake device with the interrupt line
/// released.
pub fn controller(config: Config<'_>) -> (TestController<'_>, Bus, Line) {
    let (ctrl, bus, line, _) = controller_with_supply(config);
    (ctrl, bus, line)
}

pub fn controller_with_supply(
    config: Config<'_>,
) -> (TestController<'_>, Bus, Line, FakeRegulator) {
    let bus = Bus::new();
    let line = Line::new(true);
    let regulator = FakeRegulator::new();
    let ctrl = SarController::new(
        Sx933x::new(bus.clone()),
        Some(line.clone()),
        FakeSupply(regulator.clone()),
        RecordingSink::default(),
        config,
    );
    (ctrl, bus, line, regulator)
}
