//! The SAR controller and its interrupt path.

use core::cell::RefCell;
use core::fmt::Write;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Duration;
use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use heapless::{String, Vec};
use sx933x_async::conf::RegSetting;
use sx933x_async::op::{IrqStatus, PhaseRaw};
use sx933x_async::reg::NUM_PHASES;
use sx933x_async::{SxError, Sx933x};

use crate::button::{Button, ButtonSet, Distance};
use crate::config::Config;
use crate::dispatch::{DispatchTable, StatusHandler};
use crate::event::{EventSink, ProximityEvent};
use crate::power::PowerControl;
use crate::sched::WorkQueue;
use crate::watchdog::Watchdog;

/// Capacity of the headset register snapshot.
pub const MAX_HEADSET_REGS: usize = 16;
/// Capacity of one raw data log record.
const RECORD_LEN: usize = 192;

/// Result of the identity check run at attach time.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareFault {
    None = 0,
    /// The identity register holds an unknown value.
    IdMismatch = 1,
    /// The interrupt line stayed asserted.
    IrqStuck = 2,
    /// The identity register could not be read.
    BusError = 3,
}

impl HardwareFault {
    pub(crate) const fn from_u8(val: u8) -> Self {
        match val {
            1 => HardwareFault::IdMismatch,
            2 => HardwareFault::IrqStuck,
            3 => HardwareFault::BusError,
            _ => HardwareFault::None,
        }
    }
}

/// An SX933x driven as a SAR proximity sensor.
///
/// Every method takes `&self` so the controller can be shared between the
/// interrupt handler, the worker task, the watchdog task and the control
/// path. Register access is serialized by an async mutex around the chip
/// driver.
pub struct SarController<'a, I2C, IRQ, PWR, S> {
    pub(crate) bus: Mutex<CriticalSectionRawMutex, Sx933x<I2C>>,
    pub(crate) nirq: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<IRQ>>>,
    pub(crate) power: BlockingMutex<CriticalSectionRawMutex, RefCell<PWR>>,
    pub(crate) config: Config<'a>,
    pub(crate) sink: S,
    pub(crate) buttons: ButtonSet,
    pub(crate) table: DispatchTable,
    pub(crate) work: WorkQueue,
    pub(crate) watchdog: Watchdog,
    pub(crate) fault: AtomicU8,
    pub(crate) suspended: AtomicBool,
    pub(crate) reinit_busy: AtomicBool,
    pub(crate) reset_count: AtomicU32,
    pub(crate) usb_present: AtomicBool,
    pub(crate) phone_present: AtomicBool,
    pub(crate) flip_state: AtomicU32,
    pub(crate) headset_backup:
        BlockingMutex<CriticalSectionRawMutex, RefCell<Vec<RegSetting, MAX_HEADSET_REGS>>>,
}

impl<'a, I2C, IRQ, PWR, S> SarController<'a, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Creates a controller. Nothing is sent to the device until
    /// [`SarController::attach`].
    ///
    /// Without an interrupt line (`nirq` is `None`) every interrupt is
    /// treated as asserted.
    pub fn new(
        sx: Sx933x<I2C>,
        nirq: Option<IRQ>,
        power: PWR,
        sink: S,
        config: Config<'a>,
    ) -> Self {
        let flip_state = config.flip.map(|flip| flip.initial_state).unwrap_or(0);
        Self {
            bus: Mutex::new(sx),
            nirq: BlockingMutex::new(RefCell::new(nirq)),
            power: BlockingMutex::new(RefCell::new(power)),
            config,
            sink,
            buttons: ButtonSet::new(),
            table: DispatchTable::default(),
            work: WorkQueue::new(),
            watchdog: Watchdog::new(),
            fault: AtomicU8::new(HardwareFault::None as u8),
            suspended: AtomicBool::new(false),
            reinit_busy: AtomicBool::new(false),
            reset_count: AtomicU32::new(0),
            usb_present: AtomicBool::new(false),
            phone_present: AtomicBool::new(false),
            flip_state: AtomicU32::new(flip_state),
            headset_backup: BlockingMutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Replaces the status dispatch table. Must be called before attaching.
    pub fn with_dispatch_table(mut self, table: DispatchTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn buttons(&self) -> &ButtonSet {
        &self.buttons
    }

    pub fn work_queue(&self) -> &WorkQueue {
        &self.work
    }

    /// Fault recorded by the last identity check.
    pub fn fault(&self) -> HardwareFault {
        HardwareFault::from_u8(self.fault.load(Ordering::Acquire))
    }

    /// Number of completed reinitializations.
    pub fn reset_count(&self) -> u32 {
        self.reset_count.load(Ordering::Acquire)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// Returns `Some(true)` while the active-low interrupt line is asserted,
    /// `None` if there is no line. A line that cannot be read counts as
    /// asserted.
    pub(crate) fn nirq_asserted(&self) -> Option<bool> {
        self.nirq.lock(|nirq| {
            nirq.borrow_mut()
                .as_mut()
                .map(|pin| pin.is_low().unwrap_or(true))
        })
    }

    pub(crate) fn report(&self, channel: usize, button: &Button, distance: Distance) {
        self.sink.report(ProximityEvent {
            channel: channel as u8,
            name: button.name(),
            distance,
        });
    }

    /// Reads the status register to release the interrupt line.
    pub(crate) async fn flush_status(&self) {
        if let Err(err) = self.bus.lock().await.read_status().await {
            log::warn!("status flush failed: {err:?}");
        }
    }

    /// Interrupt entry point, safe to call from interrupt context.
    ///
    /// Schedules an immediate worker run if interrupts are unmasked and the
    /// line is asserted.
    pub fn handle_interrupt(&self) {
        if !self.work.irq_enabled() {
            log::trace!("irq masked, ignored");
            return;
        }
        if self.nirq_asserted().unwrap_or(true) {
            log::debug!("irq - schedule work");
            self.work.schedule(Duration::from_ticks(0));
            self.work.mark_interrupt();
        } else {
            log::debug!("irq - nirq read high");
        }
    }

    /// Runs the worker forever. Spawn this in its own task.
    pub async fn run_worker(&self) -> ! {
        loop {
            self.work.next().await;
            self.process_work().await;
        }
    }

    /// A single worker pass: read the status once and run the handlers of
    /// the pending bits, lowest bit first.
    pub async fn process_work(&self) {
        let nirq_low = self.config.irq_timer.is_some() && self.nirq_asserted().unwrap_or(true);
        let status = match self.bus.lock().await.read_status().await {
            Ok(status) => status,
            Err(err) => {
                log::warn!("worker: status read failed: {err:?}");
                IrqStatus::default()
            }
        };
        log::debug!("worker status: {status:?}");
        for (bit, handler) in self.table.pending(status) {
            log::trace!("running handler of bit {bit}: {handler:?}");
            self.run_handler(handler).await;
        }
        if let (Some(timeout), true) = (self.config.irq_timer, nirq_low) {
            self.work.schedule(timeout);
        }
    }

    async fn run_handler(&self, handler: StatusHandler) {
        match handler {
            StatusHandler::TouchProcess => self.touch_process().await,
            StatusHandler::RawData => {
                if let Err(err) = self.log_raw_data().await {
                    log::warn!("raw data dump failed: {err:?}");
                }
            }
        }
    }

    async fn touch_process(&self) {
        let status = match self.bus.lock().await.read_phase_status().await {
            Ok(status) => status,
            Err(_) => return,
        };
        log::debug!("touch process, STAT0: {status:?}");
        for (channel, button) in self.buttons.iter() {
            if !button.is_enabled() {
                log::trace!("{} disabled, ignored", button.name());
                continue;
            }
            if let Some(distance) = button.update(status.bits()) {
                self.report(channel, button, distance);
            }
        }
    }

    /// Reads the measurements of every phase.
    pub async fn raw_data(&self) -> Result<[PhaseRaw; NUM_PHASES as usize], SxError<I2C::Error>> {
        let mut bus = self.bus.lock().await;
        let mut raw = [PhaseRaw::default(); NUM_PHASES as usize];
        for (phase, slot) in (0..NUM_PHASES).zip(raw.iter_mut()) {
            *slot = bus.read_phase_raw(phase).await?;
        }
        Ok(raw)
    }

    async fn log_raw_data(&self) -> Result<(), SxError<I2C::Error>> {
        let stat = self.bus.lock().await.read_phase_status().await?;
        log::debug!("STAT0 = {stat:?}");
        let raw = self.raw_data().await?;
        let state = |phase: u8| {
            self.buttons
                .get(phase as usize)
                .map(|button| button.state() as u8)
                .unwrap_or(0)
        };

        for phase in &raw {
            let mut line = String::<RECORD_LEN>::new();
            let _ = write!(
                line,
                "SMTC_DAT PH= {} DIFF= {} USE= {}",
                phase.phase, phase.diff, phase.useful
            );
            self.write_reference_phases(&mut line, &raw);
            let _ = write!(
                line,
                " STATE= {} OFF= {} AVG= {} SMTC_END",
                state(phase.phase),
                phase.offset,
                phase.average
            );
            log::debug!("{line}");
        }

        let debug = self.bus.lock().await.read_debug_raw().await?;
        let Some(phase) = debug.phase.and_then(|phase| raw.get(phase as usize)) else {
            log::debug!("invalid debug phase selection");
            return Ok(());
        };
        let mut line = String::<RECORD_LEN>::new();
        let _ = write!(
            line,
            "SMTC_DBG PH= {} USE= {} RAW= {}",
            phase.phase, phase.useful, debug.raw
        );
        self.write_reference_phases(&mut line, &raw);
        let _ = write!(
            line,
            " STATE= {} AVG= {} DIFF= {} OFF= {} ADC_MIN= {} ADC_MAX= {} DLT= {} SMTC_END",
            state(phase.phase),
            phase.average,
            phase.diff,
            phase.offset,
            debug.adc_min,
            debug.adc_max,
            debug.delta_var
        );
        log::debug!("{line}");
        Ok(())
    }

    fn write_reference_phases<W: Write>(&self, line: &mut W, raw: &[PhaseRaw]) {
        for reference in [self.config.ref_phase_a, self.config.ref_phase_b] {
            if let Some(phase) = reference.and_then(|phase| raw.get(phase as usize)) {
                let _ = write!(line, " PH{}_USE= {}", phase.phase, phase.useful);
            }
        }
    }

    /// Reads a register through the serialized transport.
    pub async fn read_register(&self, reg: u16) -> Result<u32, SxError<I2C::Error>> {
        self.bus.lock().await.read_register(reg).await
    }

    /// Writes a register through the serialized transport.
    pub async fn write_register(&self, reg: u16, val: u32) -> Result<(), SxError<I2C::Error>> {
        self.bus.lock().await.write_register(reg, val).await
    }

    /// Issues a compensation if any phase is enabled.
    ///
    /// Returns `true` if a compensation was started.
    pub async fn recalibrate_if_active(&self) -> Result<bool, SxError<I2C::Error>> {
        let mut bus = self.bus.lock().await;
        if !bus.phases_enabled().await? {
            log::debug!("no phase enabled, skipping compensation");
            return Ok(false);
        }
        log::info!("manual compensation");
        bus.compensate().await?;
        Ok(true)
    }
}
