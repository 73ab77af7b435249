//! Reactions to external state changes.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use sx933x_async::reg;

use crate::device::SarController;
use crate::error::SarError;
use crate::event::EventSink;
use crate::power::PowerControl;

/// An external power supply whose presence affects the readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supply {
    Usb,
    /// A phone connected as the supply.
    Phone,
}

impl Supply {
    /// Maps a supply name to a watched supply.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "usb" => Some(Supply::Usb),
            "phone" => Some(Supply::Phone),
            _ => None,
        }
    }
}

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    fn presence(&self, supply: Supply) -> &AtomicBool {
        match supply {
            Supply::Usb => &self.usb_present,
            Supply::Phone => &self.phone_present,
        }
    }

    /// Recalibrates when the presence of the supply called `name` changes.
    ///
    /// Returns `true` if a compensation was started. Supplies other than
    /// the ones in [`Supply`] are ignored.
    pub async fn on_power_supply_changed(
        &self,
        name: &str,
        present: bool,
    ) -> Result<bool, SarError<I2C::Error>> {
        let Some(supply) = Supply::from_name(name) else {
            return Ok(false);
        };
        if self.presence(supply).swap(present, Ordering::AcqRel) == present {
            log::debug!("{supply:?} presence unchanged");
            return Ok(false);
        }
        log::info!("{supply:?} present: {present}");
        Ok(self.recalibrate_if_active().await?)
    }

    /// Applies the register overlay of the mechanical `state` and
    /// recalibrates.
    ///
    /// Returns `true` if a compensation was started. Devices without a flip
    /// configuration ignore the notification. The new state is only
    /// committed once its overlay was fully written, so a failed attempt is
    /// retried by the next notification.
    pub async fn on_flip_changed(&self, state: u32) -> Result<bool, SarError<I2C::Error>> {
        if self.config.flip.is_none() {
            return Ok(false);
        }
        if self.flip_state.load(Ordering::Acquire) == state {
            log::debug!("flip state unchanged");
            return Ok(false);
        }
        self.apply_flip_overlay(state).await?;
        self.flip_state.store(state, Ordering::Release);
        Ok(self.recalibrate_if_active().await?)
    }

    /// Reapplies the overlay of the last known mechanical state.
    pub(crate) async fn restore_flip_overlay(&self) {
        if self.config.flip.is_none() {
            return;
        }
        let state = self.flip_state.load(Ordering::Acquire);
        if let Err(err) = self.apply_flip_overlay(state).await {
            log::warn!("flip overlay not applied: {err:?}");
        }
    }

    /// Writes the overlay of `state` with all phases disabled, then
    /// re-enables them if a channel is enabled.
    ///
    /// Every write is attempted even after a failure. The first failure is
    /// returned.
    async fn apply_flip_overlay(&self, state: u32) -> Result<(), SarError<I2C::Error>> {
        let Some(flip) = self.config.flip else {
            return Ok(());
        };
        log::info!("flip state {state}, applying overlay");
        let mut bus = self.bus.lock().await;
        let ctrl = bus.read_register(reg::GNRLCTRL2).await?;
        let mut result = bus
            .write_register(reg::GNRLCTRL2, ctrl & !reg::PHASE_ENABLE_MASK)
            .await;
        for setting in flip.regs_for(state) {
            let written = bus.write_register(setting.reg, setting.val).await;
            if let Err(err) = &written {
                log::warn!("flip register 0x{:04x} not written: {err:?}", setting.reg);
            }
            result = result.and(written);
        }
        if self.buttons.any_enabled() {
            let enabled = bus
                .write_register(reg::GNRLCTRL2, ctrl | reg::PHASE_ENABLE_MASK)
                .await;
            result = result.and(enabled);
        }
        Ok(result?)
    }
}
