//! Enabling and disabling channels.

use embedded_hal::digital::InputPin;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::button::Distance;
use crate::device::SarController;
use crate::error::SarError;
use crate::event::EventSink;
use crate::power::PowerControl;

impl<I2C, IRQ, PWR, S> SarController<'_, I2C, IRQ, PWR, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: InputPin,
    PWR: PowerControl,
    S: EventSink,
{
    /// Enables or disables the channel called `name`.
    ///
    /// Enabling turns every phase on, reports the channel as released and
    /// starts a compensation. Disabling reports the channel as
    /// [`Distance::Unknown`]. Once no channel is enabled all phases are
    /// turned off.
    pub async fn set_enable(&self, name: &str, enable: bool) -> Result<(), SarError<I2C::Error>> {
        let (channel, button) = self.buttons.find(name).ok_or(SarError::UnknownChannel)?;
        let mut bus = self.bus.lock().await;
        if enable {
            log::info!("enable cap sensor: {name}");
            let val = bus.enable_phases().await?;
            log::debug!("GNRLCTRL2 = {val:#x}");
            button.set_enabled(true);
            self.report(channel, button, Distance::Released);
            bus.compensate().await?;
        } else {
            log::info!("disable cap sensor: {name}");
            button.set_enabled(false);
            self.report(channel, button, Distance::Unknown);
        }

        if !self.buttons.any_enabled() {
            log::info!("disable all channels");
            let val = bus.disable_phases().await?;
            log::debug!("GNRLCTRL2 = {val:#x}");
        }
        Ok(())
    }
}
