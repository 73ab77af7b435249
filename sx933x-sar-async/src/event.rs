//! Delivery of proximity events to the host.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::button::Distance;

/// A distance change on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityEvent {
    /// Channel index, equal to its phase.
    pub channel: u8,
    /// Channel name.
    pub name: &'static str,
    pub distance: Distance,
}

/// Receives proximity events.
///
/// `report` is called from the worker and must not block.
pub trait EventSink {
    fn report(&self, event: ProximityEvent);
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn report(&self, event: ProximityEvent) {
        (**self).report(event)
    }
}

impl<M: RawMutex, const N: usize> EventSink for Channel<M, ProximityEvent, N> {
    fn report(&self, event: ProximityEvent) {
        if self.try_send(event).is_err() {
            log::warn!("proximity event queue full, dropping {event:?}");
        }
    }
}
