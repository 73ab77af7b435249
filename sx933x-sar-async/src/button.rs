//! Per-channel proximity state tracking.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use sx933x_async::op::{body_mask, prox_mask};
use sx933x_async::reg::NUM_PHASES;

/// Number of channels, one per phase.
pub const NUM_BUTTONS: usize = NUM_PHASES as usize;

/// Channel names, indexed by phase.
pub const BUTTON_NAMES: [&str; NUM_BUTTONS] = [
    "CapSense Ch0",
    "CapSense Ch1",
    "CapSense Ch2",
    "CapSense Ch3",
    "CapSense Ch4",
];

/// Distance reported to the host.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    /// The channel is disabled or was never evaluated.
    Unknown = -1,
    /// Nothing close.
    Released = 0,
    /// An object is near.
    Near = 1,
    /// A body is very near.
    VeryNear = 2,
}

impl Distance {
    /// Value reported on the wire.
    pub const fn value(self) -> i32 {
        self as i8 as i32
    }
}

/// The detection state of one channel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle = 0,
    ProxActive = 1,
    BodyActive = 2,
}

impl ButtonState {
    const fn from_u8(val: u8) -> Self {
        match val {
            1 => ButtonState::ProxActive,
            2 => ButtonState::BodyActive,
            _ => ButtonState::Idle,
        }
    }

    /// The distance reported when a channel enters this state.
    pub const fn distance(self) -> Distance {
        match self {
            ButtonState::Idle => Distance::Released,
            ButtonState::ProxActive => Distance::Near,
            ButtonState::BodyActive => Distance::VeryNear,
        }
    }
}

/// Computes the state a channel should be in for the `STAT0` value `status`.
///
/// Returns `None` for the combination body without proximity, which leaves
/// the channel where it is.
pub const fn next_state(status: u32, prox_mask: u32, body_mask: u32) -> Option<ButtonState> {
    let both = prox_mask | body_mask;
    let flags = status & both;
    if flags == both {
        Some(ButtonState::BodyActive)
    } else if flags == prox_mask {
        Some(ButtonState::ProxActive)
    } else if flags == 0 {
        Some(ButtonState::Idle)
    } else {
        None
    }
}

/// A proximity channel bound to one phase of the sensor.
///
/// Flags are atomics because the worker reads them while the control path
/// writes them.
#[derive(Debug)]
pub struct Button {
    name: &'static str,
    prox_mask: u32,
    body_mask: u32,
    enabled: AtomicBool,
    used: AtomicBool,
    state: AtomicU8,
}

impl Button {
    /// Creates a disabled, unused channel.
    pub const fn new(name: &'static str, prox_mask: u32, body_mask: u32) -> Self {
        Self {
            name,
            prox_mask,
            body_mask,
            enabled: AtomicBool::new(false),
            used: AtomicBool::new(false),
            state: AtomicU8::new(ButtonState::Idle as u8),
        }
    }

    /// Creates the channel of `phase`.
    pub const fn for_phase(name: &'static str, phase: u8) -> Self {
        Self::new(name, prox_mask(phase), body_mask(phase))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prox_mask(&self) -> u32 {
        self.prox_mask
    }

    pub fn body_mask(&self) -> u32 {
        self.body_mask
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    pub fn set_used(&self, used: bool) {
        self.used.store(used, Ordering::Release);
    }

    pub fn state(&self) -> ButtonState {
        ButtonState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn reset_state(&self) {
        self.state.store(ButtonState::Idle as u8, Ordering::Release);
    }

    /// Applies the `STAT0` value `status` to the channel.
    ///
    /// Returns the distance to report if the channel changed state. Disabled
    /// or unused channels never change.
    pub fn update(&self, status: u32) -> Option<Distance> {
        if !self.is_enabled() || !self.is_used() {
            return None;
        }
        let target = next_state(status, self.prox_mask, self.body_mask)?;
        if target == self.state() {
            log::trace!("{} already {:?}", self.name, target);
            return None;
        }
        self.state.store(target as u8, Ordering::Release);
        log::debug!("{} reporting {:?}", self.name, target);
        Some(target.distance())
    }
}

/// The channels of one sensor.
#[derive(Debug)]
pub struct ButtonSet {
    buttons: [Button; NUM_BUTTONS],
}

impl ButtonSet {
    pub const fn new() -> Self {
        Self {
            buttons: [
                Button::for_phase(BUTTON_NAMES[0], 0),
                Button::for_phase(BUTTON_NAMES[1], 1),
                Button::for_phase(BUTTON_NAMES[2], 2),
                Button::for_phase(BUTTON_NAMES[3], 3),
                Button::for_phase(BUTTON_NAMES[4], 4),
            ],
        }
    }

    /// Marks the channels whose bit is set in `used_flag` as used.
    ///
    /// Every marked channel starts disabled and idle.
    pub fn mark_used(&self, used_flag: u8) {
        for (index, button) in self.iter() {
            if used_flag & (1 << index) != 0 {
                button.set_used(true);
                button.set_enabled(false);
                button.reset_state();
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&Button> {
        self.buttons.get(index)
    }

    /// Finds a channel by its name.
    pub fn find(&self, name: &str) -> Option<(usize, &Button)> {
        self.iter().find(|(_, button)| button.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Button)> {
        self.buttons.iter().enumerate()
    }

    /// Returns `true` if at least one channel is enabled.
    pub fn any_enabled(&self) -> bool {
        self.buttons.iter().any(Button::is_enabled)
    }
}

impl Default for ButtonSet {
    fn default() -> Self {
        Self::new()
    }
}
