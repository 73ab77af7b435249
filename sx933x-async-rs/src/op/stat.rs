//! Phase detection status.

/// First bit of the proximity flags in `STAT0`.
const PROX_SHIFT: u32 = 24;
/// First bit of the body flags in `STAT0`.
const BODY_SHIFT: u32 = 16;

/// Returns the `STAT0` bit that flags proximity on `phase`.
pub const fn prox_mask(phase: u8) -> u32 {
    1 << (PROX_SHIFT + phase as u32)
}

/// Returns the `STAT0` bit that flags body detection on `phase`.
pub const fn body_mask(phase: u8) -> u32 {
    1 << (BODY_SHIFT + phase as u32)
}

/// The content of the `STAT0` register.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct PhaseStatus {
    inner: u32,
}

impl From<u32> for PhaseStatus {
    fn from(val: u32) -> Self {
        Self { inner: val }
    }
}

impl From<PhaseStatus> for u32 {
    fn from(val: PhaseStatus) -> Self {
        val.inner
    }
}

impl core::fmt::Debug for PhaseStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PhaseStatus({:#010x})", self.inner)
    }
}

impl PhaseStatus {
    /// Raw register bits.
    pub const fn bits(self) -> u32 {
        self.inner
    }

    /// Returns `true` if `phase` reports proximity.
    pub const fn prox(self, phase: u8) -> bool {
        self.inner & prox_mask(phase) != 0
    }

    /// Returns `true` if `phase` reports body detection.
    pub const fn body(self, phase: u8) -> bool {
        self.inner & body_mask(phase) != 0
    }
}
