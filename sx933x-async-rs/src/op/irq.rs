//! Host interrupt source structures.

/// Number of status bits reported by the host interrupt source.
pub const MAX_STATUS_BITS: usize = 8;

/// A single bit of the host interrupt source register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IrqBit {
    /// Transmit enable status.
    TxEn = 0,
    /// Reserved.
    Reserved = 1,
    /// Body or table detection changed.
    Body = 2,
    /// A conversion completed.
    Conversion = 3,
    /// A compensation completed.
    Compensation = 4,
    /// A phase left proximity.
    Release = 5,
    /// A phase entered proximity.
    Touch = 6,
    /// The device came out of reset.
    Reset = 7,
}

impl IrqBit {
    /// The bit's position in the status byte.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the bit at `index`, if any.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::TxEn),
            1 => Some(Self::Reserved),
            2 => Some(Self::Body),
            3 => Some(Self::Conversion),
            4 => Some(Self::Compensation),
            5 => Some(Self::Release),
            6 => Some(Self::Touch),
            7 => Some(Self::Reset),
            _ => None,
        }
    }
}

/// A snapshot of the pending interrupt bits read from the device.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct IrqStatus {
    inner: u8,
}

impl From<u8> for IrqStatus {
    fn from(status: u8) -> Self {
        Self { inner: status }
    }
}

impl From<u32> for IrqStatus {
    /// Only the low byte of the host interrupt source carries status bits.
    fn from(reg: u32) -> Self {
        Self {
            inner: (reg & 0xFF) as u8,
        }
    }
}

impl From<IrqStatus> for u8 {
    fn from(val: IrqStatus) -> Self {
        val.inner
    }
}

impl core::fmt::Debug for IrqStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IrqStatus")
            .field("tx_en", &self.is_set(IrqBit::TxEn))
            .field("body", &self.is_set(IrqBit::Body))
            .field("conversion", &self.is_set(IrqBit::Conversion))
            .field("compensation", &self.is_set(IrqBit::Compensation))
            .field("release", &self.is_set(IrqBit::Release))
            .field("touch", &self.is_set(IrqBit::Touch))
            .field("reset", &self.is_set(IrqBit::Reset))
            .finish()
    }
}

impl IrqStatus {
    /// Returns `true` if the bit at `index` is set.
    pub const fn bit(self, index: usize) -> bool {
        index < MAX_STATUS_BITS && (self.inner >> index) & 0x01 != 0
    }

    /// Returns `true` if `bit` is set.
    pub const fn is_set(self, bit: IrqBit) -> bool {
        self.bit(bit.index())
    }

    /// Returns `true` if no bit is pending.
    pub const fn is_empty(self) -> bool {
        self.inner == 0
    }

    /// Iterates over the indices of the set bits, lowest first.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_STATUS_BITS).filter(move |&index| self.bit(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_low_byte_is_kept() {
        let status = IrqStatus::from(0xABCD_0064u32);
        assert_eq!(u8::from(status), 0x64);
        assert!(status.is_set(IrqBit::Body));
        assert!(status.is_set(IrqBit::Release));
        assert!(status.is_set(IrqBit::Touch));
        assert!(!status.is_set(IrqBit::Conversion));
    }

    #[test]
    fn iterates_in_ascending_order() {
        let status = IrqStatus::from(0b1010_0101u8);
        let mut bits = status.iter();
        assert_eq!(bits.next(), Some(0));
        assert_eq!(bits.next(), Some(2));
        assert_eq!(bits.next(), Some(5));
        assert_eq!(bits.next(), Some(7));
        assert_eq!(bits.next(), None);
    }
}
