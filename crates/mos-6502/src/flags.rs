//! Processor status register (P).
//!
//! Decimal mode can be set and cleared but has no effect on the 2A03.

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// Interrupt disable: IRQs are ignored while set.
pub const I: u8 = 0x04;
/// Decimal mode (inert).
pub const D: u8 = 0x08;
/// Break. Only exists in copies of P pushed to the stack.
pub const B: u8 = 0x10;
/// Unused bit, always reads as 1.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// Processor status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Power-up value: I and U set.
    pub const POWER_ON: Self = Self(U | I);

    /// Rebuild P from a byte pulled off the stack (PLP, RTI).
    ///
    /// B does not exist in the register, U is hardwired.
    #[must_use]
    pub const fn from_stack(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Byte pushed by PHP: B and U set.
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Byte pushed by NMI/IRQ: U set, B clear.
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Z = (value == 0), N = bit 7 of value.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(Z, value == 0);
        self.set_if(N, value & 0x80 != 0);
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::POWER_ON
    }
}
