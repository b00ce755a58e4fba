//! Architectural register file.

use crate::Status;

/// 2A03 register set.
///
/// The stack lives in page 1; S is the low byte of the next free slot and
/// wraps within $0100-$01FF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Registers {
    /// Power-up state: A/X/Y zero, S=$FD, P=$24.
    #[must_use]
    pub const fn power_on() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: Status::POWER_ON,
        }
    }

    /// Address for the next push; S moves down afterwards.
    pub fn push_slot(&mut self) -> u16 {
        let addr = 0x0100 | u16::from(self.s);
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Address for the next pull; S moves up first.
    pub fn pull_slot(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        0x0100 | u16::from(self.s)
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::power_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_wraps_inside_page_one() {
        let mut regs = Registers::power_on();
        regs.s = 0x00;
        assert_eq!(regs.push_slot(), 0x0100);
        assert_eq!(regs.s, 0xFF);
        assert_eq!(regs.pull_slot(), 0x0100);
        assert_eq!(regs.s, 0x00);
    }
}
