//! Operand fetch, effective-address and stack helpers.
//!
//! Each `addr_*` helper consumes the operand bytes at PC and returns the
//! effective address. Indexed modes also report whether a page boundary
//! was crossed, since reads pay one extra cycle for it.

use emu_core::Bus;

use crate::Mos6502;

impl Mos6502 {
    /// Read the byte at PC and advance PC.
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Little-endian word at PC.
    pub(crate) fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn read_word(bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Word read for `JMP ($xxFF)`: the high byte comes from $xx00.
    pub(crate) fn read_word_same_page(bus: &mut impl Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        let addr = self.regs.push_slot();
        bus.write(addr, value);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        let addr = self.regs.pull_slot();
        bus.read(addr)
    }

    /// High byte first, so the low byte sits at the lower address.
    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn addr_zero_page(&mut self, bus: &mut impl Bus) -> u16 {
        u16::from(self.fetch(bus))
    }

    /// `$nn,X`: wraps inside page zero.
    pub(crate) fn addr_zero_page_x(&mut self, bus: &mut impl Bus) -> u16 {
        u16::from(self.fetch(bus).wrapping_add(self.regs.x))
    }

    pub(crate) fn addr_absolute(&mut self, bus: &mut impl Bus) -> u16 {
        self.fetch_word(bus)
    }

    /// `$nnnn,index`. Returns the address and whether the page changed.
    pub(crate) fn addr_absolute_indexed(&mut self, bus: &mut impl Bus, index: u8) -> (u16, bool) {
        let base = self.fetch_word(bus);
        let addr = base.wrapping_add(u16::from(index));
        (addr, (base ^ addr) & 0xFF00 != 0)
    }

    /// Relative branch. Returns the extra cycles: 0 when not taken, 1 when
    /// taken, 2 when the target is on another page.
    pub(crate) fn branch_if(&mut self, bus: &mut impl Bus, condition: bool) -> u32 {
        let offset = self.fetch(bus) as i8;
        if !condition {
            return 0;
        }
        let from = self.regs.pc;
        let to = from.wrapping_add_signed(i16::from(offset));
        self.regs.pc = to;
        if (from ^ to) & 0xFF00 != 0 { 2 } else { 1 }
    }
}
