//! PPU register file ($2000-$2007) and sprite memory.
//!
//! Only the CPU-facing half of the 2C02 is modelled: register latches,
//! OAM, and VRAM access through $2006/$2007. Nothing here renders; a
//! renderer would read [`Ppu::memory`] and [`Ppu::oam`] and drive
//! [`Ppu::set_status`].

use crate::ppu_memory::PpuMemory;

/// PPUCTRL bit selecting a VRAM increment of 32.
const CTRL_INCREMENT_32: u8 = 0x04;
/// PPUSTATUS vertical blank flag.
const STATUS_VBLANK: u8 = 0x80;

pub struct Ppu {
    /// Last value written to each register.
    registers: [u8; 8],
    status: u8,
    oam: [u8; 256],
    oam_addr: u8,
    /// VRAM address assembled by two $2006 writes.
    vram_addr: u16,
    /// First/second write toggle shared by $2005 and $2006.
    write_latch: bool,
    read_buffer: u8,
    memory: PpuMemory,
}

impl Ppu {
    #[must_use]
    pub fn new(memory: PpuMemory) -> Self {
        Self {
            registers: [0; 8],
            status: 0,
            oam: [0; 256],
            oam_addr: 0,
            vram_addr: 0,
            write_latch: false,
            read_buffer: 0,
            memory,
        }
    }

    /// CPU read from PPU register ($2000-$2007 mirrored).
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr & 0x07 {
            // PPUSTATUS
            2 => {
                let result = self.status;
                self.status &= !STATUS_VBLANK;
                self.write_latch = false;
                result
            }
            // OAMDATA
            4 => self.oam[usize::from(self.oam_addr)],
            // PPUDATA
            7 => {
                let addr = self.vram_addr & 0x3FFF;
                let result = if addr >= 0x3F00 {
                    // Palette reads bypass the buffer; it gets the nametable byte underneath.
                    self.read_buffer = self.memory.read(addr & 0x2FFF);
                    self.memory.read(addr)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.memory.read(addr);
                    buffered
                };
                self.increment_vram_addr();
                result
            }
            reg => self.registers[usize::from(reg)],
        }
    }

    /// CPU write to PPU register ($2000-$2007 mirrored).
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        let reg = addr & 0x07;
        self.registers[usize::from(reg)] = value;
        match reg {
            // OAMADDR
            3 => self.oam_addr = value,
            // OAMDATA
            4 => {
                self.oam[usize::from(self.oam_addr)] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            // PPUSCROLL
            5 => self.write_latch = !self.write_latch,
            // PPUADDR
            6 => {
                if self.write_latch {
                    self.vram_addr = (self.vram_addr & 0xFF00) | u16::from(value);
                } else {
                    self.vram_addr = (self.vram_addr & 0x00FF) | (u16::from(value & 0x3F) << 8);
                }
                self.write_latch = !self.write_latch;
            }
            // PPUDATA
            7 => {
                self.memory.write(self.vram_addr & 0x3FFF, value);
                self.increment_vram_addr();
            }
            _ => {}
        }
    }

    fn increment_vram_addr(&mut self) {
        let step = if self.registers[0] & CTRL_INCREMENT_32 != 0 {
            32
        } else {
            1
        };
        self.vram_addr = self.vram_addr.wrapping_add(step) & 0x3FFF;
    }

    /// One byte of an OAM DMA transfer, placed relative to OAMADDR.
    pub fn write_dma(&mut self, index: u8, value: u8) {
        self.oam[usize::from(self.oam_addr.wrapping_add(index))] = value;
    }

    /// Last value written to register `index` (0-7).
    #[must_use]
    pub fn register(&self, index: u8) -> u8 {
        self.registers[usize::from(index & 0x07)]
    }

    /// PPUSTATUS as the next $2002 read will see it.
    #[must_use]
    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn set_status(&mut self, status: u8) {
        self.status = status;
    }

    #[must_use]
    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    #[must_use]
    pub fn oam_addr(&self) -> u8 {
        self.oam_addr
    }

    #[must_use]
    pub fn vram_addr(&self) -> u16 {
        self.vram_addr
    }

    #[must_use]
    pub fn memory(&self) -> &PpuMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut PpuMemory {
        &mut self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nes_cartridge::Mirroring;

    fn make_ppu() -> Ppu {
        Ppu::new(PpuMemory::new(vec![0; 0x2000], true, Mirroring::Horizontal))
    }

    fn set_addr(ppu: &mut Ppu, addr: u16) {
        ppu.cpu_write(0x2006, (addr >> 8) as u8);
        ppu.cpu_write(0x2006, (addr & 0xFF) as u8);
    }

    #[test]
    fn registers_latch_and_mirror() {
        let mut ppu = make_ppu();
        ppu.cpu_write(0x2000, 0x05);
        assert_eq!(ppu.register(0), 0x05);
        ppu.cpu_write(0x3FF9, 0x1E); // mirror of $2001
        assert_eq!(ppu.register(1), 0x1E);
        assert_eq!(ppu.cpu_read(0x2008), 0x05);
    }

    #[test]
    fn ppudata_write_then_buffered_read() {
        let mut ppu = make_ppu();
        set_addr(&mut ppu, 0x2000);
        ppu.cpu_write(0x2007, 0xAA);
        ppu.cpu_write(0x2007, 0xBB);
        assert_eq!(ppu.vram_addr(), 0x2002);

        set_addr(&mut ppu, 0x2000);
        let _stale = ppu.cpu_read(0x2007);
        assert_eq!(ppu.cpu_read(0x2007), 0xAA);
        assert_eq!(ppu.cpu_read(0x2007), 0xBB);
    }

    #[test]
    fn palette_reads_are_immediate() {
        let mut ppu = make_ppu();
        set_addr(&mut ppu, 0x3F00);
        ppu.cpu_write(0x2007, 0x0F);
        set_addr(&mut ppu, 0x3F00);
        assert_eq!(ppu.cpu_read(0x2007), 0x0F);
    }

    #[test]
    fn increment_32_from_ctrl() {
        let mut ppu = make_ppu();
        ppu.cpu_write(0x2000, CTRL_INCREMENT_32);
        set_addr(&mut ppu, 0x2000);
        ppu.cpu_write(0x2007, 1);
        ppu.cpu_write(0x2007, 2);
        assert_eq!(ppu.vram_addr(), 0x2040);
        assert_eq!(ppu.memory().read(0x2020), 2);
    }

    #[test]
    fn status_read_resets_address_latch() {
        let mut ppu = make_ppu();
        ppu.cpu_write(0x2006, 0x21);
        ppu.cpu_read(0x2002);
        set_addr(&mut ppu, 0x2345);
        assert_eq!(ppu.vram_addr(), 0x2345);
    }

    #[test]
    fn status_read_clears_vblank() {
        let mut ppu = make_ppu();
        ppu.set_status(0x80);
        assert_eq!(ppu.cpu_read(0x2002), 0x80);
        assert_eq!(ppu.cpu_read(0x2002), 0x00);
    }

    #[test]
    fn oamdata_increments_address() {
        let mut ppu = make_ppu();
        ppu.cpu_write(0x2003, 0xFF);
        ppu.cpu_write(0x2004, 0x11);
        ppu.cpu_write(0x2004, 0x22);
        assert_eq!(ppu.oam()[0xFF], 0x11);
        assert_eq!(ppu.oam()[0x00], 0x22);
        assert_eq!(ppu.oam_addr(), 0x01);
    }

    #[test]
    fn dma_is_relative_to_oam_addr() {
        let mut ppu = make_ppu();
        ppu.cpu_write(0x2003, 0x10);
        ppu.write_dma(0xF0, 0x33);
        assert_eq!(ppu.oam()[0x00], 0x33);
    }
}
