//! CPU-side storage: internal RAM, cartridge SRAM and PRG ROM.
//!
//! Register windows ($2000-$401F) are routed by [`crate::NesBus`] before
//! an access reaches this layer; anything else unbacked reads 0.

use emu_core::Bus;
use nes_cartridge::Mapper;

const RAM_SIZE: usize = 0x0800;
const SRAM_SIZE: usize = 0x2000;

pub struct CpuMemory {
    /// 2K internal RAM ($0000-$07FF, mirrored to $1FFF).
    ram: [u8; RAM_SIZE],
    /// Cartridge work RAM ($6000-$7FFF).
    sram: Box<[u8; SRAM_SIZE]>,
    prg_rom: Vec<u8>,
    mapper: Box<dyn Mapper>,
}

impl CpuMemory {
    #[must_use]
    pub fn new(prg_rom: Vec<u8>, mapper: Box<dyn Mapper>) -> Self {
        Self {
            ram: [0; RAM_SIZE],
            sram: Box::new([0; SRAM_SIZE]),
            prg_rom,
            mapper,
        }
    }

    /// Read without side effects (for observation).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr) & (RAM_SIZE - 1)],
            0x6000..=0x7FFF => self.sram[usize::from(addr - 0x6000)],
            0x8000..=0xFFFF => self
                .mapper
                .prg_offset(addr, self.prg_rom.len())
                .and_then(|offset| self.prg_rom.get(offset).copied())
                .unwrap_or(0),
            _ => 0,
        }
    }

    #[must_use]
    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn mapper_mut(&mut self) -> &mut dyn Mapper {
        self.mapper.as_mut()
    }

    #[must_use]
    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }
}

impl Bus for CpuMemory {
    fn read(&mut self, addr: u16) -> u8 {
        self.peek(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr) & (RAM_SIZE - 1)] = value,
            0x6000..=0x7FFF => self.sram[usize::from(addr - 0x6000)] = value,
            0x8000..=0xFFFF => self.mapper.write_register(addr, value),
            _ => {}
        }
    }
}
