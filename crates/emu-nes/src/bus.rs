//! NES bus: CPU address routing.
//!
//! Implements `emu_core::Bus` for the console. PPU and APU register
//! windows are intercepted here; everything else falls through to
//! [`CpuMemory`].

use emu_core::Bus;
use ricoh_apu_2a03::Apu;
use tracing::debug;

use crate::memory::CpuMemory;
use crate::ppu::Ppu;

pub struct NesBus {
    pub memory: CpuMemory,
    pub ppu: Ppu,
    pub apu: Apu,
    /// OAM DMA page latched by a $4014 write, consumed by the console.
    oam_dma_page: Option<u8>,
}

impl NesBus {
    #[must_use]
    pub fn new(memory: CpuMemory, ppu: Ppu, apu: Apu) -> Self {
        Self {
            memory,
            ppu,
            apu,
            oam_dma_page: None,
        }
    }

    /// Advance the APU one CPU cycle. DMC fetches go straight to memory.
    pub fn tick_apu(&mut self) {
        self.apu.tick(&mut self.memory);
    }

    /// Level of the combined APU and mapper IRQ lines.
    #[must_use]
    pub fn irq_line(&self) -> bool {
        self.apu.irq_line() || self.memory.mapper().irq_pending()
    }

    /// Take a pending OAM DMA request.
    pub fn take_oam_dma(&mut self) -> Option<u8> {
        self.oam_dma_page.take()
    }

    #[must_use]
    pub fn oam_dma_pending(&self) -> Option<u8> {
        self.oam_dma_page
    }

    /// Copy page `page` ($XX00-$XXFF) into OAM through the bus.
    pub fn run_oam_dma(&mut self, page: u8) {
        debug!(page, "OAM DMA");
        let base = u16::from(page) << 8;
        for index in 0..=255u8 {
            let value = self.read(base | u16::from(index));
            self.ppu.write_dma(index, value);
        }
    }

    /// Peek CPU memory without side effects (for observation).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.memory.peek(addr)
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x2000..=0x3FFF => self.ppu.cpu_read(addr),
            0x4015 => self.apu.read(addr),
            // Write-only APU registers, OAM DMA and the unwired controller ports.
            0x4000..=0x401F => 0,
            _ => self.memory.read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x2000..=0x3FFF => self.ppu.cpu_write(addr, value),
            0x4014 => self.oam_dma_page = Some(value),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4016 | 0x4018..=0x401F => {}
            _ => self.memory.write(addr, value),
        }
    }
}
