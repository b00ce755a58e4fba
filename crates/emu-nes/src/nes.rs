//! Top-level NES system.
//!
//! The console is instruction-stepped: each [`Nes::step`] runs one CPU
//! instruction (or interrupt entry), any OAM DMA it triggered, and then
//! ticks the APU once for every CPU cycle consumed. Pacing is the
//! caller's business.

use emu_core::{Cpu, Observable, Value, parse_address};
use mos_6502::Mos6502;
use nes_cartridge::Cartridge;
use ricoh_apu_2a03::{AudioConsumer, AudioStats};
use tracing::{debug, info};

use crate::bus::NesBus;
use crate::config::NesConfig;
use crate::error::NesError;
use crate::memory::CpuMemory;
use crate::ppu::Ppu;
use crate::ppu_memory::PpuMemory;

/// CPU cycles per NTSC video frame (89,342 PPU dots / 3).
pub const CPU_CYCLES_PER_FRAME: u64 = 29_781;

/// OAM DMA length in CPU cycles, before the odd-cycle alignment penalty.
const OAM_DMA_CYCLES: u32 = 513;

/// NES system.
pub struct Nes {
    cpu: Mos6502,
    bus: NesBus,
    total_cycles: u64,
    frame_count: u64,
}

impl Nes {
    /// Create a new NES from the given configuration and reset the CPU.
    ///
    /// # Errors
    ///
    /// Returns [`NesError::Load`] if the ROM image is malformed or uses an
    /// unsupported mapper, and [`NesError::Audio`] if the audio settings
    /// are out of range.
    pub fn new(config: &NesConfig) -> Result<Self, NesError> {
        config.audio.validate()?;
        let cartridge = Cartridge::from_bytes(&config.rom_data)?;
        let mapper = cartridge.mapper()?;
        let mirroring = cartridge.mirroring();
        let (prg_rom, chr, chr_is_ram) = cartridge.into_parts();

        let memory = CpuMemory::new(prg_rom, mapper);
        let ppu = Ppu::new(PpuMemory::new(chr, chr_is_ram, mirroring));
        let apu = ricoh_apu_2a03::Apu::new(&config.audio);
        let mut bus = NesBus::new(memory, ppu, apu);

        let mut cpu = Mos6502::with_opcode_budget(config.opcode_budget);
        cpu.reset(&mut bus);
        info!(pc = cpu.pc(), "console reset");

        Ok(Self {
            cpu,
            bus,
            total_cycles: 0,
            frame_count: 0,
        })
    }

    /// Run one CPU step and everything clocked by it.
    ///
    /// Returns the CPU cycles consumed, including OAM DMA. A halted CPU
    /// consumes 0.
    ///
    /// # Errors
    ///
    /// Returns [`NesError::Cpu`] when the CPU hits its unsupported-opcode
    /// budget, and on every step after that until [`Nes::reset`].
    pub fn step(&mut self) -> Result<u32, NesError> {
        let mut cycles = self.cpu.step(&mut self.bus)?;

        if let Some(page) = self.bus.take_oam_dma() {
            let start = self.total_cycles + u64::from(cycles);
            let stall = OAM_DMA_CYCLES + u32::from(start % 2 == 1);
            self.bus.run_oam_dma(page);
            debug!(page, stall, "OAM DMA stalled CPU");
            cycles += stall;
        }

        for _ in 0..cycles {
            self.bus.tick_apu();
        }
        self.cpu.set_irq(self.bus.irq_line());
        self.bus.memory.mapper_mut().step();

        self.total_cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// Step until one frame's worth of CPU cycles has elapsed, or the CPU
    /// halts. Returns the cycles actually run.
    ///
    /// # Errors
    ///
    /// Propagates the first [`NesError`] from [`Nes::step`].
    pub fn run_frame(&mut self) -> Result<u64, NesError> {
        let start = self.total_cycles;
        let target = start + CPU_CYCLES_PER_FRAME;
        while self.total_cycles < target {
            if self.step()? == 0 {
                break;
            }
        }
        self.frame_count += 1;
        Ok(self.total_cycles - start)
    }

    /// Reload the reset vector and clear a halt or jam.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        info!(pc = self.cpu.pc(), "console reset");
    }

    /// Latch an NMI for the next step (vblank from an external PPU).
    pub fn queue_nmi(&mut self) {
        self.cpu.nmi();
    }

    pub fn clear_nmi(&mut self) {
        self.cpu.clear_nmi();
    }

    /// Instantaneous mixed APU output.
    #[must_use]
    pub fn output_value(&self) -> f64 {
        self.bus.apu.output_value()
    }

    /// Pull resampled audio while the APU still owns the consumer.
    pub fn drain_audio(&mut self, out: &mut [i16]) -> usize {
        self.bus.apu.drain_audio(out)
    }

    /// Move the audio consumer to a playback thread.
    pub fn take_audio_consumer(&mut self) -> Option<AudioConsumer> {
        self.bus.apu.take_consumer()
    }

    #[must_use]
    pub fn audio_stats(&self) -> AudioStats {
        self.bus.apu.audio_stats()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// CPU cycles since power-on, including DMA stalls.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Frames completed by [`Nes::run_frame`].
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Observable for Nes {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("apu.") {
            self.bus.apu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ppu.") {
            let ppu = &self.bus.ppu;
            match rest {
                "ctrl" => Some(ppu.register(0).into()),
                "mask" => Some(ppu.register(1).into()),
                "status" => Some(ppu.status().into()),
                "oam_addr" => Some(ppu.oam_addr().into()),
                "vram_addr" => Some(ppu.vram_addr().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|addr| Value::U8(self.bus.peek(addr)))
        } else {
            match path {
                "total_cycles" => Some(self.total_cycles.into()),
                "frame_count" => Some(self.frame_count.into()),
                "mapper" => Some(self.bus.memory.mapper().number().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502_paths>",
            "apu.<2a03_paths>",
            "ppu.ctrl",
            "ppu.mask",
            "ppu.status",
            "ppu.oam_addr",
            "ppu.vram_addr",
            "memory.<address>",
            "total_cycles",
            "frame_count",
            "mapper",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::Bus;

    /// NROM-128 image with `program` at $8000 and the reset vector
    /// pointing at it.
    fn make_rom(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 16 + 0x4000];
        rom[0..4].copy_from_slice(b"NES\x1a");
        rom[4] = 1;
        rom[16..16 + program.len()].copy_from_slice(program);
        rom[16 + 0x3FFC] = 0x00;
        rom[16 + 0x3FFD] = 0x80;
        rom
    }

    fn make_nes(program: &[u8]) -> Nes {
        Nes::new(&NesConfig::new(make_rom(program))).expect("valid ROM")
    }

    #[test]
    fn reset_vector_loaded() {
        let nes = make_nes(&[0xEA]);
        assert_eq!(nes.query("cpu.pc"), Some(Value::U16(0x8000)));
        assert!(nes.is_running());
    }

    #[test]
    fn apu_ticks_per_cpu_cycle() {
        let mut nes = make_nes(&[0xEA, 0xEA]);
        let cycles = nes.step().expect("step");
        assert_eq!(cycles, 2);
        assert_eq!(nes.bus().apu.cycles(), 2);
        assert_eq!(nes.total_cycles(), 2);
    }

    #[test]
    fn oam_dma_adds_stall() {
        // LDA #$02; STA $4014
        let mut nes = make_nes(&[0xA9, 0x02, 0x8D, 0x14, 0x40]);
        nes.step().expect("lda");
        let cycles = nes.step().expect("sta");
        // STA abs ends on cycle 6: even, no alignment penalty.
        assert_eq!(cycles, 4 + 513);
        assert_eq!(nes.bus().apu.cycles(), 6 + 513);
    }

    #[test]
    fn oam_dma_odd_alignment() {
        // LDA $00; LDA #$02; STA $4014 ends on cycle 9
        let mut nes = make_nes(&[0xA5, 0x00, 0xA9, 0x02, 0x8D, 0x14, 0x40]);
        nes.step().expect("lda zp");
        nes.step().expect("lda imm");
        let cycles = nes.step().expect("sta");
        assert_eq!(cycles, 4 + 514);
    }

    #[test]
    fn run_frame_counts_cycles() {
        // JMP $8000
        let mut nes = make_nes(&[0x4C, 0x00, 0x80]);
        let cycles = nes.run_frame().expect("frame");
        assert!((CPU_CYCLES_PER_FRAME..CPU_CYCLES_PER_FRAME + 3).contains(&cycles));
        assert_eq!(nes.frame_count(), 1);
    }

    #[test]
    fn run_frame_stops_on_halt() {
        let mut nes = make_nes(&[0xEA, 0x00]);
        let cycles = nes.run_frame().expect("frame");
        assert_eq!(cycles, 2 + 7);
        assert!(!nes.is_running());
    }

    #[test]
    fn frame_irq_reaches_cpu() {
        // LDA #$00; STA $4017; CLI; loop: JMP loop
        let mut rom = make_rom(&[0xA9, 0x00, 0x8D, 0x17, 0x40, 0x58, 0x4C, 0x06, 0x80]);
        // IRQ handler at $8100 is a lone BRK.
        rom[16 + 0x0100] = 0x00;
        rom[16 + 0x3FFE] = 0x00;
        rom[16 + 0x3FFF] = 0x81;
        let mut nes = Nes::new(&NesConfig::new(rom)).expect("valid ROM");

        nes.run_frame().expect("frame");
        nes.run_frame().expect("frame");
        assert!(!nes.is_running(), "IRQ handler's BRK halted the CPU");
        assert_eq!(nes.cpu().pc(), 0x8102);
    }

    #[test]
    fn observable_memory() {
        let mut nes = make_nes(&[0xEA]);
        nes.bus_mut().write(0x0010, 0xAB);
        assert_eq!(nes.query("memory.$0010"), Some(Value::U8(0xAB)));
        assert_eq!(nes.query("memory.0x8000"), Some(Value::U8(0xEA)));
        assert_eq!(nes.query("mapper"), Some(Value::U8(0)));
    }
}
