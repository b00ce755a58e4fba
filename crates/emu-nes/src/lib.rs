//! NES console built from the chip crates.
//!
//! The CPU (`mos-6502`) drives [`NesBus`], which routes PPU and APU
//! register traffic and falls through to [`CpuMemory`] for RAM, SRAM and
//! cartridge PRG. The APU (`ricoh-apu-2a03`) is ticked once per CPU cycle
//! and its IRQ line is fed back to the CPU. The PPU side is storage only:
//! register latches, OAM and [`PpuMemory`].

mod bus;
mod config;
mod error;
mod memory;
mod nes;
mod ppu;
mod ppu_memory;

#[cfg(feature = "native")]
pub mod audio;
#[cfg(feature = "native")]
pub mod capture;

pub use bus::NesBus;
pub use config::{AudioConfig, NesConfig};
pub use error::NesError;
pub use memory::CpuMemory;
pub use nes::{CPU_CYCLES_PER_FRAME, Nes};
pub use ppu::Ppu;
pub use ppu_memory::PpuMemory;
