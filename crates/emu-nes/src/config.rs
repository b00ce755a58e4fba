//! NES configuration.

pub use ricoh_apu_2a03::AudioConfig;

use mos_6502::DEFAULT_OPCODE_BUDGET;

/// NES configuration.
#[derive(Debug, Clone)]
pub struct NesConfig {
    /// iNES file contents.
    pub rom_data: Vec<u8>,
    /// Back-to-back unsupported opcodes tolerated before the CPU jams.
    pub opcode_budget: u32,
    /// Resampler and audio ring settings.
    pub audio: AudioConfig,
}

impl NesConfig {
    /// Configuration with default CPU and audio settings.
    #[must_use]
    pub fn new(rom_data: Vec<u8>) -> Self {
        Self {
            rom_data,
            opcode_budget: DEFAULT_OPCODE_BUDGET,
            audio: AudioConfig::default(),
        }
    }
}
