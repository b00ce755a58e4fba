//! Console-level errors.

use std::fmt;

use mos_6502::CpuError;
use nes_cartridge::LoadError;
use ricoh_apu_2a03::AudioConfigError;

/// Failure building or running a [`crate::Nes`].
#[derive(Debug, Clone, PartialEq)]
pub enum NesError {
    /// The ROM image could not be loaded.
    Load(LoadError),
    /// The audio settings cannot drive the resampler.
    Audio(AudioConfigError),
    /// The CPU stopped on unsupported code.
    Cpu(CpuError),
}

impl fmt::Display for NesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "cartridge load failed: {e}"),
            Self::Audio(e) => write!(f, "invalid audio config: {e}"),
            Self::Cpu(e) => write!(f, "CPU fault: {e}"),
        }
    }
}

impl std::error::Error for NesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Audio(e) => Some(e),
            Self::Cpu(e) => Some(e),
        }
    }
}

impl From<LoadError> for NesError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<AudioConfigError> for NesError {
    fn from(e: AudioConfigError) -> Self {
        Self::Audio(e)
    }
}

impl From<CpuError> for NesError {
    fn from(e: CpuError) -> Self {
        Self::Cpu(e)
    }
}
