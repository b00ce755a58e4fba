//! CPU failure modes.

use std::fmt;

/// Why the CPU stopped making progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// Too many unsupported opcodes in a row; the core has jammed.
    OpcodeStorm {
        /// The opcode that exhausted the budget.
        opcode: u8,
        /// Address it was fetched from.
        pc: u16,
        /// Length of the unsupported streak.
        streak: u32,
    },
    /// Stepped again after an opcode storm. Only `reset()` recovers.
    Jammed {
        pc: u16,
    },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpcodeStorm { opcode, pc, streak } => write!(
                f,
                "unsupported opcode ${opcode:02X} at ${pc:04X}: {streak} in a row, CPU halted"
            ),
            Self::Jammed { pc } => write!(f, "CPU is jammed at ${pc:04X}"),
        }
    }
}

impl std::error::Error for CpuError {}
