//! 2A03 CPU core: an NMOS 6502 without decimal arithmetic.
//!
//! The core is instruction-stepped. Each `step()` either services a
//! pending interrupt or executes one instruction and reports the cycles it
//! took, so the console can advance the APU by the same amount.
//!
//! Only part of the instruction set is decoded. Unknown opcodes are
//! skipped and counted; once `opcode_budget` of them arrive back to back
//! the core jams and every later step returns [`CpuError::Jammed`].

mod addressing;
mod cpu;
mod error;
pub mod flags;
mod registers;

pub use cpu::{DEFAULT_OPCODE_BUDGET, Mos6502, RunState};
pub use error::CpuError;
pub use flags::Status;
pub use registers::Registers;

/// NMI vector address.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Reset vector address.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector address.
pub const IRQ_VECTOR: u16 = 0xFFFE;
