//! CPU core trait.

use crate::Bus;

/// An instruction-stepped CPU core.
///
/// The bus is passed in, not owned, so the console can keep the memory
/// map, the PPU and the APU in one place and lend them out per step.
pub trait Cpu {
    /// Error returned when the core can no longer make progress.
    type Error;

    /// Execute one instruction or service one interrupt.
    ///
    /// Returns the number of CPU cycles consumed. A halted core consumes
    /// nothing and touches no memory.
    fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, Self::Error>;

    /// Load the program counter from the reset vector and clear any halt.
    fn reset<B: Bus>(&mut self, bus: &mut B);

    /// Latch a non-maskable interrupt for the next step.
    fn nmi(&mut self);

    /// Drop a latched non-maskable interrupt that has not been serviced.
    fn clear_nmi(&mut self);

    /// Drive the level-sensitive IRQ input.
    fn set_irq(&mut self, asserted: bool);

    /// Current program counter.
    fn pc(&self) -> u16;

    /// True once the core has stopped executing.
    fn is_halted(&self) -> bool;
}
