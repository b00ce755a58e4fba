//! Address translation between the CPU bus and cartridge storage.

use crate::{Header, LoadError, Mirroring};

/// Maps CPU addresses onto PRG storage and receives writes aimed at
/// cartridge registers.
///
/// The storage itself stays with the memory bus; a mapper only decides
/// which byte an address lands on.
pub trait Mapper: Send {
    /// iNES mapper number.
    fn number(&self) -> u8;

    /// Current nametable arrangement.
    fn mirroring(&self) -> Mirroring;

    /// Offset into PRG ROM for a CPU address in $8000-$FFFF.
    ///
    /// `None` when the address is not backed by PRG ROM.
    fn prg_offset(&self, addr: u16, prg_len: usize) -> Option<usize>;

    /// A CPU write into $8000-$FFFF. PRG ROM itself never changes.
    fn write_register(&mut self, _addr: u16, _value: u8) {}

    /// Called once per CPU instruction. Mappers with counters hook in here.
    fn step(&mut self) {}

    /// Whether the mapper is asserting IRQ.
    fn irq_pending(&self) -> bool {
        false
    }
}

/// NROM (mapper 0): no bank switching.
///
/// 16 KiB of PRG is mirrored at $8000 and $C000; 32 KiB fills the window.
#[derive(Debug, Clone, Copy)]
pub struct Nrom {
    mirroring: Mirroring,
}

impl Nrom {
    #[must_use]
    pub fn new(mirroring: Mirroring) -> Self {
        Self { mirroring }
    }
}

impl Mapper for Nrom {
    fn number(&self) -> u8 {
        0
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn prg_offset(&self, addr: u16, prg_len: usize) -> Option<usize> {
        if addr < 0x8000 || prg_len == 0 {
            return None;
        }
        Some(usize::from(addr - 0x8000) % prg_len)
    }
}

/// Build the mapper named in `header`.
pub fn mapper_for(header: &Header) -> Result<Box<dyn Mapper>, LoadError> {
    match header.mapper {
        0 => Ok(Box::new(Nrom::new(header.mirroring))),
        n => Err(LoadError::UnsupportedMapper(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nrom_16k_mirrors_upper_half() {
        let nrom = Nrom::new(Mirroring::Horizontal);
        assert_eq!(nrom.prg_offset(0x8000, 0x4000), Some(0));
        assert_eq!(nrom.prg_offset(0xC000, 0x4000), Some(0));
        assert_eq!(nrom.prg_offset(0xFFFC, 0x4000), Some(0x3FFC));
    }

    #[test]
    fn nrom_32k_is_linear() {
        let nrom = Nrom::new(Mirroring::Vertical);
        assert_eq!(nrom.prg_offset(0xC000, 0x8000), Some(0x4000));
        assert_eq!(nrom.prg_offset(0xFFFF, 0x8000), Some(0x7FFF));
    }

    #[test]
    fn nrom_ignores_low_addresses_and_empty_prg() {
        let nrom = Nrom::new(Mirroring::Vertical);
        assert_eq!(nrom.prg_offset(0x6000, 0x8000), None);
        assert_eq!(nrom.prg_offset(0x8000, 0), None);
    }
}
