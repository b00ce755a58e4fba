//! PPU address space ($0000-$3FFF).
//!
//! - $0000-$1FFF: pattern tables (cartridge CHR, writable only as CHR RAM)
//! - $2000-$2FFF: nametables, mirrored at $3000-$3EFF
//! - $3F00-$3FFF: palette RAM, 32 bytes mirrored

use nes_cartridge::Mirroring;

const NAMETABLE_SIZE: usize = 0x1000;
const PALETTE_SIZE: usize = 0x20;

pub struct PpuMemory {
    chr: Vec<u8>,
    chr_is_ram: bool,
    /// Room for four nametables; two-screen layouts only use the first 2K.
    nametables: [u8; NAMETABLE_SIZE],
    palette: [u8; PALETTE_SIZE],
    mirroring: Mirroring,
}

impl PpuMemory {
    #[must_use]
    pub fn new(chr: Vec<u8>, chr_is_ram: bool, mirroring: Mirroring) -> Self {
        Self {
            chr,
            chr_is_ram,
            nametables: [0; NAMETABLE_SIZE],
            palette: [0; PALETTE_SIZE],
            mirroring,
        }
    }

    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => self.chr.get(usize::from(a)).copied().unwrap_or(0),
            a @ 0x2000..=0x3EFF => self.nametables[self.nametable_index(a)],
            a => self.palette[palette_index(a)],
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr & 0x3FFF {
            a @ 0x0000..=0x1FFF => {
                if self.chr_is_ram
                    && let Some(byte) = self.chr.get_mut(usize::from(a))
                {
                    *byte = value;
                }
            }
            a @ 0x2000..=0x3EFF => {
                let index = self.nametable_index(a);
                self.nametables[index] = value;
            }
            a => self.palette[palette_index(a)] = value,
        }
    }

    /// Fold a nametable address onto physical storage.
    fn nametable_index(&self, addr: u16) -> usize {
        let offset = usize::from((addr - 0x2000) & 0x0FFF);
        let table = offset / 0x0400;
        let physical = match self.mirroring {
            // 0,1 -> A; 2,3 -> B
            Mirroring::Horizontal => table / 2,
            // 0,2 -> A; 1,3 -> B
            Mirroring::Vertical => table % 2,
            Mirroring::FourScreen => table,
        };
        physical * 0x0400 + (offset & 0x03FF)
    }

    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    #[must_use]
    pub fn chr(&self) -> &[u8] {
        &self.chr
    }
}

/// $3F10/$3F14/$3F18/$3F1C alias the backdrop entries below them.
fn palette_index(addr: u16) -> usize {
    let index = usize::from(addr & 0x1F);
    if index >= 0x10 && index & 0x03 == 0 {
        index - 0x10
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(mirroring: Mirroring) -> PpuMemory {
        let chr = (0..0x2000).map(|i| (i & 0xFF) as u8).collect();
        PpuMemory::new(chr, false, mirroring)
    }

    #[test]
    fn chr_rom_is_read_only() {
        let mut mem = rom(Mirroring::Horizontal);
        assert_eq!(mem.read(0x0123), 0x23);
        mem.write(0x0123, 0xFF);
        assert_eq!(mem.read(0x0123), 0x23);
    }

    #[test]
    fn chr_ram_is_writable() {
        let mut mem = PpuMemory::new(vec![0; 0x2000], true, Mirroring::Vertical);
        mem.write(0x1FFF, 0x5A);
        assert_eq!(mem.read(0x1FFF), 0x5A);
    }

    #[test]
    fn horizontal_mirroring() {
        let mut mem = rom(Mirroring::Horizontal);
        mem.write(0x2005, 1);
        mem.write(0x2805, 2);
        assert_eq!(mem.read(0x2405), 1);
        assert_eq!(mem.read(0x2C05), 2);
    }

    #[test]
    fn vertical_mirroring() {
        let mut mem = rom(Mirroring::Vertical);
        mem.write(0x2005, 1);
        mem.write(0x2405, 2);
        assert_eq!(mem.read(0x2805), 1);
        assert_eq!(mem.read(0x2C05), 2);
    }

    #[test]
    fn four_screen_keeps_tables_apart() {
        let mut mem = rom(Mirroring::FourScreen);
        for (i, base) in [0x2000u16, 0x2400, 0x2800, 0x2C00].into_iter().enumerate() {
            mem.write(base, i as u8 + 1);
        }
        assert_eq!(mem.read(0x2000), 1);
        assert_eq!(mem.read(0x2400), 2);
        assert_eq!(mem.read(0x2800), 3);
        assert_eq!(mem.read(0x2C00), 4);
    }

    #[test]
    fn nametables_repeat_at_3000() {
        let mut mem = rom(Mirroring::Vertical);
        mem.write(0x2123, 0x77);
        assert_eq!(mem.read(0x3123), 0x77);
    }

    #[test]
    fn palette_aliases() {
        let mut mem = rom(Mirroring::Horizontal);
        for (alias, base) in [(0x3F10, 0x3F00), (0x3F14, 0x3F04), (0x3F18, 0x3F08), (0x3F1C, 0x3F0C)] {
            mem.write(alias, 0x21);
            assert_eq!(mem.read(base), 0x21, "{alias:#06X}");
        }
        mem.write(0x3F11, 0x05);
        assert_eq!(mem.read(0x3F01), 0x00, "only multiples of 4 alias");
        assert_eq!(mem.read(0x3F31), 0x05, "32-byte mirror");
    }

    #[test]
    fn address_space_wraps_at_4000() {
        let mut mem = rom(Mirroring::Horizontal);
        assert_eq!(mem.read(0x4123), 0x23);
        mem.write(0x6000, 0x99);
        assert_eq!(mem.read(0x2000), 0x99);
    }
}
