//! iNES header decoding.

use crate::{CHR_BANK_SIZE, LoadError, PRG_BANK_SIZE};

/// Size of the iNES header.
pub const HEADER_LEN: usize = 16;
/// Size of the optional trainer block that follows the header.
pub const TRAINER_LEN: usize = 512;

const MAGIC: [u8; 4] = *b"NES\x1A";

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000=$2400, $2800=$2C00.
    Horizontal,
    /// $2000=$2800, $2400=$2C00.
    Vertical,
    /// Four distinct nametables backed by cartridge RAM.
    FourScreen,
}

/// Decoded iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// PRG ROM size in 16 KiB units (byte 4).
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB units (byte 5). Zero means CHR RAM.
    pub chr_banks: u8,
    /// Mapper number from the flag-6/flag-7 nibbles.
    pub mapper: u8,
    pub mirroring: Mirroring,
    /// Battery-backed SRAM (flag 6 bit 1).
    pub has_battery: bool,
    /// 512-byte trainer present (flag 6 bit 2).
    pub has_trainer: bool,
}

impl Header {
    /// Decode and validate the first 16 bytes of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < HEADER_LEN {
            return Err(LoadError::TooShort { len: data.len() });
        }
        let magic = [data[0], data[1], data[2], data[3]];
        if magic != MAGIC {
            return Err(LoadError::BadMagic(magic));
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper: (flags7 & 0xF0) | (flags6 >> 4),
            mirroring,
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
        })
    }

    #[must_use]
    pub fn prg_len(&self) -> usize {
        usize::from(self.prg_banks) * PRG_BANK_SIZE
    }

    #[must_use]
    pub fn chr_len(&self) -> usize {
        usize::from(self.chr_banks) * CHR_BANK_SIZE
    }

    /// Offset of the first PRG byte in the image.
    #[must_use]
    pub fn prg_start(&self) -> usize {
        if self.has_trainer {
            HEADER_LEN + TRAINER_LEN
        } else {
            HEADER_LEN
        }
    }

    /// Image length implied by the header.
    #[must_use]
    pub fn image_len(&self) -> usize {
        self.prg_start() + self.prg_len() + self.chr_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(bytes4to7: [u8; 4]) -> [u8; 16] {
        let mut h = [0u8; 16];
        h[..4].copy_from_slice(b"NES\x1A");
        h[4..8].copy_from_slice(&bytes4to7);
        h
    }

    #[test]
    fn mapper_number_from_both_nibbles() {
        let h = Header::parse(&header([1, 1, 0x40, 0x10])).expect("valid");
        assert_eq!(h.mapper, 0x14);
    }

    #[test]
    fn mirroring_bits() {
        let h = Header::parse(&header([1, 1, 0x01, 0])).expect("valid");
        assert_eq!(h.mirroring, Mirroring::Vertical);
        let h = Header::parse(&header([1, 1, 0x09, 0])).expect("valid");
        assert_eq!(h.mirroring, Mirroring::FourScreen);
    }

    #[test]
    fn trainer_moves_prg_start() {
        let h = Header::parse(&header([2, 0, 0x04, 0])).expect("valid");
        assert!(h.has_trainer);
        assert_eq!(h.prg_start(), 528);
        assert_eq!(h.image_len(), 528 + 32 * 1024);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut h = header([1, 1, 0, 0]);
        h[3] = 0x1B;
        assert_eq!(
            Header::parse(&h),
            Err(LoadError::BadMagic([b'N', b'E', b'S', 0x1B]))
        );
    }

    #[test]
    fn short_input_rejected() {
        assert_eq!(Header::parse(b"NES"), Err(LoadError::TooShort { len: 3 }));
    }
}
