//! Parsed cartridge contents.

use tracing::info;

use crate::{CHR_RAM_SIZE, Header, LoadError, Mapper, Mirroring, mapper_for};

/// PRG and CHR data sliced out of an iNES image.
///
/// Immutable once built; the memory bus takes the byte arrays with
/// [`Cartridge::into_parts`].
pub struct Cartridge {
    header: Header,
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
}

impl Cartridge {
    /// Parse an iNES image.
    ///
    /// Fails on a bad signature, on an image shorter than the header
    /// declares, or on a mapper number with no implementation.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let header = Header::parse(data)?;

        let expected = header.image_len();
        if data.len() < expected {
            return Err(LoadError::Truncated {
                expected,
                actual: data.len(),
            });
        }
        // Reject now rather than when the bus is built.
        mapper_for(&header)?;

        let prg_start = header.prg_start();
        let chr_start = prg_start + header.prg_len();
        let prg_rom = data[prg_start..chr_start].to_vec();

        let chr_is_ram = header.chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_RAM_SIZE]
        } else {
            data[chr_start..chr_start + header.chr_len()].to_vec()
        };

        info!(
            prg_bytes = prg_rom.len(),
            chr_bytes = chr.len(),
            chr_ram = chr_is_ram,
            mapper = header.mapper,
            "cartridge loaded"
        );

        Ok(Self {
            header,
            prg_rom,
            chr,
            chr_is_ram,
        })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    /// CHR ROM, or the zeroed CHR RAM stand-in.
    #[must_use]
    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    #[must_use]
    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }

    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring
    }

    /// Mapper for this cartridge's header.
    pub fn mapper(&self) -> Result<Box<dyn Mapper>, LoadError> {
        mapper_for(&self.header)
    }

    /// Split into `(prg_rom, chr, chr_is_ram)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>, bool) {
        (self.prg_rom, self.chr, self.chr_is_ram)
    }
}
