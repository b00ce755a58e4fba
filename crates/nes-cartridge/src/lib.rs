//! iNES cartridge loading and mapper implementations.
//!
//! An iNES image is a 16-byte header, an optional 512-byte trainer, then
//! PRG ROM (16 KiB units) and CHR ROM (8 KiB units). Images without CHR
//! ROM get 8 KiB of zeroed CHR RAM instead.
//!
//! Only NROM (mapper 0) is implemented. Other mapper numbers are rejected
//! at load time so that adding one later is a new `Mapper` impl plus one
//! arm in [`mapper_for`].

#![allow(clippy::cast_possible_truncation)]

mod cartridge;
mod error;
mod header;
mod mapper;

pub use cartridge::Cartridge;
pub use error::LoadError;
pub use header::{HEADER_LEN, Header, Mirroring, TRAINER_LEN};
pub use mapper::{Mapper, Nrom, mapper_for};

/// PRG ROM bank size.
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank size.
pub const CHR_BANK_SIZE: usize = 8 * 1024;
/// CHR RAM allocated when the header declares no CHR ROM.
pub const CHR_RAM_SIZE: usize = 8 * 1024;
