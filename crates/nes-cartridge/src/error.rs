use std::fmt;

/// Why an iNES image could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Shorter than the 16-byte header.
    TooShort { len: usize },
    /// First four bytes are not `NES\x1A`.
    BadMagic([u8; 4]),
    /// The header declares more data than the image holds.
    Truncated { expected: usize, actual: usize },
    /// No mapper implementation for this number.
    UnsupportedMapper(u8),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => {
                write!(f, "iNES image too short: {len} bytes, header needs 16")
            }
            Self::BadMagic(magic) => write!(f, "invalid iNES magic {magic:02X?}, expected NES\\x1A"),
            Self::Truncated { expected, actual } => {
                write!(f, "iNES image truncated: expected {expected} bytes, got {actual}")
            }
            Self::UnsupportedMapper(n) => write!(f, "unsupported mapper {n}"),
        }
    }
}

impl std::error::Error for LoadError {}
