use crate::error::{Error, Result};

const CTYPE_NONE: u16 = 0;
const CTYPE_MSZIP: u16 = 1;
const CTYPE_QUANTUM: u16 = 2;
const CTYPE_LZX: u16 = 3;

const COMPRESSION_TYPE_MASK: u16 = 0x000f;

/// A scheme for compressing data within the cabinet.
///
/// Only `None` and `MsZip` can be decoded; the other variants exist so that
/// recognized-but-unimplemented schemes are rejected with a specific error
/// instead of being lumped in with unknown ids.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompressionType {
    /// No compression.
    None,
    /// MSZIP compression: raw DEFLATE behind a 2-byte "CK" signature, with
    /// dictionary continuity across the blocks of one folder.
    MsZip,
    /// Quantum compression (recognized, not implemented).
    Quantum,
    /// LZX compression (recognized, not implemented).
    Lzx,
    /// A compression id this crate does not recognize.
    Unknown(u16),
}

impl CompressionType {
    /// Decodes the scheme from a folder descriptor's compression field.
    pub fn from_bitfield(bits: u16) -> CompressionType {
        // The high bits carry per-scheme parameters (Quantum level/memory,
        // LZX window); only the low four bits select the scheme.
        match bits & COMPRESSION_TYPE_MASK {
            CTYPE_NONE => CompressionType::None,
            CTYPE_MSZIP => CompressionType::MsZip,
            CTYPE_QUANTUM => CompressionType::Quantum,
            CTYPE_LZX => CompressionType::Lzx,
            id => CompressionType::Unknown(id),
        }
    }

    /// Encodes the scheme for a folder descriptor's compression field.
    pub fn to_bitfield(self) -> u16 {
        match self {
            CompressionType::None => CTYPE_NONE,
            CompressionType::MsZip => CTYPE_MSZIP,
            CompressionType::Quantum => CTYPE_QUANTUM,
            CompressionType::Lzx => CTYPE_LZX,
            CompressionType::Unknown(id) => id,
        }
    }

    /// Fails unless this scheme can actually be decoded.
    pub fn ensure_supported(self) -> Result<CompressionType> {
        match self {
            CompressionType::None | CompressionType::MsZip => Ok(self),
            CompressionType::Quantum => Err(Error::QuantumUnsupported),
            CompressionType::Lzx => Err(Error::LzxUnsupported),
            CompressionType::Unknown(id) => {
                Err(Error::UnsupportedCompression(id))
            }
        }
    }
}
