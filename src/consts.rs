pub const SIGNATURE: &[u8; 4] = b"MSCF";

pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 3;

pub const MAX_STRING_SIZE: usize = 255;
pub const MAX_UNCOMPRESSED_BLOCK_SIZE: usize = 0x8000;

// Header flags:
pub const FLAG_RESERVE_PRESENT: u16 = 0x0004;

// File attributes:
pub const ATTR_READ_ONLY: u16 = 0x01;
pub const ATTR_HIDDEN: u16 = 0x02;
pub const ATTR_SYSTEM: u16 = 0x04;
pub const ATTR_ARCH: u16 = 0x20;
pub const ATTR_EXEC: u16 = 0x40;
pub const ATTR_NAME_IS_UTF: u16 = 0x80;
