//! Packing and unpacking of the four fixed-layout cabinet records. All
//! multi-byte fields are little-endian. This module is purely mechanical;
//! semantic validation (magic, version, counts) belongs to the parser.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::consts;
use crate::error::Result;

pub const HEADER_SIZE: usize = 36;
pub const RESERVE_FIELDS_SIZE: usize = 4;
pub const FOLDER_ENTRY_SIZE: usize = 8;
pub const FILE_ENTRY_FIXED_SIZE: usize = 16;
pub const DATA_HEADER_SIZE: usize = 8;

/// Bounds-checked field access; overruns are corruption, never a panic.
fn field(buf: &[u8], offset: usize, size: usize) -> Result<&[u8]> {
    let end = offset.checked_add(size);
    match end.and_then(|end| buf.get(offset..end)) {
        Some(slice) => Ok(slice),
        None => corrupt!(
            "record at {:#x} extends past the end of the buffer \
             ({} bytes needed, {} available)",
            offset,
            size,
            buf.len().saturating_sub(offset.min(buf.len()))
        ),
    }
}

/// The archive header (CFHEADER), minus its three reserved dwords, which
/// are ignored on read and written as zero.
#[derive(Debug)]
pub struct CfHeader {
    pub cabinet_size: u32,
    pub first_file_offset: u32,
    pub version_minor: u8,
    pub version_major: u8,
    pub num_folders: u16,
    pub num_files: u16,
    pub flags: u16,
    pub set_id: u16,
    pub cabinet_index: u16,
}

impl CfHeader {
    pub fn unpack(buf: &[u8]) -> Result<CfHeader> {
        let fields = field(buf, 0, HEADER_SIZE)?;
        Ok(CfHeader {
            cabinet_size: LittleEndian::read_u32(&fields[8..12]),
            first_file_offset: LittleEndian::read_u32(&fields[16..20]),
            version_minor: fields[24],
            version_major: fields[25],
            num_folders: LittleEndian::read_u16(&fields[26..28]),
            num_files: LittleEndian::read_u16(&fields[28..30]),
            flags: LittleEndian::read_u16(&fields[30..32]),
            set_id: LittleEndian::read_u16(&fields[32..34]),
            cabinet_index: LittleEndian::read_u16(&fields[34..36]),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(consts::SIGNATURE);
        out.write_u32::<LittleEndian>(0)?; // reserved1
        out.write_u32::<LittleEndian>(self.cabinet_size)?;
        out.write_u32::<LittleEndian>(0)?; // reserved2
        out.write_u32::<LittleEndian>(self.first_file_offset)?;
        out.write_u32::<LittleEndian>(0)?; // reserved3
        out.write_u8(self.version_minor)?;
        out.write_u8(self.version_major)?;
        out.write_u16::<LittleEndian>(self.num_folders)?;
        out.write_u16::<LittleEndian>(self.num_files)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.set_id)?;
        out.write_u16::<LittleEndian>(self.cabinet_index)?;
        Ok(())
    }
}

/// The optional reserve descriptor that follows the header when
/// `FLAG_RESERVE_PRESENT` is set.
#[derive(Debug)]
pub struct CfReserve {
    pub header_reserve_size: u16,
    pub folder_reserve_size: u8,
    pub data_reserve_size: u8,
}

impl CfReserve {
    /// Unpacks the descriptor at `offset` and returns it along with the
    /// offset just past the per-header reserved bytes it declares.
    pub fn unpack(buf: &[u8], offset: usize) -> Result<(CfReserve, usize)> {
        let fields = field(buf, offset, RESERVE_FIELDS_SIZE)?;
        let reserve = CfReserve {
            header_reserve_size: LittleEndian::read_u16(&fields[0..2]),
            folder_reserve_size: fields[2],
            data_reserve_size: fields[3],
        };
        let offset = offset + RESERVE_FIELDS_SIZE;
        let reserved_bytes = reserve.header_reserve_size as usize;
        field(buf, offset, reserved_bytes)?;
        Ok((reserve, offset + reserved_bytes))
    }
}

/// A folder descriptor (CFFOLDER).
#[derive(Debug)]
pub struct CfFolder {
    pub first_data_offset: u32,
    pub num_data_blocks: u16,
    pub compression_bits: u16,
}

impl CfFolder {
    pub fn unpack(buf: &[u8], offset: usize) -> Result<CfFolder> {
        let fields = field(buf, offset, FOLDER_ENTRY_SIZE)?;
        Ok(CfFolder {
            first_data_offset: LittleEndian::read_u32(&fields[0..4]),
            num_data_blocks: LittleEndian::read_u16(&fields[4..6]),
            compression_bits: LittleEndian::read_u16(&fields[6..8]),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<LittleEndian>(self.first_data_offset)?;
        out.write_u16::<LittleEndian>(self.num_data_blocks)?;
        out.write_u16::<LittleEndian>(self.compression_bits)?;
        Ok(())
    }
}

/// A file descriptor (CFFILE) with its trailing NUL-terminated name.
#[derive(Debug)]
pub struct CfFileEntry {
    pub uncompressed_size: u32,
    pub folder_offset: u32,
    pub folder_index: u16,
    pub date: u16,
    pub time: u16,
    pub attributes: u16,
    pub name: String,
}

impl CfFileEntry {
    /// Unpacks the entry at `offset` and returns it with the number of
    /// bytes consumed, which is variable because of the name.
    pub fn unpack(buf: &[u8], offset: usize) -> Result<(CfFileEntry, usize)> {
        let fields = field(buf, offset, FILE_ENTRY_FIXED_SIZE)?;
        let uncompressed_size = LittleEndian::read_u32(&fields[0..4]);
        let folder_offset = LittleEndian::read_u32(&fields[4..8]);
        let folder_index = LittleEndian::read_u16(&fields[8..10]);
        let date = LittleEndian::read_u16(&fields[10..12]);
        let time = LittleEndian::read_u16(&fields[12..14]);
        let attributes = LittleEndian::read_u16(&fields[14..16]);

        let name_start = offset + FILE_ENTRY_FIXED_SIZE;
        let remaining = match buf.get(name_start..) {
            Some(remaining) => remaining,
            None => corrupt!("file name at {:#x} is missing", name_start),
        };
        let limit = remaining.len().min(consts::MAX_STRING_SIZE);
        let name_len =
            match remaining[..limit].iter().position(|&byte| byte == 0) {
                Some(len) => len,
                None => corrupt!(
                    "file name at {:#x} is not null-terminated",
                    name_start
                ),
            };
        let name = match std::str::from_utf8(&remaining[..name_len]) {
            Ok(name) => name.to_string(),
            Err(_) => {
                corrupt!("file name at {:#x} is not valid UTF-8", name_start)
            }
        };

        let entry = CfFileEntry {
            uncompressed_size,
            folder_offset,
            folder_index,
            date,
            time,
            attributes,
            name,
        };
        Ok((entry, FILE_ENTRY_FIXED_SIZE + name_len + 1))
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<()> {
        debug_assert!(self.name.len() < consts::MAX_STRING_SIZE);
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u32::<LittleEndian>(self.folder_offset)?;
        out.write_u16::<LittleEndian>(self.folder_index)?;
        out.write_u16::<LittleEndian>(self.date)?;
        out.write_u16::<LittleEndian>(self.time)?;
        out.write_u16::<LittleEndian>(self.attributes)?;
        out.extend_from_slice(self.name.as_bytes());
        out.write_u8(0)?;
        Ok(())
    }
}

/// A data block header (CFDATA). The payload follows the header and any
/// per-block reserved bytes.
#[derive(Debug)]
pub struct CfData {
    pub checksum: u32,
    pub compressed_size: u16,
    pub uncompressed_size: u16,
}

impl CfData {
    pub fn unpack(buf: &[u8], offset: usize) -> Result<CfData> {
        let fields = field(buf, offset, DATA_HEADER_SIZE)?;
        Ok(CfData {
            checksum: LittleEndian::read_u32(&fields[0..4]),
            compressed_size: LittleEndian::read_u16(&fields[4..6]),
            uncompressed_size: LittleEndian::read_u16(&fields[6..8]),
        })
    }

    pub fn pack(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<LittleEndian>(self.checksum)?;
        out.write_u16::<LittleEndian>(self.compressed_size)?;
        out.write_u16::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }
}

/// Slices the payload of a data block out of the buffer, skipping the
/// per-block reserved bytes.
pub fn data_payload(
    buf: &[u8],
    offset: usize,
    data_reserve_size: u8,
    compressed_size: u16,
) -> Result<&[u8]> {
    let start = offset + DATA_HEADER_SIZE + data_reserve_size as usize;
    field(buf, start, compressed_size as usize)
}
