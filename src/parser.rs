//! Single-pass cabinet parsing: header validation, per-folder data block
//! decoding, then slicing the decoded folder buffers into named entries.

use tracing::{debug, trace};

use crate::archive::CabArchive;
use crate::checksum::data_block_checksum;
use crate::consts;
use crate::ctype::CompressionType;
use crate::error::{Error, Result};
use crate::file::CabFile;
use crate::mszip::MsZipDecompressor;
use crate::record::{
    self, CfData, CfFileEntry, CfFolder, CfHeader, CfReserve,
};

/// Parses a cabinet out of `buf`. With `flatten` set, directory components
/// are stripped from stored names and only the final path segment is kept.
pub(crate) fn parse(buf: &[u8], flatten: bool) -> Result<CabArchive> {
    Parser { buf, flatten, data_reserve_size: 0 }.parse()
}

struct Parser<'a> {
    buf: &'a [u8],
    flatten: bool,
    data_reserve_size: u8,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<CabArchive> {
        if self.buf.len() < record::HEADER_SIZE
            || &self.buf[..consts::SIGNATURE.len()] != consts::SIGNATURE
        {
            return Err(Error::NotCabinet);
        }
        let header = CfHeader::unpack(self.buf)?;
        if header.cabinet_size as usize != self.buf.len() {
            corrupt!(
                "cabinet declares size {:#x} but buffer is {:#x} bytes",
                header.cabinet_size,
                self.buf.len()
            );
        }
        if header.version_major != consts::VERSION_MAJOR
            || header.version_minor != consts::VERSION_MINOR
        {
            return Err(Error::UnsupportedVersion(
                header.version_major,
                header.version_minor,
            ));
        }
        if header.cabinet_index != 0 {
            return Err(Error::ChainedCabinet);
        }
        if header.num_files == 0 {
            corrupt!("cabinet contains no files");
        }
        if header.first_file_offset as usize > self.buf.len() {
            corrupt!(
                "file table offset {:#x} is past the end of the buffer",
                header.first_file_offset
            );
        }
        debug!(
            folders = header.num_folders,
            files = header.num_files,
            set_id = header.set_id,
            "parsing cabinet"
        );

        let mut archive = CabArchive::new();
        archive.set_cabinet_set_id(header.set_id);

        let mut cursor = record::HEADER_SIZE;
        let mut folder_reserve_size = 0u8;
        if header.flags & consts::FLAG_RESERVE_PRESENT != 0 {
            let (reserve, next) = CfReserve::unpack(self.buf, cursor)?;
            let reserved_start = cursor + record::RESERVE_FIELDS_SIZE;
            let reserved_end =
                reserved_start + reserve.header_reserve_size as usize;
            archive.set_reserve_data(
                self.buf[reserved_start..reserved_end].to_vec(),
            );
            folder_reserve_size = reserve.folder_reserve_size;
            self.data_reserve_size = reserve.data_reserve_size;
            cursor = next;
        }

        let mut decompressor = MsZipDecompressor::new();
        let mut folder_data: Vec<Vec<u8>> =
            Vec::with_capacity(header.num_folders as usize);
        for index in 0..header.num_folders {
            let folder = CfFolder::unpack(self.buf, cursor)?;
            cursor +=
                record::FOLDER_ENTRY_SIZE + folder_reserve_size as usize;
            folder_data.push(self.parse_folder(
                index,
                &folder,
                &mut decompressor,
            )?);
        }

        let mut offset = header.first_file_offset as usize;
        for _ in 0..header.num_files {
            offset += self.parse_file(offset, &folder_data, &mut archive)?;
        }
        Ok(archive)
    }

    /// Decodes one folder's data blocks, in on-wire order, into a flat
    /// buffer.
    fn parse_folder(
        &self,
        index: u16,
        folder: &CfFolder,
        decompressor: &mut MsZipDecompressor,
    ) -> Result<Vec<u8>> {
        if folder.num_data_blocks == 0 {
            corrupt!("folder {} has no data blocks", index);
        }
        let compression =
            CompressionType::from_bitfield(folder.compression_bits)
                .ensure_supported()?;
        debug!(
            folder = index,
            blocks = folder.num_data_blocks,
            ?compression,
            "decoding folder"
        );
        decompressor.reset();
        let mut decoded = Vec::new();
        let mut offset = folder.first_data_offset as usize;
        for _ in 0..folder.num_data_blocks {
            offset += self.parse_data_block(
                compression,
                offset,
                decompressor,
                &mut decoded,
            )?;
        }
        Ok(decoded)
    }

    /// Decodes one data block, appending its bytes to `decoded`, and
    /// returns the number of on-wire bytes consumed.
    fn parse_data_block(
        &self,
        compression: CompressionType,
        offset: usize,
        decompressor: &mut MsZipDecompressor,
        decoded: &mut Vec<u8>,
    ) -> Result<usize> {
        let block = CfData::unpack(self.buf, offset)?;
        if compression == CompressionType::None
            && block.compressed_size != block.uncompressed_size
        {
            corrupt!(
                "stored block at {:#x} declares mismatched sizes \
                 ({} != {})",
                offset,
                block.compressed_size,
                block.uncompressed_size
            );
        }
        let payload = record::data_payload(
            self.buf,
            offset,
            self.data_reserve_size,
            block.compressed_size,
        )?;
        // A stored checksum of zero means "do not verify".
        if block.checksum != 0 {
            let actual = data_block_checksum(
                payload,
                block.compressed_size,
                block.uncompressed_size,
            );
            if actual != block.checksum {
                corrupt!(
                    "invalid checksum at {:#x} (expected {:#010x}, \
                     got {:#010x})",
                    offset,
                    block.checksum,
                    actual
                );
            }
        }
        let bytes = match compression {
            CompressionType::MsZip => decompressor
                .decompress_block(payload, block.uncompressed_size as usize)?,
            _ => payload.to_vec(),
        };
        // A length mismatch after a successful inflate is a codec defect,
        // not input corruption.
        if bytes.len() != block.uncompressed_size as usize {
            internal!(
                "block at {:#x} decoded to {} bytes, header declares {}",
                offset,
                bytes.len(),
                block.uncompressed_size
            );
        }
        trace!(offset, bytes = bytes.len(), "decoded data block");
        decoded.extend_from_slice(&bytes);
        Ok(record::DATA_HEADER_SIZE
            + self.data_reserve_size as usize
            + block.compressed_size as usize)
    }

    /// Slices one file entry out of its folder's decoded buffer and
    /// returns the entry's on-wire size.
    fn parse_file(
        &self,
        offset: usize,
        folder_data: &[Vec<u8>],
        archive: &mut CabArchive,
    ) -> Result<usize> {
        let (entry, consumed) = CfFileEntry::unpack(self.buf, offset)?;
        let folder = match folder_data.get(entry.folder_index as usize) {
            Some(folder) => folder,
            None => corrupt!(
                "file {:?} references folder {} of {}",
                entry.name,
                entry.folder_index,
                folder_data.len()
            ),
        };
        let start = entry.folder_offset as usize;
        let end = start.checked_add(entry.uncompressed_size as usize);
        let data = match end.and_then(|end| folder.get(start..end)) {
            Some(slice) => slice.to_vec(),
            None => corrupt!(
                "file {:?} wants {} bytes at offset {:#x} but its folder \
                 holds only {} bytes",
                entry.name,
                entry.uncompressed_size,
                start,
                folder.len()
            ),
        };
        let name = if self.flatten {
            flattened(&entry.name).to_string()
        } else {
            entry.name
        };
        trace!(name = %name, size = data.len(), "adding file");
        let mut file = CabFile::new(name, data);
        file.set_datetime_bits(entry.date, entry.time);
        file.set_attribute_bits(entry.attributes);
        archive.insert(file);
        Ok(consumed)
    }
}

/// The final path segment of a stored name, treating both separator styles
/// as directory boundaries.
fn flattened(name: &str) -> &str {
    match name.rfind(|chr| chr == '\\' || chr == '/') {
        Some(index) => &name[index + 1..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::flattened;
    use crate::error::Error;

    #[test]
    fn flattened_names() {
        assert_eq!(flattened("hello.c"), "hello.c");
        assert_eq!(flattened("dir\\sub\\hello.c"), "hello.c");
        assert_eq!(flattened("dir/sub/hello.c"), "hello.c");
        assert_eq!(flattened("dir\\sub/hello.c"), "hello.c");
    }

    #[test]
    fn short_buffer_is_not_a_cabinet() {
        let error = super::parse(b"MSCF", false).unwrap_err();
        assert!(matches!(error, Error::NotCabinet));
        assert!(error.is_not_supported());
    }

    #[test]
    fn bad_magic_is_not_a_cabinet() {
        let buf = vec![0u8; 64];
        let error = super::parse(&buf, false).unwrap_err();
        assert!(matches!(error, Error::NotCabinet));
    }

    fn minimal_header(cabinet_size: u32) -> Vec<u8> {
        let mut buf = vec![0u8; 36];
        buf[..4].copy_from_slice(b"MSCF");
        buf[8..12].copy_from_slice(&cabinet_size.to_le_bytes());
        buf[16..20].copy_from_slice(&36u32.to_le_bytes());
        buf[24] = 3; // version minor
        buf[25] = 1; // version major
        buf[28] = 1; // one file
        buf
    }

    #[test]
    fn size_mismatch_is_corruption() {
        let buf = minimal_header(37);
        let error = super::parse(&buf, false).unwrap_err();
        assert!(error.is_corruption());
    }

    #[test]
    fn wrong_version_is_not_supported() {
        let mut buf = minimal_header(36);
        buf[25] = 2;
        let error = super::parse(&buf, false).unwrap_err();
        assert!(matches!(error, Error::UnsupportedVersion(2, 3)));
    }

    #[test]
    fn chained_cabinet_is_not_supported() {
        let mut buf = minimal_header(36);
        buf[34] = 1;
        let error = super::parse(&buf, false).unwrap_err();
        assert!(matches!(error, Error::ChainedCabinet));
    }

    #[test]
    fn zero_files_is_corruption() {
        let mut buf = minimal_header(36);
        buf[28] = 0;
        let error = super::parse(&buf, false).unwrap_err();
        assert!(error.is_corruption());
    }

    #[test]
    fn file_offset_past_end_is_corruption() {
        let mut buf = minimal_header(36);
        buf[16..20].copy_from_slice(&100u32.to_le_bytes());
        let error = super::parse(&buf, false).unwrap_err();
        assert!(error.is_corruption());
    }
}
