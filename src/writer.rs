//! Deterministic cabinet serialization. Always emits exactly one folder;
//! multi-folder output is not produced even though multi-folder input can
//! be parsed.

use tracing::debug;

use crate::archive::CabArchive;
use crate::checksum::data_block_checksum;
use crate::consts;
use crate::ctype::CompressionType;
use crate::error::Result;
use crate::file::CabFile;
use crate::mszip;
use crate::record::{self, CfData, CfFileEntry, CfFolder, CfHeader};

/// Serializes `archive` to cabinet bytes. With `sort` set, files are
/// written in ascending name order; otherwise in the archive's insertion
/// order. Parsing a cabinet and re-saving it with the same `compress` flag
/// reproduces the input byte for byte.
pub(crate) fn write(
    archive: &CabArchive,
    compress: bool,
    sort: bool,
) -> Result<Vec<u8>> {
    let mut files: Vec<&CabFile> = archive.iter().collect();
    if sort {
        files.sort_by(|left, right| left.name().cmp(right.name()));
    }

    // All file contents, in output order, as one linear folder buffer.
    let mut linear = Vec::<u8>::new();
    for file in &files {
        if let Some(data) = file.data() {
            linear.extend_from_slice(data);
        }
    }

    // On-wire block bytes, paired with each block's uncompressed length.
    let mut blocks: Vec<(Vec<u8>, u16)> = Vec::new();
    for chunk in linear.chunks(consts::MAX_UNCOMPRESSED_BLOCK_SIZE) {
        let encoded = if compress {
            mszip::compress_chunk(chunk)?
        } else {
            chunk.to_vec()
        };
        blocks.push((encoded, chunk.len() as u16));
    }

    let mut file_table_size = 0;
    for file in &files {
        file_table_size += record::FILE_ENTRY_FIXED_SIZE
            + file.name_win32().len()
            + 1;
    }
    let first_data_offset =
        record::HEADER_SIZE + record::FOLDER_ENTRY_SIZE + file_table_size;
    let mut cabinet_size = first_data_offset;
    for (encoded, _) in &blocks {
        cabinet_size += record::DATA_HEADER_SIZE + encoded.len();
    }
    debug!(
        files = files.len(),
        blocks = blocks.len(),
        size = cabinet_size,
        compress,
        "writing cabinet"
    );

    let compression = if compress {
        CompressionType::MsZip
    } else {
        CompressionType::None
    };
    let mut out = Vec::with_capacity(cabinet_size);
    CfHeader {
        cabinet_size: cabinet_size as u32,
        first_file_offset: (record::HEADER_SIZE + record::FOLDER_ENTRY_SIZE)
            as u32,
        version_minor: consts::VERSION_MINOR,
        version_major: consts::VERSION_MAJOR,
        num_folders: 1,
        num_files: files.len() as u16,
        flags: 0,
        set_id: archive.cabinet_set_id(),
        cabinet_index: 0,
    }
    .pack(&mut out)?;
    CfFolder {
        first_data_offset: first_data_offset as u32,
        num_data_blocks: blocks.len() as u16,
        compression_bits: compression.to_bitfield(),
    }
    .pack(&mut out)?;

    let mut folder_offset = 0u32;
    for file in &files {
        let (date, time) = file.datetime_bits();
        CfFileEntry {
            uncompressed_size: file.len() as u32,
            folder_offset,
            folder_index: 0,
            date,
            time,
            attributes: file.attribute_bits(),
            name: file.name_win32(),
        }
        .pack(&mut out)?;
        folder_offset += file.len() as u32;
    }

    for (encoded, uncompressed_size) in &blocks {
        let compressed_size = encoded.len() as u16;
        let checksum =
            data_block_checksum(encoded, compressed_size, *uncompressed_size);
        CfData {
            checksum,
            compressed_size,
            uncompressed_size: *uncompressed_size,
        }
        .pack(&mut out)?;
        out.extend_from_slice(encoded);
    }
    debug_assert_eq!(out.len(), cabinet_size);
    Ok(out)
}
