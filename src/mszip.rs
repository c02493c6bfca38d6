//! The MSZIP framing used by cabinet folders: raw DEFLATE (no zlib/gzip
//! wrapper) behind a 2-byte "CK" signature. Within one folder the DEFLATE
//! dictionary carries forward from block to block, so decoding is stateful;
//! each block on the encode side is an independent stream, which any
//! conformant reader accepts because the dictionary is just a replay of the
//! previous blocks' literal output.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use tracing::trace;

use crate::error::Result;

const MSZIP_SIGNATURE: &[u8; 2] = b"CK";
const DEFLATE_MAX_DICT_LEN: usize = 0x8000;

/// Compresses one chunk of at most 0x8000 bytes into an MSZIP block.
pub fn compress_chunk(data: &[u8]) -> Result<Vec<u8>> {
    debug_assert!(data.len() <= DEFLATE_MAX_DICT_LEN);
    let mut out = Vec::<u8>::with_capacity(0xffff);
    out.extend_from_slice(MSZIP_SIGNATURE);
    let mut compressor = flate2::Compress::new(Compression::best(), false);
    match compressor.compress_vec(data, &mut out, flate2::FlushCompress::Finish)
    {
        Ok(flate2::Status::StreamEnd) => {}
        Ok(_) => internal!("MSZIP compression did not run to completion"),
        Err(error) => internal!("MSZIP compression failed: {}", error),
    }
    trace!("MSZIP: {} bytes -> {} bytes", data.len(), out.len());
    Ok(out)
}

/// A decoder session for one folder's MSZIP blocks.
///
/// Carries the preset dictionary from block to block; call [`reset`] at
/// each folder boundary before reuse.
///
/// [`reset`]: MsZipDecompressor::reset
pub struct MsZipDecompressor {
    decompressor: flate2::Decompress,
    dictionary: Vec<u8>,
}

impl MsZipDecompressor {
    pub fn new() -> MsZipDecompressor {
        MsZipDecompressor {
            decompressor: flate2::Decompress::new(false),
            dictionary: Vec::with_capacity(DEFLATE_MAX_DICT_LEN),
        }
    }

    /// Discards the carried dictionary; decompression state never crosses
    /// folder boundaries.
    pub fn reset(&mut self) {
        self.dictionary.clear();
    }

    pub fn decompress_block(
        &mut self,
        data: &[u8],
        uncompressed_size: usize,
    ) -> Result<Vec<u8>> {
        if data.len() < MSZIP_SIGNATURE.len()
            || &data[..MSZIP_SIGNATURE.len()] != MSZIP_SIGNATURE
        {
            corrupt!("MSZIP block signature invalid");
        }
        let data = &data[MSZIP_SIGNATURE.len()..];
        // Reset the raw inflater, then replay the dictionary into it as a
        // non-final stored block so back-references can reach it.
        self.decompressor.reset(false);
        if !self.dictionary.is_empty() {
            debug_assert!(self.dictionary.len() <= DEFLATE_MAX_DICT_LEN);
            let length = self.dictionary.len() as u16;
            let mut chunk: Vec<u8> = vec![0];
            chunk.write_u16::<LittleEndian>(length)?;
            chunk.write_u16::<LittleEndian>(!length)?;
            chunk.extend_from_slice(&self.dictionary);
            let mut out = Vec::with_capacity(self.dictionary.len());
            let flush = flate2::FlushDecompress::Sync;
            match self.decompressor.decompress_vec(&chunk, &mut out, flush) {
                Ok(flate2::Status::Ok) => {}
                _ => internal!("failed to replay MSZIP dictionary"),
            }
        }
        let mut out = Vec::<u8>::with_capacity(uncompressed_size);
        let flush = flate2::FlushDecompress::Finish;
        match self.decompressor.decompress_vec(data, &mut out, flush) {
            Ok(flate2::Status::StreamEnd) => {}
            Ok(_) => corrupt!("MSZIP stream did not terminate"),
            Err(error) => corrupt!("MSZIP decompression failed: {}", error),
        }
        // Keep the last 0x8000 output bytes as the next block's dictionary.
        if out.len() >= DEFLATE_MAX_DICT_LEN {
            let start = out.len() - DEFLATE_MAX_DICT_LEN;
            self.dictionary.clear();
            self.dictionary.extend_from_slice(&out[start..]);
        } else {
            let total = self.dictionary.len() + out.len();
            if total > DEFLATE_MAX_DICT_LEN {
                self.dictionary.drain(..(total - DEFLATE_MAX_DICT_LEN));
            }
            self.dictionary.extend_from_slice(&out);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::{compress_chunk, MsZipDecompressor, DEFLATE_MAX_DICT_LEN};

    #[test]
    fn read_compressed_data() {
        let input: &[u8] = b"CK%\xcc\xd1\t\x031\x0c\x04\xd1V\xb6\x80#\x95\xa4\
              \t\xc5\x12\xc7\x82e\xfb,\xa9\xff\x18\xee{x\xf3\x9d\xdb\x1c\\Q\
              \x0e\x9d}n\x04\x13\xe2\x96\x17\xda\x1ca--kC\x94\x8b\xd18nX\xe7\
              \x89az\x00\x8c\x15>\x15i\xbe\x0e\xe6hTj\x8dD%\xba\xfc\xce\x1e\
              \x96\xef\xda\xe0r\x0f\x81t>%\x9f?\x12]-\x87";
        let expected: &[u8] =
            b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed \
              do eiusmod tempor incididunt ut labore et dolore magna aliqua.";
        assert!(input.len() < expected.len());
        let mut decompressor = MsZipDecompressor::new();
        let output =
            decompressor.decompress_block(input, expected.len()).unwrap();
        assert_eq!(output, expected);
    }

    #[test]
    fn compress_then_decompress_one_block() {
        let original: &[u8] =
            b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed \
              do eiusmod tempor incididunt ut labore et dolore magna aliqua.";
        let block = compress_chunk(original).unwrap();
        assert_eq!(&block[..2], b"CK");
        let mut decompressor = MsZipDecompressor::new();
        let output =
            decompressor.decompress_block(&block, original.len()).unwrap();
        assert_eq!(output, original);
    }

    fn repeating_data(size: usize) -> Vec<u8> {
        let modulus = 251; // a prime number no bigger than u8::MAX
        (0..size).map(|index| (index % modulus) as u8).collect::<Vec<u8>>()
    }

    #[test]
    fn decoder_session_across_blocks() {
        // Independently compressed chunks must decode through one session
        // even though the session threads a dictionary between them.
        let original = repeating_data(DEFLATE_MAX_DICT_LEN * 2 + 1000);
        let mut decompressor = MsZipDecompressor::new();
        let mut output = Vec::new();
        for chunk in original.chunks(DEFLATE_MAX_DICT_LEN) {
            let block = compress_chunk(chunk).unwrap();
            output.extend_from_slice(
                &decompressor.decompress_block(&block, chunk.len()).unwrap(),
            );
        }
        assert_eq!(output, original);
    }

    #[test]
    fn session_reset_between_folders() {
        let first = repeating_data(1000);
        let second = b"fresh folder".to_vec();
        let mut decompressor = MsZipDecompressor::new();
        let block = compress_chunk(&first).unwrap();
        decompressor.decompress_block(&block, first.len()).unwrap();
        decompressor.reset();
        let block = compress_chunk(&second).unwrap();
        let output =
            decompressor.decompress_block(&block, second.len()).unwrap();
        assert_eq!(output, second);
    }

    #[test]
    fn bad_signature_is_corruption() {
        let mut block = compress_chunk(b"test123").unwrap();
        block[0] = b'X';
        let mut decompressor = MsZipDecompressor::new();
        let error = decompressor.decompress_block(&block, 7).unwrap_err();
        assert!(error.is_corruption());
    }

    #[test]
    fn malformed_stream_is_corruption() {
        let block: &[u8] = b"CK\xff\xff\xff\xff";
        let mut decompressor = MsZipDecompressor::new();
        let error = decompressor.decompress_block(block, 7).unwrap_err();
        assert!(error.is_corruption());
    }
}
