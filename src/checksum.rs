/// Rolling CFDATA checksum.
///
/// The cabinet checksum XORs the input together as 32-bit little-endian
/// words. A final group of 1-3 bytes is folded in from only the available
/// bytes, low byte first, without zero-padding the missing high bytes. The
/// cabinet specification has always worked this way, so the quirk must be
/// reproduced exactly for interoperability.
pub struct Checksum {
    value: u32,
    remainder: u32,
    remainder_shift: u32,
}

impl Checksum {
    pub fn new() -> Checksum {
        Checksum { value: 0, remainder: 0, remainder_shift: 0 }
    }

    pub fn value(&self) -> u32 {
        match self.remainder_shift {
            0 => self.value,
            8 => self.value ^ self.remainder,
            16 => {
                self.value
                    ^ (self.remainder >> 8)
                    ^ ((self.remainder & 0xff) << 8)
            }
            24 => {
                self.value
                    ^ (self.remainder >> 16)
                    ^ (self.remainder & 0xff00)
                    ^ ((self.remainder & 0xff) << 16)
            }
            _ => unreachable!(),
        }
    }

    pub fn update(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.remainder |= (byte as u32) << self.remainder_shift;
            if self.remainder_shift == 24 {
                self.value ^= self.remainder;
                self.remainder = 0;
                self.remainder_shift = 0;
            } else {
                self.remainder_shift += 8;
            }
        }
    }
}

/// Computes the stored checksum for one data block: the checksum of the
/// on-wire payload, then the little-endian (compressed, uncompressed)
/// length pair mixed in as one more word. The wire format requires this
/// exact order.
pub fn data_block_checksum(
    payload: &[u8],
    compressed_size: u16,
    uncompressed_size: u16,
) -> u32 {
    let mut checksum = Checksum::new();
    checksum.update(payload);
    checksum.value()
        ^ ((compressed_size as u32) | ((uncompressed_size as u32) << 16))
}

#[cfg(test)]
mod tests {
    use super::{data_block_checksum, Checksum};

    fn checksum_of(buf: &[u8]) -> u32 {
        let mut checksum = Checksum::new();
        checksum.update(buf);
        checksum.value()
    }

    #[test]
    fn empty_checksum() {
        assert_eq!(Checksum::new().value(), 0);
    }

    #[test]
    fn word_aligned_input() {
        assert_eq!(checksum_of(b"hello123"), 0x5f5e5407);
    }

    #[test]
    fn partial_tail_quirk() {
        // 1-3 trailing bytes are folded in without zero padding.
        assert_eq!(checksum_of(b"hello"), 0x6c6c6507);
    }

    #[test]
    fn incremental_updates_match_one_shot() {
        let mut checksum = Checksum::new();
        checksum.update(b"hel");
        checksum.update(b"lo123");
        assert_eq!(checksum.value(), 0x5f5e5407);
    }

    #[test]
    fn block_checksums() {
        assert_eq!(
            data_block_checksum(b"Hello, world!\n", 0x0e, 0x0e),
            0x7f2e1a4c
        );
        assert_eq!(
            data_block_checksum(b"Hello, world!\nSee you later!\n", 0x1d, 0x1d),
            0x3509541a
        );
    }

    #[test]
    fn block_checksum_from_cab_spec() {
        // This comes from the example cabinet file found in the CAB spec.
        let payload: &[u8] = b"#include <stdio.h>\r\n\r\n\
              void main(void)\r\n{\r\n    \
              printf(\"Hello, world!\\n\");\r\n}\r\n\
              #include <stdio.h>\r\n\r\n\
              void main(void)\r\n{\r\n    \
              printf(\"Welcome!\\n\");\r\n}\r\n\r\n";
        assert_eq!(data_block_checksum(payload, 0x97, 0x97), 0x30a65abd);
    }
}
