//! CRC32 used to validate decompressed files
//!
//! This is the reflected CRC32 (polynomial 0xEDB88320) run with a zero
//! initial register and no final inversion, matching the checksum the
//! firmware build tool records in the table. It differs from the common
//! zlib CRC32 only in those two inversions, so `crc32fast` computes it once
//! the seed and the result are complemented.

/// Continue a CRC over `data`, starting from a previous value
pub fn update(crc: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(!crc);
    hasher.update(data);
    !hasher.finalize()
}

/// CRC of `data` from a zero register
pub fn checksum(data: &[u8]) -> u32 {
    update(0, data)
}
