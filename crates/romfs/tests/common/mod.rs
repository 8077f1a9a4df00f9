//! Image builder for integration tests
//!
//! Produces table entries the same way the firmware build step does:
//! forward branch filter, raw deflate, length trailer, CRC of the original.

#![allow(dead_code, clippy::expect_used)]

use std::io::Write;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use romfs::{EmbeddedFile, Romfs};

/// Owned stand-in for a linked file table
pub struct Image {
    entries: Vec<(String, Vec<u8>, u32)>,
}

impl Image {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a file stored compressed
    pub fn compressed(mut self, path: &str, content: &[u8]) -> Self {
        let (blob, crc) = compress(content);
        self.entries.push((path.to_string(), blob, crc));
        self
    }

    /// Add a file stored raw
    pub fn raw(mut self, path: &str, content: &[u8]) -> Self {
        self.entries
            .push((path.to_string(), content.to_vec(), romfs::crc::checksum(content)));
        self
    }

    /// Add an entry with hand-made bytes
    pub fn stored(mut self, path: &str, blob: Vec<u8>, crc: u32) -> Self {
        self.entries.push((path.to_string(), blob, crc));
        self
    }

    pub fn table(&self) -> Vec<EmbeddedFile<'_>> {
        self.entries
            .iter()
            .map(|(path, blob, crc)| EmbeddedFile::new(path, blob, *crc))
            .collect()
    }
}

/// Compress `content` into a stored blob and its CRC
pub fn compress(content: &[u8]) -> (Vec<u8>, u32) {
    let crc = romfs::crc::checksum(content);

    let mut filtered = content.to_vec();
    romfs::filter::encode(&mut filtered, 0);

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&filtered).expect("in-memory write");
    let mut blob = encoder.finish().expect("in-memory finish");
    blob.extend_from_slice(&(content.len() as u32).to_le_bytes());
    (blob, crc)
}

/// Run `f` against a [`Romfs`] over the image's table
pub fn with_romfs<R>(image: &Image, f: impl FnOnce(Romfs<'_>) -> R) -> R {
    let table = image.table();
    f(Romfs::new(&table))
}

/// A few kilobytes of Thumb-like code calling a handful of functions
///
/// Each `BL` holds a PC-relative offset, so calls to the same function
/// differ byte-wise until the forward filter makes them absolute.
pub fn thumb_blob() -> Vec<u8> {
    let mut code = Vec::new();
    for i in 0u32..512 {
        code.extend_from_slice(&[0x80, 0xB5, 0x00, 0xAF]);
        let pc = code.len() as u32 + 4;
        let target = 0x8000 + (i % 7) * 0x40;
        let offset = (target.wrapping_sub(pc) >> 1) & 0x3F_FFFF;
        code.extend_from_slice(&[
            (offset >> 11) as u8,
            0xF0 | ((offset >> 19) & 0x07) as u8,
            offset as u8,
            0xF8 | ((offset >> 8) & 0x07) as u8,
        ]);
        code.extend_from_slice(&[0x80, 0xBD]);
    }
    code
}
