//! Embedded file table
//!
//! The table is produced at build time and linked into the image. Entry
//! order is the order the build tool emitted the files in; it only matters
//! for directory listing, which walks the table front to back.

/// One file linked into the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedFile<'a> {
    /// Full path, `/` separated, no leading slash
    pub filename: &'a str,
    /// Stored bytes. In compressed images this is a raw deflate stream
    /// followed by the 4-byte little-endian uncompressed length.
    pub contents: &'a [u8],
    /// Stored size in bytes (`contents.len()`)
    pub size: u32,
    /// CRC32 of the decompressed, filtered content
    pub crc: u32,
}

impl<'a> EmbeddedFile<'a> {
    /// Describe an entry for a static table
    pub const fn new(filename: &'a str, contents: &'a [u8], crc: u32) -> Self {
        Self {
            filename,
            contents,
            size: contents.len() as u32,
            crc,
        }
    }
}

/// Handle over an immutable file table
///
/// Cheap to copy. All lookups borrow the table, so a `static` table gives
/// `'static` results:
///
/// ```
/// use romfs::{EmbeddedFile, Romfs};
///
/// static FILES: [EmbeddedFile<'static>; 2] = [
///     EmbeddedFile::new("scripts/hello.lua", b"print('hi')", 0),
///     EmbeddedFile::new("defaults.parm", b"A 1\n", 0),
/// ];
/// static ROMFS: Romfs<'static> = Romfs::new(&FILES);
///
/// assert_eq!(ROMFS.len(), 2);
/// assert!(ROMFS.contains("defaults.parm"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Romfs<'a> {
    files: &'a [EmbeddedFile<'a>],
}

impl<'a> Romfs<'a> {
    /// Wrap a file table
    pub const fn new(files: &'a [EmbeddedFile<'a>]) -> Self {
        Self { files }
    }

    /// An image with no embedded files
    pub const fn empty() -> Self {
        Self { files: &[] }
    }

    /// Number of entries in the table
    pub const fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the table has no entries
    pub const fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Entries in table order
    pub fn files(&self) -> std::slice::Iter<'a, EmbeddedFile<'a>> {
        self.files.iter()
    }

    /// Entry at `index`, if any
    pub(crate) fn get(&self, index: usize) -> Option<&'a EmbeddedFile<'a>> {
        self.files.get(index)
    }
}

impl Default for Romfs<'_> {
    fn default() -> Self {
        Self::empty()
    }
}
