//! Read-only file store for firmware images
//!
//! A build step compresses a set of files, links them into the image as a
//! static table of [`EmbeddedFile`] entries, and this crate reads them back
//! at runtime.
//!
//! # Stored format
//!
//! Each compressed entry is a raw deflate stream followed by the
//! uncompressed length as a 4-byte little-endian trailer. Before
//! compressing, the build tool rewrites ARM Thumb `BL` offsets into absolute
//! targets (see [`filter`]) and records the CRC32 (see [`crc`]) of the
//! original content. Extraction reverses all of it and refuses to return
//! anything that does not check out.
//!
//! With the `uncompressed` feature the entries are stored raw and
//! [`Romfs::find_decompress`] returns borrowed table bytes instead.
//!
//! # Examples
//!
//! ```
//! use romfs::{EmbeddedFile, Passthrough, Romfs};
//!
//! static FILES: [EmbeddedFile<'static>; 3] = [
//!     EmbeddedFile::new("scripts/init.lua", b"print('boot')", 0),
//!     EmbeddedFile::new("scripts/modules/util.lua", b"return {}", 0),
//!     EmbeddedFile::new("scriptsx/other.lua", b"", 0),
//! ];
//! static ROMFS: Romfs<'static> = Romfs::new(&FILES);
//!
//! let entry = ROMFS.find_file("scripts/init.lua").unwrap();
//! assert_eq!(entry.size, 13);
//!
//! let data = ROMFS
//!     .find_decompress_with("scripts/init.lua", &Passthrough)
//!     .unwrap();
//! assert_eq!(&*data, b"print('boot')");
//!
//! let listed: Vec<_> = ROMFS.dir("scripts").collect();
//! assert_eq!(listed, ["scripts/init.lua", "scripts/modules/util.lua"]);
//! ```

#![warn(missing_docs)]

pub mod crc;
mod dir;
mod error;
mod extract;
pub mod filter;
mod locator;
mod registry;

pub use dir::DirEntries;
pub use error::{RomfsError, RomfsResult};
pub use extract::{
    DefaultExtractor, Extractor, FileData, Inflate, MAX_DEFLATE_RATIO, Passthrough, TRAILER_LEN,
};
pub use registry::{EmbeddedFile, Romfs};
