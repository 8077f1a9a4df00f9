//! Turning stored entries into readable bytes
//!
//! Compressed images store each file as a raw deflate stream followed by a
//! 4-byte little-endian trailer holding the uncompressed length. Extraction
//! inflates into a buffer of exactly that length plus one zero byte, undoes
//! the branch filter and checks the CRC32 from the table. Anything short of
//! a perfect match is an error; partial output is never returned.
//!
//! Images built with the `uncompressed` feature store files raw, and the
//! default extractor hands back the table bytes untouched.

use std::borrow::Cow;
use std::ffi::CStr;
use std::ops::Deref;

use flate2::{Decompress, FlushDecompress, Status};
use tracing::{debug, trace, warn};

use crate::crc;
use crate::error::{RomfsError, RomfsResult};
use crate::filter;
use crate::registry::{EmbeddedFile, Romfs};

/// Size of the uncompressed-length trailer
pub const TRAILER_LEN: usize = 4;

/// Upper bound on how far a deflate stream can expand
///
/// A maximal run costs a little over two bits per 258 output bytes, so no
/// valid stream of `n` bytes inflates past `n * 1032`. Trailers claiming
/// more are rejected before anything is allocated.
pub const MAX_DEFLATE_RATIO: usize = 1032;

/// Extractor used by [`Romfs::find_decompress`], chosen at build time
#[cfg(not(feature = "uncompressed"))]
pub type DefaultExtractor = Inflate;

/// Extractor used by [`Romfs::find_decompress`], chosen at build time
#[cfg(feature = "uncompressed")]
pub type DefaultExtractor = Passthrough;

/// Strategy turning a table entry into readable file content
pub trait Extractor {
    /// Produce the content of `file`
    fn extract<'a>(&self, file: &'a EmbeddedFile<'a>) -> RomfsResult<FileData<'a>>;
}

/// Inflate, unfilter and CRC-check compressed entries
#[derive(Debug, Clone, Copy, Default)]
pub struct Inflate;

/// Hand back stored bytes as-is
///
/// No allocation and no integrity check. Only correct for images whose
/// entries were stored uncompressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Extractor for Inflate {
    fn extract<'a>(&self, file: &'a EmbeddedFile<'a>) -> RomfsResult<FileData<'a>> {
        let (stream, size) = split_trailer(file.contents)?;
        let mut buf = alloc_output(size)?;

        inflate_exact(stream, &mut buf, size)?;
        filter::decode(&mut buf[..size], 0);

        let actual = crc::checksum(&buf[..size]);
        if actual != file.crc {
            return Err(RomfsError::IntegrityFailure {
                expected: file.crc,
                actual,
            });
        }

        Ok(FileData::owned(buf))
    }
}

impl Extractor for Passthrough {
    fn extract<'a>(&self, file: &'a EmbeddedFile<'a>) -> RomfsResult<FileData<'a>> {
        Ok(FileData::borrowed(file.contents))
    }
}

impl<'a> Romfs<'a> {
    /// Look up `name` and return its content, ready to use
    ///
    /// Uses [`DefaultExtractor`]. In compressed builds the result owns a
    /// freshly inflated buffer; in `uncompressed` builds it borrows the
    /// table. Either way, dropping it (or calling [`FileData::release`])
    /// is all the cleanup required.
    pub fn find_decompress(&self, name: &str) -> RomfsResult<FileData<'a>> {
        self.find_decompress_with(name, &DefaultExtractor::default())
    }

    /// Look up `name` and extract it with a specific strategy
    pub fn find_decompress_with<E: Extractor>(
        &self,
        name: &str,
        extractor: &E,
    ) -> RomfsResult<FileData<'a>> {
        let file = self.find_file(name)?;
        match extractor.extract(file) {
            Ok(data) => {
                debug!(
                    file = name,
                    stored = file.size,
                    size = data.len(),
                    owned = data.is_owned(),
                    "extracted file"
                );
                Ok(data)
            }
            Err(e) => {
                warn!(file = name, error = %e, "file unavailable");
                Err(e)
            }
        }
    }
}

/// Split a compressed blob into its deflate stream and declared length
fn split_trailer(contents: &[u8]) -> RomfsResult<(&[u8], usize)> {
    let Some(split) = contents.len().checked_sub(TRAILER_LEN) else {
        return Err(RomfsError::DecompressionFailed(format!(
            "stored size {} is shorter than the length trailer",
            contents.len()
        )));
    };
    let (stream, trailer) = contents.split_at(split);
    let trailer: [u8; TRAILER_LEN] = trailer
        .try_into()
        .map_err(|_| RomfsError::DecompressionFailed("invalid length trailer".to_string()))?;
    let size = u32::from_le_bytes(trailer) as usize;

    if size > stream.len().saturating_mul(MAX_DEFLATE_RATIO) {
        return Err(RomfsError::DecompressionFailed(format!(
            "trailer length {size} is impossible for a {} byte stream",
            stream.len()
        )));
    }

    Ok((stream, size))
}

/// Reserve `size + 1` zeroed bytes; the last one stays zero
fn alloc_output(size: usize) -> RomfsResult<Vec<u8>> {
    let total = size
        .checked_add(1)
        .ok_or(RomfsError::AllocationFailure { size: usize::MAX })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(total)
        .map_err(|_| RomfsError::AllocationFailure { size: total })?;
    buf.resize(total, 0);
    Ok(buf)
}

/// Inflate a raw deflate stream that must produce exactly `size` bytes
///
/// `out` holds one byte more than `size` so an overlong stream shows up as
/// output past the declared length instead of a stalled decoder. That byte
/// is zeroed again on success.
fn inflate_exact(stream: &[u8], out: &mut [u8], size: usize) -> RomfsResult<()> {
    let mut inflater = Decompress::new(false);
    let status = inflater
        .decompress(stream, out, FlushDecompress::Finish)
        .map_err(|e| RomfsError::DecompressionFailed(format!("malformed stream: {e}")))?;

    let produced = inflater.total_out() as usize;
    if produced > size {
        return Err(RomfsError::DecompressionFailed(format!(
            "stream holds more than the declared {size} bytes"
        )));
    }
    if status != Status::StreamEnd || produced < size {
        return Err(RomfsError::DecompressionFailed(format!(
            "stream ended after {produced} of {size} bytes"
        )));
    }

    // Gzip-derived blobs keep the container CRC32 between the end of the
    // deflate stream and the length trailer. It is never read; the table
    // CRC covers the content.
    let unread = stream.len() - (inflater.total_in() as usize).min(stream.len());
    if unread > 0 {
        trace!(unread, "bytes after end of stream ignored");
    }

    out[size] = 0;
    Ok(())
}

/// Content of an extracted file
///
/// Compressed builds own an inflated buffer with a zero byte after the
/// content; `uncompressed` builds borrow the table bytes directly. Derefs to
/// the content alone, without the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData<'a> {
    bytes: Cow<'a, [u8]>,
    len: usize,
}

impl<'a> FileData<'a> {
    /// Wrap an owned buffer whose last byte is the terminator
    fn owned(buf: Vec<u8>) -> Self {
        let len = buf.len().saturating_sub(1);
        Self {
            bytes: Cow::Owned(buf),
            len,
        }
    }

    fn borrowed(bytes: &'a [u8]) -> Self {
        Self {
            bytes: Cow::Borrowed(bytes),
            len: bytes.len(),
        }
    }

    /// File content, without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Content followed by its zero terminator
    ///
    /// `None` for borrowed table data, which carries no terminator.
    pub fn as_bytes_with_nul(&self) -> Option<&[u8]> {
        match &self.bytes {
            Cow::Owned(buf) => Some(buf),
            Cow::Borrowed(_) => None,
        }
    }

    /// Content as a C string
    ///
    /// `None` for borrowed data or content containing a NUL byte.
    pub fn as_c_str(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(self.as_bytes_with_nul()?).ok()
    }

    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the content is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of the content as stored in the table's size fields
    pub fn size(&self) -> u32 {
        u32::try_from(self.len).unwrap_or(u32::MAX)
    }

    /// Whether this value owns its buffer (compressed builds)
    pub fn is_owned(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }

    /// Copy or move the content into a vector, without the terminator
    pub fn into_vec(self) -> Vec<u8> {
        let len = self.len;
        let mut buf = self.bytes.into_owned();
        buf.truncate(len);
        buf
    }

    /// Give the data back
    ///
    /// Same as dropping it: owned buffers are freed, borrowed data is left
    /// alone.
    pub fn release(self) {}
}

impl Deref for FileData<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for FileData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
