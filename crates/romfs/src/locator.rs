//! Exact-name lookup

use crate::error::{RomfsError, RomfsResult};
use crate::registry::{EmbeddedFile, Romfs};

impl<'a> Romfs<'a> {
    /// Find the raw entry for `name`
    ///
    /// The match is a full, case-sensitive string comparison; the first
    /// matching entry wins. The returned entry carries the stored bytes,
    /// the stored size and the CRC32 recorded by the build tool.
    pub fn find_file(&self, name: &str) -> RomfsResult<&'a EmbeddedFile<'a>> {
        self.files()
            .find(|file| file.filename == name)
            .ok_or_else(|| RomfsError::NotFound(name.to_string()))
    }

    /// Whether an entry named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.files().any(|file| file.filename == name)
    }
}
