//! Directory listing
//!
//! The table is flat; directories only exist as path prefixes. Listing
//! walks the table from a caller-held cursor and stops at each entry that
//! lives somewhere under the requested directory.

use crate::registry::Romfs;

/// Path separator
const SEPARATOR: char = '/';

impl<'a> Romfs<'a> {
    /// Next path under `dirname`, starting the scan at `*cursor`
    ///
    /// Start with `*cursor == 0` and call until `None`. A path matches when
    /// it starts with `dirname` immediately followed by `/`, so `"a/b"`
    /// lists `"a/b/c"` and `"a/b/d/e"` but not `"a/bc"` or `"a/b"` itself.
    /// Once exhausted the cursor stays at the end and every further call
    /// returns `None`.
    pub fn dir_list(&self, dirname: &str, cursor: &mut usize) -> Option<&'a str> {
        while let Some(file) = self.get(*cursor) {
            *cursor += 1;
            if is_under(file.filename, dirname) {
                return Some(file.filename);
            }
        }
        None
    }

    /// Iterate over every path under `dirname`
    pub fn dir<'d>(&self, dirname: &'d str) -> DirEntries<'a, 'd> {
        DirEntries {
            romfs: *self,
            dirname,
            cursor: 0,
        }
    }
}

fn is_under(path: &str, dirname: &str) -> bool {
    path.strip_prefix(dirname)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Iterator over the paths under one directory, in table order
#[derive(Debug, Clone)]
pub struct DirEntries<'a, 'd> {
    romfs: Romfs<'a>,
    dirname: &'d str,
    cursor: usize,
}

impl<'a> Iterator for DirEntries<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.romfs.dir_list(self.dirname, &mut self.cursor)
    }
}

impl std::iter::FusedIterator for DirEntries<'_, '_> {}
