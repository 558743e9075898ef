//! A file database, similar to `codespan_reporting::files::SimpleFiles`, that
//! uses [`FileId`] as the file id, instead of `usize`.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::Range;

use codespan_reporting::files::Files as _;
use codespan_reporting::files::{Error, SimpleFile};

use crate::source::ByteRange;

/// File id.
// - `u32` rather than `usize`, because `ByteRange` stores one per range
// - `NonZeroU32` lets `Option<FileId>` and `Span` stay small
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileId(NonZeroU32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u32> for FileId {
    type Error = <NonZeroU32 as TryFrom<u32>>::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(FileId(NonZeroU32::try_from(value)?))
    }
}

impl From<FileId> for usize {
    fn from(value: FileId) -> Self {
        value.0.get() as Self
    }
}

/// Source files loaded by the driver.
pub struct Files {
    files: Vec<SimpleFile<String, String>>,
}

impl Files {
    /// Create a new files database.
    pub fn new() -> Files {
        Files { files: Vec::new() }
    }

    /// Add a file to the database, returning the handle that can be used to
    /// refer to it again.
    ///
    /// # Panics
    ///
    /// If more than `u32::MAX` files are added.
    pub fn add(&mut self, name: String, source: String) -> FileId {
        self.files.push(SimpleFile::new(name, source));
        let len = u32::try_from(self.files.len())
            .expect("too many files (maximum amount of files is `u32::MAX`)");
        // `len` is at least one after the push above
        FileId(NonZeroU32::new(len).unwrap())
    }

    /// Get the file corresponding to the given id.
    pub fn get(&self, file_id: FileId) -> Result<&SimpleFile<String, String>, Error> {
        let index = usize::from(file_id) - 1;
        self.files.get(index).ok_or(Error::FileMissing)
    }

    /// The source text covered by `range`, if the range is in bounds.
    pub fn source_slice(&self, range: ByteRange) -> Option<&str> {
        let source = self.get(range.file_id()).ok()?.source();
        source.get(Range::<usize>::from(range))
    }
}

impl Default for Files {
    fn default() -> Files {
        Files::new()
    }
}

impl<'a> codespan_reporting::files::Files<'a> for Files {
    type FileId = FileId;
    type Name = String;
    type Source = &'a str;

    fn name(&self, file_id: FileId) -> Result<String, Error> {
        Ok(self.get(file_id)?.name().clone())
    }

    fn source(&'a self, file_id: FileId) -> Result<&'a str, Error> {
        Ok(self.get(file_id)?.source().as_str())
    }

    fn line_index(&self, file_id: FileId, byte_index: usize) -> Result<usize, Error> {
        self.get(file_id)?.line_index((), byte_index)
    }

    fn line_range(&self, file_id: FileId, line_index: usize) -> Result<Range<usize>, Error> {
        self.get(file_id)?.line_range((), line_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ids_start_at_one() {
        let mut files = Files::new();
        let first = files.add("a.match".to_owned(), String::new());
        let second = files.add("b.match".to_owned(), String::new());

        assert_eq!(usize::from(first), 1);
        assert_eq!(usize::from(second), 2);
        assert_eq!(files.get(second).unwrap().name(), "b.match");
    }

    #[test]
    fn source_slice_out_of_bounds() {
        let mut files = Files::new();
        let file_id = files.add("a.match".to_owned(), "def x".to_owned());

        assert_eq!(files.source_slice(ByteRange::new(file_id, 0, 3)), Some("def"));
        assert_eq!(files.source_slice(ByteRange::new(file_id, 3, 10)), None);
    }
}
