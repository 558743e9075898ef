//! Types related to source files.

use std::fmt;
use std::ops::Range;

use crate::files::FileId;

/// Byte offsets into source files.
pub type BytePos = u32;

/// Byte ranges in source files.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ByteRange {
    file_id: FileId,
    start: BytePos,
    end: BytePos,
}

impl fmt::Debug for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ByteRange({}, {}..{})",
            self.file_id, self.start, self.end
        )
    }
}

impl ByteRange {
    pub const fn new(file_id: FileId, start: BytePos, end: BytePos) -> ByteRange {
        ByteRange {
            file_id,
            start,
            end,
        }
    }

    pub const fn file_id(&self) -> FileId {
        self.file_id
    }

    pub const fn start(&self) -> BytePos {
        self.start
    }

    pub const fn end(&self) -> BytePos {
        self.end
    }

    /// The smallest range covering both `self` and `other`, if they are in
    /// the same file.
    pub fn merge(&self, other: &ByteRange) -> Option<ByteRange> {
        if self.file_id == other.file_id {
            Some(ByteRange::new(
                self.file_id,
                self.start.min(other.start),
                self.end.max(other.end),
            ))
        } else {
            None
        }
    }
}

impl From<ByteRange> for Range<usize> {
    fn from(range: ByteRange) -> Self {
        (range.start as usize)..(range.end as usize)
    }
}

/// The source location of a core term. Terms introduced during match
/// compilation have no direct counterpart in the source, and are [`Span::Empty`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Span {
    Range(ByteRange),
    Empty,
}

impl Span {
    pub fn range(&self) -> Option<ByteRange> {
        match self {
            Span::Range(range) => Some(*range),
            Span::Empty => None,
        }
    }
}

impl From<ByteRange> for Span {
    fn from(range: ByteRange) -> Span {
        Span::Range(range)
    }
}

impl From<Option<ByteRange>> for Span {
    fn from(range: Option<ByteRange>) -> Span {
        range.map_or(Span::Empty, Span::Range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_id(id: u32) -> FileId {
        FileId::try_from(id).unwrap()
    }

    #[test]
    /// `ByteRange` is used a lot. Ensure it doesn't grow accidentally.
    fn byte_range_size() {
        assert_eq!(std::mem::size_of::<ByteRange>(), 12);
    }

    #[test]
    /// `Span` is used a lot. Ensure it doesn't grow accidentally.
    fn span_size() {
        assert_eq!(std::mem::size_of::<Span>(), 12);
    }

    #[test]
    fn merge_same_file() {
        let lhs = ByteRange::new(file_id(1), 4, 8);
        let rhs = ByteRange::new(file_id(1), 2, 6);
        assert_eq!(lhs.merge(&rhs), Some(ByteRange::new(file_id(1), 2, 8)));
    }

    #[test]
    fn merge_different_files() {
        let lhs = ByteRange::new(file_id(1), 4, 8);
        let rhs = ByteRange::new(file_id(2), 2, 6);
        assert_eq!(lhs.merge(&rhs), None);
    }
}
