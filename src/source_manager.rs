use serde::Serialize;
use std::num::NonZeroU32;

/// Source ID for identifying source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceId(NonZeroU32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl SourceId {
    /// create a new SourceId from a u32. panics if id is zero.
    pub fn new(id: u32) -> Self {
        SourceId(NonZeroU32::new(id).expect("SourceId must be non-zero"))
    }

    fn to_u32(self) -> u32 {
        self.0.get()
    }
}

/// Source ID and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLoc {
    pub source_id: SourceId,
    pub offset: u32,
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceLoc {
    pub fn new(source_id: SourceId, offset: u32) -> Self {
        SourceLoc { source_id, offset }
    }

    /// built-in source location (SourceId = 1, offset = 0)
    pub fn builtin() -> Self {
        SourceLoc::new(SourceId::new(1), 0)
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Represents a range in a template source file.
/// Packed representation (64 bits total):
/// - Bits 0-23: Offset (24 bits) - Max 16 MiB
/// - Bits 24-39: Length (16 bits) - Max 64 KiB
/// - Bits 40-63: SourceId (24 bits) - Max ~16M files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan(u64);

impl Default for SourceSpan {
    fn default() -> Self {
        Self::empty()
    }
}

impl SourceSpan {
    const OFFSET_BITS: u64 = 24;
    const LENGTH_BITS: u64 = 16;
    const SOURCE_ID_BITS: u64 = 24;

    const OFFSET_MASK: u64 = (1 << Self::OFFSET_BITS) - 1;
    const LENGTH_MASK: u64 = (1 << Self::LENGTH_BITS) - 1;
    const SOURCE_ID_MASK: u64 = (1 << Self::SOURCE_ID_BITS) - 1;

    const LENGTH_SHIFT: u64 = Self::OFFSET_BITS;
    const SOURCE_ID_SHIFT: u64 = Self::OFFSET_BITS + Self::LENGTH_BITS;

    const MAX_OFFSET: u32 = Self::OFFSET_MASK as u32;
    const MAX_LENGTH: u32 = Self::LENGTH_MASK as u32;
    const MAX_SOURCE_ID: u32 = Self::SOURCE_ID_MASK as u32;

    pub fn new(start: SourceLoc, end: SourceLoc) -> Self {
        if start.source_id != end.source_id {
            // Spans crossing files cannot be represented in the packed format.
            // Degrade to a zero-length span at the start location.
            return Self::new_with_length(start.source_id, start.offset, 0);
        }

        let length = end.offset.saturating_sub(start.offset);
        Self::new_with_length(start.source_id, start.offset, length)
    }

    pub fn new_with_length(source_id: SourceId, offset: u32, length: u32) -> Self {
        let id = source_id.to_u32();
        assert!(id <= Self::MAX_SOURCE_ID, "SourceId exceeds 24-bit limit: {}", id);
        assert!(
            offset <= Self::MAX_OFFSET,
            "SourceSpan offset exceeds 16 MiB limit: {}",
            offset
        );

        let len = length.min(Self::MAX_LENGTH);

        Self((offset as u64) | ((len as u64) << Self::LENGTH_SHIFT) | ((id as u64) << Self::SOURCE_ID_SHIFT))
    }

    pub fn empty() -> Self {
        Self::new(SourceLoc::builtin(), SourceLoc::builtin())
    }

    pub fn start(&self) -> SourceLoc {
        let offset = (self.0 & Self::OFFSET_MASK) as u32;
        SourceLoc {
            source_id: self.source_id(),
            offset,
        }
    }

    pub fn end(&self) -> SourceLoc {
        let offset = (self.0 & Self::OFFSET_MASK) as u32;
        let length = ((self.0 >> Self::LENGTH_SHIFT) & Self::LENGTH_MASK) as u32;
        SourceLoc {
            source_id: self.source_id(),
            offset: offset + length,
        }
    }

    pub fn source_id(&self) -> SourceId {
        let id = ((self.0 >> Self::SOURCE_ID_SHIFT) & Self::SOURCE_ID_MASK) as u32;
        SourceId::new(id)
    }

    /// Merge two source spans into a single span covering both
    pub fn merge(self, other: SourceSpan) -> SourceSpan {
        let id1 = self.source_id();
        let id2 = other.source_id();

        if id1 != id2 {
            return self;
        }

        let start1 = self.start().offset;
        let end1 = self.end().offset;
        let start2 = other.start().offset;
        let end2 = other.end().offset;

        let min_start = start1.min(start2);
        let max_end = end1.max(end2);

        let start_loc = SourceLoc::new(id1, min_start);
        let end_loc = SourceLoc::new(id1, max_end);

        Self::new(start_loc, end_loc)
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SourceSpan(source_id={}, start={}, end={})",
            self.source_id(),
            self.start().offset,
            self.end().offset
        )
    }
}

/// A registered template source buffer.
#[derive(Debug, Clone)]
struct SourceFile {
    path: String,
    src: String,
}

/// Owns the text of every template file so diagnostics can be rendered
/// with source context. Buffers are registered by the parser front-end;
/// this layer only reads them.
#[derive(Debug, Default)]
pub struct SourceManager {
    files: Vec<SourceFile>,
}

impl SourceManager {
    pub fn new() -> Self {
        SourceManager { files: Vec::new() }
    }

    /// Register a source buffer and return its id.
    pub fn add_buffer(&mut self, path: &str, src: &str) -> SourceId {
        self.files.push(SourceFile {
            path: path.to_string(),
            src: src.to_string(),
        });
        SourceId::new(self.files.len() as u32)
    }

    pub fn get_source(&self, id: SourceId) -> Option<&str> {
        self.files.get((id.to_u32() - 1) as usize).map(|f| f.src.as_str())
    }

    pub fn get_path(&self, id: SourceId) -> Option<&str> {
        self.files.get((id.to_u32() - 1) as usize).map(|f| f.path.as_str())
    }
}
