//! Chunk planning.
//!
//! A [`ChunkPlan`] splits an ordered record set into consecutive slices no
//! larger than the store's batch limit. Planning is independent of writing so
//! it can be tested, and reused by the applier and the restorer alike.

use std::num::NonZeroUsize;

/// Default records per chunk. Each chunk produces one backup and one update
/// batch, both under the store's per-batch write limit.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(300) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    chunk_size: NonZeroUsize,
}

impl Default for ChunkPlan {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkPlan {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.get()
    }

    /// Number of chunks needed for `len` records.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size.get())
    }

    /// Consecutive chunks over `records`, in order.
    pub fn chunks<'a, T>(&self, records: &'a [T]) -> impl Iterator<Item = Chunk<'a, T>> {
        let size = self.chunk_size.get();
        records
            .chunks(size)
            .enumerate()
            .map(move |(index, records)| Chunk {
                index,
                offset: index * size,
                records,
            })
    }
}

/// One slice of a chunk plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a, T> {
    /// Zero-based position in the plan.
    pub index: usize,
    /// Position of the first record in the full set.
    pub offset: usize,
    pub records: &'a [T],
}

impl<T> Chunk<'_, T> {
    /// One-based chunk number, as reported to operators.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One past the last record's position in the full set.
    pub fn end(&self) -> usize {
        self.offset + self.records.len()
    }
}
