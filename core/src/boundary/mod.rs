//! Boundary index.
//!
//! Maps a virtual offset to `(segment index, local offset)` and back.
//! Built from a snapshot of live segment lengths; holds no other state, so a
//! fresh index is taken for every operation that depends on extent.

use std::ops::Range;

use crate::types::StreamError;

/// Resolved position inside the composite.
///
/// `index == segment_count` with `local == 0` is the append point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub index: usize,
    pub local: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryIndex {
    /// `ends[i]` = virtual offset one past the last byte of segment `i`.
    ends: Vec<u64>,
}

impl BoundaryIndex {
    pub fn from_lengths(lengths: &[u64]) -> Result<Self, StreamError> {
        let mut ends = Vec::with_capacity(lengths.len());
        let mut acc = 0u64;
        for (i, len) in lengths.iter().enumerate() {
            acc = acc.checked_add(*len).ok_or_else(|| {
                StreamError::out_of_range(format!("total length overflows at segment {i}"))
            })?;
            ends.push(acc);
        }
        Ok(Self { ends })
    }

    pub fn segment_count(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    /// Resolve a virtual offset.
    ///
    /// - An offset on a boundary belongs to the start of the next non-empty segment.
    /// - `total()` resolves to the append point.
    /// - Anything past `total()` is `None`.
    pub fn locate(&self, offset: u64) -> Option<Location> {
        let total = self.total();
        if offset > total {
            return None;
        }
        if offset == total {
            return Some(self.append_point());
        }
        // First segment whose end lies strictly after the offset. Zero-length
        // segments have end == start and are skipped.
        let index = self.ends.partition_point(|&end| end <= offset);
        let local = offset - self.start_unchecked(index);
        Some(Location { index, local })
    }

    pub fn append_point(&self) -> Location {
        Location { index: self.ends.len(), local: 0 }
    }

    pub fn is_append(&self, loc: &Location) -> bool {
        loc.index >= self.ends.len()
    }

    /// Virtual offset where segment `index` begins. `segment_count()` yields
    /// the total length.
    pub fn segment_start(&self, index: usize) -> Option<u64> {
        if index > self.ends.len() {
            return None;
        }
        Some(self.start_unchecked(index))
    }

    pub fn segment_len(&self, index: usize) -> Option<u64> {
        self.span(index).map(|r| r.end - r.start)
    }

    /// `[start, end)` of segment `index`.
    pub fn span(&self, index: usize) -> Option<Range<u64>> {
        let end = *self.ends.get(index)?;
        Some(self.start_unchecked(index)..end)
    }

    fn start_unchecked(&self, index: usize) -> u64 {
        match index {
            0 => 0,
            i => self.ends[i - 1],
        }
    }
}
