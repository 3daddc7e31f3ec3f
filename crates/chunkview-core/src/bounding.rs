#![forbid(unsafe_code)]

//! Bounding area: the chunk-aligned region to keep resident.
//!
//! The region is the viewport window widened by `chunks_before` whole chunks
//! above and `chunks_after` whole chunks below, clamped to the dataset, then
//! rounded outward to chunk boundaries. Residency decisions downstream always
//! use the aligned bounds ([`BoundingArea::chunk_start`] and
//! [`BoundingArea::chunk_end`]), since chunks are the unit of residency.

use crate::config::BoundingAreaConfig;
use crate::viewport::ViewportState;

/// Region of the dataset around the viewport.
///
/// All ends are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoundingArea {
    /// First index of the unaligned prefetch region.
    pub start_index: usize,
    /// One past the last index of the unaligned prefetch region.
    pub end_index: usize,
    /// `start_index` rounded down to a chunk boundary.
    pub chunk_start: usize,
    /// `end_index` rounded up to a chunk boundary.
    pub chunk_end: usize,
}

impl BoundingArea {
    /// Whether the area is the zeroed area of an empty dataset.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunk_start == self.chunk_end
    }

    /// Whether an absolute index falls inside the unaligned region.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..self.end_index).contains(&index)
    }

    /// Number of chunks spanned by the aligned region.
    #[must_use]
    pub fn chunk_count(&self, chunk_size: usize) -> usize {
        (self.chunk_end - self.chunk_start) / chunk_size.max(1)
    }
}

/// Compute the bounding area for a viewport of `height` rows.
///
/// Returns the zeroed area when `total == 0`.
#[must_use]
pub fn calculate_bounding_area(
    viewport: &ViewportState,
    height: usize,
    total: usize,
    config: &BoundingAreaConfig,
) -> BoundingArea {
    if total == 0 {
        return BoundingArea::default();
    }
    let chunk_size = config.chunk_size.max(1);

    let view_start = viewport.viewport_start_index.min(total);
    let view_end = view_start.saturating_add(height.max(1)).min(total);

    let start_index = view_start.saturating_sub(config.chunks_before.saturating_mul(chunk_size));
    let end_index = view_end
        .saturating_add(config.chunks_after.saturating_mul(chunk_size))
        .min(total);

    let chunk_start = start_index / chunk_size * chunk_size;
    let chunk_end = end_index.div_ceil(chunk_size).saturating_mul(chunk_size);

    BoundingArea {
        start_index,
        end_index,
        chunk_start,
        chunk_end,
    }
}
