#![forbid(unsafe_code)]

//! Chunk residency: the resident set, load/unload diffs, and the chunk store.
//!
//! # Residency model
//!
//! The [`ChunkOrchestrator`] owns the resident set: the chunk start indices
//! currently considered loaded. The set is updated the instant a request is
//! issued, not when the data source confirms it. A load that is still in
//! flight therefore already satisfies later dedup checks, which gives at most
//! one outstanding load per chunk index. Unloading a chunk removes it from the
//! set immediately; a load for that index completing later must be discarded
//! by the caller.
//!
//! The [`ChunkStore`] holds the item payloads keyed by chunk start. It is
//! separate from the resident set: a chunk is resident as soon as its load is
//! issued but only present in the store once its items arrive.
//!
//! # Invariants
//!
//! 1. Every chunk start in the resident set is a multiple of `chunk_size`.
//! 2. Every [`LoadRequest`] has `count >= 1` and `start_index + count <= total`.
//! 3. Running [`ChunkOrchestrator::reconcile`] twice with the same area and no
//!    out-of-band changes yields no requests the second time.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::bounding::BoundingArea;
use crate::config::BoundingAreaConfig;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Ask the data source for the items in `[start_index, start_index + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    /// Chunk-aligned first index.
    pub start_index: usize,
    /// Number of items; `chunk_size` except for the final chunk.
    pub count: usize,
}

/// Tell the data source the chunk at `start_index` is no longer needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnloadRequest {
    /// Chunk-aligned first index.
    pub start_index: usize,
}

/// Requests produced by one reconcile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOperations {
    /// Loads for required chunks that were not resident, ascending.
    pub loads: Vec<LoadRequest>,
    /// Unloads for resident chunks that are no longer required, ascending.
    pub unloads: Vec<UnloadRequest>,
}

impl ChunkOperations {
    /// Whether the pass produced no requests.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty() && self.unloads.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Required chunks
// ---------------------------------------------------------------------------

/// Chunk starts covering the bounding area, ascending.
///
/// Spans chunk indices `area.chunk_start / chunk_size` through
/// `min(area.chunk_end / chunk_size, (total - 1) / chunk_size)` inclusive, so
/// the chunk just past the aligned region is kept as well when the dataset
/// extends that far. Empty when `total == 0`.
#[must_use]
pub fn required_chunks(area: &BoundingArea, total: usize, chunk_size: usize) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let first = area.chunk_start / chunk_size;
    let last = (area.chunk_end / chunk_size).min((total - 1) / chunk_size);
    if first > last {
        return Vec::new();
    }
    (first..=last).map(|chunk| chunk * chunk_size).collect()
}

// ---------------------------------------------------------------------------
// ChunkOrchestrator
// ---------------------------------------------------------------------------

/// Diffs required chunks against the resident set.
#[derive(Debug, Clone)]
pub struct ChunkOrchestrator {
    config: BoundingAreaConfig,
    resident: BTreeSet<usize>,
}

impl ChunkOrchestrator {
    /// Create an orchestrator with an empty resident set.
    ///
    /// The config is normalized here so the diff path never re-checks it.
    #[must_use]
    pub fn new(config: BoundingAreaConfig) -> Self {
        Self {
            config: config.normalized(),
            resident: BTreeSet::new(),
        }
    }

    /// The normalized config in use.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BoundingAreaConfig {
        &self.config
    }

    /// Replace the config. The resident set is kept; the next reconcile
    /// brings it in line with the new radius.
    pub fn set_config(&mut self, config: BoundingAreaConfig) {
        self.config = config.normalized();
    }

    /// Rows per chunk.
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Align an absolute index down to its chunk start.
    #[inline]
    #[must_use]
    pub fn chunk_start_of(&self, index: usize) -> usize {
        index / self.config.chunk_size * self.config.chunk_size
    }

    /// Whether the chunk at `chunk_start` is considered loaded.
    #[inline]
    #[must_use]
    pub fn is_resident(&self, chunk_start: usize) -> bool {
        self.resident.contains(&chunk_start)
    }

    /// Resident chunk starts, ascending.
    pub fn resident(&self) -> impl Iterator<Item = usize> + '_ {
        self.resident.iter().copied()
    }

    /// Number of resident chunks.
    #[inline]
    #[must_use]
    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    /// Whether the resident set exceeds the soft cap.
    #[inline]
    #[must_use]
    pub fn over_budget(&self) -> bool {
        self.resident.len() > self.config.max_loaded_chunks
    }

    /// Forget every resident chunk without emitting unloads.
    pub fn reset(&mut self) {
        self.resident.clear();
    }

    /// Required chunks for `area` under this orchestrator's chunk size.
    #[must_use]
    pub fn required_chunks(&self, area: &BoundingArea, total: usize) -> Vec<usize> {
        required_chunks(area, total, self.config.chunk_size)
    }

    /// Bring the resident set in line with `area`.
    pub fn reconcile(&mut self, area: &BoundingArea, total: usize) -> ChunkOperations {
        let required = self.required_chunks(area, total);
        self.compute_operations(&required, total)
    }

    /// Emit loads for required chunks that are not resident and, when
    /// eviction is enabled, unloads for resident chunks that are not
    /// required. The resident set is updated before returning.
    ///
    /// `required` must be ascending.
    pub fn compute_operations(&mut self, required: &[usize], total: usize) -> ChunkOperations {
        let mut ops = ChunkOperations::default();

        for &start in required {
            if self.resident.contains(&start) {
                continue;
            }
            if let Some(load) = self.load_request(start, total) {
                self.resident.insert(start);
                ops.loads.push(load);
            }
        }

        if self.config.unload_distant_chunks {
            let distant: Vec<usize> = self
                .resident
                .iter()
                .copied()
                .filter(|start| required.binary_search(start).is_err())
                .collect();
            for start in distant {
                self.resident.remove(&start);
                ops.unloads.push(UnloadRequest { start_index: start });
            }
        }

        #[cfg(feature = "tracing")]
        self.log_reconcile(&ops);

        ops
    }

    /// Request the chunk owning `index` unless it is already resident.
    pub fn request_load(&mut self, index: usize, total: usize) -> Option<LoadRequest> {
        let start = self.chunk_start_of(index);
        if self.resident.contains(&start) {
            return None;
        }
        let load = self.load_request(start, total)?;
        self.resident.insert(start);
        Some(load)
    }

    /// Request the chunk owning `index` even when it is already resident.
    ///
    /// Used for forced refreshes. The caller is expected to treat any
    /// earlier in-flight load for the same chunk as stale.
    pub fn refresh(&mut self, index: usize, total: usize) -> Option<LoadRequest> {
        let start = self.chunk_start_of(index);
        let load = self.load_request(start, total)?;
        self.resident.insert(start);
        Some(load)
    }

    /// Drop the chunk owning `index` from the resident set.
    ///
    /// Returns `None` when the chunk was not resident.
    pub fn request_unload(&mut self, index: usize) -> Option<UnloadRequest> {
        let start = self.chunk_start_of(index);
        self.resident
            .remove(&start)
            .then_some(UnloadRequest { start_index: start })
    }

    #[cfg(feature = "tracing")]
    fn log_reconcile(&self, ops: &ChunkOperations) {
        if !ops.is_empty() {
            tracing::debug!(
                target: "chunkview.chunks",
                loads = ops.loads.len(),
                unloads = ops.unloads.len(),
                resident = self.resident.len(),
                "reconciled resident chunks"
            );
        }
        if self.over_budget() {
            tracing::warn!(
                target: "chunkview.chunks",
                resident = self.resident.len(),
                max_loaded_chunks = self.config.max_loaded_chunks,
                "resident chunks exceed soft cap"
            );
        }
    }

    fn load_request(&self, start: usize, total: usize) -> Option<LoadRequest> {
        let count = self.config.chunk_size.min(total.saturating_sub(start));
        (count > 0).then_some(LoadRequest {
            start_index: start,
            count,
        })
    }
}

// ---------------------------------------------------------------------------
// Chunk + ChunkStore
// ---------------------------------------------------------------------------

/// A loaded, chunk-aligned slice of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    /// Absolute index of the first item.
    pub start_index: usize,
    /// Items in dataset order.
    pub items: Vec<T>,
}

impl<T> Chunk<T> {
    /// Create a chunk.
    #[must_use]
    pub fn new(start_index: usize, items: Vec<T>) -> Self {
        Self { start_index, items }
    }

    /// Number of items actually present.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the chunk holds no items.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at an absolute dataset index, if this chunk covers it.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index.checked_sub(self.start_index)?)
    }
}

/// Chunk payloads keyed by chunk start.
#[derive(Debug, Clone)]
pub struct ChunkStore<T> {
    chunk_size: usize,
    chunks: AHashMap<usize, Chunk<T>>,
}

impl<T> ChunkStore<T> {
    /// Create an empty store. A zero chunk size is treated as 1.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunks: AHashMap::new(),
        }
    }

    /// Rows per chunk.
    #[inline]
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Install a chunk, replacing any chunk at the same start.
    ///
    /// A misaligned start is aligned down and items past `chunk_size` are
    /// dropped. Returns the replaced chunk.
    pub fn install(&mut self, mut chunk: Chunk<T>) -> Option<Chunk<T>> {
        chunk.start_index = chunk.start_index / self.chunk_size * self.chunk_size;
        chunk.items.truncate(self.chunk_size);
        self.chunks.insert(chunk.start_index, chunk)
    }

    /// Remove and return the chunk at `chunk_start`.
    pub fn remove(&mut self, chunk_start: usize) -> Option<Chunk<T>> {
        self.chunks.remove(&chunk_start)
    }

    /// Chunk starting at `chunk_start`.
    #[inline]
    #[must_use]
    pub fn get(&self, chunk_start: usize) -> Option<&Chunk<T>> {
        self.chunks.get(&chunk_start)
    }

    /// Whether a chunk starting at `chunk_start` is held.
    #[inline]
    #[must_use]
    pub fn contains(&self, chunk_start: usize) -> bool {
        self.chunks.contains_key(&chunk_start)
    }

    /// Chunk owning the absolute `index`.
    #[inline]
    #[must_use]
    pub fn owning(&self, index: usize) -> Option<&Chunk<T>> {
        self.get(index / self.chunk_size * self.chunk_size)
    }

    /// Drop chunks whose start is not accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(usize) -> bool) {
        self.chunks.retain(|&start, _| keep(start));
    }

    /// Held chunk starts, ascending.
    #[must_use]
    pub fn starts(&self) -> Vec<usize> {
        let mut starts: Vec<usize> = self.chunks.keys().copied().collect();
        starts.sort_unstable();
        starts
    }

    /// Remove every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
