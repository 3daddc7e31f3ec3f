#![forbid(unsafe_code)]

//! Visible row materialization.
//!
//! [`materialize`] turns the viewport window and the chunk store into the
//! exact rows to render, in two passes:
//!
//! 1. For every chunk overlapping the window that is absent from the store,
//!    call `ensure_loaded(chunk_start)` once. A source that can answer
//!    synchronously returns the chunk and it is installed on the spot; an
//!    asynchronous one queues a request and returns `None`.
//! 2. Walk the window. Absent chunk: [`Row::Loading`]. Chunk present but too
//!    short for the index (the final chunk, or a stale chunk from a shrunk
//!    dataset): [`Row::Missing`]. Otherwise [`Row::Item`].
//!
//! If fewer rows were produced than the cursor offset requires, the cursor is
//! pulled onto the last produced row. This is the only place the cursor is
//! repaired outside the state machine.

use crate::chunk::{Chunk, ChunkStore};
use crate::config::ViewportConfig;
use crate::viewport::ViewportState;

/// Why a row has no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// The owning chunk has not arrived.
    Loading,
    /// The owning chunk arrived but does not cover the index.
    Missing,
}

impl PlaceholderKind {
    /// Stable tag for logs and renderers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Missing => "missing",
        }
    }
}

/// One visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a, T> {
    /// A real item.
    Item {
        /// Absolute dataset index.
        index: usize,
        /// The item.
        item: &'a T,
    },
    /// Placeholder for a chunk that has not arrived.
    Loading {
        /// Absolute dataset index.
        index: usize,
    },
    /// Placeholder for an index the loaded chunk does not cover.
    Missing {
        /// Absolute dataset index.
        index: usize,
    },
}

impl<'a, T> Row<'a, T> {
    /// Absolute dataset index of the row.
    #[must_use]
    pub fn index(&self) -> usize {
        match *self {
            Self::Item { index, .. } | Self::Loading { index } | Self::Missing { index } => index,
        }
    }

    /// The item, if this is not a placeholder.
    #[must_use]
    pub fn item(&self) -> Option<&'a T> {
        match *self {
            Self::Item { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Placeholder tag, if this is a placeholder.
    #[must_use]
    pub fn placeholder(&self) -> Option<PlaceholderKind> {
        match self {
            Self::Item { .. } => None,
            Self::Loading { .. } => Some(PlaceholderKind::Loading),
            Self::Missing { .. } => Some(PlaceholderKind::Missing),
        }
    }

    /// Whether the row is a placeholder.
    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, Self::Item { .. })
    }
}

/// Result of a materialization pass.
#[derive(Debug, Clone)]
pub struct Materialized<'a, T> {
    /// Rows in window order.
    pub rows: Vec<Row<'a, T>>,
    /// The viewport after window clamping and cursor repair.
    pub viewport: ViewportState,
    /// Number of `Loading` and `Missing` rows.
    pub placeholder_count: usize,
}

impl<T> Materialized<'_, T> {
    /// Row under the cursor.
    #[must_use]
    pub fn cursor_row(&self) -> Option<&Row<'_, T>> {
        self.rows.get(self.viewport.cursor_viewport_index)
    }

    /// Whether every row carries an item.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.placeholder_count == 0
    }
}

/// Build the visible rows for `viewport`.
///
/// `ensure_loaded` is called at most once per absent chunk overlapping the
/// window. See the module docs for the row rules.
pub fn materialize<'a, T, F>(
    viewport: &ViewportState,
    config: &ViewportConfig,
    total: usize,
    store: &'a mut ChunkStore<T>,
    mut ensure_loaded: F,
) -> Materialized<'a, T>
where
    F: FnMut(usize) -> Option<Chunk<T>>,
{
    if total == 0 {
        return Materialized {
            rows: Vec::new(),
            viewport: ViewportState::default(),
            placeholder_count: 0,
        };
    }

    let height = config.height.max(1);
    let chunk_size = store.chunk_size();
    let start = viewport
        .viewport_start_index
        .min(total.saturating_sub(height));
    let end = start.saturating_add(height).min(total);

    let mut chunk_start = start / chunk_size * chunk_size;
    while chunk_start < end {
        if !store.contains(chunk_start) {
            if let Some(chunk) = ensure_loaded(chunk_start) {
                store.install(chunk);
            }
        }
        chunk_start += chunk_size;
    }

    let store: &'a ChunkStore<T> = store;
    let mut placeholder_count = 0;
    let rows: Vec<Row<'a, T>> = (start..end)
        .map(|index| {
            let row = match store.owning(index) {
                None => Row::Loading { index },
                Some(chunk) => match chunk.get(index) {
                    Some(item) => Row::Item { index, item },
                    None => Row::Missing { index },
                },
            };
            if row.is_placeholder() {
                placeholder_count += 1;
            }
            row
        })
        .collect();

    let mut offset = viewport.cursor_index.saturating_sub(start);
    if offset >= rows.len() {
        offset = rows.len().saturating_sub(1);
    }
    let adjusted = ViewportState {
        cursor_index: start + offset,
        viewport_start_index: start,
        ..*viewport
    }
    .normalize(config, total);

    #[cfg(feature = "tracing")]
    tracing::trace!(
        target: "chunkview.materialize",
        start,
        rows = rows.len(),
        placeholder_count,
        cursor = adjusted.cursor_index,
        "materialized window"
    );

    Materialized {
        rows,
        viewport: adjusted,
        placeholder_count,
    }
}
