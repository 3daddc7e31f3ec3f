#![forbid(unsafe_code)]

//! Frame snapshots: text rendering and BLAKE3 checksums of materialized
//! windows.
//!
//! A checksum covers the viewport state (cursor, window start, offset, the
//! four flags) and every row. Two runs that produce the same checksum showed
//! the user exactly the same thing.

use std::fmt::Debug;

use chunkview_core::{Materialized, Row};

/// Stable checksum of a materialized frame, as `blake3:<hex>`.
#[must_use]
pub fn frame_checksum<T: Debug>(frame: &Materialized<'_, T>) -> String {
    let mut hasher = blake3::Hasher::new();
    let v = &frame.viewport;
    for value in [v.cursor_index, v.viewport_start_index, v.cursor_viewport_index] {
        hasher.update(&(value as u64).to_le_bytes());
    }
    hasher.update(&[
        u8::from(v.is_at_top_threshold),
        u8::from(v.is_at_bottom_threshold),
        u8::from(v.at_dataset_start),
        u8::from(v.at_dataset_end),
    ]);
    for row in &frame.rows {
        hasher.update(row_line(row).as_bytes());
        hasher.update(b"\n");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

/// One line per row: cursor marker, index, then the item or a placeholder tag.
///
/// ```text
/// > 12 "row 12"
///   13 <loading>
///   14 <missing>
/// ```
#[must_use]
pub fn render_rows<T: Debug>(frame: &Materialized<'_, T>) -> Vec<String> {
    let cursor = frame.viewport.cursor_index;
    frame
        .rows
        .iter()
        .map(|row| {
            let marker = if row.index() == cursor { '>' } else { ' ' };
            format!("{marker} {}", row_line(row))
        })
        .collect()
}

fn row_line<T: Debug>(row: &Row<'_, T>) -> String {
    match row {
        Row::Item { index, item } => format!("{index} {item:?}"),
        Row::Loading { index } | Row::Missing { index } => {
            let tag = row.placeholder().map_or("?", |kind| kind.as_str());
            format!("{index} <{tag}>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkview_core::{Chunk, ChunkStore, ViewportConfig, ViewportState, materialize};

    fn frame_for(store: &mut ChunkStore<u32>, cursor: usize) -> (Vec<String>, String) {
        let config = ViewportConfig::new(4).with_chunk_size(4).normalized();
        let state = ViewportState::default().jump_to_index(cursor, &config, 10);
        let frame = materialize(&state, &config, 10, store, |_| None);
        (render_rows(&frame), frame_checksum(&frame))
    }

    #[test]
    fn render_marks_cursor_and_placeholders() {
        let mut store = ChunkStore::new(4);
        store.install(Chunk::new(0, vec![10, 11, 12]));
        let (lines, _) = frame_for(&mut store, 1);
        assert_eq!(
            lines,
            vec!["  0 10", "> 1 11", "  2 12", "  3 <missing>"]
        );
    }

    #[test]
    fn loading_rows_render_tag() {
        let mut store = ChunkStore::new(4);
        let (lines, _) = frame_for(&mut store, 0);
        assert_eq!(lines[0], "> 0 <loading>");
    }

    #[test]
    fn checksum_is_stable_and_sensitive() {
        let mut store = ChunkStore::new(4);
        store.install(Chunk::new(0, vec![1, 2, 3, 4]));
        let (_, a) = frame_for(&mut store, 0);
        let (_, b) = frame_for(&mut store, 0);
        let (_, moved) = frame_for(&mut store, 1);
        assert!(a.starts_with("blake3:"));
        assert_eq!(a, b);
        assert_ne!(a, moved);

        store.install(Chunk::new(0, vec![1, 2, 3, 5]));
        let (_, changed) = frame_for(&mut store, 0);
        assert_ne!(a, changed);
    }
}
