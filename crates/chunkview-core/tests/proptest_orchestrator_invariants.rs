//! Property-based invariant tests for the bounding area and chunk orchestrator.
//!
//! 1. Aligned bounds are multiples of the chunk size and contain the
//!    unaligned region, which is clamped to the dataset
//! 2. Required chunks are aligned, ascending, and inside the dataset
//! 3. Load requests are never empty and never run past the dataset end
//! 4. A second reconcile with the same area issues nothing
//! 5. With eviction on, the resident set equals the required set afterwards
//! 6. With eviction off, the resident set only grows
//! 7. Materialization marks exactly the rows of absent chunks as loading

use std::collections::BTreeSet;

use chunkview_core::{
    BoundingAreaConfig, Chunk, ChunkOrchestrator, ChunkStore, PlaceholderKind, ViewportConfig,
    ViewportState, calculate_bounding_area, materialize, required_chunks,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn bounding_strategy() -> impl Strategy<Value = BoundingAreaConfig> {
    (1usize..50, 0usize..4, 0usize..4, any::<bool>()).prop_map(|(chunk, before, after, unload)| {
        BoundingAreaConfig::default()
            .with_chunk_size(chunk)
            .with_radius(before, after)
            .with_unload_distant_chunks(unload)
            .normalized()
    })
}

fn viewport_at(start: usize) -> ViewportState {
    ViewportState {
        cursor_index: start,
        viewport_start_index: start,
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1-2. Alignment
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bounding_area_is_chunk_aligned(
        config in bounding_strategy(),
        start in 0usize..2_000,
        height in 1usize..60,
        total in 0usize..2_000,
    ) {
        let area = calculate_bounding_area(&viewport_at(start), height, total, &config);
        let cs = config.chunk_size;
        prop_assert_eq!(area.chunk_start % cs, 0);
        prop_assert_eq!(area.chunk_end % cs, 0);
        prop_assert!(area.chunk_start <= area.start_index);
        prop_assert!(area.end_index <= area.chunk_end);
        prop_assert!(area.start_index <= area.end_index);
        prop_assert!(area.end_index <= total);
    }

    #[test]
    fn required_chunks_are_aligned_and_in_range(
        config in bounding_strategy(),
        start in 0usize..2_000,
        height in 1usize..60,
        total in 0usize..2_000,
    ) {
        let area = calculate_bounding_area(&viewport_at(start), height, total, &config);
        let required = required_chunks(&area, total, config.chunk_size);
        if total == 0 {
            prop_assert!(required.is_empty());
        }
        for pair in required.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], config.chunk_size);
        }
        for &chunk in &required {
            prop_assert_eq!(chunk % config.chunk_size, 0);
            prop_assert!(chunk < total);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3-6. Reconcile
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn load_requests_stay_inside_dataset(
        config in bounding_strategy(),
        starts in proptest::collection::vec(0usize..2_000, 1..20),
        height in 1usize..60,
        total in 1usize..2_000,
    ) {
        let mut orch = ChunkOrchestrator::new(config);
        for start in starts {
            let area = calculate_bounding_area(&viewport_at(start), height, total, &config);
            let ops = orch.reconcile(&area, total);
            for load in ops.loads {
                prop_assert!(load.count >= 1);
                prop_assert!(load.count <= config.chunk_size);
                prop_assert!(load.start_index + load.count <= total);
                prop_assert_eq!(load.start_index % config.chunk_size, 0);
            }
        }
    }

    #[test]
    fn reconcile_twice_is_idempotent(
        config in bounding_strategy(),
        start in 0usize..2_000,
        height in 1usize..60,
        total in 0usize..2_000,
    ) {
        let mut orch = ChunkOrchestrator::new(config);
        let area = calculate_bounding_area(&viewport_at(start), height, total, &config);
        orch.reconcile(&area, total);
        let second = orch.reconcile(&area, total);
        prop_assert!(second.is_empty(), "second pass issued {:?}", second);
    }

    #[test]
    fn resident_set_tracks_required_set(
        config in bounding_strategy(),
        starts in proptest::collection::vec(0usize..2_000, 1..20),
        height in 1usize..60,
        total in 1usize..2_000,
    ) {
        let mut orch = ChunkOrchestrator::new(config);
        let mut previous: BTreeSet<usize> = BTreeSet::new();
        for start in starts {
            let area = calculate_bounding_area(&viewport_at(start), height, total, &config);
            let required: BTreeSet<usize> = orch.required_chunks(&area, total).into_iter().collect();
            orch.reconcile(&area, total);
            let resident: BTreeSet<usize> = orch.resident().collect();
            if config.unload_distant_chunks {
                prop_assert_eq!(&resident, &required);
            } else {
                prop_assert!(resident.is_superset(&previous));
                prop_assert!(resident.is_superset(&required));
            }
            previous = resident;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Materialization placeholders
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn loading_rows_match_absent_chunks(
        height in 1usize..40,
        chunk in 1usize..25,
        total in 1usize..500,
        start in 0usize..500,
        present_mask in any::<u64>(),
    ) {
        let config = ViewportConfig::new(height)
            .with_chunk_size(chunk)
            .normalized();
        let state = ViewportState::default().jump_to_index(start, &config, total);
        let mut store: ChunkStore<usize> = ChunkStore::new(chunk);
        for (bit, chunk_start) in (0..total).step_by(chunk).enumerate() {
            if present_mask & (1u64 << (bit % 64)) != 0 {
                let end = (chunk_start + chunk).min(total);
                store.install(Chunk::new(chunk_start, (chunk_start..end).collect()));
            }
        }
        let present: BTreeSet<usize> = store.starts().into_iter().collect();
        let frame = materialize(&state, &config, total, &mut store, |_| None);

        let window = state.window(&config, total);
        prop_assert_eq!(frame.rows.len(), window.len());
        let mut expected_placeholders = 0;
        for row in &frame.rows {
            let owner = row.index() / chunk * chunk;
            if present.contains(&owner) {
                prop_assert_eq!(row.item().copied(), Some(row.index()));
            } else {
                expected_placeholders += 1;
                prop_assert_eq!(row.placeholder(), Some(PlaceholderKind::Loading));
            }
        }
        prop_assert_eq!(frame.placeholder_count, expected_placeholders);
        prop_assert_eq!(frame.viewport, state);
    }
}
