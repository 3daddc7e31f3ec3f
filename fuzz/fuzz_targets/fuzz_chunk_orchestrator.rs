#![no_main]

use chunkview_core::{
    BoundingAreaConfig, ChunkOrchestrator, ViewportConfig, ViewportState,
    calculate_bounding_area,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header: height, chunk size, radius before/after, eviction flag.
    if data.len() < 5 {
        return;
    }
    let height = usize::from(data[0] % 30) + 1;
    let chunk_size = usize::from(data[1] % 64) + 1;
    let before = usize::from(data[2] % 4);
    let after = usize::from(data[3] % 4);
    let evict = data[4] & 1 == 1;

    let viewport = ViewportConfig::new(height)
        .with_chunk_size(chunk_size)
        .normalized();
    let bounding = BoundingAreaConfig::default()
        .with_chunk_size(chunk_size)
        .with_radius(before, after)
        .with_unload_distant_chunks(evict)
        .normalized();
    let mut orchestrator = ChunkOrchestrator::new(bounding);

    let mut total = 1_000usize;
    let mut state = ViewportState::initial(&viewport, total);
    for pair in data[5..].chunks(2) {
        let op = pair[0];
        let arg = usize::from(pair.get(1).copied().unwrap_or(0));
        match op % 6 {
            0 => state = state.cursor_down(&viewport, total),
            1 => state = state.page_down(&viewport, total),
            2 => state = state.page_up(&viewport, total),
            3 => state = state.jump_to_index(arg * 13, &viewport, total),
            4 => {
                total = arg * 11;
                state = state.normalize(&viewport, total);
            }
            _ => {
                let _ = orchestrator.refresh(arg * 7, total);
            }
        }

        let area = calculate_bounding_area(&state, viewport.height, total, orchestrator.config());
        let required = orchestrator.required_chunks(&area, total);
        let ops = orchestrator.reconcile(&area, total);

        for load in &ops.loads {
            assert_eq!(load.start_index % chunk_size, 0, "unaligned load {load:?}");
            assert!(load.count >= 1 && load.count <= chunk_size);
            assert!(load.start_index + load.count <= total, "load past end {load:?}");
        }
        for unload in &ops.unloads {
            assert_eq!(unload.start_index % chunk_size, 0);
            assert!(!orchestrator.is_resident(unload.start_index));
        }
        for start in &required {
            assert!(orchestrator.is_resident(*start), "required chunk {start} not resident");
        }
        if evict {
            assert_eq!(orchestrator.resident_len(), required.len());
        }

        let again = orchestrator.reconcile(&area, total);
        assert!(again.is_empty(), "reconcile not idempotent: {again:?}");
    }
});
