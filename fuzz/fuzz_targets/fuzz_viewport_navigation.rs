#![no_main]

use chunkview_core::{ViewportConfig, ViewportState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header: height, total (two bytes), top and bottom thresholds.
    if data.len() < 5 {
        return;
    }
    let height = usize::from(data[0] % 40) + 1; // 1..=40
    let total = usize::from(u16::from_le_bytes([data[1], data[2]]) % 2_000);
    let top = i32::from(data[3] % 24) - 1; // -1..=22, may be clamped
    let bottom = i32::from(data[4] % 24) - 1;
    let config = ViewportConfig::new(height)
        .with_thresholds(top, bottom)
        .normalized();
    assert!(config.validate().is_empty(), "normalized config must validate");

    let mut state = ViewportState::initial(&config, total);
    check(&state, &config, total);

    let mut ops = data[5..].iter();
    while let Some(&op) = ops.next() {
        state = match op % 8 {
            0 => state.cursor_up(&config, total),
            1 => state.cursor_down(&config, total),
            2 => state.page_up(&config, total),
            3 => state.page_down(&config, total),
            4 => state.jump_to_start(&config, total),
            5 => state.jump_to_end(&config, total),
            6 => {
                let hi = ops.next().copied().unwrap_or(0);
                let lo = ops.next().copied().unwrap_or(0);
                let index = usize::from(u16::from_be_bytes([hi, lo]));
                state.jump_to_index(index, &config, total)
            }
            _ => state.normalize(&config, total),
        };
        check(&state, &config, total);
    }
});

fn check(state: &ViewportState, config: &ViewportConfig, total: usize) {
    assert!(state.is_consistent(), "start + offset != cursor: {state:?}");
    if total == 0 {
        assert_eq!(*state, ViewportState::default());
        return;
    }
    let height = config.height;
    assert!(state.cursor_index < total, "cursor OOB: {state:?}");
    assert!(state.cursor_viewport_index < height, "offset OOB: {state:?}");
    assert!(
        state.viewport_start_index <= total.saturating_sub(height),
        "window past dataset end: {state:?}"
    );
    assert_eq!(state.at_dataset_start, state.cursor_index == 0);
    assert_eq!(state.at_dataset_end, state.cursor_index == total - 1);
    assert_eq!(state.window(config, total).len(), height.min(total));
}
