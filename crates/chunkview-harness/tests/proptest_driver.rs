//! Property tests for whole sessions against the in-memory source.
//!
//! Whatever order the source answers in, once nothing is owed:
//!
//! 1. The window has no placeholders
//! 2. Every row shows the item stored at its own index
//! 3. The frame checksum matches a FIFO run of the same script

use chunkview_harness::{CompletionOrder, Driver, MemorySource};
use chunkview_runtime::{Msg, SessionSettings};
use proptest::prelude::*;

fn msg_strategy() -> impl Strategy<Value = Msg<usize>> {
    prop_oneof![
        4 => Just(Msg::CursorDown),
        2 => Just(Msg::CursorUp),
        2 => Just(Msg::PageDown),
        1 => Just(Msg::PageUp),
        1 => Just(Msg::JumpToEnd),
        1 => Just(Msg::JumpToStart),
        2 => (0usize..3_000).prop_map(Msg::JumpTo),
        1 => (1usize..30).prop_map(|height| Msg::Resize { height }),
        1 => (0usize..3_000).prop_map(Msg::RefreshChunk),
    ]
}

fn settings_strategy() -> impl Strategy<Value = SessionSettings> {
    (1usize..30, 1usize..40, 0usize..3, 0usize..3, any::<bool>()).prop_map(
        |(height, chunk, before, after, unload)| {
            SessionSettings::default()
                .with_height(height)
                .with_chunk_size(chunk)
                .with_radius(before, after)
                .with_unload_distant_chunks(unload)
        },
    )
}

fn run(
    settings: &SessionSettings,
    total: usize,
    order: CompletionOrder,
    script: &[Msg<usize>],
) -> Vec<(Vec<String>, String)> {
    let source = MemorySource::with_order((0..total).map(|i| i * 3).collect(), order);
    let mut driver = Driver::new(settings.clone(), source);
    driver.init();
    driver.settle();
    let mut frames = Vec::new();
    for msg in script {
        driver.send(msg.clone());
        driver.step();
        driver.settle();
        let snap = driver.snapshot();
        frames.push((snap.lines, snap.checksum));
    }
    frames
}

proptest! {
    #[test]
    fn settled_frames_are_complete_and_order_free(
        settings in settings_strategy(),
        total in 0usize..2_500,
        seed in any::<u64>(),
        script in prop::collection::vec(msg_strategy(), 1..40),
    ) {
        let fifo = run(&settings, total, CompletionOrder::Fifo, &script);
        let shuffled = run(&settings, total, CompletionOrder::Shuffled(seed), &script);

        for (lines, _) in &fifo {
            for line in lines {
                prop_assert!(!line.contains('<'), "placeholder in settled frame: {}", line);
                let mut parts = line[2..].split(' ');
                let index: usize = parts.next().unwrap().parse().unwrap();
                let item: usize = parts.next().unwrap().parse().unwrap();
                prop_assert_eq!(item, index * 3);
            }
        }
        prop_assert_eq!(fifo, shuffled);
    }
}
