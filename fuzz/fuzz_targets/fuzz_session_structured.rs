#![no_main]

use arbitrary::Arbitrary;
use chunkview_harness::{CompletionOrder, Driver, MemorySource};
use chunkview_runtime::{Msg, SessionSettings};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Up,
    Down,
    PageUp,
    PageDown,
    Start,
    End,
    Jump(u16),
    Resize(u8),
    Refresh(u16),
    Reset,
    ChunkSize(u8),
    Step,
    Settle,
}

#[derive(Debug, Arbitrary)]
struct Input {
    total: u16,
    height: u8,
    chunk_size: u8,
    before: u8,
    after: u8,
    evict: bool,
    seed: u64,
    ops: Vec<Op>,
}

fn settings(height: u8, chunk_size: u8, before: u8, after: u8, evict: bool) -> SessionSettings {
    SessionSettings::default()
        .with_height(usize::from(height % 40) + 1)
        .with_chunk_size(usize::from(chunk_size % 64) + 1)
        .with_radius(usize::from(before % 4), usize::from(after % 4))
        .with_unload_distant_chunks(evict)
}

fuzz_target!(|input: Input| {
    let total = usize::from(input.total % 4_000);
    let base = settings(
        input.height,
        input.chunk_size,
        input.before,
        input.after,
        input.evict,
    );
    let source = MemorySource::with_order(
        (0..total).collect::<Vec<usize>>(),
        CompletionOrder::Shuffled(input.seed),
    );
    let mut driver = Driver::new(base.clone(), source).with_max_steps(100_000);
    driver.init();

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Up => {
                driver.send(Msg::CursorUp);
            }
            Op::Down => {
                driver.send(Msg::CursorDown);
            }
            Op::PageUp => {
                driver.send(Msg::PageUp);
            }
            Op::PageDown => {
                driver.send(Msg::PageDown);
            }
            Op::Start => {
                driver.send(Msg::JumpToStart);
            }
            Op::End => {
                driver.send(Msg::JumpToEnd);
            }
            Op::Jump(index) => {
                driver.send(Msg::JumpTo(usize::from(index)));
            }
            Op::Resize(height) => {
                driver.send(Msg::Resize {
                    height: usize::from(height % 40) + 1,
                });
            }
            Op::Refresh(index) => {
                driver.send(Msg::RefreshChunk(usize::from(index)));
            }
            Op::Reset => {
                driver.send(Msg::Reset);
            }
            Op::ChunkSize(size) => {
                let next = base.clone().with_chunk_size(usize::from(size % 64) + 1);
                driver.send(Msg::Reconfigure(next));
            }
            Op::Step => {
                driver.step();
            }
            Op::Settle => {
                driver.settle();
            }
        }

        let session = driver.session();
        let state = *session.state();
        assert!(state.is_consistent(), "inconsistent state {state:?}");
        if total > 0 {
            assert!(state.cursor_index < total);
        }
        let chunk_size = session.viewport_config().chunk_size;
        for start in session.resident_chunks() {
            assert_eq!(start % chunk_size, 0, "unaligned resident chunk {start}");
        }
        for start in session.in_flight() {
            assert!(session.is_chunk_resident(start), "in-flight chunk {start} not resident");
        }

        let snap = driver.snapshot();
        for (offset, line) in snap.lines.iter().enumerate() {
            let index = snap.viewport.viewport_start_index + offset;
            assert!(
                line[2..].starts_with(&format!("{index} ")),
                "row {offset} out of order: {line}"
            );
        }
    }

    driver.settle();
    let snap = driver.snapshot();
    assert!(snap.is_complete(), "settled frame has placeholders: {:?}", snap.lines);
    for line in &snap.lines {
        let mut parts = line[2..].split(' ');
        assert_eq!(parts.next(), parts.next(), "item does not match index: {line}");
    }
});
