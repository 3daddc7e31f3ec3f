#![forbid(unsafe_code)]

//! In-memory data source with deterministic completion order.
//!
//! [`MemorySource`] implements [`ChunkSource`] over a `Vec<T>`. Requests are
//! queued, never answered on the spot; [`MemorySource::poll`] answers one at a
//! time in the configured [`CompletionOrder`]. With
//! [`CompletionOrder::Shuffled`] the order comes from a seeded xorshift64
//! generator, so a seed reproduces the exact interleaving.
//!
//! # Fault injection
//!
//! | Knob | Effect |
//! |------|--------|
//! | [`MemorySource::fail_chunk`] | Every load of that chunk answers `ChunkFailed` |
//! | [`MemorySource::fail_next`] | The next N answers are failures |
//! | [`MemorySource::set_answer_unloaded`] | Loads cancelled by an unload are still answered |
//! | [`MemorySource::duplicate_answers`] | Every successful answer is delivered twice |

use std::collections::{BTreeSet, VecDeque};

use chunkview_core::{LoadRequest, UnloadRequest};
use chunkview_runtime::{ChunkSource, Msg, RequestToken};

// ============================================================================
// Configuration
// ============================================================================

/// Order in which queued requests are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionOrder {
    /// Oldest request first.
    #[default]
    Fifo,
    /// Newest request first.
    Lifo,
    /// Seeded pseudo-random order.
    Shuffled(u64),
}

/// One request as seen by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// A load was requested.
    Load(RequestToken, LoadRequest),
    /// An unload was requested.
    Unload(UnloadRequest),
    /// The dataset size was requested.
    Total,
}

// ============================================================================
// Deterministic RNG (xorshift64)
// ============================================================================

#[derive(Debug, Clone)]
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next() % max as u64) as usize
    }
}

// ============================================================================
// MemorySource
// ============================================================================

/// A [`ChunkSource`] backed by a vector.
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    items: Vec<T>,
    order: CompletionOrder,
    rng: Rng,
    queue: VecDeque<(RequestToken, LoadRequest)>,
    cancelled: VecDeque<(RequestToken, LoadRequest)>,
    total_requested: bool,
    failing: BTreeSet<usize>,
    fail_next: usize,
    answer_unloaded: bool,
    duplicate: bool,
    echo: VecDeque<Msg<T>>,
    events: Vec<SourceEvent>,
}

impl<T: Clone> MemorySource<T> {
    /// Create a source over `items`, answering in FIFO order.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self::with_order(items, CompletionOrder::Fifo)
    }

    /// Create a source with an explicit completion order.
    #[must_use]
    pub fn with_order(items: Vec<T>, order: CompletionOrder) -> Self {
        let seed = match order {
            CompletionOrder::Shuffled(seed) => seed,
            _ => 1,
        };
        Self {
            items,
            order,
            rng: Rng::new(seed),
            queue: VecDeque::new(),
            cancelled: VecDeque::new(),
            total_requested: false,
            failing: BTreeSet::new(),
            fail_next: 0,
            answer_unloaded: false,
            duplicate: false,
            echo: VecDeque::new(),
            events: Vec::new(),
        }
    }

    /// Current dataset size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the dataset. Queued loads are answered from the new data.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Append items to the dataset.
    pub fn extend_items(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    /// Truncate the dataset.
    pub fn truncate_items(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Make every load of the chunk starting at `chunk_start` fail.
    pub fn fail_chunk(&mut self, chunk_start: usize) {
        self.failing.insert(chunk_start);
    }

    /// Stop failing loads of `chunk_start`.
    pub fn heal_chunk(&mut self, chunk_start: usize) {
        self.failing.remove(&chunk_start);
    }

    /// Make the next `n` answers failures.
    pub fn fail_next(&mut self, n: usize) {
        self.fail_next = n;
    }

    /// Keep answering loads after their chunk was unloaded.
    pub fn set_answer_unloaded(&mut self, enabled: bool) {
        self.answer_unloaded = enabled;
    }

    /// Deliver every successful answer twice.
    pub fn duplicate_answers(&mut self, enabled: bool) {
        self.duplicate = enabled;
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn events(&self) -> &[SourceEvent] {
        &self.events
    }

    /// Loads received so far.
    #[must_use]
    pub fn loads(&self) -> Vec<LoadRequest> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SourceEvent::Load(_, load) => Some(*load),
                _ => None,
            })
            .collect()
    }

    /// Unloads received so far.
    #[must_use]
    pub fn unloads(&self) -> Vec<UnloadRequest> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SourceEvent::Unload(unload) => Some(*unload),
                _ => None,
            })
            .collect()
    }

    /// Number of answers still owed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
            + self.echo.len()
            + usize::from(self.total_requested)
            + if self.answer_unloaded {
                self.cancelled.len()
            } else {
                0
            }
    }

    /// Produce the next answer, if any.
    ///
    /// A requested total is answered first, then duplicates, then loads in
    /// the configured order. Cancelled loads are answered last, and only when
    /// [`set_answer_unloaded`](Self::set_answer_unloaded) is on.
    pub fn poll(&mut self) -> Option<Msg<T>> {
        if self.total_requested {
            self.total_requested = false;
            return Some(Msg::TotalChanged(self.items.len()));
        }
        if let Some(msg) = self.echo.pop_front() {
            return Some(msg);
        }
        let next = match self.pick() {
            Some(entry) => Some(entry),
            None if self.answer_unloaded => self.cancelled.pop_front(),
            None => None,
        };
        let (token, request) = next?;
        Some(self.answer(token, request))
    }

    /// Answer everything currently owed.
    pub fn drain(&mut self) -> Vec<Msg<T>> {
        std::iter::from_fn(|| self.poll()).collect()
    }

    fn pick(&mut self) -> Option<(RequestToken, LoadRequest)> {
        match self.order {
            CompletionOrder::Fifo => self.queue.pop_front(),
            CompletionOrder::Lifo => self.queue.pop_back(),
            CompletionOrder::Shuffled(_) => {
                let index = self.rng.below(self.queue.len());
                self.queue.remove(index)
            }
        }
    }

    fn answer(&mut self, token: RequestToken, request: LoadRequest) -> Msg<T> {
        let failing = self.failing.contains(&request.start_index);
        if failing || self.fail_next > 0 {
            self.fail_next = self.fail_next.saturating_sub(usize::from(!failing));
            tracing::debug!(
                target: "chunkview.harness",
                chunk_start = request.start_index,
                generation = token.generation,
                "injected load failure"
            );
            return Msg::ChunkFailed {
                token,
                reason: format!("injected failure for chunk {}", request.start_index),
            };
        }

        let end = request
            .start_index
            .saturating_add(request.count)
            .min(self.items.len());
        let items: Vec<T> = self
            .items
            .get(request.start_index..end)
            .map(<[T]>::to_vec)
            .unwrap_or_default();
        if self.duplicate {
            self.echo.push_back(Msg::ChunkLoaded {
                token,
                items: items.clone(),
            });
        }
        Msg::ChunkLoaded { token, items }
    }
}

impl<T: Clone> ChunkSource for MemorySource<T> {
    fn request_load(&mut self, token: RequestToken, request: LoadRequest) {
        self.events.push(SourceEvent::Load(token, request));
        self.queue.push_back((token, request));
    }

    fn request_unload(&mut self, request: UnloadRequest) {
        self.events.push(SourceEvent::Unload(request));
        let (cancelled, kept): (Vec<_>, Vec<_>) = self
            .queue
            .drain(..)
            .partition(|(token, _)| token.chunk_start == request.start_index);
        self.queue = kept.into();
        self.cancelled.extend(cancelled);
    }

    fn request_total(&mut self) {
        self.events.push(SourceEvent::Total);
        self.total_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(chunk_start: usize, generation: u64) -> RequestToken {
        RequestToken {
            chunk_start,
            generation,
        }
    }

    fn load(start_index: usize, count: usize) -> LoadRequest {
        LoadRequest { start_index, count }
    }

    fn source(order: CompletionOrder) -> MemorySource<usize> {
        MemorySource::with_order((0..100).collect(), order)
    }

    fn answered_starts(source: &mut MemorySource<usize>) -> Vec<usize> {
        source
            .drain()
            .into_iter()
            .filter_map(|msg| match msg {
                Msg::ChunkLoaded { token, .. } => Some(token.chunk_start),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fifo_answers_in_request_order() {
        let mut s = source(CompletionOrder::Fifo);
        for (g, start) in [0, 20, 40].into_iter().enumerate() {
            s.request_load(token(start, g as u64), load(start, 20));
        }
        assert_eq!(answered_starts(&mut s), vec![0, 20, 40]);
    }

    #[test]
    fn lifo_answers_newest_first() {
        let mut s = source(CompletionOrder::Lifo);
        for (g, start) in [0, 20, 40].into_iter().enumerate() {
            s.request_load(token(start, g as u64), load(start, 20));
        }
        assert_eq!(answered_starts(&mut s), vec![40, 20, 0]);
    }

    #[test]
    fn shuffled_is_reproducible() {
        let run = |seed| {
            let mut s = source(CompletionOrder::Shuffled(seed));
            for (g, start) in (0..100).step_by(10).enumerate() {
                s.request_load(token(start, g as u64), load(start, 10));
            }
            answered_starts(&mut s)
        };
        assert_eq!(run(42), run(42));
        let mut sorted = run(42);
        sorted.sort_unstable();
        assert_eq!(sorted, (0..100).step_by(10).collect::<Vec<_>>());
    }

    #[test]
    fn answers_carry_requested_items() {
        let mut s = source(CompletionOrder::Fifo);
        s.request_load(token(90, 0), load(90, 20));
        match s.poll() {
            Some(Msg::ChunkLoaded { items, .. }) => assert_eq!(items, (90..100).collect::<Vec<_>>()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn load_past_end_answers_empty() {
        let mut s = source(CompletionOrder::Fifo);
        s.truncate_items(10);
        s.request_load(token(20, 0), load(20, 20));
        match s.poll() {
            Some(Msg::ChunkLoaded { items, .. }) => assert!(items.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unload_cancels_queued_load() {
        let mut s = source(CompletionOrder::Fifo);
        s.request_load(token(0, 0), load(0, 20));
        s.request_unload(UnloadRequest { start_index: 0 });
        assert_eq!(s.pending(), 0);
        assert!(s.poll().is_none());

        s.set_answer_unloaded(true);
        assert_eq!(s.pending(), 1);
        assert!(matches!(s.poll(), Some(Msg::ChunkLoaded { .. })));
    }

    #[test]
    fn failing_chunk_answers_failure() {
        let mut s = source(CompletionOrder::Fifo);
        s.fail_chunk(20);
        s.request_load(token(0, 0), load(0, 20));
        s.request_load(token(20, 1), load(20, 20));
        let msgs = s.drain();
        assert!(matches!(msgs[0], Msg::ChunkLoaded { .. }));
        assert!(matches!(msgs[1], Msg::ChunkFailed { .. }));

        s.heal_chunk(20);
        s.request_load(token(20, 2), load(20, 20));
        assert!(matches!(s.poll(), Some(Msg::ChunkLoaded { .. })));
    }

    #[test]
    fn fail_next_counts_down() {
        let mut s = source(CompletionOrder::Fifo);
        s.fail_next(1);
        s.request_load(token(0, 0), load(0, 20));
        s.request_load(token(20, 1), load(20, 20));
        let msgs = s.drain();
        assert!(matches!(msgs[0], Msg::ChunkFailed { .. }));
        assert!(matches!(msgs[1], Msg::ChunkLoaded { .. }));
    }

    #[test]
    fn duplicates_are_delivered_after_original() {
        let mut s = source(CompletionOrder::Fifo);
        s.duplicate_answers(true);
        s.request_load(token(0, 0), load(0, 20));
        assert_eq!(answered_starts(&mut s), vec![0, 0]);
    }

    #[test]
    fn total_request_is_answered_first() {
        let mut s = source(CompletionOrder::Fifo);
        s.request_load(token(0, 0), load(0, 20));
        s.request_total();
        assert_eq!(s.poll(), Some(Msg::TotalChanged(100)));
        assert_eq!(s.events().last(), Some(&SourceEvent::Total));
    }
}
