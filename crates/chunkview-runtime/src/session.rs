#![forbid(unsafe_code)]

//! The message-driven session.
//!
//! A [`Session`] owns the whole state of one virtualized view: the viewport
//! state, the chunk orchestrator, the chunk store, and the request ledger. The
//! host feeds it [`Msg`] values (navigation intents, completions from the data
//! source) through [`Session::update`] and forwards the returned [`Cmd`] to
//! its [`ChunkSource`](crate::ChunkSource).
//!
//! # Lifecycle
//!
//! ```text
//! Session::new ──► init() ──► Cmd (initial loads)
//!                    │
//!     ┌──────────────┘
//!     ▼
//! update(Msg) ──► Cmd ──► source ──► Msg::ChunkLoaded / ChunkFailed ──┐
//!     ▲                                                                │
//!     └────────────────────────────────────────────────────────────────┘
//!
//! materialize() ──► rows for the current window
//! ```
//!
//! # Invariants
//!
//! 1. Every token the ledger expects belongs to a resident chunk. Unloads,
//!    resets and chunk-size changes cancel tokens in the same step.
//! 2. The store holds chunks only for resident starts, plus at most the
//!    payloads of chunks whose refresh is in flight.
//! 3. A failed load leaves its chunk resident. Its rows stay placeholders
//!    until `Msg::RefreshChunk` or an unload and later reload.
//! 4. Every load handed to the host fits the dataset and the chunk size in
//!    force. Loads queued by [`Session::materialize`] that stop fitting are
//!    withdrawn before they are returned.

use chunkview_core::{
    BoundingAreaConfig, Chunk, ChunkOrchestrator, ChunkStore, LoadRequest, Materialized,
    UnloadRequest, ViewportConfig, ViewportState, calculate_bounding_area, materialize,
};

use crate::cmd::Cmd;
use crate::ledger::{RequestLedger, RequestToken};
use crate::settings::SessionSettings;
use crate::stats::SessionStats;

/// Inputs to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg<T> {
    /// Move the cursor up one row.
    CursorUp,
    /// Move the cursor down one row.
    CursorDown,
    /// Move up one page.
    PageUp,
    /// Move down one page.
    PageDown,
    /// Move to the first item.
    JumpToStart,
    /// Move to the last item.
    JumpToEnd,
    /// Move to an arbitrary index (clamped).
    JumpTo(usize),
    /// The viewport changed height.
    Resize {
        /// New row count.
        height: usize,
    },
    /// The dataset changed size.
    TotalChanged(usize),
    /// A load completed.
    ChunkLoaded {
        /// Token of the originating request.
        token: RequestToken,
        /// Items starting at `token.chunk_start`.
        items: Vec<T>,
    },
    /// A load failed.
    ChunkFailed {
        /// Token of the originating request.
        token: RequestToken,
        /// Human-readable cause.
        reason: String,
    },
    /// Re-request the chunk owning this index, even if resident.
    RefreshChunk(usize),
    /// The data source was replaced: forget every chunk and start over.
    Reset,
    /// Replace the settings.
    Reconfigure(SessionSettings),
}

/// One virtualized view over a dataset of `T`.
#[derive(Debug)]
pub struct Session<T> {
    settings: SessionSettings,
    viewport: ViewportConfig,
    orchestrator: ChunkOrchestrator,
    store: ChunkStore<T>,
    ledger: RequestLedger,
    state: ViewportState,
    total: usize,
    stats: SessionStats,
    pending: Vec<Cmd>,
}

impl<T> Session<T> {
    /// Create a session over `total` items. Nothing is requested until
    /// [`init`](Self::init).
    #[must_use]
    pub fn new(settings: SessionSettings, total: usize) -> Self {
        let viewport = settings.viewport_config();
        let bounding = settings.bounding_config();
        Self {
            state: ViewportState::initial(&viewport, total),
            store: ChunkStore::new(viewport.chunk_size),
            orchestrator: ChunkOrchestrator::new(bounding),
            ledger: RequestLedger::new(),
            stats: SessionStats::default(),
            pending: Vec::new(),
            settings,
            viewport,
            total,
        }
    }

    /// Request the chunks around the initial viewport.
    pub fn init(&mut self) -> Cmd {
        tracing::debug!(
            target: "chunkview.session",
            total = self.total,
            height = self.viewport.height,
            chunk_size = self.viewport.chunk_size,
            cursor = self.state.cursor_index,
            "session started"
        );
        self.sync()
    }

    /// Apply one message and return the requests it causes.
    pub fn update(&mut self, msg: Msg<T>) -> Cmd {
        match msg {
            Msg::CursorUp => self.navigate(ViewportState::cursor_up),
            Msg::CursorDown => self.navigate(ViewportState::cursor_down),
            Msg::PageUp => self.navigate(ViewportState::page_up),
            Msg::PageDown => self.navigate(ViewportState::page_down),
            Msg::JumpToStart => self.navigate(ViewportState::jump_to_start),
            Msg::JumpToEnd => self.navigate(ViewportState::jump_to_end),
            Msg::JumpTo(index) => {
                self.navigate(|state, config, total| state.jump_to_index(index, config, total))
            }
            Msg::Resize { height } => self.resize(height),
            Msg::TotalChanged(total) => self.set_total(total),
            Msg::ChunkLoaded { token, items } => self.on_loaded(token, items),
            Msg::ChunkFailed { token, reason } => self.on_failed(token, reason),
            Msg::RefreshChunk(index) => self.refresh(index),
            Msg::Reset => self.reset(),
            Msg::Reconfigure(settings) => self.reconfigure(settings),
        }
    }

    /// Rows for the current window.
    ///
    /// Chunks overlapping the window that are neither present nor resident
    /// are requested; those loads are queued and returned by the next
    /// [`update`](Self::update) or by [`take_pending`](Self::take_pending).
    /// The cursor repair done while materializing is kept.
    pub fn materialize(&mut self) -> Materialized<'_, T> {
        let Self {
            viewport,
            orchestrator,
            store,
            ledger,
            state,
            total,
            stats,
            pending,
            ..
        } = self;
        let total = *total;

        let frame = materialize(state, viewport, total, store, |chunk_start| {
            if let Some(load) = orchestrator.request_load(chunk_start, total) {
                let token = ledger.issue(load.start_index);
                stats.loads_issued += 1;
                tracing::debug!(
                    target: "chunkview.chunks",
                    chunk_start = load.start_index,
                    count = load.count,
                    generation = token.generation,
                    "queued load for visible chunk"
                );
                pending.push(Cmd::load(token, load));
            }
            None
        });
        *state = frame.viewport;
        frame
    }

    /// Loads queued by [`materialize`](Self::materialize) and not yet
    /// returned.
    pub fn take_pending(&mut self) -> Cmd {
        Cmd::batch(std::mem::take(&mut self.pending))
    }

    // --- Accessors ---------------------------------------------------------

    /// Current viewport state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    /// Current dataset size.
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// The settings as given.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Normalized viewport config in use.
    #[inline]
    #[must_use]
    pub fn viewport_config(&self) -> &ViewportConfig {
        &self.viewport
    }

    /// Normalized bounding config in use.
    #[inline]
    #[must_use]
    pub fn bounding_config(&self) -> &BoundingAreaConfig {
        self.orchestrator.config()
    }

    /// Lifetime counters.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Whether the chunk owning `index` is resident (loaded or in flight).
    #[must_use]
    pub fn is_chunk_resident(&self, index: usize) -> bool {
        self.orchestrator
            .is_resident(self.orchestrator.chunk_start_of(index))
    }

    /// Whether the chunk owning `index` has arrived.
    #[must_use]
    pub fn has_chunk(&self, index: usize) -> bool {
        self.store.owning(index).is_some()
    }

    /// Resident chunk starts, ascending.
    #[must_use]
    pub fn resident_chunks(&self) -> Vec<usize> {
        self.orchestrator.resident().collect()
    }

    /// Chunk starts with a load in flight, ascending.
    #[must_use]
    pub fn in_flight(&self) -> Vec<usize> {
        self.ledger.in_flight().collect()
    }

    /// Whether a completion carrying `token` would be accepted.
    #[must_use]
    pub fn expects(&self, token: RequestToken) -> bool {
        self.ledger.is_current(token)
    }

    /// The chunk store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &ChunkStore<T> {
        &self.store
    }

    // --- Transitions -------------------------------------------------------

    fn navigate(&mut self, step: impl FnOnce(ViewportState, &ViewportConfig, usize) -> ViewportState) -> Cmd {
        let before = self.state;
        self.state = step(before, &self.viewport, self.total);
        if self.state != before {
            tracing::trace!(
                target: "chunkview.session",
                cursor = self.state.cursor_index,
                start = self.state.viewport_start_index,
                "cursor moved"
            );
        }
        self.sync()
    }

    fn resize(&mut self, height: usize) -> Cmd {
        self.settings.viewport.height = height;
        self.viewport = self.settings.viewport_config();
        self.state = self.state.normalize(&self.viewport, self.total);
        tracing::debug!(
            target: "chunkview.session",
            height = self.viewport.height,
            "viewport resized"
        );
        self.sync()
    }

    fn set_total(&mut self, total: usize) -> Cmd {
        let old = self.total;
        self.total = total;
        let mut cmds = self.withdraw_pending(|load| load.start_index + load.count <= total);

        if total < old {
            let gone: Vec<usize> = self
                .orchestrator
                .resident()
                .filter(|&start| start >= total)
                .collect();
            for start in gone {
                if let Some(unload) = self.orchestrator.request_unload(start) {
                    cmds.push(self.issue_unload(unload));
                }
            }
            self.store.retain(|start| start < total);
        } else if total > old {
            // The old final chunk was short; fetch it again at full size.
            let chunk_size = self.viewport.chunk_size;
            if old % chunk_size != 0 {
                let tail = (old - 1) / chunk_size * chunk_size;
                if self.orchestrator.is_resident(tail) {
                    if let Some(load) = self.orchestrator.refresh(tail, total) {
                        cmds.push(self.issue_load(load));
                    }
                }
            }
        }

        tracing::debug!(target: "chunkview.session", old, total, "dataset size changed");
        self.state = self.state.normalize(&self.viewport, total);
        cmds.push(self.sync());
        Cmd::batch(cmds)
    }

    fn on_loaded(&mut self, token: RequestToken, items: Vec<T>) -> Cmd {
        let Some(latency) = self.ledger.complete(token) else {
            self.discard_stale(token);
            return self.take_pending();
        };
        let count = items.len();
        self.store.install(Chunk::new(token.chunk_start, items));
        self.stats.chunks_installed += 1;
        self.stats.last_load_latency = Some(latency);
        tracing::debug!(
            target: "chunkview.chunks",
            chunk_start = token.chunk_start,
            count,
            generation = token.generation,
            latency_us = latency.as_micros() as u64,
            "chunk loaded"
        );
        self.take_pending()
    }

    fn on_failed(&mut self, token: RequestToken, reason: String) -> Cmd {
        if self.ledger.complete(token).is_none() {
            self.discard_stale(token);
            return self.take_pending();
        }
        self.stats.load_failures += 1;
        tracing::warn!(
            target: "chunkview.chunks",
            chunk_start = token.chunk_start,
            generation = token.generation,
            reason = %reason,
            "chunk load failed"
        );
        self.stats.last_failure = Some(reason);
        self.take_pending()
    }

    fn refresh(&mut self, index: usize) -> Cmd {
        if index >= self.total {
            return Cmd::none();
        }
        let Some(load) = self.orchestrator.refresh(index, self.total) else {
            return Cmd::none();
        };
        self.stats.refreshes += 1;
        let mut cmds = std::mem::take(&mut self.pending);
        cmds.push(self.issue_load(load));
        Cmd::batch(cmds)
    }

    fn reset(&mut self) -> Cmd {
        self.orchestrator.reset();
        self.store.clear();
        self.ledger.clear();
        self.pending.clear();
        self.state = self.state.normalize(&self.viewport, self.total);
        tracing::info!(
            target: "chunkview.session",
            total = self.total,
            next_generation = self.ledger.next_generation(),
            "session reset"
        );
        Cmd::batch(vec![Cmd::RequestTotal, self.sync()])
    }

    fn reconfigure(&mut self, settings: SessionSettings) -> Cmd {
        let old_chunk_size = self.viewport.chunk_size;
        self.settings = settings;
        self.viewport = self.settings.viewport_config();
        let bounding = self.settings.bounding_config();
        let same_shape = bounding.chunk_size == old_chunk_size;
        let mut cmds = self.withdraw_pending(|_| same_shape);

        if same_shape {
            self.orchestrator.set_config(bounding);
        } else {
            let resident: Vec<usize> = self.orchestrator.resident().collect();
            for start in resident {
                cmds.push(self.issue_unload(UnloadRequest { start_index: start }));
            }
            self.orchestrator = ChunkOrchestrator::new(bounding);
            self.store = ChunkStore::new(bounding.chunk_size);
            self.ledger.clear();
        }

        tracing::info!(
            target: "chunkview.session",
            height = self.viewport.height,
            chunk_size = self.viewport.chunk_size,
            chunks_before = bounding.chunks_before,
            chunks_after = bounding.chunks_after,
            "session reconfigured"
        );
        self.state = self.state.normalize(&self.viewport, self.total);
        cmds.push(self.sync());
        Cmd::batch(cmds)
    }

    // --- Request plumbing --------------------------------------------------

    /// Reconcile the resident set with the current viewport.
    fn sync(&mut self) -> Cmd {
        let area = calculate_bounding_area(
            &self.state,
            self.viewport.height,
            self.total,
            self.orchestrator.config(),
        );
        let ops = self.orchestrator.reconcile(&area, self.total);
        let mut cmds = std::mem::take(&mut self.pending);
        cmds.reserve(ops.loads.len() + ops.unloads.len());
        for unload in ops.unloads {
            cmds.push(self.issue_unload(unload));
        }
        for load in ops.loads {
            cmds.push(self.issue_load(load));
        }
        self.stats.observe_resident(self.orchestrator.resident_len());
        Cmd::batch(cmds)
    }

    fn issue_load(&mut self, load: LoadRequest) -> Cmd {
        let token = self.ledger.issue(load.start_index);
        self.stats.loads_issued += 1;
        tracing::debug!(
            target: "chunkview.chunks",
            chunk_start = load.start_index,
            count = load.count,
            generation = token.generation,
            "load requested"
        );
        Cmd::load(token, load)
    }

    fn issue_unload(&mut self, unload: UnloadRequest) -> Cmd {
        self.ledger.cancel(unload.start_index);
        self.store.remove(unload.start_index);
        self.stats.unloads_issued += 1;
        tracing::debug!(
            target: "chunkview.chunks",
            chunk_start = unload.start_index,
            resident = self.orchestrator.resident_len(),
            "unload requested"
        );
        Cmd::unload(unload)
    }

    /// Take the loads queued by `materialize`, dropping those `keep` rejects.
    ///
    /// A dropped load was never sent, so its chunk leaves the resident set
    /// and the ledger without an unload.
    fn withdraw_pending(&mut self, keep: impl Fn(&LoadRequest) -> bool) -> Vec<Cmd> {
        let mut kept = Vec::new();
        for cmd in std::mem::take(&mut self.pending) {
            match cmd {
                // Superseded by a newer request for the same chunk.
                Cmd::Load { token, .. } if !self.ledger.is_current(token) => {
                    self.stats.loads_issued = self.stats.loads_issued.saturating_sub(1);
                }
                Cmd::Load { token, request } if !keep(&request) => {
                    self.ledger.cancel(request.start_index);
                    let _ = self.orchestrator.request_unload(request.start_index);
                    self.stats.loads_issued = self.stats.loads_issued.saturating_sub(1);
                    tracing::debug!(
                        target: "chunkview.chunks",
                        chunk_start = request.start_index,
                        count = request.count,
                        generation = token.generation,
                        "withdrew queued load"
                    );
                }
                other => kept.push(other),
            }
        }
        kept
    }

    fn discard_stale(&mut self, token: RequestToken) {
        self.stats.stale_completions += 1;
        tracing::debug!(
            target: "chunkview.chunks",
            chunk_start = token.chunk_start,
            generation = token.generation,
            "discarded stale completion"
        );
    }
}
