#![forbid(unsafe_code)]

//! Synchronous host loop for tests.
//!
//! [`Driver`] plays the host: it feeds messages to a [`Session`], forwards
//! every returned command to a [`MemorySource`], and pumps the source's
//! answers back in until nothing is owed.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"update","seq":3,"msg":"cursor_down","cmds":1,"cursor":12,"start":5}
//! {"event":"frame","seq":4,"checksum":"blake3:…","placeholders":0,"cursor":12}
//! ```

use std::fmt::Debug;

use chunkview_core::ViewportState;
use chunkview_runtime::{Cmd, Msg, Session, SessionSettings};
use serde_json::json;

use crate::frame::{frame_checksum, render_rows};
use crate::memory_source::MemorySource;

/// Upper bound on answers pumped by one [`Driver::settle`].
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// A rendered window, detached from the session borrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Viewport state after materialization.
    pub viewport: ViewportState,
    /// One line per row, see [`render_rows`].
    pub lines: Vec<String>,
    /// See [`frame_checksum`].
    pub checksum: String,
    /// Placeholder rows in the window.
    pub placeholder_count: usize,
}

impl FrameSnapshot {
    /// Whether every row carries an item.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.placeholder_count == 0
    }
}

/// Session plus in-memory source, wired together.
#[derive(Debug)]
pub struct Driver<T> {
    session: Session<T>,
    source: MemorySource<T>,
    max_steps: usize,
    seq: u64,
    log: Vec<serde_json::Value>,
}

impl<T: Clone + Debug> Driver<T> {
    /// Create a driver whose session starts at the source's current size.
    #[must_use]
    pub fn new(settings: SessionSettings, source: MemorySource<T>) -> Self {
        let session = Session::new(settings, source.len());
        Self {
            session,
            source,
            max_steps: DEFAULT_MAX_STEPS,
            seq: 0,
            log: Vec::new(),
        }
    }

    /// Cap the answers pumped by one [`settle`](Self::settle).
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Issue the session's initial requests. Returns how many were sent.
    pub fn init(&mut self) -> usize {
        let cmd = self.session.init();
        self.record("init", &cmd);
        cmd.dispatch(&mut self.source)
    }

    /// Apply one message and forward the resulting requests.
    pub fn send(&mut self, msg: Msg<T>) -> usize {
        let kind = msg_kind(&msg);
        let cmd = self.session.update(msg);
        self.record(kind, &cmd);
        cmd.dispatch(&mut self.source)
    }

    /// Apply several messages in order.
    pub fn send_all(&mut self, msgs: impl IntoIterator<Item = Msg<T>>) {
        for msg in msgs {
            self.send(msg);
        }
    }

    /// Deliver one answer from the source. Returns `false` when nothing is
    /// owed.
    pub fn step(&mut self) -> bool {
        match self.source.poll() {
            Some(msg) => {
                self.send(msg);
                true
            }
            None => false,
        }
    }

    /// Deliver answers until nothing is owed or the step cap is hit.
    /// Returns the number delivered.
    pub fn settle(&mut self) -> usize {
        let mut delivered = 0;
        while delivered < self.max_steps && self.step() {
            delivered += 1;
        }
        if delivered == self.max_steps {
            tracing::warn!(
                target: "chunkview.harness",
                max_steps = self.max_steps,
                "settle stopped at step cap"
            );
        }
        delivered
    }

    /// Materialize the window, then forward any loads it queued.
    pub fn snapshot(&mut self) -> FrameSnapshot {
        let snapshot = {
            let frame = self.session.materialize();
            FrameSnapshot {
                viewport: frame.viewport,
                lines: render_rows(&frame),
                checksum: frame_checksum(&frame),
                placeholder_count: frame.placeholder_count,
            }
        };
        self.seq += 1;
        self.log.push(json!({
            "event": "frame",
            "seq": self.seq,
            "checksum": snapshot.checksum,
            "placeholders": snapshot.placeholder_count,
            "cursor": snapshot.viewport.cursor_index,
        }));
        let pending = self.session.take_pending();
        self.record("pending", &pending);
        pending.dispatch(&mut self.source);
        snapshot
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// The session, mutably.
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// The source.
    #[must_use]
    pub fn source(&self) -> &MemorySource<T> {
        &self.source
    }

    /// The source, mutably, for fault injection and dataset edits.
    pub fn source_mut(&mut self) -> &mut MemorySource<T> {
        &mut self.source
    }

    /// Event log as JSON lines.
    #[must_use]
    pub fn log_jsonl(&self) -> String {
        self.log
            .iter()
            .map(serde_json::Value::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn record(&mut self, kind: &str, cmd: &Cmd) {
        if kind == "pending" && cmd.is_none() {
            return;
        }
        self.seq += 1;
        let state = self.session.state();
        self.log.push(json!({
            "event": "update",
            "seq": self.seq,
            "msg": kind,
            "cmds": cmd.count(),
            "cursor": state.cursor_index,
            "start": state.viewport_start_index,
        }));
    }
}

/// Stable snake_case label for a message.
#[must_use]
pub fn msg_kind<T>(msg: &Msg<T>) -> &'static str {
    match msg {
        Msg::CursorUp => "cursor_up",
        Msg::CursorDown => "cursor_down",
        Msg::PageUp => "page_up",
        Msg::PageDown => "page_down",
        Msg::JumpToStart => "jump_to_start",
        Msg::JumpToEnd => "jump_to_end",
        Msg::JumpTo(_) => "jump_to",
        Msg::Resize { .. } => "resize",
        Msg::TotalChanged(_) => "total_changed",
        Msg::ChunkLoaded { .. } => "chunk_loaded",
        Msg::ChunkFailed { .. } => "chunk_failed",
        Msg::RefreshChunk(_) => "refresh_chunk",
        Msg::Reset => "reset",
        Msg::Reconfigure(_) => "reconfigure",
    }
}
