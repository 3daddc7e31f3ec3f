#![forbid(unsafe_code)]

//! chunkview public facade crate.
//!
//! A windowed view over a large ordered dataset: a fixed-height viewport with
//! a cursor, backed by fixed-size chunks fetched on demand from a data source
//! and evicted when they fall out of reach.
//!
//! This crate re-exports the stable surface of the internal crates, adds the
//! unified [`Error`] model, and offers a prelude.
//!
//! ```no_run
//! use chunkview::prelude::*;
//!
//! let settings = SessionSettings::default().with_height(20).with_chunk_size(50);
//! let mut session: Session<String> = Session::new(settings, 10_000);
//! let _requests = session.init();
//! let _requests = session.update(Msg::PageDown);
//! let frame = session.materialize();
//! assert_eq!(frame.rows.len(), 20);
//! ```

pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use chunkview_core::{
    BoundingArea, BoundingAreaConfig, Chunk, ChunkOperations, ChunkOrchestrator, ChunkStore,
    LoadRequest, Materialized, PlaceholderKind, Row, UnloadRequest, ViewportConfig,
    ViewportState, calculate_bounding_area, materialize, required_chunks,
};

// --- Runtime re-exports ----------------------------------------------------

pub use chunkview_runtime::{
    BoundingSettings, ChunkSource, Cmd, Msg, RequestLedger, RequestToken, Session,
    SessionSettings, SessionStats, SettingsError, ViewportSettings,
};

// --- Errors ---------------------------------------------------------------

pub use error::{Error, LoadError, RecoveryAction, Result};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ChunkSource, Cmd, Error, LoadError, LoadRequest, Materialized, Msg, RecoveryAction,
        RequestToken, Result, Row, Session, SessionSettings, UnloadRequest, ViewportState,
    };

    pub use crate::{core, runtime};
}

pub use chunkview_core as core;
pub use chunkview_runtime as runtime;
