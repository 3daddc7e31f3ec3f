#![forbid(unsafe_code)]

//! Core: viewport navigation, chunk residency, and row materialization.
//!
//! # Role in chunkview
//! `chunkview-core` decides which slice of a large ordered dataset must be
//! resident for a fixed-height viewport, which chunks to request or evict,
//! and which rows the viewport shows right now. Everything here is a pure,
//! synchronous transition: no I/O, no threads, no clocks.
//!
//! # Primary responsibilities
//! - **Configuration**: [`config::ViewportConfig`] and
//!   [`config::BoundingAreaConfig`], normalized once at construction.
//! - **Viewport state machine**: cursor, page and jump navigation with
//!   threshold or edge-based scrolling ([`viewport`]).
//! - **Bounding area**: the chunk-aligned region to keep resident
//!   ([`bounding`]).
//! - **Chunk orchestration**: load/unload diffs against the resident set and
//!   the chunk store ([`chunk`]).
//! - **Materialization**: the ordered visible rows, with placeholders for data
//!   that has not arrived ([`materialize`]).
//!
//! # How it fits in the system
//! `chunkview-runtime` wraps these pieces into a message-driven session that
//! emits typed requests for a data source and consumes typed completions.

pub mod bounding;
pub mod chunk;
pub mod config;
pub mod materialize;
pub mod viewport;

pub use bounding::{BoundingArea, calculate_bounding_area};
pub use chunk::{
    Chunk, ChunkOperations, ChunkOrchestrator, ChunkStore, LoadRequest, UnloadRequest,
    required_chunks,
};
pub use config::{BoundingAreaConfig, ViewportConfig};
pub use materialize::{Materialized, PlaceholderKind, Row, materialize};
pub use viewport::ViewportState;
