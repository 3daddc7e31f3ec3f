#![forbid(unsafe_code)]

//! Test harness and reference fixtures for chunkview.
//!
//! - [`MemorySource`]: a [`ChunkSource`](chunkview_runtime::ChunkSource) over
//!   a vector, with seeded out-of-order completion and fault injection
//! - [`Driver`]: the host loop, pumping commands and answers synchronously
//! - [`frame_checksum`] / [`render_rows`]: stable snapshots of a window
//! - [`fixture_seed`]: seed override from the environment

pub mod driver;
pub mod fixture;
pub mod frame;
pub mod memory_source;

pub use driver::{DEFAULT_MAX_STEPS, Driver, FrameSnapshot, msg_kind};
pub use fixture::{fixture_seed, fixture_seeds};
pub use frame::{frame_checksum, render_rows};
pub use memory_source::{CompletionOrder, MemorySource, SourceEvent};
