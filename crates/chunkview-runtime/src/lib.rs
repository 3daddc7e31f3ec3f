#![forbid(unsafe_code)]

//! chunkview Runtime
//!
//! This crate wraps the pure core into a message-driven session that talks to
//! a data source through typed requests and typed completions.
//!
//! # Key Components
//!
//! - [`Session`] - Owns viewport state, residency, chunk store and request ledger
//! - [`Msg`] - Navigation intents and data source completions
//! - [`Cmd`] - Requests for the data source
//! - [`ChunkSource`] - Trait implemented by the data source
//! - [`RequestToken`] - Identity of an issued load, used to drop stale answers
//! - [`SessionSettings`] - Tunables, loadable from TOML/JSON with `settings-file`
//! - [`SessionStats`] - Lifetime counters
//!
//! # Role in chunkview
//! `chunkview-runtime` is the orchestrator. It consumes [`Msg`] values, runs
//! the core state machine and reconcile pass, and hands back a [`Cmd`] for the
//! host to forward. It never blocks and never calls the data source directly.

pub mod cmd;
pub mod ledger;
pub mod session;
pub mod settings;
pub mod source;
pub mod stats;

pub use cmd::Cmd;
pub use ledger::{RequestLedger, RequestToken};
pub use session::{Msg, Session};
pub use settings::{BoundingSettings, SessionSettings, SettingsError, ViewportSettings};
pub use source::ChunkSource;
pub use stats::SessionStats;
