#![forbid(unsafe_code)]

//! Error model and recovery actions.
//!
//! The core never fails: bad configuration is clamped and navigation past an
//! edge is a no-op. What can go wrong sits at the two edges of a session:
//! loading settings, and the data source answering a load.
//!
//! Every [`Error`] maps to a [`RecoveryAction`] so a host can keep the
//! viewport alive instead of bailing out. A failed load is the common case:
//! its rows stay placeholders and a [`Msg::RefreshChunk`] re-requests it.

use std::fmt;

use chunkview_runtime::{Msg, RequestToken, Session, SettingsError};

// ── Domain-Specific Error Types ─────────────────────────────────────────

/// A data source could not deliver a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The source reported a failure for an issued request.
    Failed {
        /// Chunk-aligned start index.
        chunk_start: usize,
        /// Human-readable cause from the source.
        reason: String,
    },
    /// The source answered with a token the session no longer expects.
    Stale(RequestToken),
    /// The source answered for a range past the end of the dataset.
    OutOfRange {
        /// Chunk-aligned start index.
        chunk_start: usize,
        /// Dataset size at the time of the answer.
        total: usize,
    },
}

impl LoadError {
    /// Build a failure from the token of the originating request.
    #[must_use]
    pub fn failed(token: RequestToken, reason: impl Into<String>) -> Self {
        Self::Failed {
            chunk_start: token.chunk_start,
            reason: reason.into(),
        }
    }

    /// Classify an answer from the data source before handing it to
    /// `session`.
    ///
    /// Returns `None` for navigation messages and for loads the session will
    /// install. An answer for a chunk at or past the end of the dataset is
    /// [`OutOfRange`](Self::OutOfRange), one whose token the session no
    /// longer expects is [`Stale`](Self::Stale), and any other failure is
    /// [`Failed`](Self::Failed).
    #[must_use]
    pub fn classify<T>(session: &Session<T>, msg: &Msg<T>) -> Option<Self> {
        let token = match msg {
            Msg::ChunkLoaded { token, .. } | Msg::ChunkFailed { token, .. } => *token,
            _ => return None,
        };
        if token.chunk_start >= session.total() {
            return Some(Self::OutOfRange {
                chunk_start: token.chunk_start,
                total: session.total(),
            });
        }
        if !session.expects(token) {
            return Some(Self::Stale(token));
        }
        match msg {
            Msg::ChunkFailed { reason, .. } => Some(Self::failed(token, reason.clone())),
            _ => None,
        }
    }

    /// Chunk the error is about.
    #[must_use]
    pub fn chunk_start(&self) -> usize {
        match self {
            Self::Failed { chunk_start, .. } | Self::OutOfRange { chunk_start, .. } => {
                *chunk_start
            }
            Self::Stale(token) => token.chunk_start,
        }
    }
}

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for chunkview hosts.
#[derive(Debug)]
pub enum Error {
    /// Settings could not be read, parsed or validated.
    Settings(SettingsError),
    /// A chunk load failed or was answered out of turn.
    Load(LoadError),
}

/// Standard result type for chunkview APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Recovery ────────────────────────────────────────────────────────────

/// What the host should do after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Re-request the chunk with [`Msg::RefreshChunk`].
    RefreshChunk,
    /// Drop the answer; the session already ignores it.
    DropAnswer,
    /// Keep running with default or previous settings.
    KeepSettings,
    /// Nothing sensible to continue with.
    Abort,
}

impl Error {
    /// Recovery action for this error.
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::Load(LoadError::Failed { .. }) => RecoveryAction::RefreshChunk,
            Self::Load(LoadError::Stale(_) | LoadError::OutOfRange { .. }) => {
                RecoveryAction::DropAnswer
            }
            Self::Settings(SettingsError::Validation(_)) => RecoveryAction::KeepSettings,
            Self::Settings(_) => RecoveryAction::Abort,
        }
    }

    /// Error type label for metrics and tracing.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Settings(SettingsError::Io(_)) => "settings_io",
            Self::Settings(SettingsError::Validation(_)) => "settings_validation",
            #[allow(unreachable_patterns)]
            Self::Settings(_) => "settings_parse",
            Self::Load(LoadError::Failed { .. }) => "load_failed",
            Self::Load(LoadError::Stale(_)) => "load_stale",
            Self::Load(LoadError::OutOfRange { .. }) => "load_out_of_range",
        }
    }

    /// Whether the session can carry on.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery(), RecoveryAction::Abort)
    }

    /// The message that retries the failed work, if any.
    #[must_use]
    pub fn retry_msg<T>(&self) -> Option<Msg<T>> {
        match (self.recovery(), self) {
            (RecoveryAction::RefreshChunk, Self::Load(err)) => {
                Some(Msg::RefreshChunk(err.chunk_start()))
            }
            _ => None,
        }
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed {
                chunk_start,
                reason,
            } => write!(f, "chunk {chunk_start} failed to load: {reason}"),
            Self::Stale(token) => write!(
                f,
                "stale answer for chunk {} (generation {})",
                token.chunk_start, token.generation
            ),
            Self::OutOfRange { chunk_start, total } => {
                write!(f, "chunk {chunk_start} is past the end of {total} items")
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings(err) => write!(f, "settings: {err}"),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshChunk => write!(f, "refresh_chunk"),
            Self::DropAnswer => write!(f, "drop_answer"),
            Self::KeepSettings => write!(f, "keep_settings"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for LoadError {}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Settings(err) => Some(err),
            Self::Load(err) => Some(err),
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Self::Settings(err)
    }
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Settings(SettingsError::Io(err))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
