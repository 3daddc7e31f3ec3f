#![forbid(unsafe_code)]

//! Session settings as data.
//!
//! [`SessionSettings`] groups every tunable of a session so it can be loaded
//! from TOML or JSON at startup (feature `settings-file`) instead of being
//! assembled in code.
//!
//! # Loading
//!
//! ```toml
//! # chunkview.toml
//! [viewport]
//! height = 30
//! top_threshold = 3
//! bottom_threshold = 3
//! chunk_size = 100
//!
//! [bounding]
//! chunks_before = 2
//! chunks_after = 2
//! unload_distant_chunks = true
//! ```
//!
//! ```rust,ignore
//! let settings = SessionSettings::from_toml_file("chunkview.toml")?;
//! let settings = SessionSettings::from_json_str(json)?.strict()?;
//! ```
//!
//! Missing fields take their defaults. Loading never rejects out-of-range
//! values on its own; they are clamped when the session is built. Call
//! [`SessionSettings::strict`] to turn [`SessionSettings::validate`] problems
//! into an error instead.
//!
//! The chunk size lives in the `viewport` section only. The bounding config
//! handed to the orchestrator always uses the same value.

#[cfg(feature = "settings-file")]
use std::path::Path;

#[cfg(feature = "settings-file")]
use serde::{Deserialize, Serialize};

use chunkview_core::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_HEIGHT, DEFAULT_MAX_LOADED_CHUNKS, DEFAULT_THRESHOLD,
};
use chunkview_core::{BoundingAreaConfig, ViewportConfig};

// ---------------------------------------------------------------------------
// Top-level SessionSettings
// ---------------------------------------------------------------------------

/// Every tunable of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "settings-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "settings-file", serde(default))]
pub struct SessionSettings {
    /// Viewport shape and scrolling.
    pub viewport: ViewportSettings,
    /// Prefetch radius and eviction.
    pub bounding: BoundingSettings,
}

impl SessionSettings {
    /// Build settings from core configs. The viewport's chunk size wins.
    #[must_use]
    pub fn from_configs(viewport: ViewportConfig, bounding: BoundingAreaConfig) -> Self {
        Self {
            viewport: ViewportSettings {
                height: viewport.height,
                top_threshold: viewport.top_threshold,
                bottom_threshold: viewport.bottom_threshold,
                chunk_size: viewport.chunk_size,
                initial_index: viewport.initial_index,
            },
            bounding: BoundingSettings {
                chunks_before: bounding.chunks_before,
                chunks_after: bounding.chunks_after,
                max_loaded_chunks: bounding.max_loaded_chunks,
                unload_distant_chunks: bounding.unload_distant_chunks,
            },
        }
    }

    /// Set the viewport height.
    #[must_use]
    pub fn with_height(mut self, height: usize) -> Self {
        self.viewport.height = height;
        self
    }

    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.viewport.chunk_size = chunk_size;
        self
    }

    /// Set both thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, top: i32, bottom: i32) -> Self {
        self.viewport.top_threshold = top;
        self.viewport.bottom_threshold = bottom;
        self
    }

    /// Set the prefetch radius in whole chunks.
    #[must_use]
    pub fn with_radius(mut self, before: usize, after: usize) -> Self {
        self.bounding.chunks_before = before;
        self.bounding.chunks_after = after;
        self
    }

    /// Enable or disable eviction of distant chunks.
    #[must_use]
    pub fn with_unload_distant_chunks(mut self, enabled: bool) -> Self {
        self.bounding.unload_distant_chunks = enabled;
        self
    }

    /// Set the initial cursor index.
    #[must_use]
    pub fn with_initial_index(mut self, index: usize) -> Self {
        self.viewport.initial_index = index;
        self
    }

    /// The viewport config as written, before clamping.
    #[must_use]
    pub fn raw_viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            height: self.viewport.height,
            top_threshold: self.viewport.top_threshold,
            bottom_threshold: self.viewport.bottom_threshold,
            chunk_size: self.viewport.chunk_size,
            initial_index: self.viewport.initial_index,
        }
    }

    /// Normalized viewport config.
    #[must_use]
    pub fn viewport_config(&self) -> ViewportConfig {
        self.raw_viewport_config().normalized()
    }

    /// Normalized bounding config, sharing the viewport's chunk size.
    #[must_use]
    pub fn bounding_config(&self) -> BoundingAreaConfig {
        BoundingAreaConfig {
            chunk_size: self.viewport_config().chunk_size,
            chunks_before: self.bounding.chunks_before,
            chunks_after: self.bounding.chunks_after,
            max_loaded_chunks: self.bounding.max_loaded_chunks,
            unload_distant_chunks: self.bounding.unload_distant_chunks,
        }
        .normalized()
    }

    /// Validate without modifying anything.
    ///
    /// Returns a list of problems. An empty list means the settings are used
    /// exactly as written.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.raw_viewport_config().validate();
        // Chunk size is reported once, by the viewport section.
        let bounding = BoundingAreaConfig {
            chunk_size: self.viewport.chunk_size.max(1),
            chunks_before: self.bounding.chunks_before,
            chunks_after: self.bounding.chunks_after,
            max_loaded_chunks: self.bounding.max_loaded_chunks,
            unload_distant_chunks: self.bounding.unload_distant_chunks,
        };
        errors.extend(bounding.validate());
        errors
    }

    /// Reject settings with any [`validate`](Self::validate) problem.
    pub fn strict(self) -> Result<Self, SettingsError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(SettingsError::Validation(errors))
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "settings-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        toml::from_str(s).map_err(SettingsError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "settings-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SettingsError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "settings-file")]
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(s).map_err(SettingsError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "settings-file")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SettingsError::Io)?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty JSON.
    #[cfg(feature = "settings-file")]
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        serde_json::to_string_pretty(self).map_err(SettingsError::Json)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The `[viewport]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "settings-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "settings-file", serde(default))]
pub struct ViewportSettings {
    /// Rows in the window. Default: 10.
    pub height: usize,
    /// Top threshold row, or -1 for edge scrolling. Default: 2.
    pub top_threshold: i32,
    /// Bottom threshold offset, or -1 for edge scrolling. Default: 2.
    pub bottom_threshold: i32,
    /// Rows per chunk. Default: 20.
    pub chunk_size: usize,
    /// Cursor index at session start. Default: 0.
    pub initial_index: usize,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            top_threshold: DEFAULT_THRESHOLD,
            bottom_threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            initial_index: 0,
        }
    }
}

/// The `[bounding]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "settings-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "settings-file", serde(default))]
pub struct BoundingSettings {
    /// Whole chunks kept before the viewport. Default: 1.
    pub chunks_before: usize,
    /// Whole chunks kept after the viewport. Default: 1.
    pub chunks_after: usize,
    /// Soft cap on resident chunks. Default: 16.
    pub max_loaded_chunks: usize,
    /// Unload chunks that leave the bounding area. Default: true.
    pub unload_distant_chunks: bool,
}

impl Default for BoundingSettings {
    fn default() -> Self {
        Self {
            chunks_before: 1,
            chunks_after: 1,
            max_loaded_chunks: DEFAULT_MAX_LOADED_CHUNKS,
            unload_distant_chunks: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading session settings.
#[derive(Debug)]
pub enum SettingsError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "settings-file")]
    Toml(toml::de::Error),
    /// JSON parse or serialize error.
    #[cfg(feature = "settings-file")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "settings-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "settings-file")]
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "settings-file")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "settings-file")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
