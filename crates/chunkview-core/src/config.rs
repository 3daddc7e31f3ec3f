#![forbid(unsafe_code)]

//! Viewport and bounding-area configuration.
//!
//! Configuration is never rejected. [`ViewportConfig::normalized`] and
//! [`BoundingAreaConfig::normalized`] clamp every field to its nearest valid
//! value (non-positive sizes fall back to the documented defaults), so the
//! navigation and orchestration code can assume a valid config without
//! re-checking it on every call.
//!
//! Callers that want to surface problems to a user run `validate()` first; it
//! reports human-readable descriptions without changing anything.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `height` | [`DEFAULT_HEIGHT`] |
//! | `top_threshold` / `bottom_threshold` | [`DEFAULT_THRESHOLD`] |
//! | `chunk_size` | [`DEFAULT_CHUNK_SIZE`] |
//! | `chunks_before` / `chunks_after` | 1 |
//! | `max_loaded_chunks` | [`DEFAULT_MAX_LOADED_CHUNKS`] |

/// Height used when a config carries a zero height.
pub const DEFAULT_HEIGHT: usize = 10;

/// Chunk size used when a config carries a zero chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Default distance (in rows) of both thresholds from their viewport edge.
pub const DEFAULT_THRESHOLD: i32 = 2;

/// Threshold value that disables threshold scrolling for one direction.
pub const THRESHOLD_DISABLED: i32 = -1;

/// Soft cap on resident chunks used when a config carries zero.
pub const DEFAULT_MAX_LOADED_CHUNKS: usize = 16;

// ---------------------------------------------------------------------------
// ViewportConfig
// ---------------------------------------------------------------------------

/// Shape of the viewport and its scrolling behavior.
///
/// `top_threshold` is a row offset from the top of the window and
/// `bottom_threshold` a row offset from the bottom. When the cursor reaches
/// the threshold row, further movement in that direction scrolls the window
/// instead of moving the cursor inside it. [`THRESHOLD_DISABLED`] (`-1`)
/// switches that direction to edge-based scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportConfig {
    /// Number of rows in the window.
    pub height: usize,
    /// Threshold row offset from the top, or `-1`.
    pub top_threshold: i32,
    /// Threshold row offset from the bottom, or `-1`.
    pub bottom_threshold: i32,
    /// Rows per chunk.
    pub chunk_size: usize,
    /// Cursor index at session start.
    pub initial_index: usize,
}

impl Default for ViewportConfig {
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

impl ViewportConfig {
    /// Create a config with the given height and defaults elsewhere.
    #[must_use]
    pub fn new(height: usize) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    /// Set both thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, top: i32, bottom: i32) -> Self {
        self.top_threshold = top;
        self.bottom_threshold = bottom;
        self
    }

    /// Disable both thresholds (pure edge-based scrolling).
    #[must_use]
    pub fn without_thresholds(self) -> Self {
        self.with_thresholds(THRESHOLD_DISABLED, THRESHOLD_DISABLED)
    }

    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the initial cursor index.
    #[must_use]
    pub fn with_initial_index(mut self, index: usize) -> Self {
        self.initial_index = index;
        self
    }

    /// Return a copy with every field clamped to its nearest valid value.
    ///
    /// - zero `height` / `chunk_size` become the defaults;
    /// - thresholds below `-1` become `-1`, thresholds past the last row
    ///   become the last row;
    /// - when both thresholds are enabled and their rows would cross
    ///   (`top + bottom > height - 1`), both are capped at `(height - 1) / 2`.
    #[must_use]
    pub fn normalized(self) -> Self {
        let height = if self.height == 0 {
            DEFAULT_HEIGHT
        } else {
            self.height
        };
        let chunk_size = if self.chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            self.chunk_size
        };

        let last_row = i32::try_from(height - 1).unwrap_or(i32::MAX);
        let mut top = self.top_threshold.clamp(THRESHOLD_DISABLED, last_row);
        let mut bottom = self.bottom_threshold.clamp(THRESHOLD_DISABLED, last_row);
        if top >= 0 && bottom >= 0 && i64::from(top) + i64::from(bottom) > i64::from(last_row) {
            let half = last_row / 2;
            top = top.min(half);
            bottom = bottom.min(half);
        }

        Self {
            height,
            top_threshold: top,
            bottom_threshold: bottom,
            chunk_size,
            initial_index: self.initial_index,
        }
    }

    /// Validate the config without modifying it.
    ///
    /// Returns a list of problems. An empty list means the config is already
    /// normalized.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.height == 0 {
            errors.push(format!(
                "viewport.height must be > 0 (defaults to {DEFAULT_HEIGHT})"
            ));
        }
        if self.chunk_size == 0 {
            errors.push(format!(
                "viewport.chunk_size must be > 0 (defaults to {DEFAULT_CHUNK_SIZE})"
            ));
        }

        let height = i64::try_from(self.height).unwrap_or(i64::MAX);
        for (name, value) in [
            ("top_threshold", self.top_threshold),
            ("bottom_threshold", self.bottom_threshold),
        ] {
            if value < THRESHOLD_DISABLED {
                errors.push(format!("viewport.{name} must be >= -1, got {value}"));
            } else if self.height > 0 && i64::from(value) >= height {
                errors.push(format!(
                    "viewport.{name} must be < height ({}), got {value}",
                    self.height
                ));
            }
        }

        if self.top_threshold >= 0
            && self.bottom_threshold >= 0
            && self.height > 0
            && i64::from(self.top_threshold) + i64::from(self.bottom_threshold) > height - 1
        {
            errors.push(format!(
                "viewport thresholds overlap: top ({}) + bottom ({}) must be <= height - 1 ({})",
                self.top_threshold,
                self.bottom_threshold,
                height - 1
            ));
        }

        errors
    }

    /// Window row of the top threshold, if enabled.
    #[inline]
    #[must_use]
    pub fn top_row(&self) -> Option<usize> {
        usize::try_from(self.top_threshold).ok()
    }

    /// Window row of the bottom threshold, if enabled.
    #[inline]
    #[must_use]
    pub fn bottom_row(&self) -> Option<usize> {
        let offset = usize::try_from(self.bottom_threshold).ok()?;
        Some(self.height.max(1).saturating_sub(1).saturating_sub(offset))
    }
}

// ---------------------------------------------------------------------------
// BoundingAreaConfig
// ---------------------------------------------------------------------------

/// Prefetch radius and eviction policy around the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingAreaConfig {
    /// Rows per chunk.
    pub chunk_size: usize,
    /// Whole chunks kept before the viewport.
    pub chunks_before: usize,
    /// Whole chunks kept after the viewport.
    pub chunks_after: usize,
    /// Soft cap on resident chunks. Exceeding it is reported, never enforced.
    pub max_loaded_chunks: usize,
    /// Emit unload requests for resident chunks outside the bounding area.
    pub unload_distant_chunks: bool,
}

impl Default for BoundingAreaConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunks_before: 1,
            chunks_after: 1,
            max_loaded_chunks: DEFAULT_MAX_LOADED_CHUNKS,
            unload_distant_chunks: true,
        }
    }
}

impl BoundingAreaConfig {
    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the prefetch radius in whole chunks.
    #[must_use]
    pub fn with_radius(mut self, before: usize, after: usize) -> Self {
        self.chunks_before = before;
        self.chunks_after = after;
        self
    }

    /// Enable or disable eviction of distant chunks.
    #[must_use]
    pub fn with_unload_distant_chunks(mut self, enabled: bool) -> Self {
        self.unload_distant_chunks = enabled;
        self
    }

    /// Set the soft cap on resident chunks.
    #[must_use]
    pub fn with_max_loaded_chunks(mut self, max: usize) -> Self {
        self.max_loaded_chunks = max;
        self
    }

    /// Return a copy with zero sizes replaced by the defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            chunk_size: if self.chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                self.chunk_size
            },
            max_loaded_chunks: if self.max_loaded_chunks == 0 {
                DEFAULT_MAX_LOADED_CHUNKS
            } else {
                self.max_loaded_chunks
            },
            ..self
        }
    }

    /// Validate the config without modifying it.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.chunk_size == 0 {
            errors.push(format!(
                "bounding.chunk_size must be > 0 (defaults to {DEFAULT_CHUNK_SIZE})"
            ));
        }
        if self.max_loaded_chunks == 0 {
            errors.push(format!(
                "bounding.max_loaded_chunks must be > 0 (defaults to {DEFAULT_MAX_LOADED_CHUNKS})"
            ));
        }

        // The bounding area spans the viewport's chunks plus the radius, so a
        // cap below the radius alone is exceeded on every reconcile.
        let radius = self.chunks_before.saturating_add(self.chunks_after);
        if self.max_loaded_chunks > 0 && radius >= self.max_loaded_chunks {
            errors.push(format!(
                "bounding.max_loaded_chunks ({}) is not larger than chunks_before + chunks_after ({radius})",
                self.max_loaded_chunks
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_viewport_config_is_valid() {
        let config = ViewportConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.normalized(), config);
    }

    #[test]
    fn zero_height_falls_back_to_default() {
        let config = ViewportConfig::new(0).normalized();
        assert_eq!(config.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn zero_chunk_size_falls_back_to_default() {
        let config = ViewportConfig::default().with_chunk_size(0).normalized();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        let bounding = BoundingAreaConfig::default().with_chunk_size(0).normalized();
        assert_eq!(bounding.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn thresholds_clamp_into_range() {
        let config = ViewportConfig::new(5).with_thresholds(-7, 40).normalized();
        assert_eq!(config.top_threshold, THRESHOLD_DISABLED);
        assert_eq!(config.bottom_threshold, 4);
    }

    #[test]
    fn crossing_thresholds_are_capped_at_half() {
        let config = ViewportConfig::new(5).with_thresholds(4, 4).normalized();
        assert_eq!(config.top_threshold, 2);
        assert_eq!(config.bottom_threshold, 2);
        assert_eq!(config.top_row(), Some(2));
        assert_eq!(config.bottom_row(), Some(2));
    }

    #[test]
    fn single_threshold_is_not_capped() {
        let config = ViewportConfig::new(5).with_thresholds(4, -1).normalized();
        assert_eq!(config.top_threshold, 4);
        assert_eq!(config.bottom_row(), None);
    }

    #[test]
    fn threshold_rows() {
        let config = ViewportConfig::new(10).with_thresholds(2, 2);
        assert_eq!(config.top_row(), Some(2));
        assert_eq!(config.bottom_row(), Some(7));

        let edge = ViewportConfig::new(10).without_thresholds();
        assert_eq!(edge.top_row(), None);
        assert_eq!(edge.bottom_row(), None);
    }

    #[test]
    fn validate_catches_zero_height() {
        let errors = ViewportConfig::new(0).validate();
        assert!(errors.iter().any(|e| e.contains("viewport.height")));
    }

    #[test]
    fn validate_catches_bad_thresholds() {
        let errors = ViewportConfig::new(10).with_thresholds(-3, 10).validate();
        assert!(errors.iter().any(|e| e.contains("top_threshold")));
        assert!(errors.iter().any(|e| e.contains("bottom_threshold")));
    }

    #[test]
    fn validate_catches_overlap() {
        let errors = ViewportConfig::new(4).with_thresholds(2, 2).validate();
        assert!(errors.iter().any(|e| e.contains("overlap")));
    }

    #[test]
    fn validate_catches_small_chunk_cap() {
        let config = BoundingAreaConfig::default()
            .with_radius(4, 4)
            .with_max_loaded_chunks(6);
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.contains("max_loaded_chunks")));
    }

    #[test]
    fn default_bounding_config_is_valid() {
        assert!(BoundingAreaConfig::default().validate().is_empty());
    }
}
