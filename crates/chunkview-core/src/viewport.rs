#![forbid(unsafe_code)]

//! Cursor and viewport state machine.
//!
//! [`ViewportState`] is replaced, never mutated in place: every navigation
//! intent takes the current state, a normalized [`ViewportConfig`] and the
//! dataset size, and returns the next state.
//!
//! # Scrolling rules
//!
//! - With a threshold enabled, the cursor moves freely inside the window until
//!   it sits on the threshold row. Further movement in that direction scrolls
//!   the window by one row and keeps the cursor pinned on the threshold row,
//!   until the window reaches the dataset edge; from there the cursor moves on
//!   toward the edge.
//! - With a threshold disabled (`-1`), the window scrolls only when the cursor
//!   would leave it.
//!
//! # Invariants
//!
//! After every operation, for a non-empty dataset:
//!
//! 1. `cursor_index == viewport_start_index + cursor_viewport_index`
//! 2. `cursor_index < total`
//! 3. `viewport_start_index <= total.saturating_sub(height)`
//! 4. `cursor_viewport_index < height`
//!
//! [`ViewportState::normalize`] is the single place these are restored;
//! operations may break them transiently before calling it.

use crate::config::ViewportConfig;

/// Cursor position and the window around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ViewportState {
    /// Absolute dataset index of the cursor.
    pub cursor_index: usize,
    /// Absolute dataset index of the first row in the window.
    pub viewport_start_index: usize,
    /// Cursor offset inside the window.
    pub cursor_viewport_index: usize,
    /// The cursor sits on the enabled top threshold row.
    pub is_at_top_threshold: bool,
    /// The cursor sits on the enabled bottom threshold row.
    pub is_at_bottom_threshold: bool,
    /// The cursor is on the first dataset item.
    pub at_dataset_start: bool,
    /// The cursor is on the last dataset item.
    pub at_dataset_end: bool,
}

impl ViewportState {
    /// Session-start state: cursor on `config.initial_index`, clamped.
    #[must_use]
    pub fn initial(config: &ViewportConfig, total: usize) -> Self {
        Self::default().jump_to_index(config.initial_index, config, total)
    }

    /// Restore the state invariants.
    ///
    /// Clamps the cursor to `[0, total - 1]`, pulls the window start into
    /// `[0, max(0, total - height)]` while keeping the cursor inside the
    /// window, recomputes the cursor offset and the four flags. An empty
    /// dataset yields the zeroed state.
    #[must_use]
    pub fn normalize(self, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let height = config.height.max(1);
        let last = total - 1;
        let max_start = total.saturating_sub(height);

        let cursor = self.cursor_index.min(last);
        let mut start = self.viewport_start_index.min(max_start);
        if cursor < start {
            start = cursor;
        } else if cursor >= start + height {
            start = cursor + 1 - height;
        }
        let offset = cursor - start;

        Self {
            cursor_index: cursor,
            viewport_start_index: start,
            cursor_viewport_index: offset,
            is_at_top_threshold: config.top_row() == Some(offset),
            is_at_bottom_threshold: config.bottom_row() == Some(offset),
            at_dataset_start: cursor == 0,
            at_dataset_end: cursor == last,
        }
    }

    /// Move the cursor one row up.
    ///
    /// Returns `self` unchanged when the cursor is already on index 0.
    #[must_use]
    pub fn cursor_up(self, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        if self.cursor_index == 0 {
            return self;
        }
        if self.cursor_index >= total {
            return self.normalize(config, total);
        }

        let mut next = self;
        match config.top_row() {
            Some(_) if self.is_at_top_threshold && self.viewport_start_index > 0 => {
                next.viewport_start_index -= 1;
                next.cursor_index -= 1;
            }
            Some(row) => {
                next.cursor_index -= 1;
                if next.cursor_index < next.viewport_start_index + row {
                    next.viewport_start_index = next
                        .viewport_start_index
                        .min(next.cursor_index.saturating_sub(row));
                }
            }
            None => {
                next.cursor_index -= 1;
                if next.cursor_index < next.viewport_start_index {
                    next.viewport_start_index = next.cursor_index;
                }
            }
        }
        next.normalize(config, total)
    }

    /// Move the cursor one row down.
    ///
    /// Returns `self` unchanged when the cursor is already on the last item.
    #[must_use]
    pub fn cursor_down(self, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let last = total - 1;
        if self.cursor_index == last {
            return self;
        }
        if self.cursor_index > last {
            return self.normalize(config, total);
        }

        let height = config.height.max(1);
        let max_start = total.saturating_sub(height);
        let mut next = self;
        match config.bottom_row() {
            Some(_) if self.is_at_bottom_threshold && self.viewport_start_index < max_start => {
                next.viewport_start_index += 1;
                next.cursor_index += 1;
            }
            Some(row) => {
                next.cursor_index += 1;
                if next.cursor_index > next.viewport_start_index + row {
                    next.viewport_start_index = next
                        .viewport_start_index
                        .max((next.cursor_index - row).min(max_start));
                }
            }
            None => {
                next.cursor_index += 1;
                if next.cursor_index >= next.viewport_start_index + height {
                    next.viewport_start_index = next.cursor_index + 1 - height;
                }
            }
        }
        next.normalize(config, total)
    }

    /// Move the cursor `height` rows up and land it on the top threshold row
    /// (or the top edge when the threshold is disabled).
    #[must_use]
    pub fn page_up(self, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let height = config.height.max(1);
        let cursor = self.cursor_index.min(total - 1).saturating_sub(height);
        let start = match config.top_row() {
            Some(row) => cursor.saturating_sub(row),
            None => cursor,
        };
        Self {
            cursor_index: cursor,
            viewport_start_index: start,
            ..self
        }
        .normalize(config, total)
    }

    /// Move the cursor `height` rows down and land it on the bottom threshold
    /// row (or the bottom edge when the threshold is disabled).
    #[must_use]
    pub fn page_down(self, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let height = config.height.max(1);
        let cursor = self.cursor_index.saturating_add(height).min(total - 1);
        let start = match config.bottom_row() {
            Some(row) => cursor.saturating_sub(row),
            None => (cursor + 1).saturating_sub(height),
        };
        Self {
            cursor_index: cursor,
            viewport_start_index: start.min(total.saturating_sub(height)),
            ..self
        }
        .normalize(config, total)
    }

    /// Put the cursor on index 0 with the window at the top.
    #[must_use]
    pub fn jump_to_start(self, config: &ViewportConfig, total: usize) -> Self {
        Self {
            cursor_index: 0,
            viewport_start_index: 0,
            ..self
        }
        .normalize(config, total)
    }

    /// Put the cursor on the last item with the window at the bottom.
    ///
    /// When the dataset fits in the window, the window starts at 0 and the
    /// cursor offset is `total - 1`.
    #[must_use]
    pub fn jump_to_end(self, config: &ViewportConfig, total: usize) -> Self {
        let height = config.height.max(1);
        Self {
            cursor_index: total.saturating_sub(1),
            viewport_start_index: total.saturating_sub(height),
            ..self
        }
        .normalize(config, total)
    }

    /// Put the cursor on an arbitrary index.
    ///
    /// The window stays where it is when the target is already visible.
    /// Otherwise it moves just far enough to show the target on the threshold
    /// row of the side it entered from (or on that edge when the threshold is
    /// disabled).
    #[must_use]
    pub fn jump_to_index(self, index: usize, config: &ViewportConfig, total: usize) -> Self {
        if total == 0 {
            return Self::default();
        }
        let height = config.height.max(1);
        let cursor = index.min(total - 1);
        let mut start = self.viewport_start_index.min(total.saturating_sub(height));

        if cursor < start {
            start = match config.top_row() {
                Some(row) => cursor.saturating_sub(row),
                None => cursor,
            };
        } else if cursor >= start + height {
            start = match config.bottom_row() {
                Some(row) => cursor.saturating_sub(row),
                None => cursor + 1 - height,
            };
        }

        Self {
            cursor_index: cursor,
            viewport_start_index: start,
            ..self
        }
        .normalize(config, total)
    }

    /// Absolute index range covered by the window, clamped to the dataset.
    #[must_use]
    pub fn window(&self, config: &ViewportConfig, total: usize) -> std::ops::Range<usize> {
        let start = self.viewport_start_index.min(total);
        start..start.saturating_add(config.height.max(1)).min(total)
    }

    /// Whether `cursor_index == viewport_start_index + cursor_viewport_index`.
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.viewport_start_index.checked_add(self.cursor_viewport_index)
            == Some(self.cursor_index)
    }
}
