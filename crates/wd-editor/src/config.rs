//! Editor configuration.
//!
//! All sizes are in window pixels. Every field has a default, so a JSON
//! file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Side of a resize handle square.
    pub handle_width: f64,
    /// Side of a reorder / anchor button.
    pub button_width: f64,
    /// Selection outline thickness.
    pub border_width: f64,
    /// Gap kept between the pointer and the drag ghost's bottom edge.
    pub ghost_offset: f64,
    pub ghost_size: (f64, f64),
    /// Hold time before a press becomes an in-place drag.
    pub long_press_ms: u64,
    pub undo_depth: usize,
    /// Row height of the widget tree sidebar.
    pub tree_row_height: f64,
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_width: 6.0,
            button_width: 16.0,
            border_width: 2.0,
            ghost_offset: 20.0,
            ghost_size: (100.0, 100.0),
            long_press_ms: 1000,
            undo_depth: 100,
            tree_row_height: 24.0,
        }
    }
}
