// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::Arc;

use parking_lot::RwLock;

/// The placeholder shown before any pad has been triggered.
pub const DEFAULT_PLACEHOLDER: &str = "***";

/// The text shown by the display: the id of the last triggered pad.
#[derive(Clone)]
pub struct DisplayState {
    placeholder: String,
    current: Arc<RwLock<String>>,
}

impl DisplayState {
    /// Creates a display state showing the placeholder.
    pub fn new(placeholder: &str) -> DisplayState {
        DisplayState {
            placeholder: placeholder.to_string(),
            current: Arc::new(RwLock::new(placeholder.to_string())),
        }
    }

    /// Returns the current text.
    pub fn get(&self) -> String {
        self.current.read().clone()
    }

    /// Replaces the current text.
    pub fn set(&self, text: &str) {
        *self.current.write() = text.to_string();
    }

    /// Returns to the placeholder.
    pub fn reset(&self) {
        self.set(&self.placeholder);
    }

    /// True until a pad has been triggered.
    pub fn is_placeholder(&self) -> bool {
        *self.current.read() == self.placeholder
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        DisplayState::new(DEFAULT_PLACEHOLDER)
    }
}
