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
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Where the audio behind each pad's clip locator lives.
#[derive(Deserialize, Clone, Default)]
pub struct Clips {
    /// Directory holding the clip files, looked up by the locator's file name.
    directory: Option<PathBuf>,

    /// Decode every pad's clip at startup (default: true).
    preload: Option<bool>,
}

impl Clips {
    pub fn new(directory: &Path) -> Clips {
        Clips {
            directory: Some(directory.to_path_buf()),
            preload: None,
        }
    }

    /// Anchors a relative directory at the given base.
    pub(super) fn relative_to(self, base: &Path) -> Clips {
        Clips {
            directory: self.directory.map(|directory| {
                if directory.is_relative() {
                    base.join(directory)
                } else {
                    directory
                }
            }),
            ..self
        }
    }

    pub fn directory(&self) -> Option<PathBuf> {
        self.directory.clone()
    }

    pub fn preload(&self) -> bool {
        self.preload.unwrap_or(true)
    }
}
