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
use serde::Deserialize;

use crate::samples::DEFAULT_MAX_VOICES;

const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone)]
pub struct Audio {
    /// The audio device. "default" picks the host's default output, names starting
    /// with "mock" pick the mock device.
    device: String,

    /// Output sample rate in Hz (default: 44100). Clips are resampled to it.
    sample_rate: Option<u32>,

    /// CPAL stream buffer size in frames. The backend default when unset.
    buffer_size: Option<u32>,

    /// Maximum number of clips sounding at once.
    max_voices: Option<usize>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            buffer_size: None,
            max_voices: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the output sample rate (default: 44100)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the fixed stream buffer size, if any.
    pub fn buffer_size(&self) -> Option<u32> {
        self.buffer_size
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices.unwrap_or(DEFAULT_MAX_VOICES).max(1)
    }
}
