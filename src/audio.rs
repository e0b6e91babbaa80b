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
use std::{error::Error, fmt, sync::Arc};

use crate::config;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod source;

/// A playable clip: the id of the clip element and the locator of its audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    id: String,
    src: String,
}

impl Clip {
    pub fn new(id: &str, src: &str) -> Clip {
        Clip {
            id: id.to_string(),
            src: src.to_string(),
        }
    }

    /// The clip element id, which is the pad's trigger key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The locator of the clip's audio.
    pub fn src(&self) -> &str {
        &self.src
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.src)
    }
}

pub trait Device: fmt::Display + Send + Sync {
    /// Starts the clip from its beginning. Returns as soon as playback is scheduled.
    /// A clip that is still playing is cut and restarted.
    fn play(&self, clip: &Clip) -> Result<(), Box<dyn Error>>;

    /// Loads the given clips ahead of their first trigger.
    fn preload(&self, _clips: &[Clip]) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the configuration.
pub fn get_device(config: &config::Machine) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.audio().device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(device)));
    };

    Ok(Arc::new(cpal::Device::get(config.audio(), config.clips())?))
}
