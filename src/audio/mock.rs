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

use parking_lot::Mutex;
use tracing::info;

use super::Clip;

/// A mock device. Doesn't actually play anything, but remembers what it was asked to play.
#[derive(Clone)]
pub struct Device {
    name: String,
    played: Arc<Mutex<Vec<Clip>>>,
    failing: bool,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            played: Arc::new(Mutex::new(Vec::new())),
            failing: false,
        }
    }

    /// Gets a mock device whose every play fails.
    pub fn failing(name: &str) -> Device {
        Device {
            failing: true,
            ..Device::get(name)
        }
    }

    /// Returns every clip played so far, oldest first.
    pub fn played(&self) -> Vec<Clip> {
        self.played.lock().clone()
    }

    /// Returns the locators of every clip played so far, oldest first.
    pub fn played_srcs(&self) -> Vec<String> {
        self.played
            .lock()
            .iter()
            .map(|clip| clip.src().to_string())
            .collect()
    }
}

impl super::Device for Device {
    fn play(&self, clip: &Clip) -> Result<(), Box<dyn Error>> {
        if self.failing {
            return Err(format!("mock device {} refuses to play {}", self.name, clip).into());
        }

        info!(device = self.name, clip = clip.id(), src = clip.src(), "Playing clip.");
        self.played.lock().push(clip.clone());
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use crate::audio::Device as _;

    use super::*;

    #[test]
    fn test_mock_records_plays() -> Result<(), Box<dyn Error>> {
        let device = Device::get("mock");
        let observer = device.clone();

        device.play(&Clip::new("Q", "a.mp3"))?;
        device.play(&Clip::new("Q", "a.mp3"))?;
        device.play(&Clip::new("X", "b.mp3"))?;

        assert_eq!(vec!["a.mp3", "a.mp3", "b.mp3"], observer.played_srcs());
        assert_eq!("X", observer.played()[2].id());
        Ok(())
    }

    #[test]
    fn test_failing_mock() {
        let device = Device::failing("broken");
        assert!(device.play(&Clip::new("Q", "a.mp3")).is_err());
        assert!(device.played().is_empty());
    }
}
