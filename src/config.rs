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
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use crate::pads;

mod audio;
mod clips;
mod display;
mod error;

pub use self::audio::Audio;
pub use self::clips::Clips;
pub use self::display::Display;
pub use self::error::ConfigError;

/// The configuration for the drum machine.
#[derive(Deserialize, Clone)]
pub struct Machine {
    /// The audio configuration.
    audio: Audio,
    /// Where clips are found.
    #[serde(default)]
    clips: Clips,
    /// The status display.
    #[serde(default)]
    display: Display,
}

impl Machine {
    /// Creates a new machine configuration with default clip and display settings.
    pub fn new(audio: Audio) -> Machine {
        Machine {
            audio,
            clips: Clips::default(),
            display: Display::default(),
        }
    }

    /// Parse a machine configuration from a YAML file. A relative clip directory is
    /// taken relative to the file.
    pub fn deserialize(path: &Path) -> Result<Machine, ConfigError> {
        let mut machine = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Machine>()?;

        if let Some(base) = path.parent() {
            machine.clips = machine.clips.relative_to(base);
        }
        machine.validate()?;
        Ok(machine)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let placeholder = self.display.placeholder();
        if placeholder.is_empty() || pads::find_by_id(placeholder).is_some() {
            return Err(ConfigError::InvalidPlaceholder(placeholder.to_string()));
        }
        Ok(())
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    pub fn clips(&self) -> &Clips {
        &self.clips
    }

    pub fn display(&self) -> &Display {
        &self.display
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn write_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drum-machine.yaml");
        fs::write(&path, contents)?;
        Ok((dir, path))
    }

    #[test]
    fn test_full_config() -> Result<(), Box<dyn Error>> {
        let (dir, path) = write_config(
            r#"
audio:
  device: mock-kit
  sample_rate: 48000
  buffer_size: 256
  max_voices: 4
clips:
  directory: samples
  preload: false
display:
  placeholder: "---"
"#,
        )?;

        let machine = Machine::deserialize(&path)?;
        assert_eq!("mock-kit", machine.audio().device());
        assert_eq!(48000, machine.audio().sample_rate());
        assert_eq!(Some(256), machine.audio().buffer_size());
        assert_eq!(4, machine.audio().max_voices());
        assert_eq!(Some(dir.path().join("samples")), machine.clips().directory());
        assert!(!machine.clips().preload());
        assert_eq!("---", machine.display().placeholder());
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<(), Box<dyn Error>> {
        let (_dir, path) = write_config("audio:\n  device: default\n")?;

        let machine = Machine::deserialize(&path)?;
        assert_eq!("default", machine.audio().device());
        assert_eq!(44100, machine.audio().sample_rate());
        assert_eq!(None, machine.audio().buffer_size());
        assert_eq!(None, machine.clips().directory());
        assert!(machine.clips().preload());
        assert_eq!("***", machine.display().placeholder());
        Ok(())
    }

    #[test]
    fn test_absolute_clip_directory() -> Result<(), Box<dyn Error>> {
        let (_dir, path) =
            write_config("audio:\n  device: default\nclips:\n  directory: /srv/drums\n")?;

        let machine = Machine::deserialize(&path)?;
        assert_eq!(Some(PathBuf::from("/srv/drums")), machine.clips().directory());
        Ok(())
    }

    #[test]
    fn test_placeholder_must_not_be_a_pad() -> Result<(), Box<dyn Error>> {
        let (_dir, path) =
            write_config("audio:\n  device: default\ndisplay:\n  placeholder: kick\n")?;

        match Machine::deserialize(&path) {
            Err(ConfigError::InvalidPlaceholder(placeholder)) => assert_eq!("kick", placeholder),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("placeholder equal to a pad id was accepted"),
        }
        Ok(())
    }

    #[test]
    fn test_missing_device() -> Result<(), Box<dyn Error>> {
        let (_dir, path) = write_config("clips:\n  directory: /srv/drums\n")?;
        assert!(matches!(
            Machine::deserialize(&path),
            Err(ConfigError::Load(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Machine::deserialize(Path::new("/nonexistent/drum-machine.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
