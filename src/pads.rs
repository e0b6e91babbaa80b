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

//! The fixed pad registry.
//!
//! The order of [`PADS`] is the on-screen order (three columns, left to right,
//! top to bottom) and must never be re-sorted.

use std::collections::HashSet;
use std::fmt;

/// The number of pads in the registry.
pub const PAD_COUNT: usize = 9;

/// A single drum pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pad {
    /// Stable identifier, used as the element id and the display label.
    id: &'static str,
    /// The uppercase trigger key.
    key: char,
    /// The locator of the pad's audio clip.
    clip: &'static str,
}

impl Pad {
    const fn new(id: &'static str, key: char, clip: &'static str) -> Pad {
        Pad { id, key, clip }
    }

    /// Returns the pad identifier.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the trigger key.
    pub fn key(&self) -> char {
        self.key
    }

    /// Returns the trigger key as a string, which is also the id of the pad's clip element.
    pub fn key_str(&self) -> String {
        self.key.to_string()
    }

    /// Returns the clip locator.
    pub fn clip(&self) -> &'static str {
        self.clip
    }

    /// Returns the resource name of the clip, e.g. `Heater-4_1`.
    pub fn clip_name(&self) -> &'static str {
        let file = self.clip.rsplit('/').next().unwrap_or(self.clip);
        file.rsplit_once('.').map_or(file, |(stem, _)| stem)
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.id, self.key, self.clip_name())
    }
}

/// The pads, in layout order.
pub static PADS: [Pad; PAD_COUNT] = [
    Pad::new(
        "heater-1",
        'Q',
        "https://s3.amazonaws.com/freecodecamp/drums/Heater-1.mp3",
    ),
    Pad::new(
        "heater-2",
        'W',
        "https://s3.amazonaws.com/freecodecamp/drums/Heater-2.mp3",
    ),
    Pad::new(
        "heater-3",
        'E',
        "https://s3.amazonaws.com/freecodecamp/drums/Heater-3.mp3",
    ),
    Pad::new(
        "heater-4",
        'A',
        "https://s3.amazonaws.com/freecodecamp/drums/Heater-4_1.mp3",
    ),
    Pad::new(
        "heater-6",
        'S',
        "https://s3.amazonaws.com/freecodecamp/drums/Heater-6.mp3",
    ),
    Pad::new(
        "open-hh",
        'D',
        "https://s3.amazonaws.com/freecodecamp/drums/Dsc_Oh.mp3",
    ),
    Pad::new(
        "kick-n-hh",
        'Z',
        "https://s3.amazonaws.com/freecodecamp/drums/Kick_n_Hat.mp3",
    ),
    Pad::new(
        "kick",
        'X',
        "https://s3.amazonaws.com/freecodecamp/drums/RP4_KICK_1.mp3",
    ),
    Pad::new(
        "closed-hh",
        'C',
        "https://s3.amazonaws.com/freecodecamp/drums/Cev_H2.mp3",
    ),
];

/// Returns all pads in layout order.
pub fn all() -> &'static [Pad] {
    &PADS
}

/// Finds the first pad bound to the given (already normalized) key.
pub fn find_by_key(key: char) -> Option<&'static Pad> {
    PADS.iter().find(|pad| pad.key == key)
}

/// Finds the pad with the given identifier.
pub fn find_by_id(id: &str) -> Option<&'static Pad> {
    PADS.iter().find(|pad| pad.id == id)
}

/// Problems with a pad table.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PadError {
    #[error("expected 9 pads, found {0}")]
    WrongCount(usize),

    #[error("trigger key {0} is bound to more than one pad")]
    DuplicateKey(char),

    #[error("pad id {0} is used more than once")]
    DuplicateId(String),

    #[error("pad {0} has trigger key {1:?}, which is not an uppercase character")]
    InvalidKey(String, char),
}

/// Checks a pad table: exactly nine pads, unique ids, unique uppercase keys.
pub fn validate(pads: &[Pad]) -> Result<(), PadError> {
    if pads.len() != PAD_COUNT {
        return Err(PadError::WrongCount(pads.len()));
    }

    let mut ids = HashSet::new();
    let mut keys = HashSet::new();
    for pad in pads {
        if !pad.key.is_uppercase() && !pad.key.is_ascii_digit() {
            return Err(PadError::InvalidKey(pad.id.to_string(), pad.key));
        }
        if !ids.insert(pad.id) {
            return Err(PadError::DuplicateId(pad.id.to_string()));
        }
        if !keys.insert(pad.key) {
            return Err(PadError::DuplicateKey(pad.key));
        }
    }

    Ok(())
}
