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

//! Clip playback for the drum pads.
//!
//! This module provides:
//! - Clip resolution from locators to local files
//! - Clip loading and caching (in-memory for zero-latency playback)
//! - Voice management with one voice per clip
//! - Integration with the audio mixer

mod engine;
mod error;
mod loader;
mod voice;

pub use engine::{ClipEngine, DEFAULT_MAX_VOICES};
pub use error::ClipError;

#[allow(unused_imports)]
pub use loader::{ClipLoader, LoadedClip};
#[allow(unused_imports)]
pub use voice::{Voice, VoiceManager};
