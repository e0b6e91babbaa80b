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

//! Coordinates clip resolution, loading and voice scheduling.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::ClipError;
use super::loader::ClipLoader;
use super::voice::{Voice, VoiceManager};
use crate::audio::mixer::{ActiveSource, SourceSender};
use crate::audio::Clip;

/// Default maximum number of voices sounding at once.
pub const DEFAULT_MAX_VOICES: usize = 16;

/// Global source ID counter.
static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Turns clip triggers into mixer sources.
pub struct ClipEngine {
    /// Where clip files are looked up.
    clip_directory: Option<PathBuf>,
    loader: Mutex<ClipLoader>,
    voice_manager: Mutex<VoiceManager>,
    /// Channel to the audio thread that owns the mixer.
    source_tx: SourceSender,
}

impl ClipEngine {
    pub fn new(
        clip_directory: Option<PathBuf>,
        sample_rate: u32,
        max_voices: usize,
        source_tx: SourceSender,
    ) -> Self {
        Self {
            clip_directory,
            loader: Mutex::new(ClipLoader::new(sample_rate)),
            voice_manager: Mutex::new(VoiceManager::new(max_voices)),
            source_tx,
        }
    }

    /// Maps a clip locator to a file on disk.
    ///
    /// URL locators are looked up by file name in the clip directory. Plain paths are
    /// used as-is when absolute and joined to the clip directory otherwise.
    pub fn resolve(&self, src: &str) -> Result<PathBuf, ClipError> {
        if let Some((_, rest)) = src.split_once("://") {
            let file_name = rest
                .rsplit('/')
                .next()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| ClipError::InvalidLocator(src.to_string()))?;
            let directory = self
                .clip_directory
                .as_ref()
                .ok_or_else(|| ClipError::NoClipDirectory(src.to_string()))?;
            return Ok(directory.join(file_name));
        }

        let path = Path::new(src);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        match &self.clip_directory {
            Some(directory) => Ok(directory.join(path)),
            None => Err(ClipError::NoClipDirectory(src.to_string())),
        }
    }

    /// Decodes the clip ahead of its first trigger.
    pub fn preload(&self, clip: &Clip) -> Result<(), ClipError> {
        let path = self.resolve(clip.src())?;
        self.loader.lock().load(&path)?;
        Ok(())
    }

    /// Starts the clip from its beginning, cutting a previous voice of the same clip.
    pub fn trigger(&self, clip: &Clip) -> Result<(), ClipError> {
        let path = self.resolve(clip.src())?;
        let loaded = self.loader.lock().load(&path)?;

        let source_id = NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let voice = Voice::new(clip.id(), cancelled.clone(), finished.clone());
        let voice_id = voice.id();

        // Hold the voice lock across the send so concurrent triggers of one clip
        // reach the mixer in the same order they were cut.
        let mut voices = self.voice_manager.lock();
        voices.add_voice(voice);
        let sent = self.source_tx.send(ActiveSource {
            id: source_id,
            source: loaded.create_source(),
            cancelled,
            finished,
        });
        if sent.is_err() {
            // The voice never reached the mixer, so nothing would ever finish it.
            voices.remove(voice_id);
        }
        drop(voices);

        if sent.is_err() {
            warn!(clip = clip.id(), "Audio output is gone, dropping clip");
            return Err(ClipError::OutputClosed);
        }

        debug!(clip = clip.id(), source_id, "Clip triggered");
        Ok(())
    }

    /// Cuts every sounding clip.
    pub fn stop_all(&self) {
        let stopped = self.voice_manager.lock().clear();
        if stopped > 0 {
            info!(stopped, "All clips stopped");
        }
    }

    /// Returns the number of voices still sounding.
    pub fn active_voice_count(&self) -> usize {
        self.voice_manager.lock().active_count()
    }

    /// Returns the total memory used by decoded clips.
    pub fn memory_usage(&self) -> usize {
        self.loader.lock().total_memory_usage()
    }
}

impl std::fmt::Debug for ClipEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEngine")
            .field("clip_directory", &self.clip_directory)
            .field("active_voices", &self.active_voice_count())
            .field("memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}
