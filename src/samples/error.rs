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
use std::path::PathBuf;

/// Error types for clip resolution, loading and playback.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("no clip directory is configured, unable to resolve {0}")]
    NoClipDirectory(String),

    #[error("clip locator {0} has no file name")]
    InvalidLocator(String),

    #[error("clip file {0} does not exist")]
    NotFound(PathBuf),

    #[error("no audio track found in {0}")]
    NoAudioTrack(PathBuf),

    #[error("no samples decoded from {0}")]
    Empty(PathBuf),

    #[error("{0} does not specify a sample rate")]
    UnknownSampleRate(PathBuf),

    #[error("audio output has gone away")]
    OutputClosed,

    #[error("Audio file error: {0}")]
    AudioError(#[from] symphonia::core::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
