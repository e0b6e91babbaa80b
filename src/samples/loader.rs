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

//! Clip loading and caching.
//!
//! Clips are decoded entirely into memory the first time they are needed and
//! kept for the rest of the session.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use super::error::ClipError;
use crate::audio::source::ClipSource;

/// A decoded clip. The sample data is shared between every voice playing it.
#[derive(Clone)]
pub struct LoadedClip {
    /// Interleaved f32 samples.
    data: Arc<Vec<f32>>,
    channel_count: u16,
    sample_rate: u32,
}

impl LoadedClip {
    /// Creates a new playback cursor at the start of the clip.
    pub fn create_source(&self) -> ClipSource {
        ClipSource::new(self.data.clone(), self.channel_count)
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Loads clips from disk and caches them by path.
pub struct ClipLoader {
    cache: HashMap<PathBuf, LoadedClip>,
    /// Sample rate of the audio output; clips are resampled to it.
    target_sample_rate: u32,
}

impl ClipLoader {
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            cache: HashMap::new(),
            target_sample_rate,
        }
    }

    /// Loads a clip into memory, or returns the cached copy.
    pub fn load(&mut self, path: &Path) -> Result<LoadedClip, ClipError> {
        if let Some(clip) = self.cache.get(path) {
            debug!(path = ?path, "Using cached clip");
            return Ok(clip.clone());
        }

        if !path.is_file() {
            return Err(ClipError::NotFound(path.to_path_buf()));
        }

        info!(path = ?path, "Loading clip into memory");
        let (samples, channel_count, source_rate) = decode_file(path)?;

        let (samples, sample_rate) = if source_rate != self.target_sample_rate {
            debug!(
                source_rate,
                target_rate = self.target_sample_rate,
                "Resampling clip"
            );
            (
                resample_linear(&samples, channel_count, source_rate, self.target_sample_rate),
                self.target_sample_rate,
            )
        } else {
            (samples, source_rate)
        };

        let loaded = LoadedClip {
            data: Arc::new(samples),
            channel_count,
            sample_rate,
        };

        info!(
            path = ?path,
            channels = channel_count,
            sample_rate,
            duration_ms = loaded.duration().as_millis(),
            memory_kb = loaded.memory_size() / 1024,
            "Clip loaded"
        );

        self.cache.insert(path.to_path_buf(), loaded.clone());
        Ok(loaded)
    }

    /// Returns true if the clip at this path has already been decoded.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.contains_key(path)
    }

    /// Returns the total memory used by cached clips.
    pub fn total_memory_usage(&self) -> usize {
        self.cache.values().map(LoadedClip::memory_size).sum()
    }
}

impl std::fmt::Debug for ClipLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipLoader")
            .field("cached_clips", &self.cache.len())
            .field("target_sample_rate", &self.target_sample_rate)
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}

/// Decodes a whole file to interleaved f32 samples.
/// Returns the samples, the channel count and the sample rate.
fn decode_file(path: &Path) -> Result<(Vec<f32>, u16, u32), ClipError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ClipError::NoAudioTrack(path.to_path_buf()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| ClipError::UnknownSampleRate(path.to_path_buf()))?;
    let mut channel_count = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped rather than failing the whole clip.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(path = ?path, error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        if channel_count == 0 {
            channel_count = spec.channels.count() as u16;
        }
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() || channel_count == 0 {
        return Err(ClipError::Empty(path.to_path_buf()));
    }

    Ok((samples, channel_count, sample_rate))
}

/// Resamples interleaved samples using linear interpolation, which is plenty for
/// short one-shot drum hits.
fn resample_linear(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channel_count as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);
    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let s0 = samples
                .get(source_frame * channels + channel)
                .copied()
                .unwrap_or(0.0);
            let s1 = samples
                .get((source_frame + 1) * channels + channel)
                .copied()
                .unwrap_or(s0);
            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a 16-bit WAV file with the given frames.
    pub(crate) fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
        for frame in 0..frames {
            for _ in 0..channels {
                let value = if frame % 2 == 0 { 8192i16 } else { -8192i16 };
                writer.write_sample(value).expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn test_load_and_cache() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("Heater-1.wav");
        write_wav(&path, 2, 44100, 441);

        let mut loader = ClipLoader::new(44100);
        assert!(!loader.is_cached(&path));

        let clip = loader.load(&path)?;
        assert_eq!(2, clip.channel_count());
        assert_eq!(44100, clip.sample_rate());
        assert_eq!(441, clip.frames());
        assert_eq!(10, clip.duration().as_millis());
        assert!(loader.is_cached(&path));
        assert_eq!(441 * 2 * 4, loader.total_memory_usage());

        // Served from the cache even once the file is gone.
        std::fs::remove_file(&path)?;
        assert_eq!(441, loader.load(&path)?.frames());
        Ok(())
    }

    #[test]
    fn test_load_resamples() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("kick.wav");
        write_wav(&path, 1, 22050, 100);

        let mut loader = ClipLoader::new(44100);
        let clip = loader.load(&path)?;
        assert_eq!(44100, clip.sample_rate());
        assert_eq!(200, clip.frames());
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let mut loader = ClipLoader::new(44100);
        match loader.load(Path::new("/nonexistent/clip.mp3")) {
            Err(ClipError::NotFound(path)) => {
                assert_eq!(Path::new("/nonexistent/clip.mp3"), path)
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.frames())),
        }
    }

    #[test]
    fn test_load_garbage() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio")?;

        let mut loader = ClipLoader::new(44100);
        assert!(loader.load(&path).is_err());
        assert!(!loader.is_cached(&path));
        Ok(())
    }

    #[test]
    fn test_resample_linear() {
        let source: Vec<f32> = (0..4410)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let result = resample_linear(&source, 1, 44100, 48000);
        let expected_len = (4410.0_f64 * 48000.0 / 44100.0).ceil() as usize;
        assert_eq!(expected_len, result.len());

        // Stereo channels stay separated.
        let stereo = vec![1.0f32, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let result = resample_linear(&stereo, 2, 44100, 48000);
        assert!(result.len() >= 8);
        assert!((result[0] - 1.0).abs() < 0.1);
        assert!((result[1] + 1.0).abs() < 0.1);
    }
}
