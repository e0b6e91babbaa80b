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
// Core mixing logic, independent of the audio backend.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::source::ClipSource;

/// Sender half used to hand new sources to whoever owns the mixer.
pub type SourceSender = crossbeam_channel::Sender<ActiveSource>;
/// Receiver half drained by the mixer's owner.
pub type SourceReceiver = crossbeam_channel::Receiver<ActiveSource>;

/// A clip voice that the mixer is playing.
pub struct ActiveSource {
    /// Unique ID for this source.
    pub id: u64,
    /// The playback cursor.
    pub source: ClipSource,
    /// Set by the voice manager to cut this source.
    pub cancelled: Arc<AtomicBool>,
    /// Set by the mixer once the source has played out or been cut.
    pub finished: Arc<AtomicBool>,
}

/// Sums active sources into interleaved output frames.
pub struct AudioMixer {
    active_sources: Vec<ActiveSource>,
    num_channels: u16,
    /// Scratch frame reused between calls.
    frame: Vec<f32>,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(num_channels: u16) -> Self {
        let num_channels = num_channels.max(1);
        Self {
            active_sources: Vec::new(),
            num_channels,
            frame: vec![0.0; num_channels as usize],
        }
    }

    /// Adds a new source to the mixer.
    pub fn add_source(&mut self, source: ActiveSource) {
        self.active_sources.push(source);
    }

    /// Adds every source waiting on the receiver.
    pub fn drain(&mut self, receiver: &SourceReceiver) {
        while let Ok(source) = receiver.try_recv() {
            self.add_source(source);
        }
    }

    /// Fills `output` (interleaved, a whole number of frames) with the mix of all active
    /// sources. Sources that are cut or exhausted are dropped and marked finished.
    pub fn process_into(&mut self, output: &mut [f32]) {
        let channels = self.num_channels as usize;

        for out_frame in output.chunks_mut(channels) {
            self.frame.fill(0.0);

            let frame = &mut self.frame;
            self.active_sources.retain_mut(|active| {
                if active.cancelled.load(Ordering::Relaxed)
                    || !active.source.mix_next_frame(frame)
                {
                    active.finished.store(true, Ordering::Relaxed);
                    return false;
                }
                true
            });

            for (out, mixed) in out_frame.iter_mut().zip(self.frame.iter()) {
                *out = mixed.clamp(-1.0, 1.0);
            }
        }
    }

    /// Gets the number of output channels.
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Returns the number of sources still playing.
    pub fn active_count(&self) -> usize {
        self.active_sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(id: u64, samples: Vec<f32>, channels: u16) -> ActiveSource {
        ActiveSource {
            id,
            source: ClipSource::new(Arc::new(samples), channels),
            cancelled: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn test_basic_mixing() {
        let mut mixer = AudioMixer::new(2);
        mixer.add_source(active(1, vec![0.5, 0.25], 1));

        let mut output = vec![0.0f32; 6];
        mixer.process_into(&mut output);

        // Two frames of the mono clip on both channels, then silence.
        assert_eq!(vec![0.5, 0.5, 0.25, 0.25, 0.0, 0.0], output);
        assert_eq!(0, mixer.active_count());
    }

    #[test]
    fn test_multiple_source_mixing() {
        let mut mixer = AudioMixer::new(2);
        mixer.add_source(active(1, vec![0.5, 0.25], 2));
        mixer.add_source(active(2, vec![0.25, 0.5], 2));

        let mut output = vec![0.0f32; 2];
        mixer.process_into(&mut output);
        assert_eq!(vec![0.75, 0.75], output);
    }

    #[test]
    fn test_clamping() {
        let mut mixer = AudioMixer::new(1);
        mixer.add_source(active(1, vec![0.75], 1));
        mixer.add_source(active(2, vec![0.75], 1));

        let mut output = vec![0.0f32; 1];
        mixer.process_into(&mut output);
        assert_eq!(vec![1.0], output);
    }

    #[test]
    fn test_cancelled_source_is_removed() {
        let mut mixer = AudioMixer::new(1);
        let source = active(1, vec![0.5; 16], 1);
        let cancelled = source.cancelled.clone();
        let finished = source.finished.clone();
        mixer.add_source(source);

        let mut output = vec![0.0f32; 4];
        mixer.process_into(&mut output);
        assert_eq!(vec![0.5; 4], output);
        assert!(!finished.load(Ordering::Relaxed));

        cancelled.store(true, Ordering::Relaxed);
        mixer.process_into(&mut output);
        assert_eq!(vec![0.0; 4], output);
        assert!(finished.load(Ordering::Relaxed));
        assert_eq!(0, mixer.active_count());
    }

    #[test]
    fn test_drain() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut mixer = AudioMixer::new(2);

        tx.send(active(1, vec![0.5], 1)).unwrap();
        tx.send(active(2, vec![0.5], 1)).unwrap();
        mixer.drain(&rx);

        assert_eq!(2, mixer.active_count());
        assert_eq!(2, mixer.num_channels());
    }
}
