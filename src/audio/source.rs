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
use std::sync::Arc;

/// A playback cursor over decoded clip audio held in memory.
///
/// The audio data is shared, so every trigger of a clip gets its own cursor without
/// copying samples.
pub struct ClipSource {
    /// Interleaved samples.
    data: Arc<Vec<f32>>,
    channel_count: u16,
    /// Current position in frames.
    position: usize,
}

impl ClipSource {
    /// Creates a source positioned at the first frame.
    pub fn new(data: Arc<Vec<f32>>, channel_count: u16) -> ClipSource {
        ClipSource {
            data,
            channel_count: channel_count.max(1),
            position: 0,
        }
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Total number of frames in the clip.
    pub fn total_frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.total_frames()
    }

    /// Adds the next frame into `output`, which holds one sample per output channel.
    ///
    /// Source channels are spread over the outputs round-robin, so a mono clip lands on
    /// every output and a stereo clip keeps left and right. Returns false once the clip
    /// is exhausted.
    pub fn mix_next_frame(&mut self, output: &mut [f32]) -> bool {
        if self.is_finished() {
            return false;
        }

        let channels = self.channel_count as usize;
        let frame = &self.data[self.position * channels..(self.position + 1) * channels];
        for (index, out) in output.iter_mut().enumerate() {
            *out += frame[index % channels];
        }

        self.position += 1;
        true
    }
}
