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

//! Voice bookkeeping for clip playback.
//!
//! Each clip has at most one voice: triggering a clip that is still sounding cuts
//! the old voice, so the clip restarts from the beginning instead of overlapping.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// A clip that has been handed to the mixer.
pub struct Voice {
    id: u64,
    /// The clip element id (the pad's trigger key).
    clip_id: String,
    start_time: Instant,
    /// Set to cut the voice.
    cancelled: Arc<AtomicBool>,
    /// Set by the mixer once the voice is done.
    finished: Arc<AtomicBool>,
}

impl Voice {
    pub fn new(clip_id: &str, cancelled: Arc<AtomicBool>, finished: Arc<AtomicBool>) -> Self {
        Self {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::SeqCst),
            clip_id: clip_id.to_string(),
            start_time: Instant::now(),
            cancelled,
            finished,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn cut(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

/// Tracks the voices that are currently sounding.
pub struct VoiceManager {
    voices: Vec<Voice>,
    /// Global maximum number of voices.
    max_voices: usize,
}

impl VoiceManager {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: Vec::new(),
            max_voices: max_voices.max(1),
        }
    }

    /// Adds a voice, cutting any voice of the same clip and, if the global limit is
    /// reached, the oldest voice. Returns the ids of the voices that were cut.
    pub fn add_voice(&mut self, voice: Voice) -> Vec<u64> {
        self.voices.retain(|v| !v.is_finished());

        let mut cut = Vec::new();
        self.voices.retain(|v| {
            if v.clip_id == voice.clip_id {
                v.cut();
                cut.push(v.id);
                return false;
            }
            true
        });

        if self.voices.len() >= self.max_voices {
            if let Some(oldest) = self.voices.iter().min_by_key(|v| v.start_time) {
                let oldest_id = oldest.id;
                oldest.cut();
                cut.push(oldest_id);
                self.voices.retain(|v| v.id != oldest_id);
                warn!(
                    max_voices = self.max_voices,
                    "Voice limit reached, stealing oldest"
                );
            }
        }

        if !cut.is_empty() {
            debug!(clip = voice.clip_id, cut = cut.len(), "Retriggered clip");
        }
        self.voices.push(voice);
        cut
    }

    /// Forgets a voice without cutting it. Returns false if it wasn't tracked.
    pub fn remove(&mut self, voice_id: u64) -> bool {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != voice_id);
        self.voices.len() != before
    }

    /// Returns the number of voices that have not finished.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_finished()).count()
    }

    /// Cuts every voice.
    pub fn clear(&mut self) -> usize {
        let count = self.voices.len();
        for voice in self.voices.drain(..) {
            voice.cut();
        }
        count
    }
}

impl std::fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceManager")
            .field("active_voices", &self.active_count())
            .field("max_voices", &self.max_voices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_voice(clip: &str) -> (Voice, Arc<AtomicBool>, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        (
            Voice::new(clip, cancelled.clone(), finished.clone()),
            cancelled,
            finished,
        )
    }

    #[test]
    fn test_retrigger_cuts_same_clip() {
        let mut manager = VoiceManager::new(32);

        let (first, first_cancelled, _) = make_voice("Q");
        let first_id = first.id();
        assert!(manager.add_voice(first).is_empty());

        let (other, other_cancelled, _) = make_voice("W");
        assert!(manager.add_voice(other).is_empty());

        let (second, second_cancelled, _) = make_voice("Q");
        assert_eq!(vec![first_id], manager.add_voice(second));

        assert!(first_cancelled.load(Ordering::Relaxed));
        assert!(!other_cancelled.load(Ordering::Relaxed));
        assert!(!second_cancelled.load(Ordering::Relaxed));
        assert_eq!(2, manager.active_count());
    }

    #[test]
    fn test_finished_voices_are_pruned() {
        let mut manager = VoiceManager::new(32);

        let (voice, cancelled, finished) = make_voice("X");
        manager.add_voice(voice);
        finished.store(true, Ordering::Relaxed);
        assert_eq!(0, manager.active_count());

        // Nothing to cut: the previous voice already played out.
        let (again, _, _) = make_voice("X");
        assert!(manager.add_voice(again).is_empty());
        assert!(!cancelled.load(Ordering::Relaxed));
    }

    #[test]
    fn test_global_limit() {
        let mut manager = VoiceManager::new(2);

        let (q, q_cancelled, _) = make_voice("Q");
        manager.add_voice(q);
        let (w, _, _) = make_voice("W");
        manager.add_voice(w);

        let (e, _, _) = make_voice("E");
        assert_eq!(1, manager.add_voice(e).len());
        assert!(q_cancelled.load(Ordering::Relaxed));
        assert_eq!(2, manager.active_count());
    }

    #[test]
    fn test_remove() {
        let mut manager = VoiceManager::new(8);
        let (q, q_cancelled, _) = make_voice("Q");
        let q_id = q.id();
        manager.add_voice(q);

        assert!(manager.remove(q_id));
        assert!(!manager.remove(q_id));
        assert!(!q_cancelled.load(Ordering::Relaxed));
        assert_eq!(0, manager.active_count());
    }

    #[test]
    fn test_clear() {
        let mut manager = VoiceManager::new(8);
        let (q, q_cancelled, _) = make_voice("Q");
        manager.add_voice(q);

        assert_eq!(1, manager.clear());
        assert!(q_cancelled.load(Ordering::Relaxed));
        assert_eq!(0, manager.active_count());
    }
}
