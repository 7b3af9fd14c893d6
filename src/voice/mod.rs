//! Voice state and the pool of currently-sounding notes.
//!
//! The pool is deliberately simple: unlimited polyphony, no stealing,
//! insertion-order iteration so rendering stays deterministic. All
//! mutation happens on the audio thread; the control thread never touches
//! voices directly and goes through the parameter store instead.

use crate::events::{EventSink, NoteAddress, OutEvent};
use crate::params::PARAM_COUNT;

/// Voices reserved up front so the steady state never reallocates inside
/// the audio callback.
pub const DEFAULT_VOICE_CAPACITY: usize = 64;

/// One currently-sounding note.
#[derive(Debug, Clone, Copy)]
pub struct Voice {
    /// False once released; the voice stops sounding but stays in the
    /// pool until the end-of-block scan reports it.
    pub held: bool,
    pub note_id: i32,
    pub channel: i16,
    pub key: i16,
    /// Oscillator phase accumulator in [0, 1).
    pub phase: f32,
    /// Per-note modulation offsets, indexed by parameter id.
    pub param_offsets: [f32; PARAM_COUNT],
}

impl Voice {
    fn start(note: NoteAddress) -> Self {
        Self {
            held: true,
            note_id: note.note_id,
            channel: note.channel,
            key: note.key,
            phase: 0.0,
            param_offsets: [0.0; PARAM_COUNT],
        }
    }

    /// The address this voice was started with, for note-ended reports.
    pub fn address(&self) -> NoteAddress {
        NoteAddress::new(self.note_id, self.channel, self.key)
    }

    /// Whether a (possibly wildcarded) event address selects this voice.
    /// All three fields must agree; `-1` skips a field.
    pub fn matches(&self, filter: &NoteAddress) -> bool {
        (filter.key == -1 || self.key == filter.key)
            && (filter.note_id == -1 || self.note_id == filter.note_id)
            && (filter.channel == -1 || self.channel == filter.channel)
    }
}

/// Insertion-ordered collection of active voices.
pub struct VoicePool {
    voices: Vec<Voice>,
}

impl VoicePool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VOICE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voices: Vec::with_capacity(capacity),
        }
    }

    /// Append a fresh voice. Matching voices are released first, the same
    /// scan a note-off performs, then the new voice always goes in.
    pub fn start(&mut self, note: NoteAddress) {
        self.release(&note);
        self.voices.push(Voice::start(note));
    }

    /// Mark matching voices as no longer held. They keep their slot until
    /// [`VoicePool::report_finished`] runs.
    pub fn release(&mut self, filter: &NoteAddress) {
        for voice in &mut self.voices {
            if voice.matches(filter) {
                voice.held = false;
            }
        }
    }

    /// Remove matching voices immediately. Choked voices never produce a
    /// note-ended report.
    pub fn choke(&mut self, filter: &NoteAddress) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].matches(filter) {
                self.voices.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Set a per-note modulation offset on the first matching voice.
    /// First match wins; later voices are not scanned.
    pub fn modulate(&mut self, filter: &NoteAddress, param_id: u32, amount: f32) {
        let p = param_id as usize;
        if p >= PARAM_COUNT {
            return;
        }
        for voice in &mut self.voices {
            if voice.matches(filter) {
                voice.param_offsets[p] = amount;
                break;
            }
        }
    }

    /// End-of-block scan: report every non-held voice to the host and
    /// remove it, preserving the order of the remaining voices.
    pub fn report_finished(&mut self, sink: &mut dyn EventSink) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].held {
                i += 1;
                continue;
            }
            let voice = self.voices.remove(i);
            sink.try_push(OutEvent::NoteEnd {
                note: voice.address(),
            });
        }
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.iter_mut()
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(note_id: i32, channel: i16, key: i16) -> NoteAddress {
        NoteAddress::new(note_id, channel, key)
    }

    #[test]
    fn pool_keeps_insertion_order() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 0, 64));
        pool.start(note(3, 0, 67));

        let keys: Vec<i16> = pool.iter().map(|v| v.key).collect();
        assert_eq!(keys, vec![60, 64, 67]);
    }

    #[test]
    fn release_uses_and_semantics_across_fields() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 1, 60));

        // Key matches both, channel narrows it to the second voice.
        pool.release(&note(-1, 1, 60));

        let held: Vec<bool> = pool.iter().map(|v| v.held).collect();
        assert_eq!(held, vec![true, false]);
    }

    #[test]
    fn wildcard_release_hits_everything() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 1, 72));
        pool.release(&NoteAddress::any());
        assert!(pool.iter().all(|v| !v.held));
    }

    #[test]
    fn restarting_a_note_releases_the_old_voice() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(1, 0, 60));

        assert_eq!(pool.len(), 2);
        let held: Vec<bool> = pool.iter().map(|v| v.held).collect();
        assert_eq!(held, vec![false, true]);
    }

    #[test]
    fn choke_removes_immediately_without_report() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 0, 64));
        pool.choke(&note(1, -1, -1));

        assert_eq!(pool.len(), 1);

        let mut sink = Vec::new();
        pool.report_finished(&mut sink);
        assert!(sink.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn modulation_stops_at_first_match() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 0, 60));

        pool.modulate(&note(-1, -1, 60), 0, 0.25);

        let offsets: Vec<f32> = pool.iter().map(|v| v.param_offsets[0]).collect();
        assert_eq!(offsets, vec![0.25, 0.0]);
    }

    #[test]
    fn modulation_with_bad_param_id_is_ignored() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.modulate(&NoteAddress::any(), 99, 0.5);
        assert_eq!(pool.iter().next().unwrap().param_offsets[0], 0.0);
    }

    #[test]
    fn finished_voices_are_reported_then_removed() {
        let mut pool = VoicePool::new();
        pool.start(note(1, 0, 60));
        pool.start(note(2, 0, 64));
        pool.start(note(3, 0, 67));
        pool.release(&note(1, -1, -1));
        pool.release(&note(3, -1, -1));

        let mut sink = Vec::new();
        pool.report_finished(&mut sink);

        assert_eq!(
            sink,
            vec![
                OutEvent::NoteEnd {
                    note: note(1, 0, 60)
                },
                OutEvent::NoteEnd {
                    note: note(3, 0, 67)
                },
            ]
        );
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().next().unwrap().note_id, 2);
    }
}
