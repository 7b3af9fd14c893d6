//! The per-instance synthesis engine: sample-accurate event dispatch,
//! span rendering, and voice end-of-life reporting.
//!
//! One `Engine` exists per host session and is owned by the audio thread.
//! The only state it shares with the control thread is the parameter
//! store, reached through an `Arc`.

use std::f32::consts::TAU;
use std::sync::Arc;

use crate::events::{EventSink, InEvent, InEventKind};
use crate::params::{clamp01, ParamStore, VOLUME};
use crate::voice::VoicePool;

/// Master gain applied to every voice before summing.
const VOICE_GAIN: f32 = 0.2;

/// Equal-temperament anchor: key 57 sounds at 440 Hz.
const TUNING_KEY: f32 = 57.0;
const TUNING_HZ: f32 = 440.0;

pub struct Engine {
    sample_rate: f32,
    voices: VoicePool,
    params: Arc<ParamStore>,
}

impl Engine {
    pub fn new(params: Arc<ParamStore>) -> Self {
        Self {
            sample_rate: 48_000.0,
            voices: VoicePool::new(),
            params,
        }
    }

    /// Host activation; fixes the sample rate for subsequent blocks.
    pub fn activate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn deactivate(&mut self) {}

    /// Drop all voices without reporting them, as on a transport reset.
    pub fn reset(&mut self) {
        self.voices.clear();
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn params(&self) -> &Arc<ParamStore> {
        &self.params
    }

    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    /// Process one render block.
    ///
    /// Order matters and is fixed: pending control-thread edits are
    /// flushed outward first, then the block is walked event by event,
    /// rendering every event-free span, and finally every voice that fell
    /// silent during the block is reported and removed. A note released
    /// mid-block therefore stops sounding at its release sample but its
    /// note-ended event only appears at the end of that same block.
    ///
    /// `events` must be ordered by time, with every time inside the
    /// block; that is the host's contract.
    pub fn process(
        &mut self,
        events: &[InEvent],
        left: &mut [f32],
        right: &mut [f32],
        sink: &mut dyn EventSink,
    ) {
        debug_assert_eq!(left.len(), right.len());

        self.params.sync_control_to_audio(sink);

        let frame_count = left.len() as u32;
        let mut event_index = 0;
        let mut next_event_frame = if events.is_empty() { frame_count } else { 0 };

        let mut cursor = 0u32;
        while cursor < frame_count {
            // Apply every event scheduled exactly at the cursor, then
            // find out how far the next event-free span extends.
            while event_index < events.len() && next_event_frame == cursor {
                let event = &events[event_index];
                if event.time != cursor {
                    next_event_frame = event.time;
                    break;
                }

                self.apply_event(event);
                event_index += 1;

                if event_index == events.len() {
                    next_event_frame = frame_count;
                    break;
                }
            }

            self.render(cursor as usize, next_event_frame as usize, left, right);
            cursor = next_event_frame;
        }

        self.voices.report_finished(sink);
    }

    /// Out-of-cycle host flush: promote control edits and apply events
    /// without rendering audio.
    pub fn flush(&mut self, events: &[InEvent], sink: &mut dyn EventSink) {
        self.params.sync_control_to_audio(sink);
        for event in events {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: &InEvent) {
        match event.kind {
            InEventKind::NoteOn { note } => self.voices.start(note),
            InEventKind::NoteOff { note } => self.voices.release(&note),
            InEventKind::NoteChoke { note } => self.voices.choke(&note),
            InEventKind::ParamValue { param_id, value } => {
                self.params.write_from_audio(param_id, value)
            }
            InEventKind::ParamMod {
                param_id,
                note,
                amount,
            } => self.voices.modulate(&note, param_id, amount),
        }
    }

    /// Render one event-free span `[start, end)` into both channels.
    ///
    /// Each held voice contributes a sine at its equal-temperament pitch,
    /// scaled by the clamped sum of the base volume and the voice's own
    /// modulation offset. Mono synthesis, written to both channels.
    /// Amplitude may step when a value event lands between spans; no
    /// smoothing is applied.
    fn render(&mut self, start: usize, end: usize, left: &mut [f32], right: &mut [f32]) {
        let base_volume = self.params.audio_values()[VOLUME as usize];
        let sample_rate = self.sample_rate;

        for frame in start..end {
            let mut sum = 0.0f32;

            for voice in self.voices.iter_mut() {
                if !voice.held {
                    continue;
                }

                let volume = clamp01(base_volume + voice.param_offsets[VOLUME as usize]);
                sum += (voice.phase * TAU).sin() * VOICE_GAIN * volume;

                voice.phase +=
                    TUNING_HZ * ((voice.key as f32 - TUNING_KEY) / 12.0).exp2() / sample_rate;
                voice.phase -= voice.phase.floor();
            }

            left[frame] = sum;
            right[frame] = sum;
        }
    }
}
