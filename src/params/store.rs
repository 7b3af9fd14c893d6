use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::events::{EventSink, OutEvent};
use crate::params::{clamp01, param_info, PARAM_COUNT, STATE_LEN};

/*
Cross-Thread Parameter Store
============================

Two threads see every parameter:

  audio side    The value the synthesis engine reads while rendering.
                Written by host PARAM_VALUE events and by the
                control-to-audio sync step, both on the audio thread.

  control side  The value the control surface reads and writes. Written
                by pointer drags and by state load, on the control thread.

Each side carries a "changed" flag meaning "I wrote this and the other
side hasn't picked it up yet". Two more flag pairs mark pending gesture
begin/end announcements. All arrays live behind ONE mutex, and every
critical section is a fixed scan over PARAM_COUNT slots, so the audio
thread never blocks on unbounded work. That bounded-mutex design is the
point; a lock-free ring would also satisfy it but isn't needed at this
parameter count.

Sync runs once per render block in both directions (and on demand when
the host flushes):

  control -> audio   promotes control edits into the audio array and
                     emits gesture-begin / value / gesture-end events in
                     that fixed order, so the host never sees a value
                     outside its gesture bracket.

  audio -> control   copies host-written values back for display and
                     reports whether anything changed, so the UI only
                     repaints when there is something new to show.
*/

/// Failure to restore persisted parameter state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The blob is not one f32 per declared parameter.
    #[error("state blob is {got} bytes, expected {STATE_LEN}")]
    WrongLength { got: usize },
}

struct Slots {
    audio: [f32; PARAM_COUNT],
    audio_changed: [bool; PARAM_COUNT],
    control: [f32; PARAM_COUNT],
    control_changed: [bool; PARAM_COUNT],
    gesture_begin: [bool; PARAM_COUNT],
    gesture_end: [bool; PARAM_COUNT],
}

/// Dual-array parameter state shared between the control thread and the
/// audio thread. Cheap to share via `Arc`; all methods take `&self`.
pub struct ParamStore {
    slots: Mutex<Slots>,
}

impl ParamStore {
    /// Create a store with every parameter at its declared default on
    /// both sides and no pending changes.
    pub fn new() -> Self {
        let mut defaults = [0.0f32; PARAM_COUNT];
        for (id, slot) in defaults.iter_mut().enumerate() {
            if let Some(info) = param_info(id as u32) {
                *slot = info.default;
            }
        }

        Self {
            slots: Mutex::new(Slots {
                audio: defaults,
                audio_changed: [false; PARAM_COUNT],
                control: defaults,
                control_changed: [false; PARAM_COUNT],
                gesture_begin: [false; PARAM_COUNT],
                gesture_end: [false; PARAM_COUNT],
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap()
    }

    /// The value the control thread should display for a parameter.
    ///
    /// If the control side has an edit the audio thread hasn't consumed
    /// yet, that edit wins; otherwise the audio-side value is returned,
    /// which lets the surface observe host automation before the next
    /// audio-to-control sync. Only reads; promotion into the audio array
    /// is reserved for the audio thread's sync step.
    pub fn main_thread_value(&self, id: u32) -> Option<f32> {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return None;
        }
        let slots = self.lock();
        Some(if slots.control_changed[i] {
            slots.control[i]
        } else {
            slots.audio[i]
        })
    }

    /// The raw control-side value, used as a drag origin and for painting.
    pub fn control_value(&self, id: u32) -> Option<f32> {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return None;
        }
        Some(self.lock().control[i])
    }

    /// Store a control-thread edit. The audio array is untouched; the
    /// next control-to-audio sync promotes it.
    pub fn write_from_control(&self, id: u32, value: f32) {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return;
        }
        let mut slots = self.lock();
        slots.control[i] = value;
        slots.control_changed[i] = true;
    }

    /// Store a host-sent value on the audio side (PARAM_VALUE event).
    pub fn write_from_audio(&self, id: u32, value: f32) {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return;
        }
        let mut slots = self.lock();
        slots.audio[i] = value;
        slots.audio_changed[i] = true;
    }

    /// Mark that a user interaction bracket should be announced.
    pub fn begin_gesture(&self, id: u32) {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return;
        }
        self.lock().gesture_begin[i] = true;
    }

    pub fn end_gesture(&self, id: u32) {
        let i = id as usize;
        if i >= PARAM_COUNT {
            return;
        }
        self.lock().gesture_end[i] = true;
    }

    /// Snapshot of the audio-side values for an event-free render span.
    /// One bounded lock per span; values only move at event boundaries.
    pub fn audio_values(&self) -> [f32; PARAM_COUNT] {
        self.lock().audio
    }

    /// Audio-thread half of the sync protocol.
    ///
    /// For each parameter, in fixed order: announce a pending gesture
    /// begin, promote a pending control edit into the audio array and
    /// emit the global-scope value event, announce a pending gesture end.
    pub fn sync_control_to_audio(&self, sink: &mut dyn EventSink) {
        let mut slots = self.lock();

        for i in 0..PARAM_COUNT {
            if slots.gesture_begin[i] {
                slots.gesture_begin[i] = false;
                sink.try_push(OutEvent::GestureBegin { param_id: i as u32 });
            }

            if slots.control_changed[i] {
                slots.audio[i] = slots.control[i];
                slots.control_changed[i] = false;
                sink.try_push(OutEvent::ParamValue {
                    param_id: i as u32,
                    value: slots.audio[i],
                });
            }

            if slots.gesture_end[i] {
                slots.gesture_end[i] = false;
                sink.try_push(OutEvent::GestureEnd { param_id: i as u32 });
            }
        }
    }

    /// Control-thread half of the sync protocol.
    ///
    /// Copies host-written audio values back to the control side and
    /// reports whether anything changed. No outward events; the host
    /// already knows the values it sent.
    pub fn sync_audio_to_control(&self) -> bool {
        let mut slots = self.lock();
        let mut any_changed = false;

        for i in 0..PARAM_COUNT {
            if slots.audio_changed[i] {
                slots.control[i] = slots.audio[i];
                slots.audio_changed[i] = false;
                any_changed = true;
            }
        }

        any_changed
    }

    /// Serialize control-side values, one f32 (little-endian) per
    /// parameter in declared-id order. Pulls pending audio-side changes
    /// across first so the saved state reflects what the host last sent.
    pub fn save_state(&self) -> [u8; STATE_LEN] {
        self.sync_audio_to_control();

        let slots = self.lock();
        let mut out = [0u8; STATE_LEN];
        for (i, value) in slots.control.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Restore control-side values from a saved blob, marking every
    /// parameter changed so the next sync propagates them to the audio
    /// side. A wrong-sized blob leaves all state untouched.
    pub fn load_state(&self, bytes: &[u8]) -> Result<(), StateError> {
        if bytes.len() != STATE_LEN {
            return Err(StateError::WrongLength { got: bytes.len() });
        }

        let mut slots = self.lock();
        for i in 0..PARAM_COUNT {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            slots.control[i] = f32::from_le_bytes(raw);
            slots.control_changed[i] = true;
        }
        Ok(())
    }

    /// Clamp a value into the unit range used by all declared parameters.
    pub fn clamp(value: f32) -> f32 {
        clamp01(value)
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}
