//! Host event protocol: the events a host feeds into the engine and the
//! events the engine reports back.
//!
//! Input events arrive ordered by their sample offset within the current
//! render block. Output events are pushed through the [`EventSink`] seam so
//! the same engine code serves a real host queue, an rtrb ring, or a plain
//! `Vec` in tests.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a note, or a set of notes when fields are wildcarded.
///
/// A field set to `-1` means "don't filter on this field". Matching uses
/// AND semantics across all three fields.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteAddress {
    /// Host-assigned identifier, opaque to the engine.
    pub note_id: i32,
    pub channel: i16,
    pub key: i16,
}

impl NoteAddress {
    pub const fn new(note_id: i32, channel: i16, key: i16) -> Self {
        Self {
            note_id,
            channel,
            key,
        }
    }

    /// Address matching every note on every channel.
    pub const fn any() -> Self {
        Self::new(-1, -1, -1)
    }
}

/// An event sent by the host, stamped with its sample offset inside the
/// current block.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct InEvent {
    /// Sample offset within the block at which the event takes effect.
    pub time: u32,
    pub kind: InEventKind,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub enum InEventKind {
    /// Start a new voice. Any voice already matching the address is
    /// released first.
    NoteOn { note: NoteAddress },
    /// Release matching voices; they fall silent but stay in the pool
    /// until the end of the block.
    NoteOff { note: NoteAddress },
    /// Drop matching voices immediately, without a note-ended report.
    NoteChoke { note: NoteAddress },
    /// Host automation writing a parameter on the audio side.
    ParamValue { param_id: u32, value: f32 },
    /// Per-note modulation offset; applies to the first matching voice.
    ParamMod {
        param_id: u32,
        note: NoteAddress,
        amount: f32,
    },
}

impl InEvent {
    pub const fn new(time: u32, kind: InEventKind) -> Self {
        Self { time, kind }
    }
}

/// An event the engine reports to the host.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutEvent {
    /// A control-thread edit promoted to the audio side; global scope,
    /// never note-filtered.
    ParamValue { param_id: u32, value: f32 },
    /// The user started manipulating a parameter.
    GestureBegin { param_id: u32 },
    /// The user stopped manipulating a parameter.
    GestureEnd { param_id: u32 },
    /// A voice finished and left the pool; carries the original address.
    NoteEnd { note: NoteAddress },
}

/// Destination for engine-produced events.
///
/// `try_push` returns whether the event was accepted. A full host queue is
/// not an error; the engine drops the event and moves on.
pub trait EventSink {
    fn try_push(&mut self, event: OutEvent) -> bool;
}

impl EventSink for Vec<OutEvent> {
    fn try_push(&mut self, event: OutEvent) -> bool {
        self.push(event);
        true
    }
}

#[cfg(feature = "rtrb")]
impl EventSink for rtrb::Producer<OutEvent> {
    fn try_push(&mut self, event: OutEvent) -> bool {
        self.push(event).is_ok()
    }
}
