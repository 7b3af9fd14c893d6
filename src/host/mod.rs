//! Static plugin capabilities and the thin seams toward the host.
//!
//! The engine answers a fixed descriptor: one note input port, one stereo
//! audio output, one parameter. Protocol plumbing (registration, ABI
//! tables) lives outside this crate; these are the data and traits it
//! queries.

/// Identity and feature tags advertised to the host.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub vendor: &'static str,
    pub version: &'static str,
    pub features: &'static [&'static str],
}

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "polysine.PolySine",
    name: "PolySine",
    vendor: "polysine",
    version: "0.1.0",
    features: &["instrument", "synthesizer", "stereo"],
};

#[derive(Debug, Clone, Copy)]
pub struct NotePort {
    pub id: u32,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct AudioPort {
    pub id: u32,
    pub name: &'static str,
    pub channel_count: u32,
    pub is_main: bool,
}

/// One note input, no note outputs.
pub const NOTE_INPUTS: &[NotePort] = &[NotePort {
    id: 0,
    name: "Note Port",
}];

/// No audio inputs, one main stereo output.
pub const AUDIO_OUTPUTS: &[AudioPort] = &[AudioPort {
    id: 0,
    name: "Audio Output",
    channel_count: 2,
    is_main: true,
}];

/// Interval at which the control thread polls audio-to-control sync and
/// repaints if anything changed.
pub const TIMER_INTERVAL_MS: u64 = 200;

/// Host-side parameter services the control surface may call.
///
/// `request_flush` asks the host to run a parameter flush promptly so
/// pending gesture/value events reach it outside the render cycle. It is
/// a hint; the host may coalesce it with its own scheduling.
pub trait HostParams {
    fn request_flush(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_one_note_input_and_one_stereo_output() {
        assert_eq!(NOTE_INPUTS.len(), 1);
        assert_eq!(AUDIO_OUTPUTS.len(), 1);
        assert_eq!(AUDIO_OUTPUTS[0].channel_count, 2);
        assert!(AUDIO_OUTPUTS[0].is_main);
        assert!(DESCRIPTOR.features.contains(&"instrument"));
    }
}
