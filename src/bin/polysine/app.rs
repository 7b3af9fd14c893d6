//! Harness wiring: audio stream setup and the UI/audio thread boundary.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

use polysine::engine::Engine;
use polysine::events::{InEvent, OutEvent};
use polysine::params::ParamStore;
use polysine::MAX_BLOCK_SIZE;

use super::ui::UiApp;

/// Capacity of the UI-to-audio event ring. Drags and key presses are far
/// slower than one block per capacity, so overflow means a stuck UI, not
/// lost notes in normal use.
const EVENT_RING_CAPACITY: usize = 256;

/// Allocation-free state snapshot pushed from the audio callback once per
/// block.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineSnapshot {
    pub voice_count: u16,
}

/// Main application: owns the plugin-core pieces and runs them the way a
/// host would.
pub struct HostHarness {
    params: Arc<ParamStore>,
}

impl HostHarness {
    pub fn new() -> Self {
        Self {
            params: Arc::new(ParamStore::new()),
        }
    }

    /// Open the audio device, start the engine on its callback thread,
    /// and hand the main thread over to the terminal UI.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (event_tx, mut event_rx) = rtrb::RingBuffer::<InEvent>::new(EVENT_RING_CAPACITY);
        let (mut out_tx, out_rx) = rtrb::RingBuffer::<OutEvent>::new(EVENT_RING_CAPACITY);
        let (mut snapshot_tx, snapshot_rx) =
            rtrb::RingBuffer::<EngineSnapshot>::new(EVENT_RING_CAPACITY);

        let mut engine = Engine::new(self.params.clone());
        engine.activate(sample_rate);

        // Scratch buffers live outside the callback so the steady state
        // never allocates.
        let mut events = Vec::with_capacity(EVENT_RING_CAPACITY);
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                        // Messages arrive between blocks; they all apply
                        // at the first sample of this one.
                        events.clear();
                        while let Ok(event) = event_rx.pop() {
                            events.push(event);
                        }

                        engine.process(
                            &events,
                            &mut left[..frames],
                            &mut right[..frames],
                            &mut out_tx,
                        );

                        let base = frames_written * channels;
                        for i in 0..frames {
                            for ch in 0..channels {
                                data[base + i * channels + ch] =
                                    if ch == 0 { left[i] } else { right[i] };
                            }
                        }

                        frames_written += frames;
                    }

                    let _ = snapshot_tx.push(EngineSnapshot {
                        voice_count: engine.voices().len() as u16,
                    });
                },
                |err| eprintln!("Audio error: {}", err),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut ui = UiApp::new(self.params, event_tx, out_rx, snapshot_rx, sample_rate);
        ui.run()
    }
}

impl Default for HostHarness {
    fn default() -> Self {
        Self::new()
    }
}
