//! End-to-end block-processing tests: the engine driven the way a host
//! drives it, with events in and audio + events out.

use std::sync::Arc;

use polysine::editor::ControlSurface;
use polysine::engine::Engine;
use polysine::events::{EventSink, InEvent, InEventKind, NoteAddress, OutEvent};
use polysine::host::HostParams;
use polysine::params::{ParamStore, VOLUME};

struct NullHost;

impl HostParams for NullHost {
    fn request_flush(&self) {}
}

fn engine() -> Engine {
    let mut engine = Engine::new(Arc::new(ParamStore::new()));
    engine.activate(48_000.0);
    engine
}

fn note_on(time: u32, note_id: i32, channel: i16, key: i16) -> InEvent {
    InEvent::new(
        time,
        InEventKind::NoteOn {
            note: NoteAddress::new(note_id, channel, key),
        },
    )
}

fn note_off(time: u32, note_id: i32, channel: i16, key: i16) -> InEvent {
    InEvent::new(
        time,
        InEventKind::NoteOff {
            note: NoteAddress::new(note_id, channel, key),
        },
    )
}

fn run_block(engine: &mut Engine, events: &[InEvent], frames: usize) -> Vec<OutEvent> {
    let mut left = vec![0.0f32; frames];
    let mut right = vec![0.0f32; frames];
    let mut sink = Vec::new();
    engine.process(events, &mut left, &mut right, &mut sink);
    sink
}

#[test]
fn held_note_accumulates_exact_phase_and_survives_the_block() {
    let mut engine = engine();

    let out = run_block(&mut engine, &[note_on(0, 1, 0, 57)], 100);
    assert!(out.is_empty(), "voice still held, no note-ended expected");

    // Key 57 is the 440 Hz anchor: phase advances 440/48000 per sample.
    let expected = (100.0f32 * 440.0 / 48_000.0).fract();
    let voice = engine.voices().iter().next().unwrap();
    assert!(voice.held);
    assert!(
        (voice.phase - expected).abs() < 1e-4,
        "phase {} != expected {}",
        voice.phase,
        expected
    );
}

#[test]
fn note_off_reports_exactly_one_end_at_the_close_of_the_next_block() {
    let mut engine = engine();
    run_block(&mut engine, &[note_on(0, 1, 0, 57)], 100);

    let out = run_block(&mut engine, &[note_off(0, 1, -1, -1)], 10);
    assert_eq!(
        out,
        vec![OutEvent::NoteEnd {
            note: NoteAddress::new(1, 0, 57)
        }]
    );
    assert!(engine.voices().is_empty());
}

#[test]
fn matched_on_off_pairs_drain_the_pool() {
    let mut engine = engine();

    let ons: Vec<InEvent> = (0..8).map(|i| note_on(0, i, 0, 60 + i as i16)).collect();
    run_block(&mut engine, &ons, 16);
    assert_eq!(engine.voices().len(), 8);

    let offs: Vec<InEvent> = (0..8).map(|i| note_off(0, i, -1, -1)).collect();
    let out = run_block(&mut engine, &offs, 16);
    assert_eq!(out.len(), 8);
    assert!(engine.voices().is_empty());
}

#[test]
fn wildcard_note_off_releases_only_and_matched_voices() {
    let mut engine = engine();
    run_block(
        &mut engine,
        &[note_on(0, 1, 0, 60), note_on(0, 2, 1, 60), note_on(0, 3, 0, 64)],
        8,
    );

    // key=60 wildcard elsewhere except channel=0: releases voice 1 only.
    let out = run_block(&mut engine, &[note_off(0, -1, 0, 60)], 8);
    assert_eq!(
        out,
        vec![OutEvent::NoteEnd {
            note: NoteAddress::new(1, 0, 60)
        }]
    );
    assert_eq!(engine.voices().len(), 2);
}

#[test]
fn drag_gesture_events_stay_inside_their_bracket() {
    let params = Arc::new(ParamStore::new());
    let mut engine = Engine::new(params.clone());
    engine.activate(48_000.0);
    let mut surface = ControlSurface::new(params);

    let mut out = Vec::new();
    let host = NullHost;

    surface.on_press(20, 30, &host);
    engine.process(&[], &mut [0.0; 4], &mut [0.0; 4], &mut out);

    surface.on_drag(20, 28, &host);
    engine.process(&[], &mut [0.0; 4], &mut [0.0; 4], &mut out);

    surface.on_drag(20, 26, &host);
    engine.process(&[], &mut [0.0; 4], &mut [0.0; 4], &mut out);

    surface.on_release(&host);
    engine.process(&[], &mut [0.0; 4], &mut [0.0; 4], &mut out);

    assert_eq!(out.len(), 4);
    assert!(matches!(out[0], OutEvent::GestureBegin { param_id: VOLUME }));
    assert!(matches!(out[1], OutEvent::ParamValue { .. }));
    assert!(matches!(out[2], OutEvent::ParamValue { .. }));
    assert!(matches!(out[3], OutEvent::GestureEnd { param_id: VOLUME }));
}

#[test]
fn saved_state_reproduces_audio_values_in_a_fresh_session() {
    let params = Arc::new(ParamStore::new());
    params.write_from_control(VOLUME, 0.65);
    let mut sink = Vec::new();
    params.sync_control_to_audio(&mut sink);
    let blob = params.save_state();

    let fresh = Arc::new(ParamStore::new());
    fresh.load_state(&blob).unwrap();

    let mut engine = Engine::new(fresh.clone());
    engine.activate(48_000.0);
    let out = run_block(&mut engine, &[], 4);

    assert_eq!(
        out,
        vec![OutEvent::ParamValue {
            param_id: VOLUME,
            value: 0.65
        }]
    );
    assert_eq!(fresh.audio_values()[VOLUME as usize], 0.65);
}

#[test]
fn host_param_value_reaches_the_surface_through_the_timer_sync() {
    let mut engine = engine();
    let params = engine.params().clone();

    let events = [InEvent::new(
        0,
        InEventKind::ParamValue {
            param_id: VOLUME,
            value: 0.1,
        },
    )];
    run_block(&mut engine, &events, 8);

    // First timer tick sees the change, the next has nothing new.
    assert!(params.sync_audio_to_control());
    assert_eq!(params.control_value(VOLUME), Some(0.1));
    assert!(!params.sync_audio_to_control());
}

#[test]
fn full_sink_drops_events_without_disturbing_the_pool() {
    struct FullSink;
    impl EventSink for FullSink {
        fn try_push(&mut self, _event: OutEvent) -> bool {
            false
        }
    }

    let mut engine = engine();
    run_block(&mut engine, &[note_on(0, 1, 0, 57)], 8);

    let mut left = [0.0f32; 8];
    let mut right = [0.0f32; 8];
    engine.process(&[note_off(0, 1, -1, -1)], &mut left, &mut right, &mut FullSink);
    assert!(engine.voices().is_empty());
}
