//! Terminal front end: keyboard notes, mouse-driven volume dial, and a
//! live view of what the engine reports back.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

use polysine::editor::{ControlSurface, CANVAS_HEIGHT, CANVAS_WIDTH};
use polysine::events::{InEvent, InEventKind, NoteAddress, OutEvent};
use polysine::host::{HostParams, DESCRIPTOR, TIMER_INTERVAL_MS};
use polysine::params::{value_to_text, ParamStore, VOLUME};

use super::app::EngineSnapshot;

/// How long a key-press note rings before the harness sends its note-off.
const NOTE_HOLD: Duration = Duration::from_millis(250);

/// Number of engine reports kept on screen.
const EVENT_HISTORY: usize = 8;

/// The cpal stream renders continuously, so a flush request is already
/// satisfied by the next block; nothing extra to schedule.
struct ContinuousHost;

impl HostParams for ContinuousHost {
    fn request_flush(&self) {}
}

struct HeldKey {
    off_at: Instant,
    note_id: i32,
    key: i16,
}

pub struct UiApp {
    params: Arc<ParamStore>,
    surface: ControlSurface,
    event_tx: Producer<InEvent>,
    out_rx: Consumer<OutEvent>,
    snapshot_rx: Consumer<EngineSnapshot>,
    sample_rate: f32,

    area: Rect,
    held: Vec<HeldKey>,
    next_note_id: i32,
    voice_count: u16,
    history: VecDeque<String>,
    last_sync: Instant,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        params: Arc<ParamStore>,
        event_tx: Producer<InEvent>,
        out_rx: Consumer<OutEvent>,
        snapshot_rx: Consumer<EngineSnapshot>,
        sample_rate: f32,
    ) -> Self {
        Self {
            surface: ControlSurface::new(params.clone()),
            params,
            event_tx,
            out_rx,
            snapshot_rx,
            sample_rate,
            area: Rect::default(),
            held: Vec::new(),
            next_note_id: 1,
            voice_count: 0,
            history: VecDeque::with_capacity(EVENT_HISTORY),
            last_sync: Instant::now(),
            should_quit: false,
        }
    }

    pub fn run(&mut self) -> EyreResult<()> {
        let mut terminal = ratatui::init();
        crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

        let result = self.event_loop(&mut terminal);

        crossterm::execute!(std::io::stdout(), DisableMouseCapture)?;
        ratatui::restore();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.release_expired_notes();
            self.poll_engine();

            // The control-thread timer: pull host-written values across
            // on a fixed cadence so the dial tracks automation.
            if self.last_sync.elapsed() >= Duration::from_millis(TIMER_INTERVAL_MS) {
                self.params.sync_audio_to_control();
                self.last_sync = Instant::now();
            }

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code)
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let key = match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            // White keys anchored at A3 (key 57 = 440 Hz).
            KeyCode::Char('a') => 57,
            KeyCode::Char('s') => 59,
            KeyCode::Char('d') => 60,
            KeyCode::Char('f') => 62,
            KeyCode::Char('g') => 64,
            KeyCode::Char('h') => 65,
            KeyCode::Char('j') => 67,
            KeyCode::Char('k') => 69,
            _ => return,
        };

        let note_id = self.next_note_id;
        self.next_note_id += 1;

        let sent = self
            .event_tx
            .push(InEvent::new(
                0,
                InEventKind::NoteOn {
                    note: NoteAddress::new(note_id, 0, key),
                },
            ))
            .is_ok();

        if sent {
            self.held.push(HeldKey {
                off_at: Instant::now() + NOTE_HOLD,
                note_id,
                key,
            });
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = self.cell_to_canvas(mouse.column, mouse.row);
        let host = ContinuousHost;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.surface.on_press(x, y, &host),
            MouseEventKind::Drag(MouseButton::Left) => self.surface.on_drag(x, y, &host),
            MouseEventKind::Up(MouseButton::Left) => self.surface.on_release(&host),
            _ => {}
        }
    }

    /// Map a terminal cell onto the surface's fixed logical canvas.
    fn cell_to_canvas(&self, column: u16, row: u16) -> (i32, i32) {
        let width = self.area.width.max(1) as i32;
        let height = self.area.height.max(1) as i32;
        let x = column as i32 * CANVAS_WIDTH as i32 / width;
        let y = row as i32 * CANVAS_HEIGHT as i32 / height;
        (x, y)
    }

    fn release_expired_notes(&mut self) {
        let now = Instant::now();
        let mut i = 0;
        while i < self.held.len() {
            if now < self.held[i].off_at {
                i += 1;
                continue;
            }
            let held = self.held.remove(i);
            let _ = self.event_tx.push(InEvent::new(
                0,
                InEventKind::NoteOff {
                    note: NoteAddress::new(held.note_id, 0, held.key),
                },
            ));
        }
    }

    fn poll_engine(&mut self) {
        while let Ok(snapshot) = self.snapshot_rx.pop() {
            self.voice_count = snapshot.voice_count;
        }
        while let Ok(event) = self.out_rx.pop() {
            if self.history.len() == EVENT_HISTORY {
                self.history.pop_front();
            }
            self.history.push_back(describe(&event));
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        self.area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let volume = self.params.main_thread_value(VOLUME).unwrap_or_default();
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Volume "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(volume.clamp(0.0, 1.0) as f64)
            .label(value_to_text(VOLUME, volume).unwrap_or_default());
        frame.render_widget(gauge, rows[0]);

        let status = Paragraph::new(vec![
            Line::from(format!("voices: {}", self.voice_count)),
            Line::from(format!("sample rate: {} Hz", self.sample_rate)),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", DESCRIPTOR.name)),
        );
        frame.render_widget(status, rows[1]);

        let items: Vec<ListItem> = self
            .history
            .iter()
            .map(|line| ListItem::new(line.as_str()))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Host events "));
        frame.render_widget(list, rows[2]);

        let help = Paragraph::new("a-k: play notes | drag top-left dial: volume | q: quit")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}

fn describe(event: &OutEvent) -> String {
    match event {
        OutEvent::ParamValue { param_id, value } => {
            format!("param {param_id} -> {value:.3}")
        }
        OutEvent::GestureBegin { param_id } => format!("gesture begin (param {param_id})"),
        OutEvent::GestureEnd { param_id } => format!("gesture end (param {param_id})"),
        OutEvent::NoteEnd { note } => {
            format!(
                "note end id={} ch={} key={}",
                note.note_id, note.channel, note.key
            )
        }
    }
}
