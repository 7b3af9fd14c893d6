//! Control surface: pointer input over a fixed logical canvas, mapped to
//! parameter-store writes, plus the dial painting for a passive bitmap
//! window.
//!
//! Runs entirely on the control thread. It never touches voices; every
//! interaction goes through the parameter store and is picked up by the
//! audio thread's next sync.

use std::sync::Arc;

use crate::host::HostParams;
use crate::params::{ParamStore, VOLUME};

/// Logical canvas the host window maps onto.
pub const CANVAS_WIDTH: u32 = 300;
pub const CANVAS_HEIGHT: u32 = 200;

// Hit-region of the one volume dial, in canvas coordinates.
const DIAL_LEFT: i32 = 10;
const DIAL_RIGHT: i32 = 40;
const DIAL_TOP: i32 = 10;
const DIAL_BOTTOM: i32 = 40;

/// Parameter change per canvas pixel of vertical drag; upward increases.
const DRAG_SCALE: f32 = 0.01;

const COLOR_BACKGROUND: u32 = 0x00C0_C0C0;
const COLOR_OUTLINE: u32 = 0x0000_0000;

struct Drag {
    param_id: u32,
    origin_y: i32,
    origin_value: f32,
}

/// Translates pointer press/drag/release into parameter edits and
/// gesture brackets.
pub struct ControlSurface {
    params: Arc<ParamStore>,
    drag: Option<Drag>,
}

impl ControlSurface {
    pub fn new(params: Arc<ParamStore>) -> Self {
        Self { params, drag: None }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer pressed. A hit inside the dial starts a drag anchored at
    /// the current control-side value and marks a gesture begin.
    pub fn on_press(&mut self, x: i32, y: i32, host: &dyn HostParams) {
        if !(DIAL_LEFT..DIAL_RIGHT).contains(&x) || !(DIAL_TOP..DIAL_BOTTOM).contains(&y) {
            return;
        }

        let origin_value = self.params.control_value(VOLUME).unwrap_or_default();
        self.drag = Some(Drag {
            param_id: VOLUME,
            origin_y: y,
            origin_value,
        });

        self.params.begin_gesture(VOLUME);
        host.request_flush();
    }

    /// Pointer moved. Vertical displacement from the press point maps
    /// linearly onto the parameter, clamped into its range before the
    /// store ever sees it.
    pub fn on_drag(&mut self, _x: i32, y: i32, host: &dyn HostParams) {
        let Some(drag) = &self.drag else {
            return;
        };

        let target = drag.origin_value + (drag.origin_y - y) as f32 * DRAG_SCALE;
        self.params
            .write_from_control(drag.param_id, ParamStore::clamp(target));
        host.request_flush();
    }

    /// Pointer released; closes the gesture bracket.
    pub fn on_release(&mut self, host: &dyn HostParams) {
        if let Some(drag) = self.drag.take() {
            self.params.end_gesture(drag.param_id);
            host.request_flush();
        }
    }

    /// Paint the surface into an ARGB canvas of
    /// `CANVAS_WIDTH * CANVAS_HEIGHT` pixels, filling the dial from the
    /// bottom up in proportion to the control-side value.
    pub fn paint(&self, bits: &mut [u32]) {
        paint_rectangle(
            bits,
            0,
            CANVAS_WIDTH,
            0,
            CANVAS_HEIGHT,
            COLOR_BACKGROUND,
            COLOR_BACKGROUND,
        );

        let value = self.params.control_value(VOLUME).unwrap_or_default();
        let fill_top = DIAL_TOP as u32
            + ((DIAL_BOTTOM - DIAL_TOP) as f32 * (1.0 - value)) as u32;

        paint_rectangle(
            bits,
            DIAL_LEFT as u32,
            DIAL_RIGHT as u32,
            DIAL_TOP as u32,
            DIAL_BOTTOM as u32,
            COLOR_OUTLINE,
            COLOR_BACKGROUND,
        );
        paint_rectangle(
            bits,
            DIAL_LEFT as u32,
            DIAL_RIGHT as u32,
            fill_top,
            DIAL_BOTTOM as u32,
            COLOR_OUTLINE,
            COLOR_OUTLINE,
        );
    }
}

fn paint_rectangle(bits: &mut [u32], l: u32, r: u32, t: u32, b: u32, border: u32, fill: u32) {
    for y in t..b {
        for x in l..r {
            bits[(y * CANVAS_WIDTH + x) as usize] =
                if y == t || y == b - 1 || x == l || x == r - 1 {
                    border
                } else {
                    fill
                };
        }
    }
}
