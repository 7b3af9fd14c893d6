//! polysine - standalone host harness
//!
//! Stands in for a DAW host during development: a cpal stream drives the
//! engine's process loop block by block, keyboard keys play notes, and the
//! mouse drags the volume dial through the control surface.
//!
//! Run with: cargo run

mod app;
mod ui;

use app::HostHarness;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    HostHarness::new().run()
}
