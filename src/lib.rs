pub mod editor; // Pointer input -> parameter edits, dial painting
pub mod engine; // Event dispatch, span rendering, voice lifecycle
pub mod events; // Host event protocol, in and out
pub mod host; // Static descriptors and host capability seams
pub mod params; // Parameter declarations + cross-thread store
pub mod voice; // Voice state and the active-note pool

pub const MAX_BLOCK_SIZE: usize = 2048;
