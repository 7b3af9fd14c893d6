//! Parameter declarations and the cross-thread parameter store.
//!
//! One parameter is declared: `Volume`, range [0,1], default 0.5,
//! automatable by the host and modulatable per note. The store in
//! [`store`] replicates each parameter's value on both sides of the
//! thread boundary; see that module for the sync protocol.

pub mod store;

pub use store::{ParamStore, StateError};

/// Parameter id of the output volume.
pub const VOLUME: u32 = 0;

/// Number of declared parameters. Ids are dense in `0..PARAM_COUNT`.
pub const PARAM_COUNT: usize = 1;

/// Byte length of the persisted state blob: one f32 per parameter.
pub const STATE_LEN: usize = PARAM_COUNT * 4;

/// Static description of one parameter, surfaced to the host.
#[derive(Debug, Clone, Copy)]
pub struct ParamInfo {
    pub id: u32,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Host may write this parameter from automation lanes.
    pub automatable: bool,
    /// Host may send per-note modulation offsets.
    pub modulatable_per_note: bool,
}

/// Look up the descriptor for a parameter id.
///
/// Returns `None` for ids outside the declared range; event paths treat
/// such ids as a host contract violation and ignore them.
pub fn param_info(id: u32) -> Option<ParamInfo> {
    match id {
        VOLUME => Some(ParamInfo {
            id: VOLUME,
            name: "Volume",
            min: 0.0,
            max: 1.0,
            default: 0.5,
            automatable: true,
            modulatable_per_note: true,
        }),
        _ => None,
    }
}

/// Format a parameter value for host display.
pub fn value_to_text(id: u32, value: f32) -> Option<String> {
    param_info(id)?;
    Some(format!("{value:.6}"))
}

/// Clamp into the unit range shared by all declared parameters.
#[inline]
pub(crate) fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_descriptor_matches_declaration() {
        let info = param_info(VOLUME).unwrap();
        assert_eq!(info.name, "Volume");
        assert_eq!(info.default, 0.5);
        assert!(info.automatable);
        assert!(info.modulatable_per_note);
    }

    #[test]
    fn unknown_id_has_no_descriptor() {
        assert!(param_info(PARAM_COUNT as u32).is_none());
        assert!(value_to_text(99, 0.5).is_none());
    }

    #[test]
    fn value_text_is_plain_decimal() {
        assert_eq!(value_to_text(VOLUME, 0.5).unwrap(), "0.500000");
    }
}
