//! Occlusion as a high-shelf cut.
//!
//! A normalized occlusion amount `o` in `[0, 1]` maps to:
//!
//! - `o == 0`: identity (no filtering)
//! - gain `-70·o` dB, so full occlusion is a -70 dB shelf
//! - frequency `(1000/e)·e^(1-o)`, falling from 1000 Hz toward 368 Hz as
//!   occlusion grows, which makes the perceived effect roughly linear in `o`
//! - Q fixed at 0.5

use spatia_core::{BiquadFilter, BiquadType};

/// Shelf gain in dB at full occlusion.
pub const FULL_OCCLUSION_DB: f32 = -70.0;

/// Q of the occlusion shelf.
pub const OCCLUSION_Q: f32 = 0.5;

/// High-shelf parameters for a given occlusion amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionShelf {
    /// Shelf gain in dB (negative).
    pub db_gain: f32,
    /// Shelf frequency in Hz.
    pub frequency: f32,
    /// Shelf Q.
    pub q: f32,
}

/// Clamps an occlusion amount into `[0, 1]`. NaN counts as unoccluded.
pub fn clamp_occlusion(occlusion: f32) -> f32 {
    if occlusion.is_nan() {
        0.0
    } else {
        occlusion.clamp(0.0, 1.0)
    }
}

/// Shelf for `occlusion`, or `None` when the path is clear.
pub fn occlusion_params(occlusion: f32) -> Option<OcclusionShelf> {
    let o = clamp_occlusion(occlusion);
    if o == 0.0 {
        return None;
    }
    let scale = 1000.0 / core::f32::consts::E;
    Some(OcclusionShelf {
        db_gain: FULL_OCCLUSION_DB * o,
        frequency: scale * (1.0 - o).exp(),
        q: OCCLUSION_Q,
    })
}

/// Configures `filter` for `occlusion`. Switching to or from identity is safe
/// mid-stream.
pub fn configure_occlusion(filter: &mut BiquadFilter, occlusion: f32) {
    match occlusion_params(occlusion) {
        None => filter.configure(BiquadType::Identity, 0.0, 0.0, 0.0),
        Some(shelf) => filter.configure(
            BiquadType::Highshelf,
            shelf.frequency,
            shelf.db_gain,
            shelf.q,
        ),
    }
}
