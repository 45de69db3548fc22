//! Panner backends: mono signal plus direction in, N channels out.
//!
//! Every backend implements [`Panner`]. A source holds one of each in a
//! [`PannerBank`] and dispatches by [`PannerSlot`], so a strategy switch never
//! allocates or recomputes direction state.
//!
//! | Strategy | Backend | Channels |
//! |----------|---------|----------|
//! | `Hrtf` | [`HrtfPanner`] | 2 |
//! | `Stereo` | [`AmplitudePanner`] | 2 |
//! | `Surround40` | [`AmplitudePanner`] | 4 |
//! | `Surround51` | [`AmplitudePanner`] | 6 |
//! | `Surround71` | [`AmplitudePanner`] | 8 |
//!
//! Angles are in degrees. Azimuth 0 is straight ahead and grows clockwise
//! (positive to the right); elevation is positive upward.

mod amplitude;
mod hrtf;

pub use amplitude::{
    AmplitudePanner, STEREO_MAP, SURROUND40_MAP, SURROUND51_MAP, SURROUND71_MAP,
};
pub use hrtf::{HrtfData, HrtfPanner, SphericalHeadHrtf};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SpatialError;

/// Capability shared by every panner backend.
pub trait Panner {
    /// Sets the horizontal angle in degrees.
    fn set_azimuth(&mut self, azimuth: f32);

    /// Sets the vertical angle in degrees.
    fn set_elevation(&mut self, elevation: f32);

    /// Number of output channels written by [`pan`](Self::pan).
    fn channels(&self) -> usize;

    /// Pans `input` into the first [`channels`](Self::channels) buffers of
    /// `outputs`, overwriting them. Each buffer must be at least
    /// `input.len()` long.
    fn pan(&mut self, input: &[f32], outputs: &mut [&mut [f32]]);

    /// Clears any signal history.
    fn reset(&mut self);

    /// Enables or disables smoothing when the direction changes.
    fn set_should_crossfade(&mut self, crossfade: bool);
}

/// How a source's main mix is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanningStrategy {
    /// Binaural rendering for headphones.
    Hrtf,
    /// Two-speaker amplitude panning.
    #[default]
    Stereo,
    /// Quadraphonic (front pair, rear pair).
    #[serde(rename = "surround40")]
    Surround40,
    /// 5.1 with silent center and LFE.
    #[serde(rename = "surround51")]
    Surround51,
    /// 7.1 with silent center and LFE.
    #[serde(rename = "surround71")]
    Surround71,
}

impl PanningStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [PanningStrategy; 5] = [
        Self::Hrtf,
        Self::Stereo,
        Self::Surround40,
        Self::Surround51,
        Self::Surround71,
    ];

    /// Channels produced by this strategy.
    pub fn channels(self) -> usize {
        match self {
            Self::Hrtf | Self::Stereo => 2,
            Self::Surround40 => 4,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
        }
    }

    /// Backend that renders this strategy.
    pub fn slot(self) -> PannerSlot {
        match self {
            Self::Hrtf => PannerSlot::Hrtf,
            Self::Stereo => PannerSlot::Stereo,
            Self::Surround40 => PannerSlot::Surround40,
            Self::Surround51 => PannerSlot::Surround51,
            Self::Surround71 => PannerSlot::Surround71,
        }
    }

    /// Name as used in scene files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hrtf => "hrtf",
            Self::Stereo => "stereo",
            Self::Surround40 => "surround40",
            Self::Surround51 => "surround51",
            Self::Surround71 => "surround71",
        }
    }
}

/// Tag selecting one backend out of a [`PannerBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PannerSlot {
    /// [`HrtfPanner`].
    Hrtf,
    /// Stereo [`AmplitudePanner`].
    Stereo,
    /// 4.0 [`AmplitudePanner`].
    Surround40,
    /// 5.1 [`AmplitudePanner`].
    Surround51,
    /// 7.1 [`AmplitudePanner`].
    Surround71,
}

impl PannerSlot {
    /// All slots, in declaration order.
    pub const ALL: [PannerSlot; 5] = [
        Self::Hrtf,
        Self::Stereo,
        Self::Surround40,
        Self::Surround51,
        Self::Surround71,
    ];

    /// Amplitude backend for an effect send with `channels` channels.
    ///
    /// Mono sends need no panner (`Ok(None)`). Sends are validated when they
    /// are registered, so any other count here is an internal fault.
    pub fn for_channels(channels: usize) -> Result<Option<PannerSlot>, SpatialError> {
        match channels {
            1 => Ok(None),
            2 => Ok(Some(PannerSlot::Stereo)),
            4 => Ok(Some(PannerSlot::Surround40)),
            6 => Ok(Some(PannerSlot::Surround51)),
            8 => Ok(Some(PannerSlot::Surround71)),
            other => Err(SpatialError::internal(format!(
                "effect send reports {other} channels"
            ))),
        }
    }
}

/// One pre-allocated instance of every backend.
#[derive(Debug)]
pub struct PannerBank {
    hrtf: HrtfPanner,
    stereo: AmplitudePanner,
    surround40: AmplitudePanner,
    surround51: AmplitudePanner,
    surround71: AmplitudePanner,
}

impl PannerBank {
    /// Builds all backends for blocks of up to `block_size` samples.
    pub fn new(block_size: usize, hrtf: Arc<dyn HrtfData>) -> Self {
        Self {
            hrtf: HrtfPanner::new(block_size, hrtf),
            stereo: AmplitudePanner::new(&STEREO_MAP),
            surround40: AmplitudePanner::new(&SURROUND40_MAP),
            surround51: AmplitudePanner::new(&SURROUND51_MAP),
            surround71: AmplitudePanner::new(&SURROUND71_MAP),
        }
    }

    /// Pushes a direction to every backend.
    pub fn set_direction(&mut self, azimuth: f32, elevation: f32) {
        for panner in self.iter_mut() {
            panner.set_azimuth(azimuth);
            panner.set_elevation(elevation);
        }
    }

    /// Backend for `slot`.
    pub fn get_mut(&mut self, slot: PannerSlot) -> &mut dyn Panner {
        match slot {
            PannerSlot::Hrtf => &mut self.hrtf,
            PannerSlot::Stereo => &mut self.stereo,
            PannerSlot::Surround40 => &mut self.surround40,
            PannerSlot::Surround51 => &mut self.surround51,
            PannerSlot::Surround71 => &mut self.surround71,
        }
    }

    /// Shared access to the HRTF backend.
    pub fn hrtf(&self) -> &HrtfPanner {
        &self.hrtf
    }

    /// Toggles direction-change smoothing on every backend.
    pub fn set_should_crossfade(&mut self, crossfade: bool) {
        for panner in self.iter_mut() {
            panner.set_should_crossfade(crossfade);
        }
    }

    /// Clears every backend's history.
    pub fn reset(&mut self) {
        for panner in self.iter_mut() {
            panner.reset();
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn Panner> {
        [
            &mut self.hrtf as &mut dyn Panner,
            &mut self.stereo,
            &mut self.surround40,
            &mut self.surround51,
            &mut self.surround71,
        ]
        .into_iter()
    }
}
