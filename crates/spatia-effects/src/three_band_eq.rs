//! Multichannel three-band equalizer.
//!
//! Three stages tuned from two crossover frequencies:
//!
//! ```text
//! x ─► ×lowband_gain ─► peaking @ mid ─► high shelf @ high ─► y
//! ```
//!
//! The low band sets the overall level. The peaking filter lifts or cuts the
//! middle band relative to the low band, and the shelf moves the top band
//! relative to the middle. The midband frequency is always halfway between the
//! two crossovers.

use spatia_core::{BiquadBank, BiquadType, db_to_linear, q_from_bw, q_from_s, scalar_multiplication_kernel};

use crate::error::EffectError;

/// Three-band equalizer over any number of channels.
///
/// ## Parameters
///
/// | Name | Default |
/// |------|---------|
/// | Lowband frequency | 300 Hz |
/// | Lowband gain | 0 dB |
/// | Midband gain | 0 dB |
/// | Highband frequency | 4000 Hz |
/// | Highband gain | 0 dB |
///
/// Frequencies are clamped to `[0, nyquist]`. Parameter changes are applied
/// at the start of the next [`process`](Self::process) call.
///
/// # Example
///
/// ```rust
/// use spatia_effects::ThreeBandEq;
///
/// let mut eq = ThreeBandEq::new(48000.0, 2).unwrap();
/// eq.set_highband_db(-6.0);
///
/// let left = [0.5f32; 64];
/// let right = [0.5f32; 64];
/// let mut out_l = [0.0f32; 64];
/// let mut out_r = [0.0f32; 64];
/// eq.process(&[&left, &right], &mut [&mut out_l, &mut out_r]);
/// // DC passes the shelf untouched
/// assert!((out_l[63] - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct ThreeBandEq {
    midband_peaks: BiquadBank,
    highband_shelves: BiquadBank,
    sample_rate: f32,
    channels: usize,

    lowband_frequency: f32,
    lowband_db: f32,
    midband_db: f32,
    highband_frequency: f32,
    highband_db: f32,

    lowband_gain: f32,
    dirty: bool,
}

impl ThreeBandEq {
    /// Creates a flat equalizer for `channels` channels.
    pub fn new(sample_rate: f32, channels: usize) -> Result<Self, EffectError> {
        if channels == 0 {
            return Err(EffectError::ChannelCount(channels));
        }
        let mut eq = Self {
            midband_peaks: BiquadBank::new(sample_rate, channels),
            highband_shelves: BiquadBank::new(sample_rate, channels),
            sample_rate,
            channels,
            lowband_frequency: 300.0,
            lowband_db: 0.0,
            midband_db: 0.0,
            highband_frequency: 4000.0,
            highband_db: 0.0,
            lowband_gain: 1.0,
            dirty: true,
        };
        eq.recompute();
        #[cfg(feature = "tracing")]
        tracing::debug!("three_band_eq: {channels} channel(s) at {sample_rate} Hz");
        Ok(eq)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sets the boundary between the low and middle bands.
    pub fn set_lowband_frequency(&mut self, hz: f32) {
        self.lowband_frequency = self.clamp_to_nyquist(hz);
        self.dirty = true;
    }

    /// Boundary between the low and middle bands.
    pub fn lowband_frequency(&self) -> f32 {
        self.lowband_frequency
    }

    /// Sets the low band gain in dB.
    pub fn set_lowband_db(&mut self, db: f32) {
        self.lowband_db = db;
        self.dirty = true;
    }

    /// Low band gain in dB.
    pub fn lowband_db(&self) -> f32 {
        self.lowband_db
    }

    /// Sets the middle band gain in dB.
    pub fn set_midband_db(&mut self, db: f32) {
        self.midband_db = db;
        self.dirty = true;
    }

    /// Middle band gain in dB.
    pub fn midband_db(&self) -> f32 {
        self.midband_db
    }

    /// Sets the boundary between the middle and high bands.
    pub fn set_highband_frequency(&mut self, hz: f32) {
        self.highband_frequency = self.clamp_to_nyquist(hz);
        self.dirty = true;
    }

    /// Boundary between the middle and high bands.
    pub fn highband_frequency(&self) -> f32 {
        self.highband_frequency
    }

    /// Sets the high band gain in dB.
    pub fn set_highband_db(&mut self, db: f32) {
        self.highband_db = db;
        self.dirty = true;
    }

    /// High band gain in dB.
    pub fn highband_db(&self) -> f32 {
        self.highband_db
    }

    /// Center of the middle band.
    pub fn midband_frequency(&self) -> f32 {
        self.lowband_frequency + (self.highband_frequency - self.lowband_frequency) / 2.0
    }

    fn clamp_to_nyquist(&self, hz: f32) -> f32 {
        hz.clamp(0.0, self.sample_rate / 2.0)
    }

    /// Retunes both filter banks from the current parameters.
    pub fn recompute(&mut self) {
        let midband_frequency = self.midband_frequency();
        self.lowband_gain = db_to_linear(self.lowband_db);

        let peaking_db = self.midband_db - self.lowband_db;
        let highshelf_db = self.highband_db - self.midband_db;
        let peaking_q = q_from_bw(
            midband_frequency,
            (self.highband_frequency - midband_frequency) * 2.0,
        );
        let highshelf_q = q_from_s(highshelf_db, 1.0);

        self.midband_peaks
            .configure(BiquadType::Peaking, midband_frequency, peaking_db, peaking_q);
        self.highband_shelves.configure(
            BiquadType::Highshelf,
            self.highband_frequency,
            highshelf_db,
            highshelf_q,
        );
        self.dirty = false;
    }

    /// Applies pending parameter changes.
    pub fn update(&mut self) {
        if self.dirty {
            self.recompute();
        }
    }

    /// Filters `inputs` into `outputs`, one buffer per channel.
    ///
    /// Processes `min(channels, inputs, outputs)` channels; each output
    /// receives `min(input, output)` samples.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        self.update();
        let channels = self.channels.min(inputs.len()).min(outputs.len());
        for (input, output) in inputs.iter().zip(outputs.iter_mut()).take(channels) {
            scalar_multiplication_kernel(self.lowband_gain, input, output);
        }
        let outputs = &mut outputs[..channels];
        self.midband_peaks.process(outputs);
        self.highband_shelves.process(outputs);
    }

    /// Filters each buffer in place.
    pub fn process_in_place(&mut self, buffers: &mut [&mut [f32]]) {
        self.update();
        let channels = self.channels.min(buffers.len());
        let gain = self.lowband_gain;
        for buffer in buffers.iter_mut().take(channels) {
            for sample in buffer.iter_mut() {
                *sample *= gain;
            }
        }
        let buffers = &mut buffers[..channels];
        self.midband_peaks.process(buffers);
        self.highband_shelves.process(buffers);
    }

    /// Combined magnitude response at `hz`, after applying pending changes.
    pub fn magnitude_at_hz(&mut self, hz: f32) -> f32 {
        self.update();
        let peak = self
            .midband_peaks
            .channel(0)
            .map_or(1.0, |f| f.magnitude_at_hz(hz));
        let shelf = self
            .highband_shelves
            .channel(0)
            .map_or(1.0, |f| f.magnitude_at_hz(hz));
        self.lowband_gain * peak * shelf
    }

    /// Clears every channel's filter history.
    pub fn reset(&mut self) {
        self.midband_peaks.reset();
        self.highband_shelves.reset();
    }
}
