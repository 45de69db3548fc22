//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a generic second-order IIR section plus a reconfigurable,
//! sample-rate aware [`BiquadFilter`] and a per-channel [`BiquadBank`].
//! The same filter is used for occlusion modeling (high shelf) and for
//! multi-band equalization (peaking + shelf).
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::f32::consts::PI;
use libm::{cosf, powf, sinf, sqrtf};

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
///
/// This is a building block for creating specific filter types.
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients, normalized by a0
    a1: f32,
    a2: f32,

    /// Input history: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output history: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    ///
    /// Initial state: `y[n] = x[n]` (no filtering)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Sets the biquad coefficients.
    ///
    /// # Arguments
    ///
    /// * `b0, b1, b2` - Feedforward coefficients
    /// * `a0, a1, a2` - Feedback coefficients (a0 is typically 1.0)
    ///
    /// Note: This function normalizes by a0 internally. The filter history
    /// is kept, so coefficients can be swapped mid-stream.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Sets coefficients from the tuple returned by the `*_coefficients`
    /// helpers in this module.
    #[inline]
    pub fn set_coefficient_tuple(&mut self, c: (f32, f32, f32, f32, f32, f32)) {
        self.set_coefficients(c.0, c.1, c.2, c.3, c.4, c.5);
    }

    /// Processes a single sample through the biquad filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
                                     - self.a1 * self.y1 - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state (delay lines).
    ///
    /// Useful for resetting the filter without changing coefficients.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude of the transfer function at `omega` radians/sample.
    ///
    /// Evaluates `|H(e^jω)|` directly from the current coefficients.
    pub fn magnitude_at(&self, omega: f32) -> f32 {
        let (c1, s1) = (cosf(omega), sinf(omega));
        let (c2, s2) = (cosf(2.0 * omega), sinf(2.0 * omega));

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        sqrtf((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im))
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter shapes understood by [`BiquadFilter::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiquadType {
    /// Gain-preserving pass-through. Always safe to switch to and from.
    #[default]
    Identity,
    /// Second-order low-pass.
    Lowpass,
    /// Second-order high-pass.
    Highpass,
    /// Band-pass with constant 0 dB peak gain.
    Bandpass,
    /// Band-reject.
    Notch,
    /// Phase-only allpass.
    Allpass,
    /// Peaking EQ bell.
    Peaking,
    /// Low shelf.
    Lowshelf,
    /// High shelf.
    Highshelf,
}

/// The last configuration applied to a [`BiquadFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadConfig {
    /// Filter shape.
    pub kind: BiquadType,
    /// Center/cutoff/shelf frequency in Hz.
    pub frequency: f32,
    /// Gain in dB (peaking and shelf types only).
    pub db_gain: f32,
    /// Q factor.
    pub q: f32,
}

impl BiquadConfig {
    /// The identity configuration.
    pub const IDENTITY: Self = Self {
        kind: BiquadType::Identity,
        frequency: 0.0,
        db_gain: 0.0,
        q: 0.0,
    };
}

/// Sample-rate aware, reconfigurable biquad.
///
/// Starts as [`BiquadType::Identity`]. Reconfiguring only recomputes
/// coefficients; the history is kept, so switching shapes mid-stream gives
/// no discontinuity beyond the normal IIR transient.
///
/// # Example
///
/// ```rust
/// use spatia_core::{BiquadFilter, BiquadType};
///
/// let mut filter = BiquadFilter::new(44100.0);
/// filter.configure(BiquadType::Highshelf, 606.5, -35.0, 0.5);
/// let y = filter.tick(1.0);
/// assert!(y.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    section: Biquad,
    sample_rate: f32,
    config: BiquadConfig,
}

impl BiquadFilter {
    /// Creates an identity filter for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            section: Biquad::new(),
            sample_rate,
            config: BiquadConfig::IDENTITY,
        }
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Returns the last applied configuration.
    pub fn config(&self) -> BiquadConfig {
        self.config
    }

    /// Reconfigures the filter.
    ///
    /// `frequency` is clamped into `(0, nyquist)` and `q` to a small positive
    /// floor. Both are ignored for [`BiquadType::Identity`], and `db_gain` is
    /// only used by the peaking and shelf shapes.
    pub fn configure(&mut self, kind: BiquadType, frequency: f32, db_gain: f32, q: f32) {
        self.config = BiquadConfig {
            kind,
            frequency,
            db_gain,
            q,
        };

        if kind == BiquadType::Identity {
            self.section.set_coefficients(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            return;
        }

        let nyquist = self.sample_rate * 0.5;
        let f = frequency.clamp(1.0, nyquist * 0.999);
        let q = q.max(1e-3);
        let sr = self.sample_rate;

        let coefficients = match kind {
            BiquadType::Identity => (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            BiquadType::Lowpass => lowpass_coefficients(f, q, sr),
            BiquadType::Highpass => highpass_coefficients(f, q, sr),
            BiquadType::Bandpass => bandpass_coefficients(f, q, sr),
            BiquadType::Notch => notch_coefficients(f, q, sr),
            BiquadType::Allpass => allpass_coefficients(f, q, sr),
            BiquadType::Peaking => peaking_eq_coefficients(f, q, db_gain, sr),
            BiquadType::Lowshelf => low_shelf_coefficients(f, q, db_gain, sr),
            BiquadType::Highshelf => high_shelf_coefficients(f, q, db_gain, sr),
        };
        self.section.set_coefficient_tuple(coefficients);
    }

    /// Filters one sample.
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        self.section.process(input)
    }

    /// Filters `input` into `output` (same length).
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        for (out, &x) in output.iter_mut().zip(input.iter()) {
            *out = self.section.process(x);
        }
    }

    /// Filters a buffer in place.
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.section.process(*sample);
        }
    }

    /// Clears the filter history, keeping the configuration.
    pub fn reset(&mut self) {
        self.section.clear();
    }

    /// Magnitude response at `frequency` Hz for the current configuration.
    pub fn magnitude_at_hz(&self, frequency: f32) -> f32 {
        self.section
            .magnitude_at(2.0 * PI * frequency / self.sample_rate)
    }
}

/// Q for a bandwidth given in Hz around `frequency`.
///
/// Uses the definition `Q = f0 / BW`.
pub fn q_from_bw(frequency: f32, bandwidth: f32) -> f32 {
    frequency / bandwidth.max(1e-6)
}

/// Q equivalent of a shelf slope `s` at the given shelf gain.
///
/// RBJ: `1/Q = sqrt((A + 1/A)(1/S - 1) + 2)` with `A = 10^(dB/40)`.
/// `s = 1` is the steepest slope without overshoot and yields `Q = 1/√2`
/// for any gain.
pub fn q_from_s(db_gain: f32, s: f32) -> f32 {
    let a = powf(10.0, db_gain / 40.0);
    let inv_q = sqrtf(((a + 1.0 / a) * (1.0 / s.max(1e-6) - 1.0) + 2.0).max(1e-12));
    1.0 / inv_q
}

/// Per-channel bank of identically configured [`BiquadFilter`]s.
///
/// Each channel keeps independent history.
#[derive(Debug, Clone)]
pub struct BiquadBank {
    filters: Vec<BiquadFilter>,
    sample_rate: f32,
    config: BiquadConfig,
}

impl BiquadBank {
    /// Creates a bank of `channels` identity filters.
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let mut bank = Self {
            filters: Vec::new(),
            sample_rate,
            config: BiquadConfig::IDENTITY,
        };
        bank.set_channel_count(channels);
        bank
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.filters.len()
    }

    /// Grows or shrinks the bank. New channels adopt the current
    /// configuration with cleared history.
    pub fn set_channel_count(&mut self, channels: usize) {
        let config = self.config;
        let sample_rate = self.sample_rate;
        self.filters.resize_with(channels, || {
            let mut filter = BiquadFilter::new(sample_rate);
            filter.configure(config.kind, config.frequency, config.db_gain, config.q);
            filter
        });
    }

    /// Configures every channel.
    pub fn configure(&mut self, kind: BiquadType, frequency: f32, db_gain: f32, q: f32) {
        self.config = BiquadConfig {
            kind,
            frequency,
            db_gain,
            q,
        };
        for filter in &mut self.filters {
            filter.configure(kind, frequency, db_gain, q);
        }
    }

    /// Returns the last applied configuration.
    pub fn config(&self) -> BiquadConfig {
        self.config
    }

    /// Access a single channel's filter.
    pub fn channel(&self, index: usize) -> Option<&BiquadFilter> {
        self.filters.get(index)
    }

    /// Filters each buffer in place with its channel's filter.
    ///
    /// Extra buffers beyond the channel count are left untouched.
    pub fn process(&mut self, buffers: &mut [&mut [f32]]) {
        for (filter, buffer) in self.filters.iter_mut().zip(buffers.iter_mut()) {
            filter.process_in_place(buffer);
        }
    }

    /// Clears every channel's history.
    pub fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }
}

/// Calculates low-pass filter coefficients using the RBJ cookbook formula.
///
/// # Arguments
///
/// * `frequency` - Cutoff frequency in Hz
/// * `q` - Q factor (typically 0.707 for Butterworth response)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 - cos_omega) / 2.0;
    let b1 = 1.0 - cos_omega;
    let b2 = (1.0 - cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high-pass filter coefficients using the RBJ cookbook formula.
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates band-pass filter coefficients using the RBJ cookbook formula.
///
/// This version has constant 0dB peak gain.
pub fn bandpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates notch (band-reject) filter coefficients using the RBJ cookbook formula.
pub fn notch_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (1.0, -2.0 * cos_omega, 1.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// Calculates second-order allpass coefficients using the RBJ cookbook formula.
pub fn allpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    (
        1.0 - alpha,
        -2.0 * cos_omega,
        1.0 + alpha,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// Calculates peaking EQ filter coefficients using the RBJ cookbook formula.
///
/// A peaking EQ boosts or cuts around a center frequency with a specified bandwidth.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `gain_db` - Gain in decibels (positive = boost, negative = cut)
/// * `sample_rate` - Sample rate in Hz
pub fn peaking_eq_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0); // sqrt(10^(dB/20))
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);

    let b0 = 1.0 + alpha * a;
    let b1 = -2.0 * cos_omega;
    let b2 = 1.0 - alpha * a;
    let a0 = 1.0 + alpha / a;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha / a;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates low shelf coefficients using the RBJ cookbook formula.
///
/// Gain below `frequency` is `gain_db`; unity above it.
pub fn low_shelf_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}

/// Calculates high shelf coefficients using the RBJ cookbook formula.
///
/// Unity gain below `frequency`; `gain_db` above it.
pub fn high_shelf_coefficients(frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> (f32, f32, f32, f32, f32, f32) {
    let a = powf(10.0, gain_db / 40.0);
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * q);
    let two_sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

    let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + two_sqrt_a_alpha);
    let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
    let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - two_sqrt_a_alpha);
    let a0 = (a + 1.0) - (a - 1.0) * cos_omega + two_sqrt_a_alpha;
    let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
    let a2 = (a + 1.0) - (a - 1.0) * cos_omega - two_sqrt_a_alpha;

    (b0, b1, b2, a0, a1, a2)
}
