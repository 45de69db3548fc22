//! Binaural panning by HRIR convolution.

use std::sync::Arc;

use spatia_core::{convolution_kernel, crossfade_convolution_kernel, db_to_linear};

use super::Panner;

/// Source of head-related impulse responses.
///
/// Implementations fill `left` and `right` (each [`length`](Self::length)
/// long) with the responses for a direction. Responses are causal:
/// `response[k]` weights the input `k` samples ago.
pub trait HrtfData: Send + Sync + core::fmt::Debug {
    /// Length of every impulse response, in samples.
    fn length(&self) -> usize;

    /// Sample rate the responses were designed for.
    fn sample_rate(&self) -> f32;

    /// Writes the responses for `azimuth`/`elevation` degrees.
    fn compute_coefficients(&self, azimuth: f32, elevation: f32, left: &mut [f32], right: &mut [f32]);
}

/// Average head radius in meters.
const HEAD_RADIUS: f32 = 0.0875;
/// Speed of sound in m/s.
const SPEED_OF_SOUND: f32 = 343.0;
/// Far-ear level drop at 90° lateral angle.
const MAX_ILD_DB: f32 = 10.0;

/// Synthetic spherical-head HRTF.
///
/// Models interaural time difference with Woodworth's formula, a level drop
/// at the far ear, and a one-pole head-shadow low-pass that deepens as the
/// source moves to the side. Good enough to place sources left/right and
/// front/back without a measured dataset.
#[derive(Debug, Clone)]
pub struct SphericalHeadHrtf {
    sample_rate: f32,
    length: usize,
}

impl SphericalHeadHrtf {
    /// Creates responses of about 1.5 ms at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        let length = ((sample_rate * 0.0015) as usize).max(8);
        Self {
            sample_rate,
            length,
        }
    }

    /// Creates responses of a specific length.
    pub fn with_length(sample_rate: f32, length: usize) -> Self {
        Self {
            sample_rate,
            length: length.max(2),
        }
    }

    fn ear_response(&self, delay: f32, gain: f32, shadow: f32, out: &mut [f32]) {
        out.fill(0.0);
        let last = (out.len() - 1) as f32;
        let delay = delay.clamp(0.0, last);
        let idx = delay as usize;
        let frac = delay - idx as f32;
        out[idx] += gain * (1.0 - frac);
        if idx + 1 < out.len() {
            out[idx + 1] += gain * frac;
        }

        // one-pole low-pass with unity DC gain
        let mut state = 0.0;
        for sample in out.iter_mut() {
            state = (1.0 - shadow) * *sample + shadow * state;
            *sample = state;
        }
    }
}

impl HrtfData for SphericalHeadHrtf {
    fn length(&self) -> usize {
        self.length
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn compute_coefficients(&self, azimuth: f32, elevation: f32, left: &mut [f32], right: &mut [f32]) {
        let az = azimuth.to_radians();
        let el = elevation.clamp(-90.0, 90.0).to_radians();

        // Lateral angle: positive to the right.
        let lateral = (az.sin() * el.cos()).clamp(-1.0, 1.0).asin();
        let theta = lateral.abs();
        let itd = HEAD_RADIUS / SPEED_OF_SOUND * (theta + theta.sin()) * self.sample_rate;

        let side = theta.sin();
        let far_gain = db_to_linear(-MAX_ILD_DB * side);
        let far_shadow = 0.6 * side;
        // Sources behind are slightly duller on both ears.
        let rear_shadow = if az.cos() < 0.0 { 0.2 * -az.cos() } else { 0.0 };
        let elevation_gain = 1.0 - 0.3 * (el.abs() / core::f32::consts::FRAC_PI_2);

        let near_delay = 1.0;
        let far_delay = near_delay + itd;
        let near = (near_delay, elevation_gain, rear_shadow);
        let far = (far_delay, elevation_gain * far_gain, (far_shadow + rear_shadow).min(0.9));

        let (l, r) = if lateral >= 0.0 { (far, near) } else { (near, far) };
        self.ear_response(l.0, l.1, l.2, left);
        self.ear_response(r.0, r.1, r.2, right);
    }
}

/// Convolves a mono signal with per-ear impulse responses.
///
/// Keeps the last `L - 1` input samples between calls so consecutive blocks
/// join seamlessly. When the direction changes and crossfading is enabled,
/// the next block fades from the old responses to the new ones. All buffers
/// are allocated up front; blocks longer than the construction block size
/// are processed in pieces.
#[derive(Debug)]
pub struct HrtfPanner {
    hrtf: Arc<dyn HrtfData>,
    block_size: usize,
    azimuth: f32,
    elevation: f32,
    /// Direction the current responses were computed for.
    computed: Option<(f32, f32)>,
    left: Vec<f32>,
    right: Vec<f32>,
    old_left: Vec<f32>,
    old_right: Vec<f32>,
    /// `L - 1` history samples followed by room for one block.
    scratch: Vec<f32>,
    crossfade: bool,
}

impl HrtfPanner {
    /// Creates a panner for blocks of up to `block_size` samples.
    pub fn new(block_size: usize, hrtf: Arc<dyn HrtfData>) -> Self {
        let len = hrtf.length().max(1);
        let block_size = block_size.max(1);
        Self {
            hrtf,
            block_size,
            azimuth: 0.0,
            elevation: 0.0,
            computed: None,
            left: vec![0.0; len],
            right: vec![0.0; len],
            old_left: vec![0.0; len],
            old_right: vec![0.0; len],
            scratch: vec![0.0; len - 1 + block_size],
            crossfade: true,
        }
    }

    /// Current azimuth in degrees.
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Current elevation in degrees.
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Length of the impulse responses in use.
    pub fn response_length(&self) -> usize {
        self.left.len()
    }

    fn pan_chunk(&mut self, input: &[f32], left_out: &mut [f32], right_out: &mut [f32]) {
        let history = self.left.len() - 1;
        let m = input.len();
        self.scratch[history..history + m].copy_from_slice(input);
        let window = &self.scratch[..history + m];

        let direction = (self.azimuth, self.elevation);
        let computed = self.computed;
        match computed {
            Some(prev) if prev == direction => {
                convolution_kernel(window, left_out, &self.left);
                convolution_kernel(window, right_out, &self.right);
            }
            previous => {
                std::mem::swap(&mut self.left, &mut self.old_left);
                std::mem::swap(&mut self.right, &mut self.old_right);
                self.hrtf.compute_coefficients(
                    direction.0,
                    direction.1,
                    &mut self.left,
                    &mut self.right,
                );
                self.computed = Some(direction);

                if self.crossfade && previous.is_some() {
                    crossfade_convolution_kernel(window, left_out, &self.old_left, &self.left);
                    crossfade_convolution_kernel(window, right_out, &self.old_right, &self.right);
                } else {
                    convolution_kernel(window, left_out, &self.left);
                    convolution_kernel(window, right_out, &self.right);
                }
            }
        }

        self.scratch.copy_within(m..m + history, 0);
    }
}

impl Panner for HrtfPanner {
    fn set_azimuth(&mut self, azimuth: f32) {
        self.azimuth = azimuth;
    }

    fn set_elevation(&mut self, elevation: f32) {
        self.elevation = elevation.clamp(-90.0, 90.0);
    }

    fn channels(&self) -> usize {
        2
    }

    fn pan(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        let [left, right, ..] = outputs else {
            return;
        };
        let mut start = 0;
        while start < input.len() {
            let end = (start + self.block_size).min(input.len());
            self.pan_chunk(&input[start..end], &mut left[start..end], &mut right[start..end]);
            start = end;
        }
    }

    fn reset(&mut self) {
        self.scratch.fill(0.0);
        self.computed = None;
    }

    fn set_should_crossfade(&mut self, crossfade: bool) {
        self.crossfade = crossfade;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(x: &[f32]) -> f32 {
        x.iter().map(|v| v * v).sum()
    }

    fn panner(block: usize) -> HrtfPanner {
        HrtfPanner::new(block, Arc::new(SphericalHeadHrtf::new(44100.0)))
    }

    #[test]
    fn front_is_symmetric() {
        let hrtf = SphericalHeadHrtf::new(44100.0);
        let mut l = vec![0.0; hrtf.length()];
        let mut r = vec![0.0; hrtf.length()];
        hrtf.compute_coefficients(0.0, 0.0, &mut l, &mut r);
        for (a, b) in l.iter().zip(&r) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn right_source_is_louder_and_earlier_on_right() {
        let hrtf = SphericalHeadHrtf::new(44100.0);
        let mut l = vec![0.0; hrtf.length()];
        let mut r = vec![0.0; hrtf.length()];
        hrtf.compute_coefficients(90.0, 0.0, &mut l, &mut r);
        assert!(energy(&r) > energy(&l) * 2.0);

        let peak = |x: &[f32]| {
            x.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map_or(0, |(i, _)| i)
        };
        assert!(peak(&r) < peak(&l));
    }

    #[test]
    fn blocks_join_seamlessly() {
        let signal: Vec<f32> = (0..256).map(|i| (i as f32 * 0.21).sin()).collect();

        let mut one = panner(256);
        let mut l1 = vec![0.0; 256];
        let mut r1 = vec![0.0; 256];
        one.set_azimuth(40.0);
        one.pan(&signal, &mut [&mut l1, &mut r1]);

        let mut many = panner(64);
        many.set_azimuth(40.0);
        let mut l2 = vec![0.0; 256];
        let mut r2 = vec![0.0; 256];
        for chunk in 0..4 {
            let range = chunk * 64..(chunk + 1) * 64;
            let (mut lo, mut ro) = (vec![0.0; 64], vec![0.0; 64]);
            many.pan(&signal[range.clone()], &mut [&mut lo, &mut ro]);
            l2[range.clone()].copy_from_slice(&lo);
            r2[range].copy_from_slice(&ro);
        }

        for i in 0..256 {
            assert!((l1[i] - l2[i]).abs() < 1e-5, "left {i}");
            assert!((r1[i] - r2[i]).abs() < 1e-5, "right {i}");
        }
    }

    #[test]
    fn long_input_is_chunked() {
        let mut p = panner(32);
        let input = vec![1.0; 100];
        let mut l = vec![f32::NAN; 100];
        let mut r = vec![f32::NAN; 100];
        p.pan(&input, &mut [&mut l, &mut r]);
        assert!(l.iter().chain(&r).all(|x| x.is_finite()));
    }

    #[test]
    fn direction_change_crossfades() {
        let mut p = panner(64);
        let input = vec![1.0; 64];
        let mut l = vec![0.0; 64];
        let mut r = vec![0.0; 64];
        p.set_azimuth(-90.0);
        p.pan(&input, &mut [&mut l, &mut r]);
        p.pan(&input, &mut [&mut l, &mut r]);
        let settled_left = l[63];

        p.set_azimuth(90.0);
        p.pan(&input, &mut [&mut l, &mut r]);
        // first sample still uses the old responses
        assert!((l[0] - settled_left).abs() < 1e-4);
        // by the end the left ear is the far ear
        assert!(l[63] < settled_left);
        assert!(r[63] > r[0]);
    }

    #[test]
    fn reset_clears_history() {
        let mut p = panner(16);
        let input = vec![1.0; 16];
        let silence = vec![0.0; 16];
        let mut l = vec![0.0; 16];
        let mut r = vec![0.0; 16];
        p.pan(&input, &mut [&mut l, &mut r]);
        p.reset();
        p.pan(&silence, &mut [&mut l, &mut r]);
        assert!(l.iter().chain(&r).all(|x| *x == 0.0));
    }
}
