//! Nested allpass diffuser.
//!
//! Each stage is an outer allpass with a second allpass inside its delay
//! path. Because an allpass nested inside the loop of another is still an
//! allpass, a series of stages smears transients into a dense wash without
//! coloring the spectrum, which makes it the usual front end of a
//! Schroeder/lattice reverberator.
//!
//! ```text
//!            ┌───────────── stage ─────────────┐
//! x ──► (+) ─┬─► z^-d_outer ─► [inner AP] ─┬──► (+) ──► y
//!        ▲   │                             │    ▲
//!        │   └──────────────► c ───────────┼────┘
//!        └────────────── -c ◄──────────────┘
//! ```
//!
//! The right channel runs an identically tuned chain. Its filters are slaves
//! of the left ones in an [`AllpassBank`], so retuning the left chain retunes
//! both while each keeps its own delay state.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use libm::{ceilf, roundf};

use spatia_core::{AllpassBank, AllpassFilter, DelayLine, SampleDelayLine};

/// Outer delays of the default stages (at 44.1kHz reference).
const OUTER_TUNINGS_44K: [usize; 4] = [661, 523, 401, 293];

/// Inner delays of the default stages (at 44.1kHz reference).
const INNER_TUNINGS_44K: [usize; 4] = [149, 211, 97, 127];

/// Reference sample rate for tuning constants.
const REFERENCE_RATE: f32 = 44100.0;

/// Largest size scale; lines are allocated for it up front.
const MAX_SIZE: f32 = 2.0;

/// Smallest size scale.
const MIN_SIZE: f32 = 0.1;

/// Inner coefficient relative to the outer one.
const INNER_RATIO: f32 = -0.8;

/// Maximum right-channel offset in milliseconds.
const MAX_SPREAD_MS: f32 = 10.0;

/// Scale delay times from reference rate to target rate.
fn scale_to_rate(samples: usize, target_rate: f32) -> usize {
    (roundf(samples as f32 * target_rate / REFERENCE_RATE) as usize).max(1)
}

#[derive(Debug, Clone, Copy)]
struct Stage {
    outer: usize,
    inner: usize,
    right_outer: usize,
    right_inner: usize,
    outer_base: usize,
    inner_base: usize,
}

/// Stereo nested-allpass diffuser.
///
/// # Parameters
///
/// - `diffusion`: 0.0-0.95, outer coefficient (inner uses -0.8×)
/// - `size`: 0.1-2.0, scales every delay
/// - `spread`: 0-10 ms, extra delay on the right input for decorrelation
///
/// # Example
///
/// ```rust
/// use spatia_effects::Diffuser;
///
/// let mut diffuser = Diffuser::new(48000.0);
/// diffuser.set_diffusion(0.6);
///
/// let (l, r) = diffuser.tick_stereo(1.0, 1.0);
/// assert!(l.is_finite() && r.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct Diffuser {
    bank: AllpassBank<SampleDelayLine>,
    stages: Vec<Stage>,
    spread: SampleDelayLine,
    spread_ms: f32,
    diffusion: f32,
    size: f32,
    sample_rate: f32,
}

impl Diffuser {
    /// Creates the default four-stage diffuser.
    pub fn new(sample_rate: f32) -> Self {
        let pairs: Vec<(usize, usize)> = OUTER_TUNINGS_44K
            .iter()
            .zip(INNER_TUNINGS_44K.iter())
            .map(|(&o, &i)| (scale_to_rate(o, sample_rate), scale_to_rate(i, sample_rate)))
            .collect();
        Self::with_stages(sample_rate, &pairs)
    }

    /// Creates a diffuser from `(outer, inner)` delays in samples, one pair
    /// per stage.
    pub fn with_stages(sample_rate: f32, delays: &[(usize, usize)]) -> Self {
        let mut bank = AllpassBank::new();
        let mut stages = Vec::with_capacity(delays.len());
        let line = |base: usize| {
            let max = (ceilf(base as f32 * MAX_SIZE) as usize).max(1);
            AllpassFilter::with_coefficient(SampleDelayLine::with_delay(max, base.max(1)), 0.5)
        };

        for &(outer_base, inner_base) in delays {
            let outer = bank.push(line(outer_base));
            let inner = bank.push(line(inner_base));
            let right_outer = bank.push(line(outer_base));
            let right_inner = bank.push(line(inner_base));
            let linked = bank.link(outer, right_outer).and(bank.link(inner, right_inner));
            debug_assert!(linked.is_ok(), "fresh diffuser stages must link");
            stages.push(Stage {
                outer,
                inner,
                right_outer,
                right_inner,
                outer_base,
                inner_base,
            });
        }

        let spread_max = ((sample_rate * MAX_SPREAD_MS / 1000.0) as usize).max(1);
        let mut diffuser = Self {
            bank,
            stages,
            spread: SampleDelayLine::new(spread_max),
            spread_ms: 0.0,
            diffusion: 0.5,
            size: 1.0,
            sample_rate,
        };
        diffuser.set_diffusion(0.5);
        #[cfg(feature = "tracing")]
        tracing::debug!("diffuser: {} nested stage(s)", diffuser.stages.len());
        diffuser
    }

    /// Number of nested stages.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// The filters, left chain linked to right chain.
    pub fn bank(&self) -> &AllpassBank<SampleDelayLine> {
        &self.bank
    }

    /// Sets the outer coefficient of every stage.
    pub fn set_diffusion(&mut self, diffusion: f32) {
        self.diffusion = diffusion.clamp(0.0, 0.95);
        for stage in &self.stages {
            self.bank.set_coefficient(stage.outer, self.diffusion);
            self.bank
                .set_coefficient(stage.inner, self.diffusion * INNER_RATIO);
        }
    }

    /// Outer coefficient.
    pub fn diffusion(&self) -> f32 {
        self.diffusion
    }

    /// Scales every delay relative to its base tuning.
    pub fn set_size(&mut self, size: f32) {
        self.size = size.clamp(MIN_SIZE, MAX_SIZE);
        for stage in &self.stages {
            let outer = roundf(stage.outer_base as f32 * self.size);
            let inner = roundf(stage.inner_base as f32 * self.size);
            self.bank.set_delay(stage.outer, outer);
            self.bank.set_delay(stage.inner, inner);
        }
    }

    /// Delay scale.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Delays the right input by `ms` milliseconds. 0 disables the offset.
    pub fn set_spread_ms(&mut self, ms: f32) {
        self.spread_ms = ms.clamp(0.0, MAX_SPREAD_MS);
        let samples = roundf(self.spread_ms * self.sample_rate / 1000.0);
        self.spread.set_delay(samples);
    }

    /// Right-channel offset in milliseconds.
    pub fn spread_ms(&self) -> f32 {
        self.spread_ms
    }

    fn nested_tick(bank: &mut AllpassBank<SampleDelayLine>, outer: usize, inner: usize, x: f32) -> f32 {
        let Some(v) = bank.get_mut(outer).map(|f| f.begin_nested_tick()) else {
            return x;
        };
        let transformed = bank.tick(inner, v);
        match bank.get_mut(outer) {
            Some(f) => f.end_nested_tick(x, transformed),
            None => x,
        }
    }

    /// Diffuses one sample through the left chain.
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let mut x = input;
        for stage in &self.stages {
            x = Self::nested_tick(&mut self.bank, stage.outer, stage.inner, x);
        }
        x
    }

    /// Diffuses one stereo sample through both chains.
    #[inline]
    pub fn tick_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut r = if self.spread_ms > 0.0 {
            let delayed = self.spread.read();
            self.spread.advance(right);
            delayed
        } else {
            right
        };
        let mut l = left;
        for stage in &self.stages {
            l = Self::nested_tick(&mut self.bank, stage.outer, stage.inner, l);
            r = Self::nested_tick(&mut self.bank, stage.right_outer, stage.right_inner, r);
        }
        (l, r)
    }

    /// Diffuses two buffers in place.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.tick_stereo(*l, *r);
        }
    }

    /// Clears every delay line.
    pub fn reset(&mut self) {
        self.bank.reset_all();
        self.spread.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48000.0;

    fn impulse_energy(diffuser: &mut Diffuser, samples: usize) -> f32 {
        let mut energy = 0.0;
        for i in 0..samples {
            let y = diffuser.tick(if i == 0 { 1.0 } else { 0.0 });
            energy += y * y;
        }
        energy
    }

    #[test]
    fn default_tuning_scales_with_rate() {
        let d = Diffuser::new(SR);
        assert_eq!(d.stage_count(), 4);
        assert_eq!(d.bank().len(), 16);
        let outer = d.bank().get(0).unwrap().line().delay();
        assert_eq!(outer, (661.0f32 * SR / 44100.0).round());
    }

    #[test]
    fn preserves_energy() {
        let mut d = Diffuser::new(SR);
        d.set_diffusion(0.7);
        let energy = impulse_energy(&mut d, 96000);
        assert!((energy - 1.0).abs() < 1e-3, "energy {energy}");
    }

    #[test]
    fn smears_impulse() {
        let mut d = Diffuser::new(SR);
        let mut nonzero = 0;
        for i in 0..4800 {
            let y = d.tick(if i == 0 { 1.0 } else { 0.0 });
            if y.abs() > 1e-4 {
                nonzero += 1;
            }
        }
        assert!(nonzero > 50, "only {nonzero} taps");
    }

    #[test]
    fn right_chain_follows_left_tuning() {
        let mut d = Diffuser::new(SR);
        d.set_diffusion(0.4);
        d.set_size(1.5);
        for stage in &d.stages {
            let bank = d.bank();
            let (l, r) = (bank.get(stage.outer).unwrap(), bank.get(stage.right_outer).unwrap());
            assert_eq!(l.coefficient(), r.coefficient());
            assert_eq!(l.line().delay(), r.line().delay());
            let (l, r) = (bank.get(stage.inner).unwrap(), bank.get(stage.right_inner).unwrap());
            assert_eq!(l.coefficient(), r.coefficient());
            assert!((l.coefficient() + 0.32).abs() < 1e-6);
            assert_eq!(l.line().delay(), r.line().delay());
        }
    }

    #[test]
    fn chains_keep_separate_state() {
        let mut d = Diffuser::new(SR);
        let mut right_energy = 0.0;
        for i in 0..2000 {
            let (_, r) = d.tick_stereo(if i == 0 { 1.0 } else { 0.0 }, 0.0);
            right_energy += r * r;
        }
        assert_eq!(right_energy, 0.0);
    }

    #[test]
    fn spread_decorrelates_identical_input() {
        let mut d = Diffuser::new(SR);
        d.set_spread_ms(1.0);
        let mut differs = false;
        for i in 0..4000 {
            let x = if i == 0 { 1.0 } else { 0.0 };
            let (l, r) = d.tick_stereo(x, x);
            differs |= (l - r).abs() > 1e-6;
        }
        assert!(differs);

        let mut plain = Diffuser::new(SR);
        for i in 0..4000 {
            let x = if i % 7 == 0 { 0.3 } else { -0.1 };
            let (l, r) = plain.tick_stereo(x, x);
            assert_eq!(l, r);
        }
    }

    #[test]
    fn reset_silences() {
        let mut d = Diffuser::new(SR);
        for _ in 0..1000 {
            d.tick_stereo(0.5, -0.5);
        }
        d.reset();
        let (l, r) = d.tick_stereo(0.0, 0.0);
        assert_eq!((l, r), (0.0, 0.0));
    }
}
