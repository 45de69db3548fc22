//! Property-based tests for spatia-core DSP primitives.
//!
//! Tests filter stability, convolution equivalence, and allpass flatness
//! using proptest for randomized input generation.

use proptest::prelude::*;
use spatia_core::{
    AllpassFilter, BiquadFilter, BiquadType, SampleDelayLine, convolution_kernel,
    crossfade_convolution_kernel, crossfade_weights, multiplication_addition_kernel,
};

const SAMPLE_RATE: f32 = 48000.0;

fn biquad_kind(variant: usize) -> BiquadType {
    match variant % 9 {
        0 => BiquadType::Identity,
        1 => BiquadType::Lowpass,
        2 => BiquadType::Highpass,
        3 => BiquadType::Bandpass,
        4 => BiquadType::Notch,
        5 => BiquadType::Allpass,
        6 => BiquadType::Peaking,
        7 => BiquadType::Lowshelf,
        _ => BiquadType::Highshelf,
    }
}

/// Straightforward direct-sum FIR against a time-reversed response.
fn reference_convolution(input: &[f32], n: usize, response: &[f32]) -> Vec<f32> {
    let len = response.len();
    (0..n)
        .map(|j| {
            (0..len)
                .map(|i| f64::from(input[j + i]) * f64::from(response[len - i - 1]))
                .sum::<f64>() as f32
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Every biquad shape stays finite for any in-range configuration and
    /// random input.
    #[test]
    fn biquad_filter_stability(
        freq in 20.0f32..20000.0f32,
        q in 0.1f32..10.0f32,
        db in -70.0f32..24.0f32,
        variant in 0usize..9,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut filter = BiquadFilter::new(SAMPLE_RATE);
        filter.configure(biquad_kind(variant), freq, db, q);

        for _ in 0..32 {
            for &sample in &input {
                let out = filter.tick(sample);
                prop_assert!(out.is_finite(), "{:?} f={freq} q={q} db={db}", biquad_kind(variant));
            }
        }
    }

    /// Switching shapes mid-stream never produces non-finite output.
    #[test]
    fn biquad_switching_is_safe(
        a in 0usize..9,
        b in 0usize..9,
        freq in 50.0f32..15000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut filter = BiquadFilter::new(SAMPLE_RATE);
        filter.configure(biquad_kind(a), freq, -12.0, 0.7);
        for &x in &input {
            filter.tick(x);
        }
        filter.configure(biquad_kind(b), freq * 0.5, 6.0, 0.5);
        for &x in &input {
            prop_assert!(filter.tick(x).is_finite());
        }
    }

    /// The tap-split convolution agrees with a plain direct sum for any block
    /// size and response length, including lengths not divisible by four.
    #[test]
    fn convolution_matches_direct_sum(
        n in 1usize..96,
        response in prop::collection::vec(-1.0f32..=1.0f32, 1..40),
        seed in prop::collection::vec(-1.0f32..=1.0f32, 136),
    ) {
        let len = response.len();
        let input = &seed[..n + len - 1];
        let mut output = vec![0.0; n];
        convolution_kernel(input, &mut output, &response);

        let expected = reference_convolution(input, n, &response);
        for (j, (a, b)) in output.iter().zip(&expected).enumerate() {
            prop_assert!((a - b).abs() < 1e-4, "j={j}: {a} vs {b}");
        }
    }

    /// Crossfade weights are complementary at every output index.
    #[test]
    fn crossfade_weights_sum_to_one(n in 1usize..4096) {
        let delta = 1.0 / n as f32;
        for i in 0..n {
            let (w1, w2) = crossfade_weights(i, delta);
            prop_assert!((w1 + w2 - 1.0).abs() < 1e-5);
            prop_assert!((0.0..=1.0).contains(&w1));
            prop_assert!((0.0..=1.0).contains(&w2));
        }
    }

    /// Crossfading between identical responses equals plain convolution.
    #[test]
    fn crossfade_of_identical_responses(
        n in 1usize..64,
        response in prop::collection::vec(-1.0f32..=1.0f32, 1..24),
        seed in prop::collection::vec(-1.0f32..=1.0f32, 88),
    ) {
        let len = response.len();
        let input = &seed[..n + len - 1];
        let mut plain = vec![0.0; n];
        let mut faded = vec![0.0; n];
        convolution_kernel(input, &mut plain, &response);
        crossfade_convolution_kernel(input, &mut faded, &response, &response);
        for (a, b) in plain.iter().zip(&faded) {
            prop_assert!((a - b).abs() < 1e-4);
        }
    }

    /// Multiply-add matches the scalar definition for any length.
    #[test]
    fn multiplication_addition_matches_scalar(
        gain in -4.0f32..4.0f32,
        src in prop::collection::vec(-1.0f32..=1.0f32, 0..67),
    ) {
        let mut dst: Vec<f32> = src.iter().map(|x| x * 0.5).collect();
        let expected: Vec<f32> = src.iter().map(|x| x * 0.5 + gain * x).collect();
        multiplication_addition_kernel(gain, &src, &mut dst);
        for (a, b) in dst.iter().zip(&expected) {
            prop_assert!((a - b).abs() < 1e-5);
        }
    }

    /// An allpass stays lossless: impulse response energy is 1 for any stable
    /// coefficient and delay.
    #[test]
    fn allpass_impulse_energy_is_unity(
        c in -0.9f32..0.9f32,
        delay in 1usize..64,
    ) {
        let mut ap = AllpassFilter::with_coefficient(SampleDelayLine::new(delay), c);
        let mut energy = 0.0f64;
        for n in 0..(delay * 400) {
            let y = ap.tick(if n == 0 { 1.0 } else { 0.0 });
            energy += f64::from(y) * f64::from(y);
        }
        prop_assert!((energy - 1.0).abs() < 1e-3, "c={c} d={delay} energy={energy}");
    }
}
