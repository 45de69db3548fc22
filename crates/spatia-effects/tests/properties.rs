//! Property-based tests for the equalizer and diffuser.
//!
//! Verifies finite, bounded output for arbitrary settings and input.

use proptest::prelude::*;
use spatia_effects::{Diffuser, ThreeBandEq};

const SAMPLE_RATE: f32 = 48000.0;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn eq_output_is_finite(
        low_hz in 20.0f32..2000.0,
        high_hz in 2000.0f32..20000.0,
        low_db in -24.0f32..24.0,
        mid_db in -24.0f32..24.0,
        high_db in -24.0f32..24.0,
        signal in prop::collection::vec(-1.0f32..1.0, 256),
    ) {
        let mut eq = ThreeBandEq::new(SAMPLE_RATE, 1).unwrap();
        eq.set_lowband_frequency(low_hz);
        eq.set_highband_frequency(high_hz);
        eq.set_lowband_db(low_db);
        eq.set_midband_db(mid_db);
        eq.set_highband_db(high_db);

        let mut out = vec![0.0f32; signal.len()];
        eq.process(&[&signal], &mut [&mut out]);
        prop_assert!(out.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn eq_level_only_when_bands_match(db in -18.0f32..18.0, hz in 30.0f32..15000.0) {
        let mut eq = ThreeBandEq::new(SAMPLE_RATE, 1).unwrap();
        eq.set_lowband_db(db);
        eq.set_midband_db(db);
        eq.set_highband_db(db);
        let measured = 20.0 * eq.magnitude_at_hz(hz).log10();
        prop_assert!((measured - db).abs() < 0.05, "{} vs {}", measured, db);
    }

    #[test]
    fn diffuser_never_amplifies(
        diffusion in 0.0f32..0.95,
        size in 0.1f32..2.0,
        signal in prop::collection::vec(-1.0f32..1.0, 512),
    ) {
        let mut d = Diffuser::new(SAMPLE_RATE);
        d.set_diffusion(diffusion);
        d.set_size(size);

        let input_energy: f32 = signal.iter().map(|x| x * x).sum();
        let mut left = signal.clone();
        let mut right = vec![0.0f32; signal.len()];
        d.process_stereo(&mut left, &mut right);
        let output_energy: f32 = left.iter().map(|x| x * x).sum();

        prop_assert!(left.iter().all(|y| y.is_finite()));
        // a lossless filter can only hold energy back, never add it
        prop_assert!(output_energy <= input_energy * 1.001 + 1e-6);
    }
}
