//! Integration tests for spatia-core DSP primitives.
//!
//! Tests cross-module interactions and verifies DSP accuracy using signal-level
//! measurements: sine wave analysis for shelf and peaking filters, transfer
//! function checks for the allpass and its nested form, and block-wise
//! convolution with carried history.

use spatia_core::{
    AllpassBank, AllpassFilter, BiquadBank, BiquadFilter, BiquadType, DelayLine,
    FractionalDelayLine, SampleDelayLine, Workspace, convolution_kernel, q_from_bw, q_from_s,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

/// Measure RMS amplitude of a signal buffer.
fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

/// Convert linear amplitude to dB.
fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

/// Filter a sine and return the steady-state gain in dB.
fn measured_gain_db(filter: &mut BiquadFilter, freq_hz: f32) -> f32 {
    let input = generate_sine(freq_hz, SAMPLE_RATE, 48000);
    let mut output = vec![0.0; input.len()];
    filter.process_block(&input, &mut output);
    let settle = 24000;
    to_db(rms(&output[settle..]) / rms(&input[settle..]))
}

// ---------------------------------------------------------------------------
// Biquad
// ---------------------------------------------------------------------------

#[test]
fn occlusion_shelf_attenuates_highs_only() {
    let mut filter = BiquadFilter::new(SAMPLE_RATE);
    // full occlusion: -70 dB above 1000/e Hz
    filter.configure(BiquadType::Highshelf, 1000.0 / core::f32::consts::E, -70.0, 0.5);

    let low = measured_gain_db(&mut filter, 10.0);
    filter.reset();
    let high = measured_gain_db(&mut filter, 15000.0);

    assert!(low > -3.0, "low band should pass, got {low:.1} dB");
    assert!(high < -55.0, "high band should be cut, got {high:.1} dB");
}

#[test]
fn peaking_filter_hits_target_gain() {
    let mut filter = BiquadFilter::new(SAMPLE_RATE);
    let q = q_from_bw(1000.0, 500.0);
    filter.configure(BiquadType::Peaking, 1000.0, 9.0, q);
    let gain = measured_gain_db(&mut filter, 1000.0);
    assert!((gain - 9.0).abs() < 0.5, "expected ~9 dB, got {gain:.2}");
}

#[test]
fn shelf_slope_one_is_butterworth_q() {
    for db in [-24.0, -6.0, 0.0, 6.0, 24.0] {
        assert!((q_from_s(db, 1.0) - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
    }
}

#[test]
fn bank_filters_multichannel_buffers() {
    let mut bank = BiquadBank::new(SAMPLE_RATE, 3);
    bank.configure(BiquadType::Lowpass, 500.0, 0.0, 0.707);

    let mut a = generate_sine(8000.0, SAMPLE_RATE, 4096);
    let mut b = a.clone();
    let mut c = a.clone();
    let before = rms(&a[2048..]);
    {
        let mut buffers: [&mut [f32]; 3] = [&mut a, &mut b, &mut c];
        bank.process(&mut buffers);
    }
    for buf in [&a, &b, &c] {
        assert!(rms(&buf[2048..]) < before * 0.05);
    }
    assert_eq!(a, b);
    assert_eq!(b, c);
}

// ---------------------------------------------------------------------------
// Allpass
// ---------------------------------------------------------------------------

/// Impulse response of H(z) = (c + z^-d) / (1 + c z^-d) by direct recursion on
/// the difference equation y[n] = c x[n] + x[n-d] - c y[n-d].
fn analytic_allpass(c: f32, d: usize, len: usize) -> Vec<f32> {
    let mut x = vec![0.0f32; len];
    x[0] = 1.0;
    let mut y = vec![0.0f32; len];
    for n in 0..len {
        let xd = if n >= d { x[n - d] } else { 0.0 };
        let yd = if n >= d { y[n - d] } else { 0.0 };
        y[n] = c * x[n] + xd - c * yd;
    }
    y
}

#[test]
fn allpass_matches_difference_equation() {
    for &(c, d) in &[(0.5, 1), (0.5, 4), (-0.7, 13), (0.3, 29)] {
        let mut ap = AllpassFilter::with_coefficient(SampleDelayLine::new(d), c);
        let expected = analytic_allpass(c, d, 400);
        for (n, &e) in expected.iter().enumerate() {
            let y = ap.tick(if n == 0 { 1.0 } else { 0.0 });
            assert!((y - e).abs() < 1e-5, "c={c} d={d} n={n}: {y} vs {e}");
        }
    }
}

#[test]
fn allpass_preserves_sine_amplitude() {
    let mut ap = AllpassFilter::with_coefficient(FractionalDelayLine::new(64), 0.6);
    ap.line_mut().set_delay(37.25);
    let input = generate_sine(1234.0, SAMPLE_RATE, 9600);
    let output: Vec<f32> = input.iter().map(|&x| ap.tick(x)).collect();
    let ratio = rms(&output[4800..]) / rms(&input[4800..]);
    assert!((ratio - 1.0).abs() < 0.05, "allpass changed level: {ratio}");
}

#[test]
fn linked_bank_processes_channels_independently() {
    let mut bank = AllpassBank::new();
    let left = bank.push(AllpassFilter::new(SampleDelayLine::new(128)));
    let right = bank.push(AllpassFilter::new(SampleDelayLine::new(128)));
    bank.link(left, right).unwrap();
    bank.set_coefficient(left, 0.65);
    bank.set_delay(left, 17.0);

    let mut l_out = Vec::new();
    let mut r_out = Vec::new();
    for n in 0..200 {
        let x = if n == 0 { 1.0 } else { 0.0 };
        l_out.push(bank.tick(left, x));
        // right channel receives the impulse 5 samples later
        r_out.push(bank.tick(right, if n == 5 { 1.0 } else { 0.0 }));
    }
    assert_eq!(&l_out[..195], &r_out[5..]);
}

// ---------------------------------------------------------------------------
// Convolution
// ---------------------------------------------------------------------------

#[test]
fn blockwise_convolution_with_history_matches_one_shot() {
    let response: Vec<f32> = (0..11).map(|i| 1.0 / (1.0 + i as f32)).collect();
    let len = response.len();
    let block = 32;
    let signal = generate_sine(700.0, SAMPLE_RATE, block * 8);

    // One shot over the whole signal, zero history.
    let mut padded = vec![0.0; len - 1];
    padded.extend_from_slice(&signal);
    let mut expected = vec![0.0; signal.len()];
    convolution_kernel(&padded, &mut expected, &response);

    // Block by block, carrying the last len-1 samples.
    let mut ws = Workspace::new();
    let mut history = vec![0.0; len - 1];
    let mut actual = Vec::new();
    for chunk in signal.chunks(block) {
        let scratch = ws.get(len - 1 + block);
        scratch[..len - 1].copy_from_slice(&history);
        scratch[len - 1..].copy_from_slice(chunk);
        let mut out = vec![0.0; block];
        convolution_kernel(scratch, &mut out, &response);
        history.copy_from_slice(&scratch[block..]);
        actual.extend_from_slice(&out);
    }

    for (a, b) in actual.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-5);
    }
}
