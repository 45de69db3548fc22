//! Block mixing and convolution kernels.
//!
//! These run in the audio path: no allocation, no branching on sample values.
//!
//! Convolution follows the time-reversed FIR convention used by the HRTF
//! panner. For an impulse response of length `L` and `N` outputs:
//!
//! ```text
//! output[j] = Σ_{i=0}^{L-1} input[j + i] · response[L - i - 1]
//! ```
//!
//! so `input` must hold `N + L - 1` samples, the first `L - 1` being history
//! from the previous block.

use libm::fmaf;

/// Fused multiply-accumulate: `dst[i] += gain · src[i]`.
///
/// Processes `min(src.len(), dst.len())` samples, four at a time.
#[inline]
pub fn multiplication_addition_kernel(gain: f32, src: &[f32], dst: &mut [f32]) {
    let len = src.len().min(dst.len());
    let (src, dst) = (&src[..len], &mut dst[..len]);

    let mut src_chunks = src.chunks_exact(4);
    let mut dst_chunks = dst.chunks_exact_mut(4);
    for (s, d) in (&mut src_chunks).zip(&mut dst_chunks) {
        d[0] = fmaf(gain, s[0], d[0]);
        d[1] = fmaf(gain, s[1], d[1]);
        d[2] = fmaf(gain, s[2], d[2]);
        d[3] = fmaf(gain, s[3], d[3]);
    }
    for (s, d) in src_chunks
        .remainder()
        .iter()
        .zip(dst_chunks.into_remainder())
    {
        *d = fmaf(gain, *s, *d);
    }
}

/// Scaled copy: `dst[i] = gain · src[i]`.
#[inline]
pub fn scalar_multiplication_kernel(gain: f32, src: &[f32], dst: &mut [f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = gain * s;
    }
}

/// Direct-form FIR convolution against a time-reversed `response`.
///
/// Overwrites all of `output`. Taps whose index is a multiple of four are
/// routed through [`multiplication_addition_kernel`]; the rest use a scalar
/// loop. Both paths agree within rounding.
///
/// # Panics
///
/// Panics if `input.len() < output.len() + response.len() - 1`.
pub fn convolution_kernel(input: &[f32], output: &mut [f32], response: &[f32]) {
    let n = output.len();
    let len = response.len();
    output.fill(0.0);
    if len == 0 {
        return;
    }
    assert!(
        input.len() + 1 >= n + len,
        "convolution input needs {} samples, got {}",
        n + len - 1,
        input.len()
    );

    for i in 0..len {
        let c = response[len - i - 1];
        let window = &input[i..i + n];
        if i % 4 == 0 {
            multiplication_addition_kernel(c, window, output);
        } else {
            for (o, x) in output.iter_mut().zip(window) {
                *o += x * c;
            }
        }
    }
}

/// Convolution against a response crossfaded from `from` to `to` over the
/// block.
///
/// Output sample `i` of `N` uses `(1 - i/N)·from + (i/N)·to`.
///
/// # Panics
///
/// Panics if `from` and `to` differ in length or `input` is too short.
pub fn crossfade_convolution_kernel(input: &[f32], output: &mut [f32], from: &[f32], to: &[f32]) {
    assert_eq!(from.len(), to.len(), "crossfade responses differ in length");
    let n = output.len();
    let len = from.len();
    if len == 0 {
        output.fill(0.0);
        return;
    }
    assert!(
        input.len() + 1 >= n + len,
        "convolution input needs {} samples, got {}",
        n + len - 1,
        input.len()
    );

    let delta = 1.0 / n.max(1) as f32;
    for (i, out) in output.iter_mut().enumerate() {
        let (w1, w2) = crossfade_weights(i, delta);
        let window = &input[i..i + len];
        let mut acc = 0.0;
        for (j, x) in window.iter().enumerate() {
            let k = len - j - 1;
            acc += x * (w1 * from[k] + w2 * to[k]);
        }
        *out = acc;
    }
}

/// Weights applied to the outgoing and incoming response at output index `i`
/// when `delta = 1/N`.
#[inline]
pub fn crossfade_weights(i: usize, delta: f32) -> (f32, f32) {
    let w2 = i as f32 * delta;
    (1.0 - w2, w2)
}
