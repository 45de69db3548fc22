//! Mathematical utility functions for DSP.
//!
//! Provides the small set of conversions the spatialization pipeline and the
//! filter primitives share. All functions are allocation-free and suitable
//! for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`db_to_scalar`] - dB relative to an arbitrary reference amplitude
//!
//! # Angles
//!
//! - [`wrap_degrees`] - Fold an angle into `[0, 360)`
//! - [`constant_power_gains`] - Quarter-sine crossfade pair for panning
//!
//! # Utilities
//!
//! - [`lerp`] - Linear interpolation
//! - [`flush_denormal`] - Subnormal protection for feedback paths

use libm::{cosf, expf, logf, sinf};

/// Convert decibels to linear gain.
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear gain value (e.g., 0 dB → 1.0, -6 dB → 0.5, +6 dB → 2.0)
///
/// # Example
/// ```rust
/// use spatia_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// # Example
/// ```rust
/// use spatia_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert decibels to an amplitude relative to `reference`.
///
/// `db_to_scalar(db, 1.0)` is equivalent to [`db_to_linear`].
#[inline]
pub fn db_to_scalar(db: f32, reference: f32) -> f32 {
    reference * db_to_linear(db)
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fold an angle in degrees into `[0, 360)`.
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}

/// Constant-power gain pair for a position `t` in `[0, 1]` between two
/// outputs.
///
/// Returns `(cos(t·π/2), sin(t·π/2))`, so the squared gains always sum to 1.
#[inline]
pub fn constant_power_gains(t: f32) -> (f32, f32) {
    let angle = t.clamp(0.0, 1.0) * core::f32::consts::FRAC_PI_2;
    (cosf(angle), sinf(angle))
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Replaces values below 1e-20 with zero, leaving margin before the IEEE 754
/// subnormal range begins. Use this in feedback loops (allpass chains, delay
/// lines) where signal can decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
