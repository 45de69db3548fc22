//! Spatia Core - DSP primitives for spatial audio
//!
//! This crate provides the filter and mixing building blocks the spatialization
//! pipeline and graph-level effects are composed from, designed for real-time
//! audio processing with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR section with RBJ cookbook coefficients
//! - [`BiquadFilter`] - Reconfigurable biquad with an exact identity mode
//! - [`BiquadBank`] - One [`BiquadFilter`] per channel, tuned together
//! - [`AllpassFilter`] - Nestable allpass over any [`DelayLine`]
//! - [`AllpassBank`] - Arena of allpass filters with acyclic slave links
//!
//! ## Delay Lines
//!
//! - [`DelayLine`] - Read-without-advance delay line trait
//! - [`SampleDelayLine`] - Integer delay
//! - [`InterpolatedDelay`] / [`FractionalDelayLine`] - Fractional delay
//!
//! ## Kernels
//!
//! - [`multiplication_addition_kernel`] - `dst += gain·src`
//! - [`convolution_kernel`] - Direct FIR convolution
//! - [`crossfade_convolution_kernel`] - FIR convolution across a response change
//!
//! ## Utilities
//!
//! - [`Workspace`] - Grow-only scratch storage (thread-local under `std`)
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`constant_power_gains`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! spatia-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use spatia_core::{BiquadFilter, BiquadType, convolution_kernel};
//!
//! let mut shelf = BiquadFilter::new(44100.0);
//! shelf.configure(BiquadType::Highshelf, 606.5, -35.0, 0.5);
//! let y = shelf.tick(1.0);
//! assert!(y.is_finite());
//!
//! let input = [0.0, 1.0, 0.0, 0.0];
//! let mut output = [0.0; 3];
//! convolution_kernel(&input, &mut output, &[0.5, 0.25]);
//! assert_eq!(output, [0.5, 0.25, 0.0]);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Generic where it pays**: filters are generic over their delay line

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod delay;
pub mod kernels;
pub mod math;
pub mod workspace;

// Re-export main types at crate root
pub use allpass::{AllpassBank, AllpassFilter, AllpassLinkError};
pub use biquad::{
    Biquad, BiquadBank, BiquadConfig, BiquadFilter, BiquadType, allpass_coefficients,
    bandpass_coefficients, high_shelf_coefficients, highpass_coefficients, low_shelf_coefficients,
    lowpass_coefficients, notch_coefficients, peaking_eq_coefficients, q_from_bw, q_from_s,
};
pub use delay::{DelayLine, FractionalDelayLine, InterpolatedDelay, SampleDelayLine};
pub use kernels::{
    convolution_kernel, crossfade_convolution_kernel, crossfade_weights,
    multiplication_addition_kernel, scalar_multiplication_kernel,
};
pub use math::{
    constant_power_gains, db_to_linear, db_to_scalar, flush_denormal, lerp, linear_to_db,
    wrap_degrees,
};
#[cfg(feature = "std")]
pub use workspace::with_thread_workspace;
pub use workspace::Workspace;
