//! Spatia Effects - Graph-level effects built from spatia-core primitives
//!
//! - [`ThreeBandEq`] - Level, peaking and high-shelf stages over any channel count
//! - [`Diffuser`] - Stereo chain of nested allpass stages for reverb diffusion
//!
//! ## Example
//!
//! ```rust
//! use spatia_effects::{Diffuser, ThreeBandEq};
//!
//! let mut eq = ThreeBandEq::new(48000.0, 2).unwrap();
//! eq.set_lowband_db(3.0);
//!
//! let mut diffuser = Diffuser::new(48000.0);
//! diffuser.set_size(0.8);
//!
//! let mut left = vec![0.25f32; 256];
//! let mut right = vec![0.25f32; 256];
//! eq.process_in_place(&mut [&mut left, &mut right]);
//! diffuser.process_stereo(&mut left, &mut right);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod diffuser;
pub mod error;
pub mod three_band_eq;

// Re-export main types at crate root
pub use diffuser::Diffuser;
pub use error::EffectError;
pub use three_band_eq::ThreeBandEq;
