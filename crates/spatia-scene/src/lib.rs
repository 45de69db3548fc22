//! Spatia Scene - 3D source spatialization
//!
//! Places mono sources around a listener and renders them into a shared
//! multi-channel mix, with distance attenuation, occlusion and effect sends.
//!
//! # Core Abstractions
//!
//! - [`Environment`] - Listener settings, effect sends and the shared buffers
//!   every source accumulates into
//! - [`SourceNode`] - A mono source: `update` computes geometry and gains,
//!   `process` renders a block
//! - [`Panner`] - Capability trait behind the HRTF and amplitude backends
//! - [`DistanceModel`] - Linear, inverse and inverse-square attenuation
//! - [`SceneConfig`] - TOML scene description
//!
//! # Block Protocol
//!
//! ```text
//! env.begin_block()            zero every buffer
//! for each source:
//!     source.update(&env)      distance, angles, gains, occlusion
//!     source.process(in, &mut env)
//! read env.main_mix() and env.send_buffers(i)
//! ```
//!
//! # Coordinates
//!
//! Listener space is right-handed with -Z forward, +Y up and +X to the
//! right. Azimuth is `atan2(x, -z)` in degrees, so positive angles are to the
//! listener's right. Elevation is clamped to `[-90, 90]`.
//!
//! # Example
//!
//! ```rust
//! use spatia_scene::{Environment, PanningStrategy, SourceNode};
//!
//! let mut env = Environment::with_default_hrtf(48000.0, 128);
//! env.set_panning_strategy(PanningStrategy::Hrtf);
//! let reverb = env.add_effect_send(2, true).unwrap();
//!
//! let mut source = SourceNode::new(&env);
//! source.set_position([3.0, 0.0, -4.0]);
//! source.feed_effect(&env, reverb).unwrap();
//!
//! env.begin_block();
//! source.update(&env);
//! source.process(&[0.25; 128], &mut env).unwrap();
//!
//! assert!((source.distance() - 5.0).abs() < 1e-5);
//! assert!(source.azimuth() > 0.0);
//! ```

pub mod config;
pub mod distance;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod occlusion;
pub mod panner;
pub mod source;

pub use config::{EffectSendConfig, EnvironmentConfig, ListenerConfig, SceneConfig};
pub use distance::{DistanceModel, gain_for_distance_model, reverb_multiplier};
pub use environment::{EffectSend, Environment, EnvironmentInfo, MAIN_CHANNELS};
pub use error::{ConfigError, SpatialError};
pub use geometry::{Mat4, Vec3};
pub use occlusion::{OcclusionShelf, configure_occlusion, occlusion_params};
pub use panner::{
    AmplitudePanner, HrtfData, HrtfPanner, Panner, PannerBank, PannerSlot, PanningStrategy,
    SphericalHeadHrtf,
};
pub use source::SourceNode;
