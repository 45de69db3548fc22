//! The listener's environment: shared settings and mix buffers.
//!
//! An [`Environment`] owns everything sources read or accumulate into during a
//! block:
//!
//! - an [`EnvironmentInfo`] snapshot (listener transform, distance model,
//!   reverb curve, panning strategy)
//! - the registered [`EffectSend`]s
//! - one buffer per channel: [`MAIN_CHANNELS`] main-mix channels followed by
//!   every send's channels in registration order
//!
//! Buffers are accumulation-only. Call [`begin_block`](Environment::begin_block)
//! once per block, process every source, then read the results.

use std::sync::Arc;

use crate::config::SceneConfig;
use crate::distance::DistanceModel;
use crate::error::SpatialError;
use crate::geometry::{Mat4, Vec3};
use crate::panner::{HrtfData, PanningStrategy, SphericalHeadHrtf};

/// Main-mix channels, enough for 7.1.
pub const MAIN_CHANNELS: usize = 8;

/// Channel counts an effect send may have.
pub const VALID_SEND_CHANNELS: [usize; 5] = [1, 2, 4, 6, 8];

/// Snapshot of the settings sources read each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentInfo {
    /// Transform from world space into listener space.
    pub world_to_listener: Mat4,
    /// Distance attenuation curve.
    pub distance_model: DistanceModel,
    /// Sources farther than this are culled.
    pub max_distance: f32,
    /// Distance at which the reverb level reaches its maximum.
    pub reverb_distance: f32,
    /// Reverb level at the listener.
    pub min_reverb_level: f32,
    /// Reverb level at `reverb_distance` and beyond.
    pub max_reverb_level: f32,
    /// Rendering used for the main mix.
    pub panning_strategy: PanningStrategy,
    /// The panning strategy changed since the last tick.
    pub panning_strategy_changed: bool,
    /// The distance model changed since the last tick.
    pub distance_model_changed: bool,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            world_to_listener: Mat4::IDENTITY,
            distance_model: DistanceModel::Linear,
            max_distance: 50.0,
            reverb_distance: 30.0,
            min_reverb_level: 0.15,
            max_reverb_level: 0.6,
            panning_strategy: PanningStrategy::Stereo,
            panning_strategy_changed: false,
            distance_model_changed: false,
        }
    }
}

/// An auxiliary bus sources may feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectSend {
    /// First environment channel of the send.
    pub start: usize,
    /// Number of channels: 1, 2, 4, 6 or 8.
    pub channels: usize,
    /// Reverb sends receive the distance-dependent reverb gain.
    pub is_reverb: bool,
}

/// Listener environment: settings, effect sends and shared buffers.
#[derive(Debug)]
pub struct Environment {
    info: EnvironmentInfo,
    sends: Vec<EffectSend>,
    buffers: Vec<Vec<f32>>,
    hrtf: Arc<dyn HrtfData>,
    default_size: f32,
    sample_rate: f32,
    block_size: usize,
    should_crossfade: bool,
    /// Change flags that have already been visible for one tick.
    strategy_change_published: bool,
    model_change_published: bool,
}

impl Environment {
    /// Creates an environment with default settings and no sends.
    pub fn new(sample_rate: f32, block_size: usize, hrtf: Arc<dyn HrtfData>) -> Self {
        if (hrtf.sample_rate() - sample_rate).abs() > f32::EPSILON {
            tracing::warn!(
                "HRTF designed for {} Hz used at {} Hz",
                hrtf.sample_rate(),
                sample_rate
            );
        }
        Self {
            info: EnvironmentInfo::default(),
            sends: Vec::new(),
            buffers: vec![vec![0.0; block_size]; MAIN_CHANNELS],
            hrtf,
            default_size: 0.0,
            sample_rate,
            block_size,
            should_crossfade: true,
            strategy_change_published: false,
            model_change_published: false,
        }
    }

    /// Creates an environment using the built-in spherical-head HRTF.
    pub fn with_default_hrtf(sample_rate: f32, block_size: usize) -> Self {
        Self::new(
            sample_rate,
            block_size,
            Arc::new(SphericalHeadHrtf::new(sample_rate)),
        )
    }

    /// Builds an environment from a validated scene configuration.
    pub fn from_config(
        config: &SceneConfig,
        hrtf: Option<Arc<dyn HrtfData>>,
    ) -> Result<Self, SpatialError> {
        config.validate()?;
        let sample_rate = config.sample_rate as f32;
        let hrtf = hrtf.unwrap_or_else(|| Arc::new(SphericalHeadHrtf::new(sample_rate)));
        let mut env = Self::new(sample_rate, config.block_size, hrtf);

        let e = &config.environment;
        env.info.distance_model = e.distance_model;
        env.info.panning_strategy = e.panning_strategy;
        env.info.max_distance = e.max_distance;
        env.info.reverb_distance = e.reverb_distance;
        env.info.min_reverb_level = e.min_reverb_level;
        env.info.max_reverb_level = e.max_reverb_level;
        env.default_size = e.default_size;
        env.should_crossfade = e.hrtf_crossfade;
        env.set_listener(e.listener.position, e.listener.forward, e.listener.up);

        for send in &e.effect_sends {
            env.add_effect_send(send.channels, send.is_reverb)?;
        }
        Ok(env)
    }

    /// Current settings snapshot.
    pub fn info(&self) -> &EnvironmentInfo {
        &self.info
    }

    /// Mutable settings. Change flags raised here are cleared like those of
    /// the setters, one tick after [`begin_block`](Self::begin_block) first
    /// publishes them.
    pub fn info_mut(&mut self) -> &mut EnvironmentInfo {
        &mut self.info
    }

    /// Switches the main-mix panning strategy.
    pub fn set_panning_strategy(&mut self, strategy: PanningStrategy) {
        if strategy != self.info.panning_strategy {
            self.info.panning_strategy_changed = true;
            self.strategy_change_published = false;
            tracing::debug!(
                "environment panning strategy: {} -> {}",
                self.info.panning_strategy.name(),
                strategy.name()
            );
        }
        self.info.panning_strategy = strategy;
    }

    /// Switches the distance model.
    pub fn set_distance_model(&mut self, model: DistanceModel) {
        if model != self.info.distance_model {
            self.info.distance_model_changed = true;
            self.model_change_published = false;
        }
        self.info.distance_model = model;
    }

    /// Places the listener. `forward` and `up` need not be normalized.
    pub fn set_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        self.info.world_to_listener = Mat4::look_at(position, forward, up);
    }

    /// Registers an effect send and returns its 0-based index.
    ///
    /// Its channels are appended after all existing buffers.
    pub fn add_effect_send(&mut self, channels: usize, is_reverb: bool) -> Result<usize, SpatialError> {
        if !VALID_SEND_CHANNELS.contains(&channels) {
            return Err(SpatialError::range(format!(
                "effect send channel count must be one of 1, 2, 4, 6, 8 (got {channels})"
            )));
        }
        let send = EffectSend {
            start: self.buffers.len(),
            channels,
            is_reverb,
        };
        self.buffers
            .extend((0..channels).map(|_| vec![0.0; self.block_size]));
        self.sends.push(send);
        tracing::debug!(
            "effect send {} registered: {} channel(s), reverb={}",
            self.sends.len() - 1,
            channels,
            is_reverb
        );
        Ok(self.sends.len() - 1)
    }

    /// Number of registered effect sends.
    pub fn effect_send_count(&self) -> usize {
        self.sends.len()
    }

    /// Effect send `index`, if registered.
    pub fn effect_send(&self, index: usize) -> Option<EffectSend> {
        self.sends.get(index).copied()
    }

    /// All effect sends.
    pub fn effect_sends(&self) -> &[EffectSend] {
        &self.sends
    }

    /// Starts a tick: zeroes every buffer and ages the change flags.
    ///
    /// A flag raised before this call stays set for the tick it starts and
    /// is cleared by the next call. Call once before processing sources.
    pub fn begin_block(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        age_change_flag(
            &mut self.info.panning_strategy_changed,
            &mut self.strategy_change_published,
        );
        age_change_flag(
            &mut self.info.distance_model_changed,
            &mut self.model_change_published,
        );
    }

    /// Total channel count: main mix plus every send.
    pub fn channel_count(&self) -> usize {
        self.buffers.len()
    }

    /// Buffer of environment channel `index`.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.buffers.get(index).map(Vec::as_slice)
    }

    /// The main-mix channels in use by the current strategy.
    pub fn main_mix(&self) -> &[Vec<f32>] {
        &self.buffers[..self.info.panning_strategy.channels()]
    }

    /// Buffers of effect send `index`.
    pub fn send_buffers(&self, index: usize) -> Option<&[Vec<f32>]> {
        let send = self.sends.get(index)?;
        Some(&self.buffers[send.start..send.start + send.channels])
    }

    pub(crate) fn buffers_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.buffers
    }

    /// HRTF source shared by every source in this environment.
    pub fn hrtf(&self) -> Arc<dyn HrtfData> {
        Arc::clone(&self.hrtf)
    }

    /// Default size given to new sources.
    pub fn default_size(&self) -> f32 {
        self.default_size
    }

    /// Sets the default size given to new sources.
    pub fn set_default_size(&mut self, size: f32) {
        self.default_size = size.max(0.0);
    }

    /// Whether new sources crossfade on direction changes.
    pub fn should_crossfade(&self) -> bool {
        self.should_crossfade
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Block size in samples.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

fn age_change_flag(flag: &mut bool, published: &mut bool) {
    if !*flag {
        *published = false;
    } else if *published {
        *flag = false;
        *published = false;
    } else {
        *published = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> Environment {
        Environment::with_default_hrtf(44100.0, 64)
    }

    #[test]
    fn starts_with_main_channels_only() {
        let env = env();
        assert_eq!(env.channel_count(), MAIN_CHANNELS);
        assert_eq!(env.effect_send_count(), 0);
        assert_eq!(env.main_mix().len(), 2);
    }

    #[test]
    fn sends_are_laid_out_after_main() {
        let mut env = env();
        assert_eq!(env.add_effect_send(2, true).unwrap(), 0);
        assert_eq!(env.add_effect_send(1, false).unwrap(), 1);
        assert_eq!(env.add_effect_send(6, false).unwrap(), 2);

        assert_eq!(env.effect_send(0).unwrap().start, 8);
        assert_eq!(env.effect_send(1).unwrap().start, 10);
        assert_eq!(env.effect_send(2).unwrap().start, 11);
        assert_eq!(env.channel_count(), 17);
        assert_eq!(env.send_buffers(2).unwrap().len(), 6);
        assert!(env.send_buffers(3).is_none());
    }

    #[test]
    fn invalid_send_width_is_range_error() {
        let mut env = env();
        for bad in [0, 3, 5, 7, 9] {
            assert!(matches!(
                env.add_effect_send(bad, false),
                Err(SpatialError::Range(_))
            ));
        }
        assert_eq!(env.effect_send_count(), 0);
        assert_eq!(env.channel_count(), MAIN_CHANNELS);
    }

    #[test]
    fn begin_block_zeroes() {
        let mut env = env();
        env.add_effect_send(1, true).unwrap();
        for buf in env.buffers_mut() {
            buf.fill(1.0);
        }
        env.begin_block();
        for i in 0..env.channel_count() {
            assert!(env.channel(i).unwrap().iter().all(|x| *x == 0.0));
        }
    }

    #[test]
    fn strategy_change_sets_flag() {
        let mut env = env();
        env.set_panning_strategy(PanningStrategy::Surround51);
        assert!(env.info().panning_strategy_changed);
        assert_eq!(env.main_mix().len(), 6);
        // setting the same strategy again does not hide the pending change
        env.set_panning_strategy(PanningStrategy::Surround51);
        assert!(env.info().panning_strategy_changed);
    }

    #[test]
    fn change_flags_last_one_tick() {
        let mut env = env();
        env.set_panning_strategy(PanningStrategy::Hrtf);
        env.set_distance_model(DistanceModel::Inverse);
        env.begin_block();
        assert!(env.info().panning_strategy_changed);
        assert!(env.info().distance_model_changed);
        for _ in 0..3 {
            env.begin_block();
            assert!(!env.info().panning_strategy_changed);
            assert!(!env.info().distance_model_changed);
        }
    }

    #[test]
    fn change_during_tick_is_seen_next_tick() {
        let mut env = env();
        env.set_panning_strategy(PanningStrategy::Hrtf);
        env.begin_block();
        env.set_panning_strategy(PanningStrategy::Surround40);
        env.begin_block();
        assert!(env.info().panning_strategy_changed);
        env.begin_block();
        assert!(!env.info().panning_strategy_changed);
    }

    #[test]
    fn listener_transform() {
        let mut env = env();
        env.set_listener([0.0, 0.0, 10.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]);
        let p = env.info().world_to_listener.transform_point([0.0, 0.0, 0.0]);
        assert!((p[2] + 10.0).abs() < 1e-5);
    }
}
