//! Spatialized mono sources.
//!
//! A [`SourceNode`] turns one mono signal into contributions to the
//! environment's main mix and effect sends. Each block runs in two phases:
//!
//! 1. [`update`](SourceNode::update) reads the environment, resolves the
//!    source's overrides, and computes distance, direction and gains.
//! 2. [`process`](SourceNode::process) filters, pans and accumulates the
//!    block into the environment's buffers.
//!
//! Sources never overwrite shared buffers, so the order in which sources are
//! processed within a block does not matter.
//!
//! # Example
//!
//! ```rust
//! use spatia_scene::{Environment, SourceNode};
//!
//! let mut env = Environment::with_default_hrtf(44100.0, 64);
//! let mut source = SourceNode::new(&env);
//! source.set_position([0.0, 0.0, -25.0]);
//!
//! env.begin_block();
//! source.update(&env);
//! assert!((source.dry_gain() - 0.5).abs() < 1e-6);
//!
//! source.process(&[1.0; 64], &mut env).unwrap();
//! assert!(env.main_mix()[0][63] > 0.0);
//! ```

use std::collections::BTreeMap;

use spatia_core::{BiquadFilter, multiplication_addition_kernel, with_thread_workspace};

use crate::distance::{DistanceModel, gain_for_distance_model, reverb_multiplier};
use crate::environment::{EffectSend, Environment, EnvironmentInfo, MAIN_CHANNELS};
use crate::error::SpatialError;
use crate::geometry::{Vec3, length};
use crate::occlusion::{clamp_occlusion, configure_occlusion};
use crate::panner::{PannerBank, PannerSlot, PanningStrategy};

/// Scratch buffers per sample: one occluded signal plus the widest pan.
const SCRATCH_BUFFERS: usize = 1 + MAIN_CHANNELS;

/// A mono source placed in an [`Environment`].
#[derive(Debug)]
pub struct SourceNode {
    panners: PannerBank,
    occlusion_filter: BiquadFilter,

    culled: bool,
    dry_gain: f32,
    reverb_gain: f32,
    azimuth: f32,
    elevation: f32,
    distance: f32,
    strategy: PanningStrategy,
    effective: EnvironmentInfo,

    /// Fed send index -> panner needed for its width (`None` for mono).
    fed_effects: BTreeMap<usize, Option<PannerSlot>>,

    position: Vec3,
    head_relative: bool,
    occlusion: f32,
    occlusion_dirty: bool,
    size: f32,
    mul: f32,

    control_panning: bool,
    panning_strategy: PanningStrategy,
    panning_dirty: bool,

    control_distance_model: bool,
    distance_model: DistanceModel,
    distance_model_dirty: bool,
    max_distance: f32,

    control_reverb: bool,
    reverb_distance: f32,
    min_reverb_level: f32,
    max_reverb_level: f32,
}

impl SourceNode {
    /// Creates an unoccluded source at the listener, sized by the
    /// environment's default.
    pub fn new(env: &Environment) -> Self {
        let info = *env.info();
        let mut panners = PannerBank::new(env.block_size(), env.hrtf());
        panners.set_should_crossfade(env.should_crossfade());

        let mut source = Self {
            panners,
            occlusion_filter: BiquadFilter::new(env.sample_rate()),
            culled: false,
            dry_gain: 0.0,
            reverb_gain: 0.0,
            azimuth: 0.0,
            elevation: 0.0,
            distance: 0.0,
            strategy: info.panning_strategy,
            effective: info,
            fed_effects: BTreeMap::new(),
            position: [0.0, 0.0, 0.0],
            head_relative: false,
            occlusion: 0.0,
            occlusion_dirty: false,
            size: env.default_size(),
            mul: 1.0,
            control_panning: false,
            panning_strategy: info.panning_strategy,
            panning_dirty: false,
            control_distance_model: false,
            distance_model: info.distance_model,
            distance_model_dirty: false,
            max_distance: info.max_distance,
            control_reverb: false,
            reverb_distance: info.reverb_distance,
            min_reverb_level: info.min_reverb_level,
            max_reverb_level: info.max_reverb_level,
        };
        configure_occlusion(&mut source.occlusion_filter, 0.0);
        source
    }

    /// Creates a source for an input of `input_channels` channels.
    ///
    /// Sources are mono; any other width is a shape error.
    pub fn for_input(env: &Environment, input_channels: usize) -> Result<Self, SpatialError> {
        if input_channels != 1 {
            return Err(SpatialError::shape(format!(
                "sources take exactly one input channel (got {input_channels})"
            )));
        }
        Ok(Self::new(env))
    }

    // --- Effect sends ---

    /// Subscribes to effect send `index` (0-based).
    ///
    /// Feeding an already-fed send does nothing.
    pub fn feed_effect(&mut self, env: &Environment, index: usize) -> Result<(), SpatialError> {
        let send = Self::checked_send(env, index)?;
        if self.fed_effects.contains_key(&index) {
            return Ok(());
        }
        let slot = PannerSlot::for_channels(send.channels)?;
        self.fed_effects.insert(index, slot);
        tracing::debug!(
            "source feeding effect send {index} ({} channel(s))",
            send.channels
        );
        Ok(())
    }

    /// Unsubscribes from effect send `index` (0-based).
    ///
    /// Stopping a send that is not fed does nothing.
    pub fn stop_feeding_effect(&mut self, env: &Environment, index: usize) -> Result<(), SpatialError> {
        Self::checked_send(env, index)?;
        if self.fed_effects.remove(&index).is_some() {
            tracing::debug!("source stopped feeding effect send {index}");
        }
        Ok(())
    }

    /// [`feed_effect`](Self::feed_effect) with a 1-based index.
    pub fn feed_effect_external(&mut self, env: &Environment, index: usize) -> Result<(), SpatialError> {
        self.feed_effect(env, external_index(index)?)
    }

    /// [`stop_feeding_effect`](Self::stop_feeding_effect) with a 1-based index.
    pub fn stop_feeding_effect_external(
        &mut self,
        env: &Environment,
        index: usize,
    ) -> Result<(), SpatialError> {
        self.stop_feeding_effect(env, external_index(index)?)
    }

    /// Whether effect send `index` (0-based) is fed.
    pub fn is_feeding(&self, index: usize) -> bool {
        self.fed_effects.contains_key(&index)
    }

    /// Number of fed effect sends.
    pub fn fed_effect_count(&self) -> usize {
        self.fed_effects.len()
    }

    fn checked_send(env: &Environment, index: usize) -> Result<EffectSend, SpatialError> {
        env.effect_send(index).ok_or_else(|| {
            SpatialError::range(format!(
                "invalid effect send {index} (environment has {})",
                env.effect_send_count()
            ))
        })
    }

    // --- Properties ---

    /// Copies the environment's current settings into this source's
    /// override properties.
    pub fn set_properties_from_environment(&mut self, env: &Environment) {
        let info = env.info();
        self.set_panning_strategy(info.panning_strategy);
        self.set_distance_model(info.distance_model);
        self.max_distance = info.max_distance;
        self.reverb_distance = info.reverb_distance;
        self.min_reverb_level = info.min_reverb_level;
        self.max_reverb_level = info.max_reverb_level;
    }

    /// Sets the position, in world space or relative to the listener's head.
    ///
    /// Positions with a non-finite coordinate are ignored.
    pub fn set_position(&mut self, position: Vec3) {
        if position.iter().all(|c| c.is_finite()) {
            self.position = position;
        }
    }

    /// Position as last set.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Interprets the position relative to the listener's head.
    pub fn set_head_relative(&mut self, head_relative: bool) {
        self.head_relative = head_relative;
    }

    /// Whether the position is head-relative.
    pub fn head_relative(&self) -> bool {
        self.head_relative
    }

    /// Sets occlusion in `[0, 1]`; out-of-range values are clamped.
    pub fn set_occlusion(&mut self, occlusion: f32) {
        let occlusion = clamp_occlusion(occlusion);
        if occlusion != self.occlusion {
            self.occlusion = occlusion;
            self.occlusion_dirty = true;
        }
    }

    /// Occlusion amount.
    pub fn occlusion(&self) -> f32 {
        self.occlusion
    }

    /// Sets the reference size; inside it the source is at full level.
    pub fn set_size(&mut self, size: f32) {
        self.size = size.max(0.0);
    }

    /// Reference size.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Sets the output level multiplier. Negative and NaN values become 0.
    pub fn set_mul(&mut self, mul: f32) {
        self.mul = if mul.is_nan() { 0.0 } else { mul.clamp(0.0, f32::MAX) };
    }

    /// Output level multiplier.
    pub fn mul(&self) -> f32 {
        self.mul
    }

    /// Panning strategy used when [`control_panning`](Self::set_control_panning)
    /// is on.
    pub fn set_panning_strategy(&mut self, strategy: PanningStrategy) {
        if strategy != self.panning_strategy {
            self.panning_strategy = strategy;
            self.panning_dirty = true;
        }
    }

    /// Use this source's panning strategy instead of the environment's.
    pub fn set_control_panning(&mut self, control: bool) {
        self.control_panning = control;
    }

    /// Distance model used when
    /// [`control_distance_model`](Self::set_control_distance_model) is on.
    pub fn set_distance_model(&mut self, model: DistanceModel) {
        if model != self.distance_model {
            self.distance_model = model;
            self.distance_model_dirty = true;
        }
    }

    /// Maximum distance used when the distance model is overridden.
    pub fn set_max_distance(&mut self, max_distance: f32) {
        self.max_distance = max_distance.max(0.0);
    }

    /// Use this source's distance model and maximum distance.
    pub fn set_control_distance_model(&mut self, control: bool) {
        self.control_distance_model = control;
    }

    /// Reverb distance used when reverb is overridden.
    pub fn set_reverb_distance(&mut self, distance: f32) {
        self.reverb_distance = distance.max(0.0);
    }

    /// Minimum reverb level used when reverb is overridden.
    pub fn set_min_reverb_level(&mut self, level: f32) {
        self.min_reverb_level = level.clamp(0.0, 1.0);
    }

    /// Maximum reverb level used when reverb is overridden.
    pub fn set_max_reverb_level(&mut self, level: f32) {
        self.max_reverb_level = level.clamp(0.0, 1.0);
    }

    /// Use this source's reverb distance and levels.
    pub fn set_control_reverb(&mut self, control: bool) {
        self.control_reverb = control;
    }

    /// Enables or disables smoothing of direction changes.
    pub fn set_should_crossfade(&mut self, crossfade: bool) {
        self.panners.set_should_crossfade(crossfade);
    }

    // --- Per-block ---

    /// The environment snapshot with this source's overrides applied.
    fn effective_info(&mut self, env: &Environment) -> EnvironmentInfo {
        let mut info = *env.info();
        if self.control_panning {
            info.panning_strategy = self.panning_strategy;
            info.panning_strategy_changed = self.panning_dirty;
        }
        if self.control_distance_model {
            info.distance_model = self.distance_model;
            info.distance_model_changed = self.distance_model_dirty;
            info.max_distance = self.max_distance;
        }
        if self.control_reverb {
            info.reverb_distance = self.reverb_distance;
            info.min_reverb_level = self.min_reverb_level;
            info.max_reverb_level = self.max_reverb_level;
        }
        self.panning_dirty = false;
        self.distance_model_dirty = false;
        info
    }

    /// Recomputes geometry and gains for the coming block.
    ///
    /// A source farther than the maximum distance is culled: gains, angles
    /// and panners keep their previous values and [`process`](Self::process)
    /// will not touch any buffer.
    pub fn update(&mut self, env: &Environment) {
        let info = self.effective_info(env);
        self.effective = info;

        let npos = if self.head_relative {
            self.position
        } else {
            info.world_to_listener.transform_point(self.position)
        };
        let distance = length(npos);
        self.distance = distance;
        // A non-finite listener transform or an overflowing distance culls too.
        if !distance.is_finite() || distance > info.max_distance {
            self.culled = true;
            return;
        }
        self.culled = false;

        let [x, y, z] = npos;
        let xz = (x * x + z * z).sqrt();
        let elevation = y.atan2(xz).to_degrees().clamp(-90.0, 90.0);
        let azimuth = x.atan2(-z).to_degrees();
        self.azimuth = azimuth;
        self.elevation = elevation;

        let distance = f64::from(distance);
        let dry = gain_for_distance_model(
            info.distance_model,
            distance,
            f64::from(info.max_distance),
            f64::from(self.size),
        ) as f32;
        let reverb_mul = reverb_multiplier(
            info.distance_model,
            distance,
            f64::from(info.reverb_distance),
            info.min_reverb_level,
            info.max_reverb_level,
        );
        let mut reverb = dry * reverb_mul;

        let reverb_sends = self
            .fed_effects
            .keys()
            .filter(|&&i| env.effect_send(i).is_some_and(|s| s.is_reverb))
            .count();
        if reverb_sends > 0 {
            reverb /= reverb_sends as f32;
        }

        self.dry_gain = dry * self.mul;
        self.reverb_gain = reverb * self.mul;

        self.panners.set_direction(azimuth, elevation);

        if self.occlusion_dirty {
            self.occlusion_dirty = false;
            configure_occlusion(&mut self.occlusion_filter, self.occlusion);
            tracing::debug!("source occlusion reconfigured to {}", self.occlusion);
        }

        if info.panning_strategy != self.strategy {
            // The newly selected backend may hold history from long ago.
            self.panners.get_mut(info.panning_strategy.slot()).reset();
            tracing::debug!(
                "source panning strategy: {} -> {}",
                self.strategy.name(),
                info.panning_strategy.name()
            );
        }
        self.strategy = info.panning_strategy;
    }

    /// Renders one block of mono `input` into the environment.
    ///
    /// Does nothing when culled. `input` may be shorter than the
    /// environment's block size; the remainder of each buffer is left as is.
    pub fn process(&mut self, input: &[f32], env: &mut Environment) -> Result<(), SpatialError> {
        let n = input.len();
        if n > env.block_size() {
            return Err(SpatialError::shape(format!(
                "input block of {n} samples exceeds environment block size {}",
                env.block_size()
            )));
        }
        if self.culled || n == 0 {
            return Ok(());
        }

        let main_slot = self.strategy.slot();
        let main_channels = self.strategy.channels();
        let dry = self.dry_gain;
        let reverb = self.reverb_gain;

        with_thread_workspace(SCRATCH_BUFFERS * n, |ws| {
            let (occluded, pan) = ws.split_at_mut(n);
            for (o, &x) in occluded.iter_mut().zip(input) {
                *o = self.occlusion_filter.tick(x);
            }
            let occluded: &[f32] = occluded;

            let mut chunks = pan.chunks_exact_mut(n);
            let mut pan_buffers: [&mut [f32]; MAIN_CHANNELS] =
                core::array::from_fn(|_| chunks.next().unwrap_or_default());

            self.panners
                .get_mut(main_slot)
                .pan(occluded, &mut pan_buffers[..main_channels]);
            let buffers = env.buffers_mut();
            for (src, dst) in pan_buffers.iter().zip(buffers.iter_mut()).take(main_channels) {
                multiplication_addition_kernel(dry, src, dst);
            }

            for (&index, &slot) in &self.fed_effects {
                if slot.is_some() {
                    continue;
                }
                let Some(send) = env.effect_send(index) else {
                    continue;
                };
                let gain = if send.is_reverb { reverb } else { dry };
                multiplication_addition_kernel(gain, occluded, &mut env.buffers_mut()[send.start]);
            }

            // Each backend pans at most once per block: sends sharing the
            // main slot read the main pan, every other width is panned once
            // for all of its sends.
            let order = core::iter::once(main_slot)
                .chain(PannerSlot::ALL.into_iter().filter(|&s| s != main_slot));
            for slot in order {
                let mut panned = slot == main_slot;
                for (&index, _) in self.fed_effects.iter().filter(|&(_, &s)| s == Some(slot)) {
                    let Some(send) = env.effect_send(index) else {
                        continue;
                    };
                    if !panned {
                        self.panners
                            .get_mut(slot)
                            .pan(occluded, &mut pan_buffers[..send.channels]);
                        panned = true;
                    }
                    let gain = if send.is_reverb { reverb } else { dry };
                    let dsts = &mut env.buffers_mut()[send.start..send.start + send.channels];
                    for (src, dst) in pan_buffers.iter().zip(dsts.iter_mut()) {
                        multiplication_addition_kernel(gain, src, dst);
                    }
                }
            }
        });
        Ok(())
    }

    /// Clears the occlusion filter and every panner's history.
    pub fn reset(&mut self) {
        self.occlusion_filter.reset();
        self.panners.reset();
    }

    // --- Results of the last update ---

    /// Azimuth in degrees, positive to the right.
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Elevation in degrees, within `[-90, 90]`.
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Distance from the listener.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Gain applied to the main mix and non-reverb sends.
    pub fn dry_gain(&self) -> f32 {
        self.dry_gain
    }

    /// Gain applied to each reverb send.
    pub fn reverb_gain(&self) -> f32 {
        self.reverb_gain
    }

    /// Whether the source was beyond the maximum distance.
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Strategy the next [`process`](Self::process) will render with.
    pub fn panning_strategy(&self) -> PanningStrategy {
        self.strategy
    }

    /// Settings used by the last update, overrides included.
    pub fn last_environment_info(&self) -> &EnvironmentInfo {
        &self.effective
    }

    /// The occlusion filter.
    pub fn occlusion_filter(&self) -> &BiquadFilter {
        &self.occlusion_filter
    }

    /// The source's panners.
    pub fn panners(&self) -> &PannerBank {
        &self.panners
    }
}

fn external_index(index: usize) -> Result<usize, SpatialError> {
    index
        .checked_sub(1)
        .ok_or_else(|| SpatialError::range("effect send indices start at 1"))
}
