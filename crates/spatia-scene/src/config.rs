//! Scene configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::distance::DistanceModel;
use crate::environment::{MAIN_CHANNELS, VALID_SEND_CHANNELS};
use crate::error::ConfigError;
use crate::geometry::Vec3;
use crate::panner::PanningStrategy;

/// A renderable scene: engine settings plus the environment.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 256
///
/// [environment]
/// distance_model = "inverse_square"
/// panning_strategy = "hrtf"
/// max_distance = 50.0
///
/// [environment.listener]
/// position = [0.0, 0.0, 0.0]
///
/// [[environment.effect_sends]]
/// channels = 2
/// is_reverb = true
/// ```
///
/// Every field except the section headers has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneConfig {
    /// Sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Samples per processing block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Listener environment.
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_block_size() -> usize {
    256
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            environment: EnvironmentConfig::default(),
        }
    }
}

/// Environment section of a scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Distance attenuation curve.
    pub distance_model: DistanceModel,
    /// Main-mix rendering.
    pub panning_strategy: PanningStrategy,
    /// Culling distance.
    pub max_distance: f32,
    /// Distance at which reverb reaches its maximum level.
    pub reverb_distance: f32,
    /// Reverb level at the listener.
    pub min_reverb_level: f32,
    /// Reverb level at `reverb_distance`.
    pub max_reverb_level: f32,
    /// Size given to new sources.
    pub default_size: f32,
    /// Channels written to the output file. 0 follows the panning strategy.
    pub output_channels: usize,
    /// Crossfade HRTF responses on direction changes.
    pub hrtf_crossfade: bool,
    /// Listener placement.
    pub listener: ListenerConfig,
    /// Effect sends, registered in order.
    pub effect_sends: Vec<EffectSendConfig>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            distance_model: DistanceModel::Linear,
            panning_strategy: PanningStrategy::Stereo,
            max_distance: 50.0,
            reverb_distance: 30.0,
            min_reverb_level: 0.15,
            max_reverb_level: 0.6,
            default_size: 0.0,
            output_channels: 0,
            hrtf_crossfade: true,
            listener: ListenerConfig::default(),
            effect_sends: Vec::new(),
        }
    }
}

impl EnvironmentConfig {
    /// Channel count of rendered output.
    pub fn output_channel_count(&self) -> usize {
        if self.output_channels == 0 {
            self.panning_strategy.channels()
        } else {
            self.output_channels
        }
    }
}

/// Listener position and orientation in world space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Position.
    pub position: Vec3,
    /// Direction the listener faces.
    pub forward: Vec3,
    /// Top of the listener's head.
    pub up: Vec3,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            forward: [0.0, 0.0, -1.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// One effect send.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectSendConfig {
    /// 1, 2, 4, 6 or 8.
    pub channels: usize,
    /// Receives the reverb gain instead of the dry gain.
    #[serde(default)]
    pub is_reverb: bool,
}

impl SceneConfig {
    /// Load a scene from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::read_file(path, e))?;
        let scene: SceneConfig = toml::from_str(&content)?;
        Ok(scene)
    }

    /// Load a scene from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the scene to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the scene to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every value against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be > 0"));
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid("block_size", "must be > 0"));
        }

        let env = &self.environment;
        positive("environment.max_distance", env.max_distance)?;
        positive("environment.reverb_distance", env.reverb_distance)?;
        unit("environment.min_reverb_level", env.min_reverb_level)?;
        unit("environment.max_reverb_level", env.max_reverb_level)?;
        if env.min_reverb_level > env.max_reverb_level {
            return Err(ConfigError::invalid(
                "environment.min_reverb_level",
                format!(
                    "must not exceed max_reverb_level ({} > {})",
                    env.min_reverb_level, env.max_reverb_level
                ),
            ));
        }
        if !(env.default_size >= 0.0 && env.default_size.is_finite()) {
            return Err(ConfigError::invalid(
                "environment.default_size",
                "must be a finite value >= 0",
            ));
        }
        if env.output_channels != 0
            && !(env.panning_strategy.channels()..=MAIN_CHANNELS).contains(&env.output_channels)
        {
            return Err(ConfigError::invalid(
                "environment.output_channels",
                format!(
                    "must be 0 or between {} and {MAIN_CHANNELS}",
                    env.panning_strategy.channels()
                ),
            ));
        }
        for (i, send) in env.effect_sends.iter().enumerate() {
            if !VALID_SEND_CHANNELS.contains(&send.channels) {
                return Err(ConfigError::invalid(
                    format!("environment.effect_sends[{i}].channels"),
                    format!("must be one of 1, 2, 4, 6, 8 (got {})", send.channels),
                ));
            }
        }
        Ok(())
    }
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0 (got {value})")))
    }
}

fn unit(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1] (got {value})"),
        ))
    }
}
