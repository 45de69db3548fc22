//! Distance attenuation models.
//!
//! All three curves share the same normalization: the distance past the
//! source's reference size, divided by the maximum distance. Beyond the
//! maximum the gain is zero.
//!
//! | Model | Gain at `p = adjusted / max` |
//! |-------|------------------------------|
//! | Linear | `1 - p` |
//! | Inverse | `1 / (1 + 315·p)` |
//! | InverseSquare | `1 / (1 + 315·p²)` |

use serde::{Deserialize, Serialize};

/// Rolloff used by the inverse curves.
const ROLLOFF: f64 = 315.0;

/// Distance attenuation curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    /// Straight line from 1 at the source to 0 at the maximum distance.
    #[default]
    Linear,
    /// Steep early falloff.
    Inverse,
    /// Flat near the source, then falls off.
    InverseSquare,
}

impl DistanceModel {
    /// All models, in declaration order.
    pub const ALL: [DistanceModel; 3] = [Self::Linear, Self::Inverse, Self::InverseSquare];

    /// Lowercase name as used in scene files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Inverse => "inverse",
            Self::InverseSquare => "inverse_square",
        }
    }
}

/// Gain in `[0, 1]` for a source `distance` away.
///
/// `reference_distance` is the source's size: inside it the gain is 1.
/// Computed in `f64`; the final value is clamped so rounding near the
/// boundary cannot go negative.
pub fn gain_for_distance_model(
    model: DistanceModel,
    distance: f64,
    max_distance: f64,
    reference_distance: f64,
) -> f64 {
    let adjusted = (distance - reference_distance).max(0.0);
    let gain = if adjusted > max_distance {
        0.0
    } else {
        let p = if max_distance > 0.0 {
            adjusted / max_distance
        } else {
            // max == 0 and adjusted == 0: the source sits exactly at the limit.
            0.0
        };
        match model {
            DistanceModel::Linear => 1.0 - p,
            DistanceModel::Inverse => 1.0 / (1.0 + ROLLOFF * p),
            DistanceModel::InverseSquare => 1.0 / (1.0 + ROLLOFF * p * p),
        }
    };
    gain.max(0.0)
}

/// Reverb level for a source `distance` away, before dry scaling.
///
/// Interpolates from `min_level` (at the listener) toward `max_level` as the
/// source recedes to `reverb_distance`.
pub fn reverb_multiplier(
    model: DistanceModel,
    distance: f64,
    reverb_distance: f64,
    min_level: f32,
    max_level: f32,
) -> f32 {
    let unscaled = 1.0 - gain_for_distance_model(model, distance, reverb_distance, 0.0) as f32;
    min_level + (max_level - min_level) * unscaled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_halfway_is_half() {
        let g = gain_for_distance_model(DistanceModel::Linear, 25.0, 50.0, 0.0);
        assert!((g - 0.5).abs() < 1e-12);
    }

    #[test]
    fn beyond_max_is_silent() {
        for model in DistanceModel::ALL {
            assert_eq!(gain_for_distance_model(model, 50.001, 50.0, 0.0), 0.0);
        }
    }

    #[test]
    fn inside_reference_is_unity() {
        for model in DistanceModel::ALL {
            assert_eq!(gain_for_distance_model(model, 2.0, 50.0, 3.0), 1.0);
        }
    }

    #[test]
    fn reference_shifts_curve() {
        let a = gain_for_distance_model(DistanceModel::Linear, 30.0, 50.0, 5.0);
        assert!((a - 0.5).abs() < 1e-12);
    }

    #[test]
    fn inverse_curves() {
        let inv = gain_for_distance_model(DistanceModel::Inverse, 10.0, 100.0, 0.0);
        assert!((inv - 1.0 / 32.5).abs() < 1e-12);
        let sq = gain_for_distance_model(DistanceModel::InverseSquare, 10.0, 100.0, 0.0);
        assert!((sq - 1.0 / 4.15).abs() < 1e-12);
        // at the maximum, both end near 1/316
        let end = gain_for_distance_model(DistanceModel::Inverse, 100.0, 100.0, 0.0);
        assert!((end - 1.0 / 316.0).abs() < 1e-12);
    }

    #[test]
    fn reverb_multiplier_bounds() {
        let near = reverb_multiplier(DistanceModel::Linear, 0.0, 30.0, 0.15, 0.6);
        assert!((near - 0.15).abs() < 1e-6);
        let far = reverb_multiplier(DistanceModel::Linear, 40.0, 30.0, 0.15, 0.6);
        assert!((far - 0.6).abs() < 1e-6);
        let mid = reverb_multiplier(DistanceModel::Linear, 15.0, 30.0, 0.0, 1.0);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_max_distance() {
        assert_eq!(gain_for_distance_model(DistanceModel::Linear, 0.0, 0.0, 0.0), 1.0);
        assert_eq!(gain_for_distance_model(DistanceModel::Linear, 1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn names_round_trip_through_serde() {
        for model in DistanceModel::ALL {
            let s = toml::to_string(&Wrapper { model }).unwrap();
            assert!(s.contains(model.name()), "{s}");
            let back: Wrapper = toml::from_str(&s).unwrap();
            assert_eq!(back.model, model);
        }
    }

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        model: DistanceModel,
    }
}
