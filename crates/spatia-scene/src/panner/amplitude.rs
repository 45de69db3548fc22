//! Constant-power amplitude panning over a ring of speakers.

use spatia_core::{constant_power_gains, wrap_degrees};

use super::Panner;

/// Stereo: left, right.
pub const STEREO_MAP: [Option<f32>; 2] = [Some(-90.0), Some(90.0)];

/// 4.0: front left, front right, back left, back right.
pub const SURROUND40_MAP: [Option<f32>; 4] =
    [Some(-45.0), Some(45.0), Some(-135.0), Some(135.0)];

/// 5.1: FL, FR, C (silent), LFE (silent), BL, BR.
pub const SURROUND51_MAP: [Option<f32>; 6] =
    [Some(-22.5), Some(22.5), None, None, Some(-110.0), Some(110.0)];

/// 7.1: FL, FR, C (silent), LFE (silent), BL, BR, SL, SR.
pub const SURROUND71_MAP: [Option<f32>; 8] = [
    Some(-22.5),
    Some(22.5),
    None,
    None,
    Some(-150.0),
    Some(150.0),
    Some(-110.0),
    Some(110.0),
];

/// Pans between the two speakers bracketing the azimuth.
///
/// The speaker map lists one angle per output channel; `None` marks a channel
/// that is never fed (center, LFE). Elevation is accepted and ignored.
/// When crossfading is enabled, gain changes ramp linearly over one block.
///
/// # Example
///
/// ```rust
/// use spatia_scene::panner::{AmplitudePanner, Panner, STEREO_MAP};
///
/// let mut panner = AmplitudePanner::new(&STEREO_MAP);
/// panner.set_should_crossfade(false);
/// panner.set_azimuth(90.0);
///
/// let input = [1.0f32; 4];
/// let mut left = [0.0f32; 4];
/// let mut right = [0.0f32; 4];
/// panner.pan(&input, &mut [&mut left, &mut right]);
/// assert!(left[0].abs() < 1e-6);
/// assert!((right[0] - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AmplitudePanner {
    /// `(angle in [0, 360), channel)` sorted by angle.
    speakers: Vec<(f32, usize)>,
    channels: usize,
    azimuth: f32,
    elevation: f32,
    current: Vec<f32>,
    target: Vec<f32>,
    dirty: bool,
    /// Set until the first block, which jumps straight to the target gains.
    fresh: bool,
    crossfade: bool,
}

impl AmplitudePanner {
    /// Creates a panner for the given speaker map.
    pub fn new(map: &[Option<f32>]) -> Self {
        let mut speakers: Vec<(f32, usize)> = map
            .iter()
            .enumerate()
            .filter_map(|(ch, angle)| angle.map(|a| (wrap_degrees(a), ch)))
            .collect();
        speakers.sort_by(|a, b| a.0.total_cmp(&b.0));

        let channels = map.len();
        let mut panner = Self {
            speakers,
            channels,
            azimuth: 0.0,
            elevation: 0.0,
            current: vec![0.0; channels],
            target: vec![0.0; channels],
            dirty: true,
            fresh: true,
            crossfade: true,
        };
        panner.update_target();
        panner
    }

    /// Current azimuth in degrees.
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Current elevation in degrees.
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Gains for the current azimuth, one per channel.
    pub fn gains(&mut self) -> &[f32] {
        self.update_target();
        &self.target
    }

    fn update_target(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.target.fill(0.0);

        match self.speakers.len() {
            0 => {}
            1 => self.target[self.speakers[0].1] = 1.0,
            n => {
                let angle = wrap_degrees(self.azimuth);
                // Pair (lo, hi) with lo <= angle < hi, wrapping past 360.
                let upper = self.speakers.partition_point(|s| s.0 <= angle);
                let (lo, hi) = if upper == 0 || upper == n {
                    (self.speakers[n - 1], self.speakers[0])
                } else {
                    (self.speakers[upper - 1], self.speakers[upper])
                };
                let lo_angle = lo.0;
                let mut hi_angle = hi.0;
                let mut pos = angle;
                if hi_angle <= lo_angle {
                    hi_angle += 360.0;
                    if pos < lo_angle {
                        pos += 360.0;
                    }
                }
                let span = hi_angle - lo_angle;
                let t = if span > 0.0 { (pos - lo_angle) / span } else { 0.0 };
                let (g_lo, g_hi) = constant_power_gains(t);
                self.target[lo.1] += g_lo;
                self.target[hi.1] += g_hi;
            }
        }
    }
}

impl Panner for AmplitudePanner {
    fn set_azimuth(&mut self, azimuth: f32) {
        if azimuth != self.azimuth {
            self.azimuth = azimuth;
            self.dirty = true;
        }
    }

    fn set_elevation(&mut self, elevation: f32) {
        self.elevation = elevation;
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn pan(&mut self, input: &[f32], outputs: &mut [&mut [f32]]) {
        self.update_target();
        let n = input.len();
        let ramp = self.crossfade && !self.fresh;
        self.fresh = false;

        for (ch, out) in outputs.iter_mut().take(self.channels).enumerate() {
            let out = &mut out[..n];
            let from = self.current[ch];
            let to = self.target[ch];
            if ramp && from != to && n > 0 {
                let step = (to - from) / n as f32;
                for (i, (o, &x)) in out.iter_mut().zip(input).enumerate() {
                    *o = x * (from + step * i as f32);
                }
            } else {
                for (o, &x) in out.iter_mut().zip(input) {
                    *o = x * to;
                }
            }
        }
        self.current.copy_from_slice(&self.target);
    }

    fn reset(&mut self) {
        self.fresh = true;
    }

    fn set_should_crossfade(&mut self, crossfade: bool) {
        self.crossfade = crossfade;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains_at(map: &[Option<f32>], azimuth: f32) -> Vec<f32> {
        let mut panner = AmplitudePanner::new(map);
        panner.set_azimuth(azimuth);
        panner.gains().to_vec()
    }

    #[test]
    fn stereo_center_is_equal_power() {
        let g = gains_at(&STEREO_MAP, 0.0);
        assert!((g[0] - g[1]).abs() < 1e-6);
        assert!((g[0] * g[0] + g[1] * g[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stereo_hard_left_and_right() {
        let left = gains_at(&STEREO_MAP, -90.0);
        assert!((left[0] - 1.0).abs() < 1e-6 && left[1].abs() < 1e-6);
        let right = gains_at(&STEREO_MAP, 90.0);
        assert!(right[0].abs() < 1e-6 && (right[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stereo_favors_near_side() {
        let g = gains_at(&STEREO_MAP, -45.0);
        assert!(g[0] > g[1]);
        let g = gains_at(&STEREO_MAP, 30.0);
        assert!(g[1] > g[0]);
    }

    #[test]
    fn surround40_wraps_behind() {
        // Directly behind sits between back left (-135) and back right (135).
        let g = gains_at(&SURROUND40_MAP, 180.0);
        assert!(g[0].abs() < 1e-6 && g[1].abs() < 1e-6);
        assert!((g[2] - g[3]).abs() < 1e-5);
        assert!(g[2] > 0.7);
    }

    #[test]
    fn surround51_center_and_lfe_silent() {
        for az in [-180.0, -100.0, -20.0, 0.0, 15.0, 60.0, 170.0] {
            let g = gains_at(&SURROUND51_MAP, az);
            assert_eq!(g[2], 0.0);
            assert_eq!(g[3], 0.0);
            let power: f32 = g.iter().map(|x| x * x).sum();
            assert!((power - 1.0).abs() < 1e-5, "az {az}: power {power}");
        }
    }

    #[test]
    fn surround71_side_speaker() {
        let g = gains_at(&SURROUND71_MAP, 110.0);
        assert!((g[7] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn crossfade_ramps_gains() {
        let mut panner = AmplitudePanner::new(&STEREO_MAP);
        let input = [1.0f32; 8];
        let mut l = [0.0f32; 8];
        let mut r = [0.0f32; 8];
        panner.set_azimuth(-90.0);
        panner.pan(&input, &mut [&mut l, &mut r]);
        assert!((l[7] - 1.0).abs() < 1e-6);

        panner.set_azimuth(90.0);
        panner.pan(&input, &mut [&mut l, &mut r]);
        // starts at the old gains and moves toward the new ones
        assert!((l[0] - 1.0).abs() < 1e-6);
        assert!(l[7] < l[0] && l[7] > 0.0);
        assert!(r[0].abs() < 1e-6 && r[7] > 0.5);
    }

    #[test]
    fn no_crossfade_jumps() {
        let mut panner = AmplitudePanner::new(&STEREO_MAP);
        panner.set_should_crossfade(false);
        let input = [1.0f32; 8];
        let mut l = [0.0f32; 8];
        let mut r = [0.0f32; 8];
        panner.pan(&input, &mut [&mut l, &mut r]);
        panner.set_azimuth(90.0);
        panner.pan(&input, &mut [&mut l, &mut r]);
        assert!(l.iter().all(|x| x.abs() < 1e-6));
        assert!(r.iter().all(|x| (x - 1.0).abs() < 1e-6));
    }
}
