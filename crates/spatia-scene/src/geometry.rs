//! Minimal 3D vector and matrix math for listener transforms.
//!
//! Listener space is right-handed: the listener faces `-Z`, `+Y` is up and
//! `+X` is to the right.

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space.
pub type Vec3 = [f32; 3];

/// Dot product.
#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product.
#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length.
#[inline]
pub fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

/// Unit vector in the direction of `v`; the zero vector stays zero.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0; 3]
    }
}

/// Column-major 4×4 homogeneous transform.
///
/// `cols[c][r]` is row `r` of column `c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix columns.
    pub cols: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Pure translation by `t`.
    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t[0], t[1], t[2], 1.0];
        m
    }

    /// World-to-listener transform for a listener at `position` facing
    /// `forward` with the given `up` vector.
    ///
    /// If `forward` and `up` are parallel the right axis degenerates to zero;
    /// callers should pass a proper orientation.
    pub fn look_at(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        let f = normalize(forward);
        let right = normalize(cross(f, up));
        let true_up = cross(right, f);

        Self {
            cols: [
                [right[0], true_up[0], -f[0], 0.0],
                [right[1], true_up[1], -f[1], 0.0],
                [right[2], true_up[2], -f[2], 0.0],
                [
                    -dot(right, position),
                    -dot(true_up, position),
                    dot(f, position),
                    1.0,
                ],
            ],
        }
    }

    /// Applies the transform to a point (`w = 1`).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let c = &self.cols;
        [
            c[0][0] * p[0] + c[1][0] * p[1] + c[2][0] * p[2] + c[3][0],
            c[0][1] * p[0] + c[1][1] * p[1] + c[2][1] * p[2] + c[3][1],
            c[0][2] * p[0] + c[1][2] * p[1] + c[2][2] * p[2] + c[3][2],
        ]
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Mat4;

    /// Matrix product: `(a * b)` applies `b` first, then `a`.
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (c, col) in out.iter_mut().enumerate() {
            for (r, value) in col.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.cols[k][r] * rhs.cols[c][k]).sum();
            }
        }
        Mat4 { cols: out }
    }
}
