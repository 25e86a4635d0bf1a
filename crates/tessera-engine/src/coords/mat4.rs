use core::ops::Mul;

use super::{Quat, Vec2};

/// Row-major 4x4 matrix.
///
/// Points are column vectors: `m * p` transforms `p`, so `a * b` applies `b`
/// first. Projections map target pixels into wgpu clip space (`z` in `0..1`).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub rows: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][3] = x;
        m.rows[1][3] = y;
        m.rows[2][3] = z;
        m
    }

    pub fn scaling(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][0] = x;
        m.rows[1][1] = y;
        m.rows[2][2] = z;
        m
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quat(q: Quat) -> Self {
        let (ii, jj, kk) = (q.i * q.i, q.j * q.j, q.k * q.k);
        let (ij, ik, jk) = (q.i * q.j, q.i * q.k, q.j * q.k);
        let (ri, rj, rk) = (q.r * q.i, q.r * q.j, q.r * q.k);

        Mat4 {
            rows: [
                [1.0 - 2.0 * (jj + kk), 2.0 * (ij - rk), 2.0 * (ik + rj), 0.0],
                [2.0 * (ij + rk), 1.0 - 2.0 * (ii + kk), 2.0 * (jk - ri), 0.0],
                [2.0 * (ik - rj), 2.0 * (jk + ri), 1.0 - 2.0 * (ii + jj), 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Orthographic projection.
    ///
    /// `(left, top)` maps to the top-left corner of the target; pass
    /// `bottom > top` for a y-down pixel space. Depth maps `near..far` onto
    /// `0..1`.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.rows[0][0] = 2.0 / (right - left);
        m.rows[0][3] = -(right + left) / (right - left);
        m.rows[1][1] = 2.0 / (top - bottom);
        m.rows[1][3] = -(top + bottom) / (top - bottom);
        m.rows[2][2] = 1.0 / (far - near);
        m.rows[2][3] = -near / (far - near);
        m
    }

    /// Pixel-space projection for a `width` x `height` target.
    pub fn ortho_target(width: f32, height: f32) -> Self {
        Self::ortho(0.0, width, height, 0.0, 0.0, 1.0)
    }

    /// Transforms the point `(p.x, p.y, 0, 1)` and keeps `x, y`.
    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let r0 = self.rows[0];
        let r1 = self.rows[1];
        Vec2::new(
            r0[0] * p.x + r0[1] * p.y + r0[3],
            r1[0] * p.x + r1[1] * p.y + r1[3],
        )
    }

    /// Column-major copy, the layout WGSL expects for `mat4x4<f32>`.
    pub fn to_cols_array_2d(&self) -> [[f32; 4]; 4] {
        let r = &self.rows;
        [
            [r[0][0], r[1][0], r[2][0], r[3][0]],
            [r[0][1], r[1][1], r[2][1], r[3][1]],
            [r[0][2], r[1][2], r[2][2], r[3][2]],
            [r[0][3], r[1][3], r[2][3], r[3][3]],
        ]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Mat4 { rows: out }
    }
}
