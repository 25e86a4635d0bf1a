/// Unit quaternion `r + i·x + j·y + k·z` used for sprite rotation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    pub i: f32,
    pub j: f32,
    pub k: f32,
    pub r: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { i: 0.0, j: 0.0, k: 0.0, r: 1.0 };

    /// Composes a rotation of `radians` around +Z onto `self`.
    ///
    /// Accumulative: `q.rotate_z(a).rotate_z(b)` equals `q.rotate_z(a + b)`.
    #[must_use]
    pub fn rotate_z(self, radians: f32) -> Quat {
        let (s, c) = (radians * 0.5).sin_cos();
        let rot = Quat { i: 0.0, j: 0.0, k: s, r: c };
        rot * self
    }

    /// Rotation angle around +Z in radians, assuming a pure Z rotation.
    pub fn angle_z(self) -> f32 {
        2.0 * self.k.atan2(self.r)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl core::ops::Mul for Quat {
    type Output = Quat;

    // Hamilton product.
    fn mul(self, q: Quat) -> Quat {
        let p = self;
        Quat {
            r: p.r * q.r - p.i * q.i - p.j * q.j - p.k * q.k,
            i: p.r * q.i + p.i * q.r + p.j * q.k - p.k * q.j,
            j: p.r * q.j - p.i * q.k + p.j * q.r + p.k * q.i,
            k: p.r * q.k + p.i * q.j - p.j * q.i + p.k * q.r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_accumulate() {
        let a = Quat::IDENTITY.rotate_z(0.3).rotate_z(0.5);
        let b = Quat::IDENTITY.rotate_z(0.8);
        assert!((a.angle_z() - b.angle_z()).abs() < 1e-5);
    }

    #[test]
    fn stays_unit_length() {
        let mut q = Quat::IDENTITY;
        for _ in 0..360 {
            q = q.rotate_z(1f32.to_radians());
        }
        let len = (q.i * q.i + q.j * q.j + q.k * q.k + q.r * q.r).sqrt();
        assert!((len - 1.0).abs() < 1e-4);
    }
}
