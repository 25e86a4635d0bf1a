use super::Vec2;

/// Axis-aligned rectangle in target pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Inclusive containment on every edge.
    ///
    /// Touch targets in the demo are specified as inclusive pixel ranges, so the
    /// far edge counts as inside.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x <= max.x && p.y <= max.y
    }

    /// Converts a pixel rectangle inside a `tex_w` x `tex_h` texture into
    /// normalized texture coordinates.
    ///
    /// Returns `None` for an empty rectangle or a zero-sized texture.
    pub fn to_tex_coords(self, tex_w: u32, tex_h: u32) -> Option<TexCoords> {
        if self.is_empty() || tex_w == 0 || tex_h == 0 {
            return None;
        }
        let (w, h) = (tex_w as f32, tex_h as f32);
        let max = self.max();
        Some(TexCoords {
            left: self.origin.x / w,
            top: self.origin.y / h,
            right: max.x / w,
            bottom: max.y / h,
        })
    }
}

/// Normalized texture-space rectangle.
///
/// `v = 0` addresses the first (top) row of the uploaded image.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexCoords {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl TexCoords {
    /// The whole texture.
    pub const FULL: TexCoords = TexCoords { left: 0.0, top: 0.0, right: 1.0, bottom: 1.0 };

    #[inline]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }
}

impl Default for TexCoords {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn contains_both_edges_inclusive() {
        let rect = r(20.0, 160.0, 80.0, 50.0);
        assert!(rect.contains(Vec2::new(20.0, 160.0)));
        assert!(rect.contains(Vec2::new(100.0, 210.0)));
    }

    #[test]
    fn contains_outside() {
        let rect = r(20.0, 160.0, 80.0, 50.0);
        assert!(!rect.contains(Vec2::new(19.9, 170.0)));
        assert!(!rect.contains(Vec2::new(50.0, 210.1)));
    }

    // ── tex coords ────────────────────────────────────────────────────────

    #[test]
    fn tex_coords_quadrant_of_sheet() {
        let tc = r(32.0, 0.0, 32.0, 32.0).to_tex_coords(64, 64).unwrap();
        assert_eq!(tc, TexCoords::new(0.5, 0.0, 1.0, 0.5));
    }

    #[test]
    fn tex_coords_use_padded_size() {
        // A 40x40 image lives in a 64x64 texture.
        let tc = r(0.0, 0.0, 40.0, 40.0).to_tex_coords(64, 64).unwrap();
        assert_eq!(tc.right, 40.0 / 64.0);
        assert_eq!(tc.bottom, 40.0 / 64.0);
    }

    #[test]
    fn tex_coords_reject_empty() {
        assert!(r(0.0, 0.0, 0.0, 8.0).to_tex_coords(64, 64).is_none());
        assert!(r(0.0, 0.0, 8.0, 8.0).to_tex_coords(0, 64).is_none());
    }
}
