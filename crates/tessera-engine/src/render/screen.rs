use crate::coords::Mat4;
use crate::device::ScreenTarget;

/// Logical screen.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Screen {
    Top,
    Bottom,
}

/// Eye of the top screen. The bottom screen ignores it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Screen {
    #[inline]
    pub const fn width(self) -> f32 {
        match self {
            Self::Top => ScreenTarget::TOP_WIDTH as f32,
            Self::Bottom => ScreenTarget::BOTTOM_WIDTH as f32,
        }
    }

    #[inline]
    pub const fn height(self) -> f32 {
        ScreenTarget::HEIGHT as f32
    }

    pub const fn target(self, side: Side) -> ScreenTarget {
        match (self, side) {
            (Self::Top, Side::Left) => ScreenTarget::TopLeft,
            (Self::Top, Side::Right) => ScreenTarget::TopRight,
            (Self::Bottom, _) => ScreenTarget::Bottom,
        }
    }

    /// Pixel-space projection, top-left origin.
    pub fn projection(self) -> Mat4 {
        Mat4::ortho_target(self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    #[test]
    fn bottom_ignores_side() {
        assert_eq!(Screen::Bottom.target(Side::Right), ScreenTarget::Bottom);
        assert_eq!(Screen::Top.target(Side::Right), ScreenTarget::TopRight);
    }

    #[test]
    fn projection_maps_corners_to_ndc() {
        let p = Screen::Top.projection();
        let close = |a: Vec2, b: Vec2| (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5;
        assert!(close(p.transform_point(Vec2::new(0.0, 0.0)), Vec2::new(-1.0, 1.0)));
        assert!(close(p.transform_point(Vec2::new(400.0, 240.0)), Vec2::new(1.0, -1.0)));
    }
}
