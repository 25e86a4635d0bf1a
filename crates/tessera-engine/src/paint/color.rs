/// Packed straight-alpha RGBA8 color.
///
/// Layout: `r` in bits 0..8, `g` in 8..16, `b` in 16..24, `a` in 24..32.
/// Equality is bitwise, which is what the combiner state cache compares.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);
    pub const WHITE: Color = Color::rgba(0xFF, 0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 0xFF);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color((r as u32) | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24)
    }

    /// Builds a color from channels listed in ABGR order.
    ///
    /// Handy when porting palettes written for hardware that stores ABGR words.
    #[inline]
    pub const fn abgr(a: u8, b: u8, g: u8, r: u8) -> Self {
        Self::rgba(r, g, b, a)
    }

    /// Expands a 5-6-5 packed color to 8 bits per channel.
    pub const fn from_rgb565(rgb: u16, a: u8) -> Self {
        let rgb = rgb as u32;
        let r = ((rgb >> 11) & 0x1F) * 0xFF / 0x1F;
        let g = ((rgb >> 5) & 0x3F) * 0xFF / 0x3F;
        let b = (rgb & 0x1F) * 0xFF / 0x1F;
        Self::rgba(r as u8, g as u8, b as u8, a)
    }

    #[inline]
    pub const fn r(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns the same color with alpha replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Color((self.0 & 0x00FF_FFFF) | (a as u32) << 24)
    }

    /// Normalized `[r, g, b, a]` in `0..=1`.
    pub fn to_f32_array(self) -> [f32; 4] {
        [self.r(), self.g(), self.b(), self.a()].map(|c| c as f32 / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_layout_is_rgba_low_to_high() {
        let c = Color::rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.0, 0x4433_2211);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn abgr_lists_channels_reversed() {
        assert_eq!(Color::abgr(255, 10, 20, 30), Color::rgba(30, 20, 10, 255));
    }

    #[test]
    fn rgb565_extremes() {
        assert_eq!(Color::from_rgb565(0xFFFF, 0xFF), Color::WHITE);
        assert_eq!(Color::from_rgb565(0xF800, 0x80), Color::rgba(0xFF, 0, 0, 0x80));
        assert_eq!(Color::from_rgb565(0x07E0, 0xFF), Color::rgba(0, 0xFF, 0, 0xFF));
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Color::rgba(1, 2, 3, 4).with_alpha(200);
        assert_eq!(c, Color::rgba(1, 2, 3, 200));
    }
}
