use std::fmt;

use crate::coords::{Rect, TexCoords};
use crate::texture::DecodedImage;

/// Codepoint whose glyph width defines the font-wide text scale (HIRAGANA A).
pub const REFERENCE_CODEPOINT: u32 = 0x3042;

/// Pixel width the reference glyph is normalized to.
pub const REFERENCE_WIDTH: f32 = 20.0;

/// Sheet geometry shared by every glyph of a system font.
///
/// Sheets are laid out as `sheet_columns` x `sheet_rows` cells, each cell
/// `cell_width` x `cell_height` pixels, separated by a 1 pixel gutter that also
/// runs along the top and left edges.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontInfo {
    pub cell_width: u32,
    pub cell_height: u32,
    /// Distance from the cell top to the baseline.
    pub baseline: u32,
    /// Vertical advance between lines.
    pub line_feed: f32,
    pub sheet_width: u32,
    pub sheet_height: u32,
    pub sheet_columns: u32,
    pub sheet_rows: u32,
    pub sheet_count: usize,
}

impl FontInfo {
    #[inline]
    pub fn glyphs_per_sheet(&self) -> usize {
        (self.sheet_columns * self.sheet_rows) as usize
    }
}

/// Horizontal metrics of one glyph, in unscaled pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CharWidthInfo {
    /// Left bearing: offset from the pen to the bitmap.
    pub left: f32,
    /// Width of the bitmap.
    pub glyph_width: f32,
    /// Pen advance.
    pub char_width: f32,
}

/// A glyph located on its source sheet, scaled for drawing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphPos {
    pub sheet: usize,
    pub x_advance: f32,
    /// Quad relative to the pen, top-left origin.
    pub vtx: Rect,
    pub tex: TexCoords,
}

#[derive(Debug)]
pub enum FontError {
    Parse(String),
    /// None of the searched font files exists.
    NotFound,
    EmptyCharset,
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "font parse error: {msg}"),
            Self::NotFound => f.write_str("no system font found"),
            Self::EmptyCharset => f.write_str("font charset is empty"),
        }
    }
}

impl std::error::Error for FontError {}

/// The platform font every text draw falls back on.
///
/// Glyph indices are font-local; [`glyph_index`](Self::glyph_index) maps any
/// codepoint to one (unknown codepoints map to a replacement glyph).
pub trait SystemFont {
    fn info(&self) -> &FontInfo;

    /// RGBA8 pixels of sheet `index`, `sheet_width` x `sheet_height`.
    fn sheet(&self, index: usize) -> Option<&DecodedImage>;

    fn glyph_index(&self, codepoint: u32) -> usize;

    fn char_width_info(&self, glyph: usize) -> CharWidthInfo;

    /// Locates `glyph` on its sheet and scales its quad.
    fn glyph_pos(&self, glyph: usize, scale_x: f32, scale_y: f32) -> GlyphPos {
        let info = self.info();
        let cwi = self.char_width_info(glyph);

        let per_sheet = info.glyphs_per_sheet().max(1);
        let sheet = glyph / per_sheet;
        let in_sheet = (glyph % per_sheet) as u32;
        let col = in_sheet % info.sheet_columns.max(1);
        let row = in_sheet / info.sheet_columns.max(1);

        let (sw, sh) = (info.sheet_width as f32, info.sheet_height as f32);
        let tx = (col * (info.cell_width + 1) + 1) as f32 / sw;
        let ty = (row * (info.cell_height + 1) + 1) as f32 / sh;

        GlyphPos {
            sheet,
            x_advance: scale_x * cwi.char_width,
            vtx: Rect::new(
                scale_x * cwi.left,
                0.0,
                scale_x * cwi.glyph_width,
                scale_y * info.cell_height as f32,
            ),
            tex: TexCoords::new(
                tx,
                ty,
                tx + cwi.glyph_width / sw,
                ty + info.cell_height as f32 / sh,
            ),
        }
    }

    /// Factor applied to every caller-supplied text scale.
    fn text_scale(&self) -> f32 {
        let width = self.char_width_info(self.glyph_index(REFERENCE_CODEPOINT)).glyph_width;
        if width > 0.0 { REFERENCE_WIDTH / width } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::test_font::MonospaceFont;

    #[test]
    fn glyph_pos_walks_cells_with_gutter() {
        let font = MonospaceFont::new();
        let info = *font.info();

        // 'A' = 65: row 4, column 1 of a 16-column sheet
        let pos = font.glyph_pos(65, 1.0, 1.0);
        assert_eq!(pos.sheet, 0);
        let tx = (1 * (info.cell_width + 1) + 1) as f32 / info.sheet_width as f32;
        let ty = (4 * (info.cell_height + 1) + 1) as f32 / info.sheet_height as f32;
        assert_eq!(pos.tex.left, tx);
        assert_eq!(pos.tex.top, ty);
        assert_eq!(pos.x_advance, 10.0);
    }

    #[test]
    fn glyph_pos_picks_later_sheets() {
        let font = MonospaceFont::new();
        let pos = font.glyph_pos(0xE9, 2.0, 2.0);
        assert_eq!(pos.sheet, 1);
        assert_eq!(pos.x_advance, 28.0);
        assert_eq!(pos.vtx.size.y, 32.0);
    }

    struct DefaultScale(MonospaceFont);

    impl SystemFont for DefaultScale {
        fn info(&self) -> &FontInfo {
            self.0.info()
        }
        fn sheet(&self, index: usize) -> Option<&DecodedImage> {
            self.0.sheet(index)
        }
        fn glyph_index(&self, codepoint: u32) -> usize {
            self.0.glyph_index(codepoint)
        }
        fn char_width_info(&self, glyph: usize) -> CharWidthInfo {
            self.0.char_width_info(glyph)
        }
    }

    #[test]
    fn text_scale_normalizes_reference_glyph() {
        // no U+3042 glyph: the 10 px replacement stands in for it
        let font = DefaultScale(MonospaceFont::new());
        assert_eq!(font.text_scale(), 2.0);
    }
}
