//! The text walk shared by measuring and drawing.
//!
//! Both walk the same codepoints with the same line breaks, so a measured box
//! always matches what a draw covers.

use crate::coords::Vec2;

use super::utf8::decode_one;

/// Scaled layout parameters of one text run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutStyle {
    pub scale: Vec2,
    /// Vertical advance between lines, already scaled.
    pub line_height: f32,
    /// Lines break before a glyph whose advance would cross this width.
    pub wrap: Option<f32>,
}

/// One glyph positioned relative to the text origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub codepoint: u32,
    /// Pen position at the glyph's top-left.
    pub pen: Vec2,
    /// Scaled pen advance.
    pub advance: f32,
}

/// Iterator over the glyphs of a UTF-8 run.
///
/// Stops at the end of input, at a NUL, or at the first malformed sequence.
pub struct LayoutWalker<'t, F> {
    bytes: &'t [u8],
    cursor: usize,
    pen: Vec2,
    widest: f32,
    lines: u32,
    style: LayoutStyle,
    advance: F,
}

impl<'t, F: FnMut(u32) -> f32> LayoutWalker<'t, F> {
    /// `advance` maps a codepoint to its unscaled pen advance.
    pub fn new(text: &'t [u8], style: LayoutStyle, advance: F) -> Self {
        Self {
            bytes: text,
            cursor: 0,
            pen: Vec2::zero(),
            widest: 0.0,
            lines: 0,
            style,
            advance,
        }
    }

    /// Bounding box of everything walked so far (including the current line).
    pub fn size(&self) -> Vec2 {
        Vec2::new(
            self.widest.max(self.pen.x),
            (self.lines + 1) as f32 * self.style.line_height,
        )
    }

    /// Walks to the end and returns the bounding box.
    pub fn measure(mut self) -> Vec2 {
        while self.next().is_some() {}
        self.size()
    }

    fn new_line(&mut self) {
        self.widest = self.widest.max(self.pen.x);
        self.pen.x = 0.0;
        self.pen.y += self.style.line_height;
        self.lines += 1;
    }
}

impl<F: FnMut(u32) -> f32> Iterator for LayoutWalker<'_, F> {
    type Item = PlacedGlyph;

    fn next(&mut self) -> Option<PlacedGlyph> {
        loop {
            let (codepoint, units) = decode_one(self.bytes.get(self.cursor..)?)?;
            if codepoint == 0 {
                return None;
            }
            if codepoint == u32::from(b'\n') {
                self.cursor += units;
                self.new_line();
                continue;
            }

            let advance = self.style.scale.x * (self.advance)(codepoint);
            if let Some(wrap) = self.style.wrap {
                // the cursor stays put: the codepoint is retried on the new line
                if self.pen.x > 0.0 && self.pen.x + advance > wrap {
                    self.new_line();
                    continue;
                }
            }

            self.cursor += units;
            let placed = PlacedGlyph { codepoint, pen: self.pen, advance };
            self.pen.x += advance;
            return Some(placed);
        }
    }
}
