//! Deterministic font for tests: no font file, fixed metrics.
//!
//! Codepoints below 256 are their own glyph index; everything else maps to
//! `'?'`. ASCII glyphs are 10 px wide with a 10 px advance, Latin-1 glyphs
//! are 12 px wide with a 1 px bearing and a 14 px advance.

use crate::texture::{padded_size, DecodedImage};

use super::{CharWidthInfo, FontInfo, SystemFont};

pub struct MonospaceFont {
    info: FontInfo,
    sheets: Vec<DecodedImage>,
}

impl MonospaceFont {
    pub const CELL_WIDTH: u32 = 10;
    pub const CELL_HEIGHT: u32 = 16;
    pub const ASCII_ADVANCE: f32 = 10.0;
    pub const LATIN1_ADVANCE: f32 = 14.0;

    pub fn new() -> Self {
        let (columns, rows) = (16, 8);
        let sheet_width = padded_size(columns * (Self::CELL_WIDTH + 1) + 1);
        let sheet_height = padded_size(rows * (Self::CELL_HEIGHT + 1) + 1);
        let sheet = DecodedImage {
            width: sheet_width,
            height: sheet_height,
            pixels: vec![0xFF; (sheet_width * sheet_height * 4) as usize],
        };

        Self {
            info: FontInfo {
                cell_width: Self::CELL_WIDTH,
                cell_height: Self::CELL_HEIGHT,
                baseline: 12,
                line_feed: Self::CELL_HEIGHT as f32,
                sheet_width,
                sheet_height,
                sheet_columns: columns,
                sheet_rows: rows,
                sheet_count: 2,
            },
            sheets: vec![sheet.clone(), sheet],
        }
    }
}

impl SystemFont for MonospaceFont {
    fn info(&self) -> &FontInfo {
        &self.info
    }

    fn sheet(&self, index: usize) -> Option<&DecodedImage> {
        self.sheets.get(index)
    }

    fn glyph_index(&self, codepoint: u32) -> usize {
        if codepoint < 256 { codepoint as usize } else { '?' as usize }
    }

    fn char_width_info(&self, glyph: usize) -> CharWidthInfo {
        if glyph < 128 {
            CharWidthInfo { left: 0.0, glyph_width: 10.0, char_width: Self::ASCII_ADVANCE }
        } else {
            CharWidthInfo { left: 1.0, glyph_width: 12.0, char_width: Self::LATIN1_ADVANCE }
        }
    }

    fn text_scale(&self) -> f32 {
        1.0
    }
}
