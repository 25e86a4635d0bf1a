//! System font rasterized with fontdue into fixed-cell glyph sheets.

use std::collections::HashMap;

use crate::texture::{padded_size, DecodedImage};

use super::{CharWidthInfo, FontError, FontInfo, SystemFont};

/// Font files tried, in order, by [`FontdueSystemFont::from_system`].
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

const REPLACEMENT: char = '?';

#[derive(Debug, Clone)]
pub struct FontConfig {
    /// Pixel size glyphs are rasterized at.
    pub raster_px: f32,
    /// Pixel size text is drawn at with a caller scale of 1.
    pub nominal_px: f32,
    /// Characters baked into the sheets. `'?'` and `' '` are always added.
    pub charset: Vec<char>,
    pub sheet_columns: u32,
    pub sheet_rows: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            raster_px: 30.0,
            nominal_px: 20.0,
            charset: default_charset(),
            sheet_columns: 32,
            sheet_rows: 8,
        }
    }
}

/// Printable ASCII, Latin-1, general punctuation and a few symbols.
pub fn default_charset() -> Vec<char> {
    (' '..='~')
        .chain('\u{A0}'..='\u{FF}')
        .chain('\u{2010}'..='\u{2027}')
        .chain(['\u{2190}', '\u{2191}', '\u{2192}', '\u{2193}', '\u{3042}', '\u{FFFD}'])
        .collect()
}

/// A [`SystemFont`] backed by a TrueType/OpenType file.
pub struct FontdueSystemFont {
    info: FontInfo,
    sheets: Vec<DecodedImage>,
    metrics: Vec<CharWidthInfo>,
    index: HashMap<char, usize>,
    replacement: usize,
    blank: usize,
    text_scale: f32,
}

struct Raster {
    ch: char,
    metrics: fontdue::Metrics,
    coverage: Vec<u8>,
}

impl FontdueSystemFont {
    /// Loads the first font found in [`SYSTEM_FONT_PATHS`].
    pub fn from_system(config: &FontConfig) -> Result<Self, FontError> {
        let bytes = SYSTEM_FONT_PATHS
            .iter()
            .find_map(|p| std::fs::read(p).ok())
            .ok_or(FontError::NotFound)?;
        Self::from_bytes(&bytes, config)
    }

    pub fn from_bytes(bytes: &[u8], config: &FontConfig) -> Result<Self, FontError> {
        if config.charset.is_empty() {
            return Err(FontError::EmptyCharset);
        }
        let settings = fontdue::FontSettings { scale: config.raster_px, ..Default::default() };
        let font = fontdue::Font::from_bytes(bytes, settings)
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let mut chars: Vec<char> = vec![REPLACEMENT, ' '];
        for &ch in &config.charset {
            if !ch.is_control() && !chars.contains(&ch) {
                chars.push(ch);
            }
        }

        let px = config.raster_px;
        let rasters: Vec<Raster> = chars
            .iter()
            .map(|&ch| {
                let (metrics, coverage) = font.rasterize(ch, px);
                Raster { ch, metrics, coverage }
            })
            .collect();

        let (ascent, descent, line_feed) = match font.horizontal_line_metrics(px) {
            Some(m) => (m.ascent, m.descent, m.new_line_size),
            None => (px, 0.0, px),
        };
        let baseline = ascent.ceil().max(0.0) as u32;
        let tallest = rasters.iter().map(|r| r.metrics.height as u32).max().unwrap_or(0);
        let cell_height = ((ascent - descent).ceil() as u32).max(tallest).max(1);
        let cell_width = rasters.iter().map(|r| r.metrics.width as u32).max().unwrap_or(0).max(1);

        let columns = config.sheet_columns.max(1);
        let rows = config.sheet_rows.max(1);
        let per_sheet = (columns * rows) as usize;
        let sheet_count = rasters.len().div_ceil(per_sheet);

        let info = FontInfo {
            cell_width,
            cell_height,
            baseline,
            line_feed: line_feed.ceil(),
            sheet_width: padded_size(columns * (cell_width + 1) + 1),
            sheet_height: padded_size(rows * (cell_height + 1) + 1),
            sheet_columns: columns,
            sheet_rows: rows,
            sheet_count,
        };

        let mut sheets: Vec<DecodedImage> = (0..sheet_count)
            .map(|_| DecodedImage {
                width: info.sheet_width,
                height: info.sheet_height,
                pixels: vec![0; (info.sheet_width * info.sheet_height * 4) as usize],
            })
            .collect();

        let mut metrics = Vec::with_capacity(rasters.len());
        let mut index = HashMap::with_capacity(rasters.len());
        for (i, r) in rasters.iter().enumerate() {
            let in_sheet = (i % per_sheet) as u32;
            let cell_x = (in_sheet % columns) * (cell_width + 1) + 1;
            let cell_y = (in_sheet / columns) * (cell_height + 1) + 1;
            let top = baseline as i32 - (r.metrics.ymin + r.metrics.height as i32);

            blit_coverage(
                &mut sheets[i / per_sheet],
                (cell_x, cell_y, cell_width, cell_height),
                &r.coverage,
                r.metrics.width as u32,
                top,
            );

            metrics.push(CharWidthInfo {
                left: r.metrics.xmin as f32,
                glyph_width: r.metrics.width as f32,
                char_width: r.metrics.advance_width,
            });
            index.insert(r.ch, i);
        }

        log::info!(
            "system font: {} glyphs, {}x{} cells, {} sheet(s) of {}x{}",
            rasters.len(),
            cell_width,
            cell_height,
            sheet_count,
            info.sheet_width,
            info.sheet_height
        );

        Ok(Self {
            info,
            sheets,
            metrics,
            index,
            replacement: 0,
            blank: 1,
            text_scale: config.nominal_px / config.raster_px,
        })
    }
}

/// Copies a coverage bitmap into a cell as white texels, `top` rows below the
/// cell top. Pixels falling outside the cell are clipped.
fn blit_coverage(
    sheet: &mut DecodedImage,
    (cell_x, cell_y, cell_w, cell_h): (u32, u32, u32, u32),
    coverage: &[u8],
    width: u32,
    top: i32,
) {
    if width == 0 {
        return;
    }
    for (row, line) in coverage.chunks_exact(width as usize).enumerate() {
        let y = top + row as i32;
        if y < 0 || y >= cell_h as i32 {
            continue;
        }
        for (col, &a) in line.iter().enumerate().take(cell_w as usize) {
            let px = cell_x + col as u32;
            let py = cell_y + y as u32;
            if px >= sheet.width || py >= sheet.height {
                continue;
            }
            let at = ((py * sheet.width + px) * 4) as usize;
            sheet.pixels[at..at + 4].copy_from_slice(&[0xFF, 0xFF, 0xFF, a]);
        }
    }
}

impl SystemFont for FontdueSystemFont {
    fn info(&self) -> &FontInfo {
        &self.info
    }

    fn sheet(&self, index: usize) -> Option<&DecodedImage> {
        self.sheets.get(index)
    }

    fn glyph_index(&self, codepoint: u32) -> usize {
        match char::from_u32(codepoint) {
            Some(ch) if ch.is_control() => self.blank,
            Some(ch) => self.index.get(&ch).copied().unwrap_or(self.replacement),
            None => self.replacement,
        }
    }

    fn char_width_info(&self, glyph: usize) -> CharWidthInfo {
        self.metrics.get(glyph).copied().unwrap_or_default()
    }

    fn text_scale(&self) -> f32 {
        self.text_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_sheet(w: u32, h: u32) -> DecodedImage {
        DecodedImage { width: w, height: h, pixels: vec![0; (w * h * 4) as usize] }
    }

    fn alpha_at(sheet: &DecodedImage, x: u32, y: u32) -> u8 {
        sheet.pixels[((y * sheet.width + x) * 4 + 3) as usize]
    }

    #[test]
    fn blit_places_coverage_below_cell_top() {
        let mut sheet = blank_sheet(16, 16);
        blit_coverage(&mut sheet, (1, 1, 4, 6), &[10, 20, 30, 40], 2, 3);
        assert_eq!(alpha_at(&sheet, 1, 4), 10);
        assert_eq!(alpha_at(&sheet, 2, 4), 20);
        assert_eq!(alpha_at(&sheet, 1, 5), 30);
        assert_eq!(alpha_at(&sheet, 2, 5), 40);
        assert_eq!(alpha_at(&sheet, 1, 1), 0);
    }

    #[test]
    fn blit_clips_to_cell() {
        let mut sheet = blank_sheet(16, 16);
        // 2 rows above the cell, 1 inside
        blit_coverage(&mut sheet, (1, 1, 4, 2), &[1, 2, 3], 1, -2);
        assert_eq!(alpha_at(&sheet, 1, 1), 3);
        assert_eq!(alpha_at(&sheet, 1, 0), 0);
    }

    #[test]
    fn default_charset_is_printable() {
        let set = default_charset();
        assert!(set.contains(&'A'));
        assert!(set.contains(&'é'));
        assert!(!set.iter().any(|c| c.is_control()));
    }

    #[test]
    fn rejects_empty_charset() {
        let config = FontConfig { charset: Vec::new(), ..FontConfig::default() };
        let err = FontdueSystemFont::from_bytes(b"", &config);
        assert!(matches!(err, Err(FontError::EmptyCharset)));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = FontdueSystemFont::from_bytes(b"not a font", &FontConfig::default());
        assert!(matches!(err, Err(FontError::Parse(_))));
    }

    #[test]
    fn system_font_when_available() {
        let Ok(font) = FontdueSystemFont::from_system(&FontConfig::default()) else {
            return;
        };
        let info = *font.info();
        assert!(info.sheet_count >= 1);
        let a = font.char_width_info(font.glyph_index('A' as u32));
        assert!(a.char_width > 0.0);
        // unknown codepoints fall back to '?'
        assert_eq!(font.glyph_index(0x10FFFD), font.glyph_index('?' as u32));
        assert!((font.text_scale() - 20.0 / 30.0).abs() < 1e-6);
    }
}
