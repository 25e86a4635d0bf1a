use crate::device::GpuBackend;
use crate::render::VertexBatch;
use crate::texture::{TextureError, TextureLease, TextureRegistry};

use super::{GlyphAtlas, SystemFont};

/// The system font with its GPU resources: uploaded sheets plus the ASCII
/// atlas.
pub struct SystemText {
    font: Box<dyn SystemFont>,
    /// Indexed like the font's sheets; `None` where the font had no pixels.
    sheets: Vec<Option<TextureLease>>,
    atlas: GlyphAtlas,
    text_scale: f32,
}

impl SystemText {
    /// Uploads every sheet of `font` and builds the glyph atlas from them.
    pub fn load<B: GpuBackend + ?Sized>(
        gpu: &mut B,
        batch: &mut VertexBatch,
        registry: &mut TextureRegistry,
        font: Box<dyn SystemFont>,
    ) -> Result<Self, TextureError> {
        let count = font.info().sheet_count;
        let mut sheets = Vec::with_capacity(count);
        for i in 0..count {
            let sheet = match font.sheet(i) {
                Some(image) => Some(registry.load_image(gpu, image)?.lease()),
                None => {
                    log::warn!("font sheet {i} of {count} has no pixels");
                    None
                }
            };
            sheets.push(sheet);
        }

        let atlas = GlyphAtlas::build(gpu, batch, registry, font.as_ref(), &sheets)?;
        let text_scale = font.text_scale();
        Ok(Self { font, sheets, atlas, text_scale })
    }

    #[inline]
    pub fn font(&self) -> &dyn SystemFont {
        self.font.as_ref()
    }

    #[inline]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    #[inline]
    pub fn sheet(&self, index: usize) -> Option<&TextureLease> {
        self.sheets.get(index)?.as_ref()
    }

    #[inline]
    pub fn text_scale(&self) -> f32 {
        self.text_scale
    }

    /// Unscaled line height.
    #[inline]
    pub fn line_feed(&self) -> f32 {
        self.font.info().line_feed
    }

    /// Unscaled pen advance of `codepoint`: from the atlas for ASCII, from the
    /// font otherwise.
    pub fn advance(&self, codepoint: u32) -> f32 {
        match self.atlas.glyph(codepoint) {
            Some(glyph) => glyph.char_width,
            None => self.font.char_width_info(self.font.glyph_index(codepoint)).char_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessBackend;
    use crate::text::test_font::MonospaceFont;
    use crate::text::{CharWidthInfo, FontInfo};
    use crate::texture::DecodedImage;

    /// Monospace font whose first sheet failed to rasterize.
    struct FirstSheetMissing(MonospaceFont);

    impl SystemFont for FirstSheetMissing {
        fn info(&self) -> &FontInfo {
            self.0.info()
        }
        fn sheet(&self, index: usize) -> Option<&DecodedImage> {
            if index == 0 { None } else { self.0.sheet(index) }
        }
        fn glyph_index(&self, codepoint: u32) -> usize {
            self.0.glyph_index(codepoint)
        }
        fn char_width_info(&self, glyph: usize) -> CharWidthInfo {
            self.0.char_width_info(glyph)
        }
    }

    #[test]
    fn missing_sheet_keeps_later_sheets_at_their_index() {
        let mut gpu = HeadlessBackend::new();
        let mut batch = VertexBatch::new(0x4000);
        let mut registry = TextureRegistry::new();
        let font = Box::new(FirstSheetMissing(MonospaceFont::new()));

        let text = SystemText::load(&mut gpu, &mut batch, &mut registry, font).unwrap();

        assert!(text.sheet(0).is_none());
        let latin1 = text.sheet(1).expect("second sheet uploaded");
        assert!(latin1.texture().is_valid());
        assert!(text.sheet(2).is_none());
        // 'é' lives on sheet 1 and must resolve to the uploaded texture
        assert_eq!(text.font().glyph_pos(0xE9, 1.0, 1.0).sheet, 1);
    }
}
