//! One-time glyph atlas construction.
//!
//! The 128 ASCII glyphs are copied from the font's source sheets into a single
//! 16 x 8 cell texture, so ordinary text samples one texture and never has to
//! rebind. Everything else keeps being drawn from the source sheets.

use crate::coords::{Mat4, TexCoords};
use crate::device::{BlendMode, GpuBackend, Topology};
use crate::paint::Color;
use crate::render::{Vertex, VertexBatch, STRIP_QUAD_VERTICES};
use crate::texture::{TextureError, TextureLease, TextureRef, TextureRegistry};

use super::SystemFont;

pub const CACHED_GLYPHS: usize = 128;
pub const ATLAS_COLUMNS: u32 = 16;
pub const ATLAS_ROWS: u32 = 8;

/// A cached ASCII glyph.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Glyph {
    pub left: f32,
    pub glyph_width: f32,
    pub char_width: f32,
    /// Cell rectangle inside the atlas.
    pub tex: TexCoords,
}

#[derive(Debug)]
pub struct GlyphAtlas {
    lease: TextureLease,
    glyphs: [Glyph; CACHED_GLYPHS],
    cell_height: f32,
}

impl GlyphAtlas {
    #[inline]
    pub fn texture(&self) -> &TextureRef {
        self.lease.texture()
    }

    /// Cached entry for an ASCII codepoint.
    #[inline]
    pub fn glyph(&self, codepoint: u32) -> Option<&Glyph> {
        self.glyphs.get(codepoint as usize)
    }

    #[inline]
    pub fn cell_height(&self) -> f32 {
        self.cell_height
    }

    /// Renders the ASCII range of `font` into a fresh texture.
    ///
    /// Runs a complete frame of its own on the atlas target, so it must not be
    /// called while a frame is open.
    pub fn build<B: GpuBackend + ?Sized>(
        gpu: &mut B,
        batch: &mut VertexBatch,
        registry: &mut TextureRegistry,
        font: &dyn SystemFont,
        sheets: &[Option<TextureLease>],
    ) -> Result<Self, TextureError> {
        let info = *font.info();
        let (cw, ch) = (info.cell_width, info.cell_height);

        let (texture, target) =
            registry.create_render_texture(gpu, ATLAS_COLUMNS * cw, ATLAS_ROWS * ch)?;
        let lease = texture.lease();
        let (tex_w, tex_h) = texture.size();
        let (tw, th) = (tex_w as f32, tex_h as f32);

        gpu.set_clear_color(target, Color::TRANSPARENT);
        gpu.frame_begin();
        gpu.frame_draw_on(target);
        gpu.set_projection(&Mat4::ortho_target(tw, th));

        batch.reset();
        batch.set_blend_mode(gpu, BlendMode::TextureReplace, Color::TRANSPARENT);
        batch.set_topology(gpu, Topology::TriangleStrip);

        let mut glyphs = [Glyph::default(); CACHED_GLYPHS];
        for (code, slot) in glyphs.iter_mut().enumerate() {
            let index = font.glyph_index(code as u32);
            let cwi = font.char_width_info(index);
            let src = font.glyph_pos(index, 1.0, 1.0);

            let left = (code as u32 % ATLAS_COLUMNS * cw) as f32;
            let top = (code as u32 / ATLAS_COLUMNS * ch) as f32;
            let right = left + cwi.glyph_width;
            let bottom = top + ch as f32;

            *slot = Glyph {
                left: cwi.left,
                glyph_width: cwi.glyph_width,
                char_width: cwi.char_width,
                tex: TexCoords::new(left / tw, top / th, right / tw, bottom / th),
            };

            let Some(sheet) = sheets.get(src.sheet).and_then(Option::as_ref).and_then(|s| s.texture().gpu()) else {
                log::warn!("glyph {code}: source sheet {} missing", src.sheet);
                continue;
            };
            if !batch.ensure_space(STRIP_QUAD_VERTICES) {
                continue;
            }

            batch.bind_texture(gpu, sheet);
            let t = src.tex;
            batch.append_strip_quad([
                Vertex::new(left, bottom, t.left, t.bottom),
                Vertex::new(right, bottom, t.right, t.bottom),
                Vertex::new(left, top, t.left, t.top),
                Vertex::new(right, top, t.right, t.top),
            ]);
            batch.flush(gpu);
            // draws hand their vertices over, so each glyph can start from zero
            batch.reset();
        }

        gpu.frame_end();
        batch.reset();
        registry.detach_target(gpu, &texture);

        log::info!("glyph atlas built: {tex_w}x{tex_h}, {cw}x{ch} cells");
        Ok(Self { lease, glyphs, cell_height: ch as f32 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BackendCall, HeadlessBackend};
    use crate::text::test_font::MonospaceFont;

    fn build() -> (HeadlessBackend, TextureRegistry, GlyphAtlas) {
        let mut gpu = HeadlessBackend::new();
        let mut registry = TextureRegistry::new();
        let mut batch = VertexBatch::new(0x4000);
        let font = MonospaceFont::new();

        let sheets: Vec<Option<TextureLease>> = (0..font.info().sheet_count)
            .map(|i| {
                let img = font.sheet(i).unwrap();
                Some(registry.load_image(&mut gpu, img).unwrap().lease())
            })
            .collect();
        let atlas = GlyphAtlas::build(&mut gpu, &mut batch, &mut registry, &font, &sheets).unwrap();
        drop(sheets);
        (gpu, registry, atlas)
    }

    #[test]
    fn atlas_is_sized_for_16_by_8_cells() {
        let (_, _, atlas) = build();
        // 160 x 128 padded to powers of two
        assert_eq!(atlas.texture().size(), (256, 128));
        assert_eq!(atlas.cell_height(), 16.0);
    }

    #[test]
    fn one_draw_per_glyph_into_the_atlas_target() {
        let (gpu, registry, atlas) = build();
        let draws: Vec<_> = gpu.draws().collect();
        assert_eq!(draws.len(), CACHED_GLYPHS);
        assert!(draws.iter().all(|d| d.count() == 4 && d.topology == Topology::TriangleStrip));
        assert!(draws.iter().all(|d| d.mode == BlendMode::TextureReplace));
        // the target is gone once the atlas is built
        assert_eq!(registry.target_of(atlas.texture()), None);
        assert!(gpu.calls().iter().any(|c| matches!(c, BackendCall::DeleteTarget(_))));
    }

    #[test]
    fn glyph_cells_follow_row_major_order() {
        let (_, _, atlas) = build();
        let a = atlas.glyph('A' as u32).unwrap();
        // 'A' = 65: column 1, row 4
        assert_eq!(a.tex.left, 10.0 / 256.0);
        assert_eq!(a.tex.top, 64.0 / 128.0);
        assert_eq!(a.tex.right, 20.0 / 256.0);
        assert_eq!(a.tex.bottom, 80.0 / 128.0);
        assert_eq!(a.char_width, MonospaceFont::ASCII_ADVANCE);
        assert!(atlas.glyph(200).is_none());
    }

    #[test]
    fn atlas_keeps_itself_referenced() {
        let (_, _, atlas) = build();
        assert_eq!(atlas.texture().ref_count(), 1);
    }
}
