use std::fmt;

use crate::coords::Vec2;
use crate::device::{BlendMode, GpuBackend, Topology};
use crate::paint::Color;
use crate::render::{Renderer, Screen, Vertex, STRIP_QUAD_VERTICES};

use super::{LayoutStyle, LayoutWalker};

impl<B: GpuBackend> Renderer<B> {
    fn layout_style(&self, scale_x: f32, scale_y: f32, wrap: Option<f32>) -> LayoutStyle {
        let scale = Vec2::new(scale_x, scale_y) * self.text.text_scale();
        LayoutStyle { scale, line_height: scale.y * self.text.line_feed(), wrap }
    }

    /// Size of the box `text` covers when drawn with the same arguments.
    pub fn text_size(&self, text: impl AsRef<[u8]>, scale_x: f32, scale_y: f32, wrap: Option<f32>) -> Vec2 {
        let style = self.layout_style(scale_x, scale_y, wrap);
        LayoutWalker::new(text.as_ref(), style, |cp| self.text.advance(cp)).measure()
    }

    pub fn text_width(&self, text: impl AsRef<[u8]>, scale_x: f32, scale_y: f32) -> f32 {
        self.text_size(text, scale_x, scale_y, None).x
    }

    pub fn text_height(&self, text: impl AsRef<[u8]>, scale_x: f32, scale_y: f32) -> f32 {
        self.text_size(text, scale_x, scale_y, None).y
    }

    pub fn text_height_wrap(&self, text: impl AsRef<[u8]>, scale_x: f32, scale_y: f32, wrap: f32) -> f32 {
        self.text_size(text, scale_x, scale_y, Some(wrap)).y
    }

    pub fn draw_text(&mut self, x: f32, y: f32, scale_x: f32, scale_y: f32, color: Color, text: impl AsRef<[u8]>) {
        self.draw_text_wrap(x, y, scale_x, scale_y, color, None, text);
    }

    /// Draws `text` centered horizontally on `screen`.
    pub fn draw_text_center(
        &mut self,
        screen: Screen,
        y: f32,
        scale_x: f32,
        scale_y: f32,
        color: Color,
        text: impl AsRef<[u8]>,
    ) {
        let text = text.as_ref();
        let x = (screen.width() - self.text_width(text, scale_x, scale_y)) / 2.0;
        self.draw_text_wrap(x, y, scale_x, scale_y, color, None, text);
    }

    /// Formats and draws, e.g. `draw_text_fmt(.., format_args!("{n} sprites"))`.
    pub fn draw_text_fmt(&mut self, x: f32, y: f32, scale_x: f32, scale_y: f32, color: Color, args: fmt::Arguments<'_>) {
        let text = fmt::format(args);
        self.draw_text_wrap(x, y, scale_x, scale_y, color, None, text);
    }

    /// Draws `text` with its top-left at `(x, y)`, breaking lines before any
    /// glyph that would cross `x + wrap`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text_wrap(
        &mut self,
        x: f32,
        y: f32,
        scale_x: f32,
        scale_y: f32,
        color: Color,
        wrap: Option<f32>,
        text: impl AsRef<[u8]>,
    ) {
        let style = self.layout_style(scale_x, scale_y, wrap);
        let scale = style.scale;

        self.batch.set_blend_mode(&mut self.backend, BlendMode::TintTexture, color);
        self.batch.set_topology(&mut self.backend, Topology::TriangleStrip);

        let (text_res, batch, backend) = (&self.text, &mut self.batch, &mut self.backend);
        let atlas = text_res.atlas();
        let font = text_res.font();
        let origin = Vec2::new(x, y);

        for placed in LayoutWalker::new(text.as_ref(), style, |cp| text_res.advance(cp)) {
            let pen = origin + placed.pen;

            let (texture, left, right, bottom, tex) = match atlas.glyph(placed.codepoint) {
                Some(glyph) => {
                    let left = pen.x + scale.x * glyph.left;
                    let right = left + scale.x * glyph.glyph_width;
                    let bottom = pen.y + scale.y * atlas.cell_height();
                    (atlas.texture().gpu(), left, right, bottom, glyph.tex)
                }
                None => {
                    let pos = font.glyph_pos(font.glyph_index(placed.codepoint), scale.x, scale.y);
                    let left = pen.x + pos.vtx.origin.x;
                    let sheet = text_res.sheet(pos.sheet).and_then(|s| s.texture().gpu());
                    (sheet, left, left + pos.vtx.size.x, pen.y + pos.vtx.size.y, pos.tex)
                }
            };

            let Some(texture) = texture else { continue };
            if !batch.ensure_space(STRIP_QUAD_VERTICES) {
                break;
            }
            batch.bind_texture(backend, texture);
            batch.append_strip_quad([
                Vertex::new(left, bottom, tex.left, tex.bottom),
                Vertex::new(right, bottom, tex.right, tex.bottom),
                Vertex::new(left, pen.y, tex.left, tex.top),
                Vertex::new(right, pen.y, tex.right, tex.top),
            ]);
        }

        batch.flush(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessBackend;
    use crate::render::renderer::tests::{draws, renderer, renderer_with};
    use crate::render::{RendererConfig, Side};
    use crate::text::test_font::MonospaceFont;

    /// Top-left corner of every glyph quad, in draw order.
    fn top_left_positions(r: &Renderer<HeadlessBackend>) -> Vec<[f32; 2]> {
        let mut out = Vec::new();
        for d in draws(r) {
            // a draw opens with a bare quad; later quads carry two bridge vertices
            let (first, rest) = d.vertices.split_at(4);
            out.push(first[2].pos);
            out.extend(rest.chunks_exact(6).map(|q| q[4].pos));
        }
        out
    }

    #[test]
    fn ascii_advance_comes_from_the_atlas() {
        let r = renderer();
        let glyph = *r.text().atlas().glyph('A' as u32).unwrap();
        assert_eq!(r.text_width("A", 1.0, 1.0), glyph.char_width);
        assert_eq!(r.text_width("A", 2.5, 1.0), glyph.char_width * 2.5);
    }

    #[test]
    fn non_ascii_advance_comes_from_the_font() {
        let r = renderer();
        assert_eq!(r.text_width("é", 1.0, 1.0), MonospaceFont::LATIN1_ADVANCE);
        assert_eq!(r.text_width("é", 2.0, 1.0), MonospaceFont::LATIN1_ADVANCE * 2.0);
    }

    #[test]
    fn wrap_measures_two_lines() {
        let r = renderer();
        let wrap = r.text_width("AAAA ", 1.0, 1.0);
        let line = r.text_height("A", 1.0, 1.0);
        assert_eq!(r.text_height_wrap("AAAA AAAA", 1.0, 1.0, wrap), 2.0 * line);
        assert_eq!(r.text_size("AAAA AAAA", 1.0, 1.0, Some(wrap)).x, wrap);
    }

    #[test]
    fn wrap_draws_second_word_at_origin_one_line_lower() {
        let mut r = renderer();
        let wrap = r.text_width("AAAA ", 1.0, 1.0);
        let line = r.text_height("A", 1.0, 1.0);

        r.frame_begin(Screen::Top, Side::Left);
        r.draw_text_wrap(7.0, 3.0, 1.0, 1.0, Color::WHITE, Some(wrap), "AAAA AAAA");
        r.frame_end();

        let d = draws(&r);
        assert_eq!(d.len(), 1);
        let v = &d[0].vertices;
        // 9 quads: 4 + 8 * 6 vertices
        assert_eq!(v.len(), 4 + 8 * 6);
        // sixth glyph (second line, first 'A'): its top-left corner
        let sixth_top_left = v[4 + 4 * 6 + 4].pos;
        assert_eq!(sixth_top_left, [7.0, 3.0 + line]);
    }

    #[test]
    fn text_is_tinted_strip_on_the_atlas() {
        let mut r = renderer();
        let atlas = r.text().atlas().texture().gpu();

        r.frame_begin(Screen::Top, Side::Left);
        r.draw_text(0.0, 0.0, 1.0, 1.0, Color::rgba(9, 8, 7, 255), "Hi");
        r.frame_end();

        let d = draws(&r);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].mode, BlendMode::TintTexture);
        assert_eq!(d[0].color, Color::rgba(9, 8, 7, 255));
        assert_eq!(d[0].topology, Topology::TriangleStrip);
        assert_eq!(d[0].texture, atlas);
    }

    #[test]
    fn non_ascii_binds_its_source_sheet() {
        let mut r = renderer();
        let atlas = r.text().atlas().texture().gpu();
        let latin1_sheet = r.text().sheet(1).and_then(|s| s.texture().gpu());

        r.frame_begin(Screen::Top, Side::Left);
        r.draw_text(0.0, 0.0, 1.0, 1.0, Color::WHITE, "aéa");
        r.frame_end();

        let textures: Vec<_> = draws(&r).iter().map(|d| d.texture).collect();
        assert_eq!(textures, vec![atlas, latin1_sheet, atlas]);
    }

    #[test]
    fn glyph_quads_follow_the_pen() {
        let mut r = renderer();
        r.frame_begin(Screen::Top, Side::Left);
        r.draw_text(5.0, 10.0, 1.0, 1.0, Color::WHITE, "ab\nc");
        r.frame_end();

        let corners = top_left_positions(&r);
        assert_eq!(corners, vec![[5.0, 10.0], [15.0, 10.0], [5.0, 26.0]]);
    }

    #[test]
    fn text_stops_when_the_batch_fills() {
        let mut r = renderer_with(RendererConfig { max_vertices: 20, ..RendererConfig::default() });
        r.frame_begin(Screen::Top, Side::Left);
        r.draw_text(0.0, 0.0, 1.0, 1.0, Color::WHITE, "abcdefgh");
        assert_eq!(r.batch().pending(), 0);
        r.frame_end();
        // 4 + 6 + 6 fit below 20
        assert_eq!(draws(&r)[0].count(), 16);
    }

    #[test]
    fn centered_text_is_centered() {
        let mut r = renderer();
        r.frame_begin(Screen::Bottom, Side::Left);
        r.draw_text_center(Screen::Bottom, 0.0, 1.0, 1.0, Color::WHITE, "abcd");
        r.frame_end();
        assert_eq!(top_left_positions(&r)[0], [(320.0 - 40.0) / 2.0, 0.0]);
    }

    #[test]
    fn formatted_text_matches_plain_text() {
        let mut a = renderer();
        a.frame_begin(Screen::Top, Side::Left);
        a.draw_text_fmt(0.0, 0.0, 1.0, 1.0, Color::WHITE, format_args!("{}/{}", 12, 34));
        a.frame_end();

        let mut b = renderer();
        b.frame_begin(Screen::Top, Side::Left);
        b.draw_text(0.0, 0.0, 1.0, 1.0, Color::WHITE, "12/34");
        b.frame_end();

        assert_eq!(draws(&a)[0].vertices, draws(&b)[0].vertices);
    }
}
