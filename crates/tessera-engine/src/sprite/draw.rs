use crate::coords::{Rect, Vec2};
use crate::device::{BlendMode, GpuBackend, Topology};
use crate::paint::Color;
use crate::render::{Renderer, Vertex};
use crate::texture::TextureRef;

use super::Sprite;

/// Vertices of one sprite: two independent triangles.
pub const SPRITE_VERTICES: usize = 6;

impl<B: GpuBackend> Renderer<B> {
    /// A sprite showing the pixel rectangle `source` of `texture`.
    ///
    /// Returns `None` for an invalid texture or an empty rectangle.
    pub fn new_sprite_textured(&self, position: Vec2, texture: &TextureRef, source: Rect) -> Option<Sprite> {
        if !texture.is_valid() {
            log::warn!("sprite requested on an invalid texture");
            return None;
        }
        let (w, h) = texture.size();
        let texcoords = source.to_tex_coords(w, h)?;
        Some(Sprite::textured(position, source.size, texture, texcoords))
    }

    pub fn new_sprite_colored(&self, position: Vec2, size: Vec2, color: Color) -> Sprite {
        Sprite::colored(position, size, color)
    }

    /// Queues `sprite` with its last updated transform.
    ///
    /// While an outline is active the sprite is drawn inflated in the outline
    /// color instead.
    pub fn draw_sprite(&mut self, sprite: &Sprite) {
        if !self.batch.ensure_space(SPRITE_VERTICES) {
            return;
        }

        let texture = match sprite.texture() {
            Some(t) => match t.gpu() {
                Some(gpu) => Some(gpu),
                // texture freed at shutdown
                None => return,
            },
            None => None,
        };

        let outline = self.batch.state().outline;
        let (model, mode, color) = if outline.is_active() {
            let mode = if texture.is_some() { BlendMode::TintTexture } else { BlendMode::FlatColor };
            (sprite.outline_model(outline.thickness), mode, outline.color)
        } else if texture.is_some() {
            (sprite.model(), BlendMode::TextureReplace, sprite.color())
        } else {
            (sprite.model(), BlendMode::FlatColor, sprite.color())
        };

        if let Some(gpu) = texture {
            self.batch.bind_texture(&mut self.backend, gpu);
        }
        self.batch.set_blend_mode(&mut self.backend, mode, color);
        self.batch.set_topology(&mut self.backend, Topology::TriangleList);

        let Vec2 { x: w, y: h } = sprite.size();
        let t = sprite.texcoords();
        let corners = [
            (0.0, 0.0, t.left, t.top),
            (0.0, h, t.left, t.bottom),
            (w, h, t.right, t.bottom),
            (w, h, t.right, t.bottom),
            (w, 0.0, t.right, t.top),
            (0.0, 0.0, t.left, t.top),
        ];
        let vertices = corners.map(|(x, y, u, v)| {
            let p = model.transform_point(Vec2::new(x, y));
            Vertex::new(p.x, p.y, u, v)
        });
        self.batch.append_all(&vertices);
    }

    /// Releases the sprite's texture reference and, if the sprite was told
    /// to, asks for the texture to be destroyed.
    pub fn destroy_sprite(&mut self, sprite: Sprite) {
        let texture = sprite.destroys_texture().then(|| sprite.texture().cloned()).flatten();
        drop(sprite);
        if let Some(texture) = texture {
            self.destroy_texture(&texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BackendCall, HeadlessBackend};
    use crate::render::renderer::tests::{draws, renderer, renderer_with};
    use crate::render::{RendererConfig, Screen, Side};

    fn sheet(r: &mut Renderer<HeadlessBackend>) -> TextureRef {
        let tex = r.texture_from_image(64, 64, &vec![0xFF; 64 * 64 * 4]);
        assert!(tex.is_valid());
        tex
    }

    fn cell(id: u32) -> Rect {
        Rect::new((id / 2 * 32) as f32, (id % 2 * 32) as f32, 32.0, 32.0)
    }

    #[test]
    fn textured_sprite_normalizes_by_padded_size() {
        let mut r = renderer();
        let tex = r.texture_from_image(40, 20, &vec![0; 40 * 20 * 4]);
        let s = r.new_sprite_textured(Vec2::zero(), &tex, Rect::new(32.0, 16.0, 16.0, 8.0)).unwrap();
        assert_eq!(s.size(), Vec2::new(16.0, 8.0));
        assert_eq!(s.texcoords().left, 0.5);
        assert_eq!(s.texcoords().top, 0.25);
        assert_eq!(s.texcoords().right, 0.75);
        assert_eq!(s.texcoords().bottom, 0.375);
        assert_eq!(tex.ref_count(), 1);
    }

    #[test]
    fn invalid_inputs_make_no_sprite() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        assert!(r.new_sprite_textured(Vec2::zero(), &TextureRef::invalid(), cell(0)).is_none());
        assert!(r.new_sprite_textured(Vec2::zero(), &tex, Rect::new(0.0, 0.0, 0.0, 8.0)).is_none());
        assert_eq!(tex.ref_count(), 0);
    }

    #[test]
    fn creating_sprites_leaves_the_renderer_untouched() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        let calls = r.backend().calls().len();

        let shared = &r;
        let a = shared.new_sprite_textured(Vec2::zero(), &tex, cell(0)).unwrap();
        let b = shared.new_sprite_colored(Vec2::zero(), Vec2::new(4.0, 4.0), Color::WHITE);

        assert_eq!(r.backend().calls().len(), calls);
        assert_eq!(r.batch().write_head(), 0);
        assert_eq!(tex.ref_count(), 1);
        drop((a, b));
    }

    #[test]
    fn destroy_waits_for_every_sprite() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        let sprites: Vec<Sprite> = (0..3)
            .map(|i| r.new_sprite_textured(Vec2::zero(), &tex, cell(i)).unwrap())
            .collect();
        assert_eq!(tex.ref_count(), 3);

        for s in sprites {
            assert!(!r.destroy_texture(&tex));
            r.destroy_sprite(s);
        }
        assert_eq!(tex.ref_count(), 0);
        assert!(r.destroy_texture(&tex));
        assert_eq!(tex.uid(), 0);
    }

    #[test]
    fn destroying_the_last_owner_can_take_the_texture_along() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        let mut a = r.new_sprite_textured(Vec2::zero(), &tex, cell(0)).unwrap();
        let mut b = r.new_sprite_textured(Vec2::zero(), &tex, cell(1)).unwrap();
        a.set_destroy_texture(true);
        b.set_destroy_texture(true);

        r.destroy_sprite(a);
        assert!(tex.is_valid());
        r.destroy_sprite(b);
        assert!(!tex.is_valid());
    }

    #[test]
    fn colored_sprite_uses_flat_color_list() {
        let mut r = renderer();
        let mut s = r.new_sprite_colored(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), Color::BLACK);
        s.update();

        r.frame_begin(Screen::Top, Side::Left);
        r.draw_sprite(&s);
        r.frame_end();

        let d = draws(&r);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].topology, Topology::TriangleList);
        assert_eq!(d[0].mode, BlendMode::FlatColor);
        assert_eq!(d[0].color, Color::BLACK);
        let pos: Vec<[f32; 2]> = d[0].vertices.iter().map(|v| v.pos).collect();
        assert_eq!(
            pos,
            vec![[1.0, 2.0], [1.0, 6.0], [4.0, 6.0], [4.0, 6.0], [4.0, 2.0], [1.0, 2.0]]
        );
    }

    #[test]
    fn hundred_sprites_one_bind_one_draw() {
        let mut r = renderer();
        let tex = sheet(&mut r);

        let mut seed = 7u32;
        let mut sprites: Vec<Sprite> = (0..100)
            .map(|i| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let pos = Vec2::new((i * 3) as f32, (seed >> 16 & 0xFF) as f32);
                r.new_sprite_textured(pos, &tex, cell(seed & 3)).unwrap()
            })
            .collect();

        r.frame_begin(Screen::Top, Side::Left);
        for s in &mut sprites {
            s.rotate(15.0).update();
            r.draw_sprite(s);
        }
        r.frame_end();

        assert_eq!(r.backend().texture_binds(), 1);
        let d = draws(&r);
        assert_eq!(d.len(), 1);
        assert_eq!(d.iter().map(|d| d.count()).sum::<u32>(), 600);
        assert_eq!(d[0].texture, tex.gpu());
        assert_eq!(d[0].mode, BlendMode::TextureReplace);
    }

    #[test]
    fn no_draw_spans_two_states() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        let mut textured = r.new_sprite_textured(Vec2::zero(), &tex, cell(0)).unwrap();
        let mut flat = r.new_sprite_colored(Vec2::zero(), Vec2::new(8.0, 8.0), Color::WHITE);
        textured.update();
        flat.update();

        r.frame_begin(Screen::Top, Side::Left);
        r.draw_sprite(&textured);
        r.draw_sprite(&flat);
        r.draw_sprite(&textured);
        r.draw_rectangle(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        r.frame_end();

        let d = draws(&r);
        let modes: Vec<_> = d.iter().map(|d| (d.mode, d.topology, d.count())).collect();
        assert_eq!(
            modes,
            vec![
                (BlendMode::TextureReplace, Topology::TriangleList, 6),
                (BlendMode::FlatColor, Topology::TriangleList, 6),
                (BlendMode::TextureReplace, Topology::TriangleList, 6),
                (BlendMode::FlatColor, Topology::TriangleStrip, 4),
            ]
        );
        // ranges are contiguous and never overlap
        for pair in d.windows(2) {
            assert_eq!(pair[0].first + pair[0].count(), pair[1].first);
        }
    }

    #[test]
    fn full_batch_drops_whole_sprites() {
        let mut r = renderer_with(RendererConfig { max_vertices: 20, ..RendererConfig::default() });
        let mut s = r.new_sprite_colored(Vec2::zero(), Vec2::new(4.0, 4.0), Color::WHITE);
        s.update();

        r.frame_begin(Screen::Top, Side::Left);
        for _ in 0..5 {
            r.draw_sprite(&s);
        }
        assert_eq!(r.batch().write_head(), 18);
        r.frame_end();
        assert_eq!(draws(&r)[0].count(), 18);
    }

    #[test]
    fn outline_pass_inflates_and_recolors() {
        let mut r = renderer();
        let tex = sheet(&mut r);
        let mut s = r.new_sprite_textured(Vec2::new(100.0, 100.0), &tex, cell(0)).unwrap();
        s.update();

        r.frame_begin(Screen::Top, Side::Left);
        r.outline_begin();
        r.draw_sprite(&s);
        r.outline_apply(Color::rgba(255, 0, 0, 255), 50.0);
        r.draw_sprite(&s);
        r.outline_end();
        r.draw_sprite(&s);
        r.frame_end();

        let d = draws(&r);
        assert_eq!(d.len(), 3);
        // silhouette: textured, stamping
        assert_eq!(d[0].mode, BlendMode::TextureReplace);
        assert!(d[0].stencil.enabled && d[0].alpha.enabled);
        // fringe: tinted in the outline color, 1.5x around the center
        assert_eq!(d[1].mode, BlendMode::TintTexture);
        assert_eq!(d[1].color, Color::rgba(255, 0, 0, 255));
        assert_eq!(d[1].vertices[0].pos, [92.0, 92.0]);
        assert!(!d[1].alpha.enabled);
        // back to normal
        assert!(!d[2].stencil.enabled);
        assert_eq!(d[2].vertices[0].pos, [100.0, 100.0]);
        assert_eq!(
            r.backend().calls().iter().filter(|c| matches!(c, BackendCall::BindTexture(_))).count(),
            1
        );
    }
}
