use crate::coords::{Mat4, Quat, Rect, TexCoords, Vec2};
use crate::paint::Color;
use crate::texture::{TextureLease, TextureRef};

use super::Derived;

/// A transformable quad, textured or flat-colored.
///
/// Mutators only record what changed; [`update`](Self::update) resolves the
/// scaled bounds and the model matrix before the next draw. Drawing a sprite
/// that was mutated but not updated uses the previous transform.
#[derive(Debug)]
pub struct Sprite {
    /// Anchor position (top-left at scale 1).
    origin: Vec2,
    /// Unscaled size.
    size: Vec2,
    scale: Vec2,
    rotation: Quat,
    color: Color,
    texcoords: TexCoords,
    texture: Option<TextureLease>,
    destroy_texture: bool,

    /// Scaled size, re-centered on the unscaled box.
    bounds: Derived<Rect>,
    model: Derived<Mat4>,
}

impl Sprite {
    /// A sprite showing `texcoords` of `texture`, `size` pixels large.
    ///
    /// Takes a counted reference on the texture for the sprite's lifetime.
    pub fn textured(position: Vec2, size: Vec2, texture: &TextureRef, texcoords: TexCoords) -> Self {
        Self::build(position, size, Color::WHITE, texcoords, Some(texture.lease()))
    }

    pub fn colored(position: Vec2, size: Vec2, color: Color) -> Self {
        Self::build(position, size, color, TexCoords::default(), None)
    }

    fn build(
        origin: Vec2,
        size: Vec2,
        color: Color,
        texcoords: TexCoords,
        texture: Option<TextureLease>,
    ) -> Self {
        Self {
            origin,
            size,
            scale: Vec2::new(1.0, 1.0),
            rotation: Quat::IDENTITY,
            color,
            texcoords,
            texture,
            destroy_texture: false,
            bounds: Derived::Clean(Rect { origin, size }),
            model: Derived::Dirty(Mat4::IDENTITY),
        }
    }

    // ── mutators ──────────────────────────────────────────────────────────

    /// Translates the sprite. Bounds move immediately; the model is rebuilt
    /// on the next update.
    pub fn move_by(&mut self, dx: f32, dy: f32) -> &mut Self {
        let d = Vec2::new(dx, dy);
        self.origin += d;
        self.bounds.update_in_place(|r| r.origin += d);
        self.model.invalidate();
        self
    }

    /// Adds `degrees` of rotation around the sprite's center.
    pub fn rotate(&mut self, degrees: f32) -> &mut Self {
        self.rotation = self.rotation.rotate_z(degrees.to_radians());
        self.model.invalidate();
        self
    }

    /// Adds `(dx, dy)` to the scale factors, which never drop below zero.
    pub fn scale(&mut self, dx: f32, dy: f32) -> &mut Self {
        self.scale = (self.scale + Vec2::new(dx, dy)).clamp_non_negative();
        self.bounds.invalidate();
        self.model.invalidate();
        self
    }

    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Whether destroying the sprite also asks for its texture to be
    /// destroyed.
    pub fn set_destroy_texture(&mut self, destroy: bool) -> &mut Self {
        self.destroy_texture = destroy;
        self
    }

    /// Resolves the scaled bounds, then the model matrix.
    pub fn update(&mut self) -> &mut Self {
        let (origin, size, scale, rotation) = (self.origin, self.size, self.scale, self.rotation);
        self.bounds.resolve(|| {
            let scaled = size.scale(scale);
            Rect { origin: origin + (size - scaled) * 0.5, size: scaled }
        });
        self.model.resolve(|| pivot_transform(origin, size, scale, rotation, size.y * 0.5));
        self
    }

    // ── accessors ─────────────────────────────────────────────────────────

    /// Scaled, re-centered rectangle as of the last update.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn scale_factors(&self) -> Vec2 {
        self.scale
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn texcoords(&self) -> TexCoords {
        self.texcoords
    }

    /// Model matrix as of the last update.
    #[inline]
    pub fn model(&self) -> Mat4 {
        self.model.get()
    }

    #[inline]
    pub fn dimensions_dirty(&self) -> bool {
        self.bounds.is_dirty()
    }

    #[inline]
    pub fn model_dirty(&self) -> bool {
        self.model.is_dirty()
    }

    #[inline]
    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref().map(TextureLease::texture)
    }

    #[inline]
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }

    #[inline]
    pub fn destroys_texture(&self) -> bool {
        self.destroy_texture
    }

    /// Model for the fringe pass of an outline: the scale grows by
    /// `thickness` on both axes around the center.
    pub fn outline_model(&self, thickness: f32) -> Mat4 {
        let scale = self.scale + Vec2::new(thickness, thickness);
        pivot_transform(self.origin, self.size, scale, self.rotation, self.size.y * 0.5)
    }
}

/// `T(origin + c) * R * S * T(-c)` with `c = (size.x / 2, pivot_y)`.
fn pivot_transform(origin: Vec2, size: Vec2, scale: Vec2, rotation: Quat, pivot_y: f32) -> Mat4 {
    let c = Vec2::new(size.x * 0.5, pivot_y);
    Mat4::translation(origin.x + c.x, origin.y + c.y, 0.0)
        * Mat4::from_quat(rotation)
        * Mat4::scaling(scale.x, scale.y, 1.0)
        * Mat4::translation(-c.x, -c.y, 0.0)
}
