//! Sprites: transformable quads with lazily rebuilt model matrices.

mod derived;
mod draw;
#[allow(clippy::module_inception)]
mod sprite;

pub use derived::Derived;
pub use draw::SPRITE_VERTICES;
pub use sprite::Sprite;
