//! Geometry types shared by the batcher, sprites and text layout.
//!
//! Canonical CPU space:
//! - Screen pixels of the selected render target
//! - Origin top-left
//! - +X right, +Y down
//!
//! Targets carry their own orthographic projection; vertices are submitted in
//! this space and converted to clip space on the GPU.

mod mat4;
mod quat;
mod rect;
mod vec2;

pub use mat4::Mat4;
pub use quat::Quat;
pub use rect::{Rect, TexCoords};
pub use vec2::Vec2;
