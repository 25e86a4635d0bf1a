use crate::device::{AlphaTest, BlendMode, GpuTexture, StencilTest, Topology};
use crate::paint::Color;

use super::outline::OutlineState;

/// Everything a queued vertex range is drawn under.
///
/// Owned by [`VertexBatch`](super::VertexBatch); it changes only through the
/// batch's flush-then-mutate setters, so two vertices of one flushed range
/// always share the same state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    /// Texture last bound on the backend.
    pub texture: Option<GpuTexture>,
    pub mode: BlendMode,
    /// Constant color of `mode`; meaningful only for color modes.
    pub color: Color,
    pub topology: Topology,
    pub stencil: StencilTest,
    pub alpha: AlphaTest,
    pub outline: OutlineState,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            texture: None,
            mode: BlendMode::Off,
            color: Color::TRANSPARENT,
            topology: Topology::TriangleList,
            stencil: StencilTest::DISABLED,
            alpha: AlphaTest::DISABLED,
            outline: OutlineState::default(),
        }
    }
}
