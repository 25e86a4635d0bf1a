//! The GPU capability the batcher drives.
//!
//! Everything above this trait is backend-agnostic: the batcher decides *when*
//! state changes and draws happen, a backend decides *how* they reach a GPU.

use crate::coords::Mat4;
use crate::paint::Color;
use crate::render::Vertex;

use super::BackendError;

// ── handles ───────────────────────────────────────────────────────────────

/// Backend-side texture handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct GpuTexture(pub u32);

/// Backend-side render target handle.
///
/// Ids `0..3` are the screen targets every backend pre-creates (see
/// [`ScreenTarget`]); texture targets are allocated above them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// The three fixed screen surfaces.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScreenTarget {
    TopLeft,
    TopRight,
    Bottom,
}

impl ScreenTarget {
    pub const ALL: [ScreenTarget; 3] = [Self::TopLeft, Self::TopRight, Self::Bottom];

    pub const TOP_WIDTH: u32 = 400;
    pub const BOTTOM_WIDTH: u32 = 320;
    pub const HEIGHT: u32 = 240;

    #[inline]
    pub const fn id(self) -> TargetId {
        match self {
            Self::TopLeft => TargetId(0),
            Self::TopRight => TargetId(1),
            Self::Bottom => TargetId(2),
        }
    }

    /// Size in pixels as `(width, height)`.
    #[inline]
    pub const fn size(self) -> (u32, u32) {
        match self {
            Self::TopLeft | Self::TopRight => (Self::TOP_WIDTH, Self::HEIGHT),
            Self::Bottom => (Self::BOTTOM_WIDTH, Self::HEIGHT),
        }
    }

    pub fn from_id(id: TargetId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

/// First id handed out for texture render targets.
pub const FIRST_TEXTURE_TARGET: u32 = 3;

// ── state values ──────────────────────────────────────────────────────────

/// Primitive assembly mode for a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

/// Fragment combiner configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Leaves the backend combiner untouched.
    Off,
    /// Output is the texture sample.
    TextureReplace,
    /// RGB from the constant color, alpha from the texture sample.
    TintTexture,
    /// Output is the constant color.
    FlatColor,
}

impl BlendMode {
    /// Whether the constant color participates in the output.
    #[inline]
    pub const fn uses_color(self) -> bool {
        matches!(self, Self::TintTexture | Self::FlatColor)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompareFunc {
    Never,
    Always,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl CompareFunc {
    pub fn test<T: PartialOrd>(self, value: T, reference: T) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Equal => value == reference,
            Self::NotEqual => value != reference,
            Self::Less => value < reference,
            Self::LessEqual => value <= reference,
            Self::Greater => value > reference,
            Self::GreaterEqual => value >= reference,
        }
    }
}

/// Stencil configuration. Passing fragments replace the stored value with
/// `reference` (masked by `write_mask`); failing fragments keep it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StencilTest {
    pub enabled: bool,
    pub compare: CompareFunc,
    pub reference: u8,
    pub read_mask: u8,
    pub write_mask: u8,
}

impl StencilTest {
    pub const DISABLED: StencilTest = StencilTest {
        enabled: false,
        compare: CompareFunc::Always,
        reference: 1,
        read_mask: 0xFF,
        write_mask: 0xFF,
    };

    /// Every fragment passes and writes `reference`.
    pub const fn stamp(reference: u8) -> Self {
        StencilTest {
            enabled: true,
            compare: CompareFunc::Always,
            reference,
            read_mask: 0xFF,
            write_mask: 0xFF,
        }
    }

    /// Only fragments outside a `reference` stamp pass; nothing is written.
    pub const fn outside(reference: u8) -> Self {
        StencilTest {
            enabled: true,
            compare: CompareFunc::NotEqual,
            reference,
            read_mask: 0xFF,
            write_mask: 0x00,
        }
    }
}

impl Default for StencilTest {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Alpha test against an 8-bit reference.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AlphaTest {
    pub enabled: bool,
    pub compare: CompareFunc,
    pub reference: u8,
}

impl AlphaTest {
    pub const DISABLED: AlphaTest = AlphaTest {
        enabled: false,
        compare: CompareFunc::Greater,
        reference: 0,
    };

    pub const fn greater_than(reference: u8) -> Self {
        AlphaTest {
            enabled: true,
            compare: CompareFunc::Greater,
            reference,
        }
    }
}

impl Default for AlphaTest {
    fn default() -> Self {
        Self::DISABLED
    }
}

// ── textures ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub wrap: TextureWrap,
    /// The texture can later be passed to [`GpuBackend::create_texture_target`].
    pub render_target: bool,
}

impl TextureDesc {
    pub fn sampled(width: u32, height: u32) -> Self {
        Self { width, height, wrap: TextureWrap::ClampToEdge, render_target: false }
    }

    pub fn render_target(width: u32, height: u32) -> Self {
        Self { width, height, wrap: TextureWrap::ClampToEdge, render_target: true }
    }
}

// ── capability ────────────────────────────────────────────────────────────

/// Opaque GPU capability.
///
/// Texel words passed to [`upload_texture`](Self::upload_texture) are in the
/// native ABGR order (`u32::to_le_bytes` yields `[a, b, g, r]`), row-major,
/// `width * height` long.
///
/// Pipeline state (`set_*`, `bind_texture`) persists across frames. A draw
/// uses whatever state was set last.
pub trait GpuBackend {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuTexture, BackendError>;

    fn upload_texture(&mut self, texture: GpuTexture, texels: &[u32], width: u32, height: u32);

    /// Frees the texture. Draws already recorded in the current frame still
    /// sample it.
    fn delete_texture(&mut self, texture: GpuTexture);

    /// Makes a render-target texture drawable.
    fn create_texture_target(&mut self, texture: GpuTexture) -> Result<TargetId, BackendError>;

    fn delete_target(&mut self, target: TargetId);

    /// Color used when `target` is first drawn on in a frame.
    fn set_clear_color(&mut self, target: TargetId, color: Color);

    /// Shows the right-eye top screen next to the left one.
    fn set_stereo(&mut self, enabled: bool);

    fn frame_begin(&mut self);

    fn frame_draw_on(&mut self, target: TargetId);

    fn frame_end(&mut self);

    fn set_projection(&mut self, projection: &Mat4);

    fn bind_texture(&mut self, texture: GpuTexture);

    fn set_combiner(&mut self, mode: BlendMode, color: Color);

    fn set_stencil_test(&mut self, test: StencilTest);

    fn set_alpha_test(&mut self, test: AlphaTest);

    /// Draws `vertices`, which occupy `first..first + len` of the shared
    /// vertex buffer.
    fn draw_arrays(&mut self, topology: Topology, first: u32, vertices: &[Vertex]);
}
