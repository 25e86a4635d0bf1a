//! A GPU-less backend that records every call.
//!
//! Used by the test suites to assert on binds, combiner changes and draw
//! ranges, and usable for off-screen tooling that only needs layout results.

use std::collections::HashMap;

use crate::coords::Mat4;
use crate::paint::Color;
use crate::render::Vertex;

use super::backend::FIRST_TEXTURE_TARGET;
use super::{
    AlphaTest, BackendError, BlendMode, GpuBackend, GpuTexture, StencilTest, TargetId,
    TextureDesc, Topology,
};

/// One submitted draw with the state it was recorded under.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub target: Option<TargetId>,
    pub topology: Topology,
    pub first: u32,
    pub texture: Option<GpuTexture>,
    pub mode: BlendMode,
    pub color: Color,
    pub stencil: StencilTest,
    pub alpha: AlphaTest,
    pub vertices: Vec<Vertex>,
}

impl DrawRecord {
    pub fn count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateTexture { texture: GpuTexture, width: u32, height: u32 },
    UploadTexture { texture: GpuTexture, width: u32, height: u32 },
    DeleteTexture(GpuTexture),
    CreateTarget { target: TargetId, texture: GpuTexture },
    DeleteTarget(TargetId),
    SetClearColor { target: TargetId, color: Color },
    SetStereo(bool),
    FrameBegin,
    FrameDrawOn(TargetId),
    FrameEnd,
    SetProjection(Mat4),
    BindTexture(GpuTexture),
    SetCombiner { mode: BlendMode, color: Color },
    SetStencilTest(StencilTest),
    SetAlphaTest(AlphaTest),
    Draw(DrawRecord),
}

/// Texture storage kept by [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessTexture {
    pub width: u32,
    pub height: u32,
    pub render_target: bool,
    pub texels: Vec<u32>,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    calls: Vec<BackendCall>,
    textures: HashMap<GpuTexture, HeadlessTexture>,
    targets: HashMap<TargetId, GpuTexture>,
    next_texture: u32,
    next_target: u32,
    max_texture_size: u32,

    target: Option<TargetId>,
    texture: Option<GpuTexture>,
    mode: BlendMode,
    color: Color,
    stencil: StencilTest,
    alpha: AlphaTest,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            textures: HashMap::new(),
            targets: HashMap::new(),
            next_texture: 1,
            next_target: FIRST_TEXTURE_TARGET,
            max_texture_size: 1024,
            target: None,
            texture: None,
            mode: BlendMode::TextureReplace,
            color: Color::WHITE,
            stencil: StencilTest::DISABLED,
            alpha: AlphaTest::DISABLED,
        }
    }

    /// Textures larger than `size` on either axis fail to allocate.
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Drains the call log, keeping textures and state.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.calls.iter().filter_map(|c| match c {
            BackendCall::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn texture_binds(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::BindTexture(_)))
            .count()
    }

    pub fn texture(&self, texture: GpuTexture) -> Option<&HeadlessTexture> {
        self.textures.get(&texture)
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuTexture, BackendError> {
        let (width, height) = (desc.width, desc.height);
        if width == 0 || height == 0 || width > self.max_texture_size || height > self.max_texture_size {
            return Err(BackendError::TextureAllocation { width, height });
        }

        let texture = GpuTexture(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(
            texture,
            HeadlessTexture {
                width,
                height,
                render_target: desc.render_target,
                texels: vec![0; (width * height) as usize],
            },
        );
        self.calls.push(BackendCall::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn upload_texture(&mut self, texture: GpuTexture, texels: &[u32], width: u32, height: u32) {
        if let Some(slot) = self.textures.get_mut(&texture) {
            let n = slot.texels.len().min(texels.len());
            slot.texels[..n].copy_from_slice(&texels[..n]);
        }
        self.calls.push(BackendCall::UploadTexture { texture, width, height });
    }

    fn delete_texture(&mut self, texture: GpuTexture) {
        self.textures.remove(&texture);
        self.targets.retain(|_, t| *t != texture);
        self.calls.push(BackendCall::DeleteTexture(texture));
    }

    fn create_texture_target(&mut self, texture: GpuTexture) -> Result<TargetId, BackendError> {
        let Some(slot) = self.textures.get(&texture) else {
            return Err(BackendError::UnknownTexture(texture.0));
        };
        if !slot.render_target {
            return Err(BackendError::TargetAllocation(texture.0));
        }

        let target = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(target, texture);
        self.calls.push(BackendCall::CreateTarget { target, texture });
        Ok(target)
    }

    fn delete_target(&mut self, target: TargetId) {
        self.targets.remove(&target);
        self.calls.push(BackendCall::DeleteTarget(target));
    }

    fn set_clear_color(&mut self, target: TargetId, color: Color) {
        self.calls.push(BackendCall::SetClearColor { target, color });
    }

    fn set_stereo(&mut self, enabled: bool) {
        self.calls.push(BackendCall::SetStereo(enabled));
    }

    fn frame_begin(&mut self) {
        self.calls.push(BackendCall::FrameBegin);
    }

    fn frame_draw_on(&mut self, target: TargetId) {
        self.target = Some(target);
        self.calls.push(BackendCall::FrameDrawOn(target));
    }

    fn frame_end(&mut self) {
        self.target = None;
        self.calls.push(BackendCall::FrameEnd);
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.calls.push(BackendCall::SetProjection(*projection));
    }

    fn bind_texture(&mut self, texture: GpuTexture) {
        self.texture = Some(texture);
        self.calls.push(BackendCall::BindTexture(texture));
    }

    fn set_combiner(&mut self, mode: BlendMode, color: Color) {
        self.mode = mode;
        self.color = color;
        self.calls.push(BackendCall::SetCombiner { mode, color });
    }

    fn set_stencil_test(&mut self, test: StencilTest) {
        self.stencil = test;
        self.calls.push(BackendCall::SetStencilTest(test));
    }

    fn set_alpha_test(&mut self, test: AlphaTest) {
        self.alpha = test;
        self.calls.push(BackendCall::SetAlphaTest(test));
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, vertices: &[Vertex]) {
        log::trace!("headless draw: {topology:?} first={first} count={}", vertices.len());
        self.calls.push(BackendCall::Draw(DrawRecord {
            target: self.target,
            topology,
            first,
            texture: self.texture,
            mode: self.mode,
            color: self.color,
            stencil: self.stencil,
            alpha: self.alpha,
            vertices: vertices.to_vec(),
        }));
    }
}
