//! [`GpuBackend`] on top of wgpu.
//!
//! Between `frame_begin` and `frame_end` nothing touches the GPU: draws are
//! recorded per target pass, with their vertices copied into a frame-local
//! stream and their state frozen into a uniform block. `frame_end` uploads
//! both streams once, replays the passes in order and, if a screen was drawn
//! on, composites the screens into the window surface.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use crate::coords::Mat4;
use crate::device::backend::FIRST_TEXTURE_TARGET;
use crate::device::{
    AlphaTest, BackendError, BlendMode, Gpu, GpuBackend, GpuTexture, ScreenTarget, StencilTest,
    SurfaceErrorAction, TargetId, TextureDesc, TextureWrap, Topology,
};
use crate::paint::Color;
use crate::render::Vertex;

use super::composite::{bottom_screen_point, screen_viewports, Compositor};
use super::pipeline::{DrawPipelines, DrawUniform, PipelineKey, StencilKey, TARGET_FORMAT, UNIFORM_STRIDE};
use super::target::{clear_color, create_sampler, RenderTarget, TargetColor, TextureSlot};

// ── recording ─────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone)]
struct DrawState {
    projection: Mat4,
    texture: Option<GpuTexture>,
    mode: BlendMode,
    color: Color,
    stencil: StencilTest,
    alpha: AlphaTest,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            texture: None,
            mode: BlendMode::TextureReplace,
            color: Color::WHITE,
            stencil: StencilTest::DISABLED,
            alpha: AlphaTest::DISABLED,
        }
    }
}

struct RecordedDraw {
    pipeline: PipelineKey,
    texture: Option<GpuTexture>,
    uniform: u32,
    stencil_reference: u8,
    vertices: Range<u32>,
}

struct RecordedPass {
    target: TargetId,
    /// Set on the first pass of the frame on this target.
    clear: Option<Color>,
    draws: Vec<RecordedDraw>,
}

#[derive(Default)]
struct FrameRecording {
    passes: Vec<RecordedPass>,
    vertices: Vec<Vertex>,
    uniforms: Vec<DrawUniform>,
    touched: HashSet<TargetId>,
}

// ── streaming buffers ─────────────────────────────────────────────────────

/// A buffer rewritten every frame that only ever grows.
struct StreamBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl StreamBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, capacity: u64) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let buffer = Self::allocate(device, label, usage, capacity);
        Self { label, usage, buffer, capacity }
    }

    fn allocate(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Returns true when the buffer was replaced.
    fn reserve(&mut self, device: &wgpu::Device, size: u64) -> bool {
        if size <= self.capacity {
            return false;
        }
        let capacity = size.next_power_of_two();
        log::debug!("{}: growing to {capacity} bytes", self.label);
        self.buffer = Self::allocate(device, self.label, self.usage, capacity);
        self.capacity = capacity;
        true
    }
}

// ── backend ───────────────────────────────────────────────────────────────

/// wgpu-backed GPU capability bound to one window surface.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    pipelines: DrawPipelines,
    compositor: Compositor,
    samplers: [wgpu::Sampler; 2],
    /// Sampled when a draw has no texture bound.
    white: TextureSlot,

    textures: HashMap<GpuTexture, TextureSlot>,
    targets: HashMap<TargetId, RenderTarget>,
    next_texture: u32,
    next_target: u32,
    stereo: bool,

    vertex_stream: StreamBuffer,
    uniform_stream: StreamBuffer,
    uniform_bind_group: wgpu::BindGroup,

    state: DrawState,
    frame: Option<FrameRecording>,
    doomed_textures: Vec<GpuTexture>,
    doomed_targets: Vec<TargetId>,
    surface_status: Option<SurfaceErrorAction>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Result<Self> {
        let device = gpu.device();

        let pipelines = DrawPipelines::new(device);
        let compositor = Compositor::new(device, gpu.surface_format());
        let samplers = [
            create_sampler(device, TextureWrap::ClampToEdge, wgpu::FilterMode::Linear),
            create_sampler(device, TextureWrap::Repeat, wgpu::FilterMode::Linear),
        ];

        let white = TextureSlot::new(
            device,
            pipelines.texture_layout(),
            &samplers[0],
            1,
            1,
            false,
            "tessera white texture",
        );
        white.upload(gpu.queue(), &[u32::MAX], 1, 1);

        let mut targets = HashMap::new();
        for screen in ScreenTarget::ALL {
            let (w, h) = screen.size();
            let slot = TextureSlot::new(
                device,
                compositor.texture_layout(),
                compositor.sampler(),
                w,
                h,
                true,
                "tessera screen",
            );
            let mut target = RenderTarget::new(device, TargetColor::Screen(slot), w, h);
            target.clear = Color::BLACK;
            targets.insert(screen.id(), target);
        }

        let vertex_stream = StreamBuffer::new(
            device,
            "tessera vertex stream",
            wgpu::BufferUsages::VERTEX,
            (0x4000 * std::mem::size_of::<Vertex>()) as u64,
        );
        let uniform_stream =
            StreamBuffer::new(device, "tessera uniform stream", wgpu::BufferUsages::UNIFORM, 64 * UNIFORM_STRIDE);
        let uniform_bind_group = create_uniform_bind_group(device, &pipelines, &uniform_stream.buffer);

        log::info!("wgpu backend ready: surface format {:?}", gpu.surface_format());

        Ok(Self {
            gpu,
            pipelines,
            compositor,
            samplers,
            white,
            textures: HashMap::new(),
            targets,
            next_texture: 1,
            next_target: FIRST_TEXTURE_TARGET,
            stereo: false,
            vertex_stream,
            uniform_stream,
            uniform_bind_group,
            state: DrawState::default(),
            frame: None,
            doomed_textures: Vec::new(),
            doomed_targets: Vec::new(),
            surface_status: None,
        })
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    #[inline]
    pub fn stereo(&self) -> bool {
        self.stereo
    }

    /// Maps a surface position (physical pixels) to bottom-screen pixels.
    pub fn bottom_screen_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let size = self.gpu.size();
        bottom_screen_point(size.width, size.height, self.stereo, x, y)
    }

    /// Outcome of the last surface acquisition that failed, if any.
    pub fn take_surface_status(&mut self) -> Option<SurfaceErrorAction> {
        self.surface_status.take()
    }

    fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    // ── replay ────────────────────────────────────────────────────────────

    fn upload_streams(&mut self, rec: &FrameRecording) {
        let device = self.gpu.device();

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&rec.vertices);
        self.vertex_stream.reserve(device, vertex_bytes.len() as u64);
        if !vertex_bytes.is_empty() {
            self.gpu.queue().write_buffer(&self.vertex_stream.buffer, 0, vertex_bytes);
        }

        let uniform_size = rec.uniforms.len() as u64 * UNIFORM_STRIDE;
        if self.uniform_stream.reserve(device, uniform_size) {
            self.uniform_bind_group = create_uniform_bind_group(device, &self.pipelines, &self.uniform_stream.buffer);
        }
        if !rec.uniforms.is_empty() {
            let mut staging = vec![0u8; uniform_size as usize];
            for (i, u) in rec.uniforms.iter().enumerate() {
                let at = i * UNIFORM_STRIDE as usize;
                let bytes = bytemuck::bytes_of(u);
                staging[at..at + bytes.len()].copy_from_slice(bytes);
            }
            self.gpu.queue().write_buffer(&self.uniform_stream.buffer, 0, &staging);
        }
    }

    fn encode_passes(&self, encoder: &mut wgpu::CommandEncoder, rec: &FrameRecording) {
        for pass in &rec.passes {
            let Some(target) = self.targets.get(&pass.target) else {
                log::warn!("skipping pass on deleted target {:?}", pass.target);
                continue;
            };
            let color_view = match &target.color {
                TargetColor::Screen(slot) => &slot.view,
                TargetColor::Texture(tex) => match self.textures.get(tex) {
                    Some(slot) => &slot.view,
                    None => continue,
                },
            };

            let (color_load, stencil_load) = match pass.clear {
                Some(c) => (wgpu::LoadOp::Clear(clear_color(c)), wgpu::LoadOp::Clear(0)),
                None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessera target pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: color_load, store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_stencil,
                    depth_ops: Some(wgpu::Operations {
                        load: if pass.clear.is_some() { wgpu::LoadOp::Clear(1.0) } else { wgpu::LoadOp::Load },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations { load: stencil_load, store: wgpu::StoreOp::Store }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_vertex_buffer(0, self.vertex_stream.buffer.slice(..));
            for draw in &pass.draws {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else { continue };
                let texture = match draw.texture {
                    Some(tex) => match self.textures.get(&tex) {
                        Some(slot) => slot,
                        None => continue,
                    },
                    None => &self.white,
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform * UNIFORM_STRIDE as u32]);
                rpass.set_bind_group(1, &texture.bind_group, &[]);
                rpass.set_stencil_reference(draw.stencil_reference as u32);
                rpass.draw(draw.vertices.clone(), 0..1);
            }
        }
    }

    fn present(&mut self, rec: FrameRecording) {
        self.upload_streams(&rec);

        let device = self.gpu.device();
        for key in rec.passes.iter().flat_map(|p| p.draws.iter().map(|d| d.pipeline)) {
            self.pipelines.prepare(device, key);
        }

        let drew_screen = rec.touched.iter().any(|t| ScreenTarget::from_id(*t).is_some());
        let surface_frame = if drew_screen {
            match self.gpu.acquire() {
                Ok(frame) => Some(frame),
                Err(err) => {
                    let reason = err.to_string();
                    let action = self.gpu.recover(err);
                    log::warn!("surface unavailable ({reason}): {action:?}");
                    self.surface_status = Some(action);
                    None
                }
            }
        } else {
            None
        };

        match surface_frame {
            Some(mut frame) => {
                self.encode_passes(&mut frame.encoder, &rec);
                let size = self.gpu.size();
                let screens = screen_viewports(size.width, size.height, self.stereo)
                    .into_iter()
                    .filter_map(|(screen, vp)| match &self.targets.get(&screen.id())?.color {
                        TargetColor::Screen(slot) => Some((&slot.bind_group, vp)),
                        TargetColor::Texture(_) => None,
                    });
                self.compositor.draw(&mut frame.encoder, &frame.view, screens);
                self.gpu.present(frame);
            }
            None => {
                let mut encoder = self.gpu.encoder("tessera offscreen encoder");
                self.encode_passes(&mut encoder, &rec);
                self.gpu.queue().submit(std::iter::once(encoder.finish()));
            }
        }
    }

    fn drop_doomed(&mut self) {
        for target in std::mem::take(&mut self.doomed_targets) {
            self.targets.remove(&target);
        }
        for texture in std::mem::take(&mut self.doomed_textures) {
            self.remove_texture(texture);
        }
    }

    fn remove_texture(&mut self, texture: GpuTexture) {
        if let Some(slot) = self.textures.remove(&texture) {
            slot.texture.destroy();
        }
        self.targets
            .retain(|_, t| !matches!(t.color, TargetColor::Texture(tex) if tex == texture));
        if self.state.texture == Some(texture) {
            self.state.texture = None;
        }
    }
}

fn create_uniform_bind_group(device: &wgpu::Device, pipelines: &DrawPipelines, buffer: &wgpu::Buffer) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("tessera uniform bind group"),
        layout: pipelines.uniform_layout(),
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniform>() as u64),
            }),
        }],
    })
}

impl GpuBackend for WgpuBackend<'_> {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuTexture, BackendError> {
        let (width, height) = (desc.width, desc.height);
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(BackendError::TextureAllocation { width, height });
        }

        let sampler = match desc.wrap {
            TextureWrap::ClampToEdge => &self.samplers[0],
            TextureWrap::Repeat => &self.samplers[1],
        };
        let slot = TextureSlot::new(
            self.gpu.device(),
            self.pipelines.texture_layout(),
            sampler,
            width,
            height,
            desc.render_target,
            "tessera texture",
        );

        let texture = GpuTexture(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(texture, slot);
        Ok(texture)
    }

    fn upload_texture(&mut self, texture: GpuTexture, texels: &[u32], width: u32, height: u32) {
        match self.textures.get(&texture) {
            Some(slot) => slot.upload(self.gpu.queue(), texels, width, height),
            None => log::warn!("upload to unknown texture {}", texture.0),
        }
    }

    fn delete_texture(&mut self, texture: GpuTexture) {
        if self.in_frame() {
            self.doomed_textures.push(texture);
        } else {
            self.remove_texture(texture);
        }
    }

    fn create_texture_target(&mut self, texture: GpuTexture) -> Result<TargetId, BackendError> {
        let Some(slot) = self.textures.get(&texture) else {
            return Err(BackendError::UnknownTexture(texture.0));
        };
        if !slot.render_target {
            return Err(BackendError::TargetAllocation(texture.0));
        }

        let target = RenderTarget::new(self.gpu.device(), TargetColor::Texture(texture), slot.width, slot.height);
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(id, target);
        Ok(id)
    }

    fn delete_target(&mut self, target: TargetId) {
        if ScreenTarget::from_id(target).is_some() {
            log::warn!("screen targets cannot be deleted");
            return;
        }
        if self.in_frame() {
            self.doomed_targets.push(target);
        } else {
            self.targets.remove(&target);
        }
    }

    fn set_clear_color(&mut self, target: TargetId, color: Color) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.clear = color;
        }
    }

    fn set_stereo(&mut self, enabled: bool) {
        self.stereo = enabled;
    }

    fn frame_begin(&mut self) {
        if self.frame.is_some() {
            log::warn!("frame_begin inside an open frame; previous recording discarded");
        }
        self.frame = Some(FrameRecording::default());
    }

    fn frame_draw_on(&mut self, target: TargetId) {
        let Some(rec) = self.frame.as_mut() else {
            log::warn!("frame_draw_on outside a frame");
            return;
        };
        let Some(t) = self.targets.get(&target) else {
            log::warn!("frame_draw_on unknown target {}", target.0);
            return;
        };

        let clear = rec.touched.insert(target).then_some(t.clear);
        rec.passes.push(RecordedPass { target, clear, draws: Vec::new() });
    }

    fn frame_end(&mut self) {
        let Some(rec) = self.frame.take() else { return };
        self.present(rec);
        self.drop_doomed();
    }

    fn set_projection(&mut self, projection: &Mat4) {
        self.state.projection = *projection;
    }

    fn bind_texture(&mut self, texture: GpuTexture) {
        self.state.texture = Some(texture);
    }

    fn set_combiner(&mut self, mode: BlendMode, color: Color) {
        if mode == BlendMode::Off {
            return;
        }
        self.state.mode = mode;
        self.state.color = color;
    }

    fn set_stencil_test(&mut self, test: StencilTest) {
        self.state.stencil = test;
    }

    fn set_alpha_test(&mut self, test: AlphaTest) {
        self.state.alpha = test;
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, vertices: &[Vertex]) {
        let Some(rec) = self.frame.as_mut() else {
            log::warn!("draw outside a frame dropped");
            return;
        };
        let Some(pass) = rec.passes.last_mut() else {
            log::warn!("draw without a target dropped");
            return;
        };
        if vertices.is_empty() {
            return;
        }

        let s = self.state;
        let start = rec.vertices.len() as u32;
        rec.vertices.extend_from_slice(vertices);
        let uniform = rec.uniforms.len() as u32;
        rec.uniforms.push(DrawUniform::new(&s.projection, s.mode, s.color, s.alpha));

        log::trace!("wgpu draw: {topology:?} first={first} count={}", vertices.len());
        pass.draws.push(RecordedDraw {
            pipeline: PipelineKey { format: TARGET_FORMAT, topology, stencil: StencilKey::from(s.stencil) },
            // flat draws still sample, so they read the white texel
            texture: if s.mode == BlendMode::FlatColor { None } else { s.texture },
            uniform,
            stencil_reference: s.stencil.reference,
            vertices: start..start + vertices.len() as u32,
        });
    }
}
