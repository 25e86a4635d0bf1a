//! The public drawing surface.
//!
//! A [`Renderer`] owns the batch, the texture registry and the system font,
//! and drives one [`GpuBackend`]. Sprite and text entry points live next to
//! their subsystems (`sprite`, `text`) as further `impl Renderer` blocks.

use std::ops::{Deref, DerefMut};
use std::path::Path;

use anyhow::{Context, Result};

use crate::device::{BlendMode, GpuBackend, ScreenTarget, Topology};
use crate::paint::Color;
use crate::text::{SystemFont, SystemText};
use crate::texture::{TextureError, TextureRef, TextureRegistry};

use super::outline::OutlineTests;
use super::{Screen, Side, Vertex, VertexBatch, DEFAULT_MAX_VERTICES, STRIP_QUAD_VERTICES};

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Vertex ceiling of the shared batch.
    pub max_vertices: usize,
    pub top_clear: Color,
    pub bottom_clear: Color,
    pub stereo: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            top_clear: Color::abgr(0xFF, 0, 0, 0),
            bottom_clear: Color::abgr(0xFF, 0, 0, 0),
            stereo: false,
        }
    }
}

pub struct Renderer<B: GpuBackend> {
    pub(crate) backend: B,
    pub(crate) batch: VertexBatch,
    pub(crate) textures: TextureRegistry,
    pub(crate) text: SystemText,
    in_frame: bool,
}

impl<B: GpuBackend> Renderer<B> {
    /// Sets up screen clear colors and builds the glyph atlas from `font`.
    ///
    /// Failing to allocate the atlas is fatal.
    pub fn new(mut backend: B, font: Box<dyn SystemFont>, config: RendererConfig) -> Result<Self> {
        anyhow::ensure!(
            config.max_vertices > STRIP_QUAD_VERTICES,
            "vertex batch of {} vertices cannot hold a single quad",
            config.max_vertices
        );

        let mut batch = VertexBatch::new(config.max_vertices);
        let mut textures = TextureRegistry::new();

        backend.set_clear_color(ScreenTarget::TopLeft.id(), config.top_clear);
        backend.set_clear_color(ScreenTarget::TopRight.id(), config.top_clear);
        backend.set_clear_color(ScreenTarget::Bottom.id(), config.bottom_clear);
        backend.set_stereo(config.stereo);

        let text = SystemText::load(&mut backend, &mut batch, &mut textures, font)
            .context("failed to build the system font glyph atlas")?;

        log::info!("renderer ready: {} vertex batch", config.max_vertices);
        Ok(Self { backend, batch, textures, text, in_frame: false })
    }

    /// Frees every texture (including the atlas) and hands the backend back.
    pub fn shutdown(self) -> B {
        let Self { mut backend, mut textures, text, .. } = self;
        drop(text);
        textures.destroy_all(&mut backend);
        log::info!("renderer shut down");
        backend
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn batch(&self) -> &VertexBatch {
        &self.batch
    }

    #[inline]
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    #[inline]
    pub fn text(&self) -> &SystemText {
        &self.text
    }

    // ── screens ───────────────────────────────────────────────────────────

    /// Clear color of `screen`; for the top screen both eyes.
    pub fn set_screen_color(&mut self, screen: Screen, color: Color) {
        match screen {
            Screen::Top => {
                self.backend.set_clear_color(ScreenTarget::TopLeft.id(), color);
                self.backend.set_clear_color(ScreenTarget::TopRight.id(), color);
            }
            Screen::Bottom => self.backend.set_clear_color(ScreenTarget::Bottom.id(), color),
        }
    }

    pub fn set_stereo(&mut self, enabled: bool) {
        self.backend.set_stereo(enabled);
    }

    // ── frames ────────────────────────────────────────────────────────────

    /// Opens a frame and selects `screen` as the first target.
    pub fn frame_begin(&mut self, screen: Screen, side: Side) {
        if self.in_frame {
            log::warn!("frame_begin while a frame is open; closing it first");
            self.frame_end();
        }
        self.batch.reset();
        self.backend.frame_begin();
        self.in_frame = true;
        self.frame_draw_on(screen, side);
    }

    /// Flushes and switches the target within the current frame.
    pub fn frame_draw_on(&mut self, screen: Screen, side: Side) {
        self.batch.flush(&mut self.backend);
        self.backend.frame_draw_on(screen.target(side).id());
        self.backend.set_projection(&screen.projection());
    }

    /// Flushes what is queued and closes the frame. No-op outside a frame.
    pub fn frame_end(&mut self) {
        if !self.in_frame {
            return;
        }
        self.batch.flush(&mut self.backend);
        self.backend.frame_end();
        self.in_frame = false;
    }

    /// Opens a frame that is closed when the guard drops.
    pub fn frame(&mut self, screen: Screen, side: Side) -> Frame<'_, B> {
        self.frame_begin(screen, side);
        Frame { renderer: self }
    }

    #[inline]
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    // ── shapes ────────────────────────────────────────────────────────────

    pub fn draw_rectangle(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        if !self.batch.ensure_space(STRIP_QUAD_VERTICES) {
            return;
        }
        self.batch.set_blend_mode(&mut self.backend, BlendMode::FlatColor, color);
        self.batch.set_topology(&mut self.backend, Topology::TriangleStrip);

        let (r, b) = (x + width, y + height);
        self.batch.append_strip_quad([
            Vertex::new(x, b, 0.0, 0.0),
            Vertex::new(r, b, 0.0, 0.0),
            Vertex::new(x, y, 0.0, 0.0),
            Vertex::new(r, y, 0.0, 0.0),
        ]);
    }

    // ── textures ──────────────────────────────────────────────────────────

    pub fn try_texture_from_png(&mut self, path: impl AsRef<Path>) -> Result<TextureRef, TextureError> {
        self.textures.load_file(&mut self.backend, path.as_ref())
    }

    pub fn try_texture_from_memory(&mut self, bytes: &[u8]) -> Result<TextureRef, TextureError> {
        self.textures.load_encoded(&mut self.backend, bytes)
    }

    pub fn try_texture_from_image(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureRef, TextureError> {
        self.textures.load(&mut self.backend, width, height, rgba)
    }

    /// Loads an image file. Returns an invalid texture on failure.
    pub fn texture_from_png(&mut self, path: impl AsRef<Path>) -> TextureRef {
        let path = path.as_ref();
        or_invalid(self.try_texture_from_png(path), || path.display().to_string())
    }

    /// Decodes an in-memory image. Returns an invalid texture on failure.
    pub fn texture_from_memory(&mut self, bytes: &[u8]) -> TextureRef {
        or_invalid(self.try_texture_from_memory(bytes), || format!("{} byte buffer", bytes.len()))
    }

    /// Uploads raw RGBA8 pixels. Returns an invalid texture on failure.
    pub fn texture_from_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> TextureRef {
        or_invalid(self.try_texture_from_image(width, height, rgba), || {
            format!("{width}x{height} image")
        })
    }

    /// Frees `texture` if nothing references it; see
    /// [`TextureRegistry::destroy`].
    pub fn destroy_texture(&mut self, texture: &TextureRef) -> bool {
        let gpu = texture.gpu();
        let bound = gpu.is_some() && gpu == self.batch.state().texture;
        if bound && texture.ref_count() == 0 {
            // queued vertices still sample it
            self.batch.flush(&mut self.backend);
        }

        let freed = self.textures.destroy(&mut self.backend, texture);
        if let (true, Some(gpu)) = (freed, gpu) {
            self.batch.forget_texture(gpu);
        }
        freed
    }

    // ── outline ───────────────────────────────────────────────────────────

    /// Starts the silhouette pass: everything drawn until
    /// [`outline_apply`](Self::outline_apply) stamps the stencil buffer.
    pub fn outline_begin(&mut self) {
        self.batch.flush(&mut self.backend);
        let tests = self.batch.state_mut().outline.begin();
        self.apply_outline_tests(tests);
    }

    /// Starts the fringe pass. `thickness` is a percentage added to each
    /// sprite's scale.
    pub fn outline_apply(&mut self, color: Color, thickness: f32) {
        self.batch.flush(&mut self.backend);
        let tests = self.batch.state_mut().outline.apply(color, thickness);
        self.apply_outline_tests(tests);
    }

    pub fn outline_end(&mut self) {
        self.batch.flush(&mut self.backend);
        let tests = self.batch.state_mut().outline.end();
        self.apply_outline_tests(tests);
    }

    fn apply_outline_tests(&mut self, tests: OutlineTests) {
        self.batch.set_alpha_test(&mut self.backend, tests.alpha);
        self.batch.set_stencil_test(&mut self.backend, tests.stencil);
    }
}

fn or_invalid(result: Result<TextureRef, TextureError>, what: impl FnOnce() -> String) -> TextureRef {
    match result {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("texture creation failed for {}: {e}", what());
            TextureRef::invalid()
        }
    }
}

// ── frame guard ───────────────────────────────────────────────────────────

/// An open frame. Dropping it flushes and ends the frame, so geometry is never
/// lost on an early return.
pub struct Frame<'r, B: GpuBackend> {
    renderer: &'r mut Renderer<B>,
}

impl<B: GpuBackend> Deref for Frame<'_, B> {
    type Target = Renderer<B>;

    fn deref(&self) -> &Renderer<B> {
        self.renderer
    }
}

impl<B: GpuBackend> DerefMut for Frame<'_, B> {
    fn deref_mut(&mut self) -> &mut Renderer<B> {
        self.renderer
    }
}

impl<B: GpuBackend> Drop for Frame<'_, B> {
    fn drop(&mut self) {
        self.renderer.frame_end();
    }
}
