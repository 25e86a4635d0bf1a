//! Shared vertex buffer and state-coalescing flush policy.
//!
//! Every draw path appends into one [`VertexBatch`]. Vertices accumulate under
//! the current [`RenderState`]; any setter that would change that state first
//! flushes the pending range `[flushed_up_to, write_head)` as a single draw.

use crate::device::{AlphaTest, BlendMode, GpuBackend, GpuTexture, StencilTest, Topology};
use crate::paint::Color;

use super::{RenderState, Vertex};

/// Vertex ceiling of the shared buffer.
pub const DEFAULT_MAX_VERTICES: usize = 0x4000;

/// Vertices reserved for one strip quad: four corners plus two degenerate
/// vertices bridging it to the previous quad of the same strip run.
pub const STRIP_QUAD_VERTICES: usize = 6;

#[derive(Debug)]
pub struct VertexBatch {
    /// `vertices.len()` is the write head.
    vertices: Vec<Vertex>,
    capacity: usize,
    flushed_up_to: usize,
    state: RenderState,
}

impl VertexBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
            flushed_up_to: 0,
            state: RenderState::default(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn write_head(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn flushed_up_to(&self) -> usize {
        self.flushed_up_to
    }

    /// Number of vertices queued but not yet submitted.
    #[inline]
    pub fn pending(&self) -> usize {
        self.write_head() - self.flushed_up_to
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub(crate) fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// Whether `n` more vertices fit.
    ///
    /// The comparison is strict: the last slot of the buffer is never used.
    #[inline]
    pub fn has_space(&self, n: usize) -> bool {
        self.write_head() + n < self.capacity
    }

    /// Precondition check for a shape needing `n` vertices.
    ///
    /// Returns `false` (and logs) when the shape must be dropped.
    pub fn ensure_space(&self, n: usize) -> bool {
        if self.has_space(n) {
            return true;
        }
        log::warn!(
            "vertex batch full ({}/{}), dropping a {n}-vertex shape",
            self.write_head(),
            self.capacity
        );
        false
    }

    /// Appends one vertex. Refused once the buffer is full.
    #[inline]
    pub fn append(&mut self, v: Vertex) -> bool {
        if !self.has_space(1) {
            return false;
        }
        self.vertices.push(v);
        true
    }

    /// Appends a whole shape or nothing.
    pub fn append_all(&mut self, vs: &[Vertex]) -> bool {
        if !self.has_space(vs.len()) {
            return false;
        }
        self.vertices.extend_from_slice(vs);
        true
    }

    /// Appends a strip quad in `[bottom-left, bottom-right, top-left,
    /// top-right]` order.
    ///
    /// When the pending range already holds strip geometry the quad is joined
    /// with two degenerate vertices, so many quads share one strip draw.
    pub fn append_strip_quad(&mut self, quad: [Vertex; 4]) -> bool {
        let bridge = self.state.topology == Topology::TriangleStrip && self.pending() > 0;
        let needed = if bridge { STRIP_QUAD_VERTICES } else { 4 };
        if !self.has_space(needed) {
            return false;
        }
        if bridge {
            let last = self.vertices[self.vertices.len() - 1];
            self.vertices.push(last);
            self.vertices.push(quad[0]);
        }
        self.vertices.extend_from_slice(&quad);
        true
    }

    /// Submits `[flushed_up_to, write_head)` as one draw, if non-empty.
    pub fn flush<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B) {
        let head = self.write_head();
        if head == self.flushed_up_to {
            return;
        }
        let first = self.flushed_up_to;
        gpu.draw_arrays(self.state.topology, first as u32, &self.vertices[first..head]);
        self.flushed_up_to = head;
    }

    /// Rewinds both cursors to zero. Only valid at a frame boundary, after the
    /// previous frame's ranges were submitted.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.flushed_up_to = 0;
    }

    // ── flush-then-mutate setters ─────────────────────────────────────────

    pub fn set_topology<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, topology: Topology) {
        if self.state.topology != topology {
            self.flush(gpu);
            self.state.topology = topology;
        }
    }

    /// Binds `texture` unless it already is. Returns whether a bind happened.
    pub fn bind_texture<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, texture: GpuTexture) -> bool {
        if self.state.texture == Some(texture) {
            return false;
        }
        self.flush(gpu);
        gpu.bind_texture(texture);
        self.state.texture = Some(texture);
        true
    }

    /// Switches the combiner.
    ///
    /// For color modes a different `color` is a state change too. `Off` only
    /// records the mode and leaves the backend combiner as it is.
    pub fn set_blend_mode<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, mode: BlendMode, color: Color) {
        let changed =
            self.state.mode != mode || (mode.uses_color() && self.state.color != color);
        if !changed {
            return;
        }

        self.flush(gpu);
        self.state.mode = mode;
        if mode == BlendMode::Off {
            return;
        }
        if mode.uses_color() {
            self.state.color = color;
        }
        gpu.set_combiner(mode, self.state.color);
    }

    pub fn set_stencil_test<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, test: StencilTest) {
        if self.state.stencil != test {
            self.flush(gpu);
            gpu.set_stencil_test(test);
            self.state.stencil = test;
        }
    }

    pub fn set_alpha_test<B: GpuBackend + ?Sized>(&mut self, gpu: &mut B, test: AlphaTest) {
        if self.state.alpha != test {
            self.flush(gpu);
            gpu.set_alpha_test(test);
            self.state.alpha = test;
        }
    }

    /// Forgets the bound texture if it is `texture`.
    pub(crate) fn forget_texture(&mut self, texture: GpuTexture) {
        if self.state.texture == Some(texture) {
            self.state.texture = None;
        }
    }
}
