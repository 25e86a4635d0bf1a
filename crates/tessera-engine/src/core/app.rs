use anyhow::Result;
use winit::event::WindowEvent;

use crate::device::WgpuBackend;
use crate::render::Renderer;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once the renderer exists, before the first frame. Load
    /// textures and create sprites here.
    fn on_start(&mut self, renderer: &mut Renderer<WgpuBackend<'_>>) -> Result<()> {
        let _ = renderer;
        Ok(())
    }

    /// Called for every window event, after input translation.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per frame. The renderer is outside a frame on entry and
    /// must be left that way.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the renderer shuts down; destroy sprites here so
    /// their textures can be freed.
    fn on_shutdown(&mut self, renderer: &mut Renderer<WgpuBackend<'_>>) {
        let _ = renderer;
    }
}
