use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit, ScreenTarget, SurfaceErrorAction, WgpuBackend};
use crate::input::platform::translate_window_event;
use crate::input::{InputFrame, InputState};
use crate::render::{Renderer, RendererConfig};
use crate::text::{FontConfig, FontdueSystemFont, SystemFont};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial window size as a multiple of the native screen layout
    /// (400x480, or 800x480 with stereo on).
    pub window_scale: f64,
    pub gpu: GpuInit,
    pub renderer: RendererConfig,
    pub font: FontConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tessera".to_string(),
            window_scale: 2.0,
            gpu: GpuInit::default(),
            renderer: RendererConfig::default(),
            font: FontConfig::default(),
        }
    }
}

impl RuntimeConfig {
    fn initial_size(&self) -> LogicalSize<f64> {
        let columns = if self.renderer.stereo { 2.0 } else { 1.0 };
        LogicalSize::new(
            columns * ScreenTarget::TOP_WIDTH as f64 * self.window_scale,
            2.0 * ScreenTarget::HEIGHT as f64 * self.window_scale,
        )
    }
}

/// Runtime commands issued by the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, builds the renderer with the system font and runs
    /// `app` until it exits or the window closes.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.startup_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    /// `None` once shut down.
    #[borrows(window)]
    #[covariant]
    renderer: Option<Renderer<WgpuBackend<'this>>>,
}

fn build_renderer<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    font: Box<dyn SystemFont>,
    config: RendererConfig,
) -> Result<Option<Renderer<WgpuBackend<'w>>>> {
    let gpu = pollster::block_on(Gpu::new(window, gpu_init)).context("GPU initialization failed")?;
    let backend = WgpuBackend::new(gpu)?;
    Ok(Some(Renderer::new(backend, font, config)?))
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    startup_error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        Self { config, app, entry: None, exit_requested: false, startup_error: None }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size());

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let font = FontdueSystemFont::from_system(&self.config.font).context("failed to load a system font")?;
        let gpu_init = self.config.gpu.clone();
        let renderer_config = self.config.renderer.clone();

        let mut entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            window,
            renderer_builder: |w| build_renderer(w, gpu_init, Box::new(font), renderer_config),
        }
        .try_build()?;

        let app = &mut self.app;
        entry.with_renderer_mut(|slot| match slot {
            Some(renderer) => app.on_start(renderer),
            None => Ok(()),
        })?;

        entry.with_window(|w| w.request_redraw());
        self.entry = Some(entry);
        Ok(())
    }

    /// Lets the app release its resources, then tears the renderer down.
    fn shutdown(&mut self) {
        let Some(mut entry) = self.entry.take() else { return };
        let app = &mut self.app;
        entry.with_renderer_mut(|slot| {
            if let Some(mut renderer) = slot.take() {
                app.on_shutdown(&mut renderer);
                drop(renderer.shutdown());
            }
        });
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, ctx: RuntimeCtx) {
        for cmd in ctx.commands {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = &self.entry {
                        entry.with_window(|w| w.set_title(&title));
                    }
                }
                Command::Exit => self.request_exit(event_loop),
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else { return };
        let app = &mut self.app;

        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;
        let mut fatal = false;

        entry.with_mut(|fields| {
            let Some(renderer) = fields.renderer.as_mut() else { return };
            let time = fields.clock.tick();

            fields.window.pre_present_notify();
            {
                let mut ctx = FrameCtx {
                    window: fields.window,
                    renderer,
                    input: fields.input_state,
                    input_frame: fields.input_frame,
                    time,
                    runtime: &mut runtime_ctx,
                };
                control = app.on_frame(&mut ctx);
            }

            if renderer.in_frame() {
                log::warn!("frame left open by the app; closing it");
                renderer.frame_end();
            }
            fatal = renderer.backend_mut().take_surface_status() == Some(SurfaceErrorAction::Fatal);

            fields.input_frame.clear();
        });

        if fatal {
            log::error!("surface lost for good; exiting");
            runtime_ctx.exit();
        }
        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(event_loop, runtime_ctx);
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("startup failed: {e:#}");
            self.startup_error = Some(e);
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // continuous redraw
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(entry) = self.entry.as_mut() else { return };
        if entry.borrow_window().id() != window_id {
            return;
        }

        entry.with_mut(|fields| {
            let renderer = fields.renderer.as_ref();
            let ev = translate_window_event(&event, |x, y| {
                renderer.and_then(|r| r.backend().bottom_screen_point(x, y))
            });
            if let Some(ev) = ev {
                fields.input_state.apply_event(fields.input_frame, ev);
            }
        });

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => {
                entry.with_renderer_mut(|slot| {
                    if let Some(r) = slot {
                        r.backend_mut().resize(*new_size);
                    }
                });
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_renderer_mut(|slot| {
                    if let Some(r) = slot {
                        r.backend_mut().resize(new_size);
                    }
                });
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
