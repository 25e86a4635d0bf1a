//! Bouncing ball sprites on the top screen, controls on the bottom screen.
//!
//! Up/Down add or remove sprites, Start quits. Click the bottom-screen
//! buttons to toggle outlines, rotation and movement.

mod balls;

use anyhow::Result;

use tessera_engine::coords::{Rect, Vec2};
use tessera_engine::core::{App, AppControl, FrameCtx};
use tessera_engine::device::WgpuBackend;
use tessera_engine::input::Button;
use tessera_engine::logging::{init_logging, LoggingConfig};
use tessera_engine::paint::Color;
use tessera_engine::render::{Renderer, Screen, Side};
use tessera_engine::sprite::Sprite;
use tessera_engine::window::{Runtime, RuntimeConfig};

use balls::{ball_sheet, Ball, Lcg, SHEET_SIZE};

const MAX_SPRITES: usize = 2048;
const INITIAL_SPRITES: usize = 256;

const TEXT_SCALE: f32 = 0.5;
const OUTLINE_THICKNESS: f32 = 0.15;

const BUTTON_ON: Color = Color::rgba(0, 0xFF, 0, 0xFF);
const BUTTON_OFF: Color = Color::rgba(0xFE, 0xFE, 0xFE, 0xFF);
const LABEL: Color = Color::rgba(0, 0, 0, 0xFF);
const INFO: Color = Color::rgba(0xFE, 0xFE, 0xFE, 0xFF);
const PANEL: Color = Color::rgba(0x20, 0x20, 0x20, 0xFF);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Toggle {
    Outline,
    Rotating,
    Moving,
}

impl Toggle {
    const ALL: [Toggle; 3] = [Toggle::Outline, Toggle::Rotating, Toggle::Moving];

    fn button(self) -> Rect {
        let x = match self {
            Toggle::Outline => 20.0,
            Toggle::Rotating => 120.0,
            Toggle::Moving => 220.0,
        };
        Rect::new(x, 160.0, 80.0, 50.0)
    }

    fn label(self) -> (f32, &'static str) {
        match self {
            Toggle::Outline => (33.0, "Outline"),
            Toggle::Rotating => (135.0, "Rotating"),
            Toggle::Moving => (237.0, "Moving"),
        }
    }
}

struct BallsApp {
    balls: Vec<Ball>,
    sprites: Vec<Sprite>,
    /// Rotation each sprite currently carries, in degrees.
    applied_angle: Vec<f32>,
    n: usize,

    outline: bool,
    rotating: bool,
    moving: bool,
}

impl BallsApp {
    fn new() -> Self {
        let mut rng = Lcg::from_time();
        let balls = (0..MAX_SPRITES).map(|_| Ball::random(&mut rng)).collect();
        Self {
            balls,
            sprites: Vec::with_capacity(MAX_SPRITES),
            applied_angle: Vec::with_capacity(MAX_SPRITES),
            n: INITIAL_SPRITES,
            outline: false,
            rotating: false,
            moving: false,
        }
    }

    fn flag(&mut self, toggle: Toggle) -> &mut bool {
        match toggle {
            Toggle::Outline => &mut self.outline,
            Toggle::Rotating => &mut self.rotating,
            Toggle::Moving => &mut self.moving,
        }
    }

    fn handle_input(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.was_pressed(Button::Start) {
            return AppControl::Exit;
        }

        if ctx.input.is_held(Button::Up) && self.n < MAX_SPRITES {
            self.n += 1;
        } else if ctx.input.is_held(Button::Down) && self.n > 1 {
            self.n -= 1;
        }

        if let Some((x, y)) = ctx.input_frame.touch_began {
            let p = Vec2::new(x, y);
            if let Some(toggle) = Toggle::ALL.into_iter().find(|t| t.button().contains(p)) {
                let flag = self.flag(toggle);
                *flag = !*flag;
                log::debug!("{toggle:?} -> {}", *flag);
            }
        }
        AppControl::Continue
    }

    /// Moves the first `n` sprites onto their balls' state.
    fn sync_sprites(&mut self) {
        for i in 0..self.n {
            let ball = &self.balls[i];
            let sprite = &mut self.sprites[i];

            let at = sprite.origin();
            sprite.move_by(ball.x - at.x, ball.y - at.y);

            let target = if self.rotating { ball.angle } else { 0.0 };
            let delta = target - self.applied_angle[i];
            if delta != 0.0 {
                sprite.rotate(delta);
                self.applied_angle[i] = target;
            }

            sprite.update();
        }
    }

    fn draw_balls(&self, renderer: &mut Renderer<WgpuBackend<'_>>) {
        let visible = &self.sprites[..self.n];
        if !self.outline {
            visible.iter().for_each(|s| renderer.draw_sprite(s));
            return;
        }

        renderer.outline_begin();
        visible.iter().for_each(|s| renderer.draw_sprite(s));
        // one outline color per pass; use the first ball's
        renderer.outline_apply(Color(self.balls[0].color), OUTLINE_THICKNESS);
        visible.iter().for_each(|s| renderer.draw_sprite(s));
        renderer.outline_end();
    }

    fn draw_panel(&self, renderer: &mut Renderer<WgpuBackend<'_>>, fps: f32) {
        renderer.draw_rectangle(0.0, 0.0, Screen::Bottom.width(), Screen::Bottom.height(), PANEL);

        for toggle in Toggle::ALL {
            let on = match toggle {
                Toggle::Outline => self.outline,
                Toggle::Rotating => self.rotating,
                Toggle::Moving => self.moving,
            };
            let b = toggle.button();
            let fill = if on { BUTTON_ON } else { BUTTON_OFF };
            renderer.draw_rectangle(b.origin.x, b.origin.y, b.size.x, b.size.y, fill);

            let (x, text) = toggle.label();
            renderer.draw_text(x, 178.0, TEXT_SCALE, TEXT_SCALE, LABEL, text);
        }

        let h = renderer.text_height("a", TEXT_SCALE, TEXT_SCALE);
        let s = TEXT_SCALE;
        renderer.draw_text_fmt(
            2.0,
            2.0,
            s,
            s,
            INFO,
            format_args!("Rendering {}/{} sprites", self.n, MAX_SPRITES),
        );
        renderer.draw_text(2.0, 2.0 + h, s, s, INFO, "FPS:");
        renderer.draw_text(2.0, 2.0 + h * 2.0, s, s, INFO, "Batch:");
        renderer.draw_text_fmt(60.0, 2.0 + h, s, s, INFO, format_args!("{fps:.1}"));

        let batch = renderer.batch();
        let usage = batch.write_head() as f32 * 100.0 / batch.capacity() as f32;
        renderer.draw_text_fmt(60.0, 2.0 + h * 2.0, s, s, INFO, format_args!("{usage:2.2}%"));

        renderer.draw_text(2.0, 2.0 + h * 4.0, s, s, INFO, "Press UP/DOWN to add/remove sprites");
    }
}

impl App for BallsApp {
    fn on_start(&mut self, renderer: &mut Renderer<WgpuBackend<'_>>) -> Result<()> {
        let sheet = renderer.try_texture_from_image(SHEET_SIZE, SHEET_SIZE, &ball_sheet())?;
        renderer.set_screen_color(Screen::Top, Color::abgr(255, 10, 10, 10));

        for ball in &self.balls {
            let mut sprite = renderer
                .new_sprite_textured(Vec2::new(ball.x, ball.y), &sheet, ball.cell())
                .ok_or_else(|| anyhow::anyhow!("ball sheet rejected a sprite cell"))?;
            // the last sprite destroyed frees the sheet
            sprite.set_destroy_texture(true);
            self.sprites.push(sprite);
            self.applied_angle.push(0.0);
        }

        log::info!("{} ball sprites ready", self.sprites.len());
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.handle_input(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }

        if self.moving {
            self.balls[..self.n].iter_mut().for_each(Ball::step);
        }
        self.sync_sprites();

        let fps = ctx.time.fps;
        let mut frame = ctx.renderer.frame(Screen::Top, Side::Left);
        self.draw_balls(&mut frame);

        frame.frame_draw_on(Screen::Bottom, Side::Left);
        self.draw_panel(&mut frame, fps);

        AppControl::Continue
    }

    fn on_shutdown(&mut self, renderer: &mut Renderer<WgpuBackend<'_>>) {
        for sprite in self.sprites.drain(..) {
            renderer.destroy_sprite(sprite);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "tessera: ball sprites".to_string(),
        ..RuntimeConfig::default()
    };

    Runtime::run(config, BallsApp::new())
}
