//! Ball simulation and the procedural sprite sheet.

use tessera_engine::coords::Rect;
use tessera_engine::device::ScreenTarget;

/// Edge of one ball cell in the sheet.
pub const BALL_SIZE: f32 = 32.0;

/// The sheet holds 2x2 cells.
pub const SHEET_SIZE: u32 = 64;

const BOUND_X: f32 = ScreenTarget::TOP_WIDTH as f32 - BALL_SIZE;
const BOUND_Y: f32 = ScreenTarget::HEIGHT as f32 - BALL_SIZE;

/// Small LCG so the demo does not need an RNG crate. Same constants as the
/// classic C library `rand`.
#[derive(Debug, Clone)]
pub struct Lcg(u32);

impl Lcg {
    pub const MAX: u32 = 0x7FFF;

    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    /// Seeds from the wall clock.
    pub fn from_time() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32 ^ d.subsec_nanos())
            .unwrap_or(1);
        Self::new(seed)
    }

    /// Next value in `0..=MAX`.
    pub fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (self.0 >> 16) & Self::MAX
    }

    /// Uniform in `[lo, hi]`.
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next() as f32 / Self::MAX as f32
    }
}

/// One bouncing ball.
#[derive(Debug, Clone)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    /// Degrees.
    pub angle: f32,
    /// Outline color, packed RGBA.
    pub color: u32,
    /// Sheet cell, `0..4`.
    pub id: u32,
}

impl Ball {
    pub fn random(rng: &mut Lcg) -> Self {
        let x = (rng.next() % BOUND_X as u32) as f32;
        let y = (rng.next() % BOUND_Y as u32) as f32;
        let dx = rng.range_f32(-2.0, 2.0);
        let dy = rng.range_f32(-2.0, 2.0);
        let angle = (rng.next() % 360) as f32;
        let [r, g, b] = [rng.next() % 0xFF, rng.next() % 0xFF, rng.next() % 0xFF];
        let color = r | g << 8 | b << 16 | 0xFF << 24;
        let id = rng.next() & 3;
        Self { x, y, dx, dy, angle, color, id }
    }

    /// Advances one step, bouncing off the top screen edges.
    pub fn step(&mut self) {
        self.x += self.dx;
        self.y += self.dy;

        if self.x < 1.0 || self.x > BOUND_X {
            self.dx = -self.dx;
        }
        if self.y < 1.0 || self.y > BOUND_Y {
            self.dy = -self.dy;
        }

        self.angle = (self.angle + 1.0) % 360.0;
    }

    /// Pixel rectangle of this ball's cell in the sheet.
    pub fn cell(&self) -> Rect {
        cell_rect(self.id)
    }
}

pub fn cell_rect(id: u32) -> Rect {
    Rect::new((id / 2) as f32 * BALL_SIZE, (id % 2) as f32 * BALL_SIZE, BALL_SIZE, BALL_SIZE)
}

/// RGBA8 pixels of a 64x64 sheet with four shaded balls.
pub fn ball_sheet() -> Vec<u8> {
    const TINTS: [[f32; 3]; 4] = [
        [0.95, 0.30, 0.25],
        [0.30, 0.55, 0.95],
        [0.35, 0.85, 0.40],
        [0.95, 0.80, 0.25],
    ];

    let side = SHEET_SIZE as usize;
    let cell = BALL_SIZE as usize;
    let radius = BALL_SIZE / 2.0 - 1.0;
    let mut pixels = vec![0u8; side * side * 4];

    for (id, tint) in TINTS.iter().enumerate() {
        let origin = cell_rect(id as u32).origin;
        let (ox, oy) = (origin.x as usize, origin.y as usize);

        for cy in 0..cell {
            for cx in 0..cell {
                let fx = cx as f32 + 0.5 - BALL_SIZE / 2.0;
                let fy = cy as f32 + 0.5 - BALL_SIZE / 2.0;
                let d = (fx * fx + fy * fy).sqrt();
                if d > radius {
                    continue;
                }

                // light from the top-left
                let shade = (1.0 - ((fx + 6.0).powi(2) + (fy + 6.0).powi(2)).sqrt() / (2.0 * radius)).clamp(0.25, 1.0);
                let alpha = (radius - d).clamp(0.0, 1.0);

                let i = ((oy + cy) * side + ox + cx) * 4;
                pixels[i] = (tint[0] * shade * 255.0) as u8;
                pixels[i + 1] = (tint[1] * shade * 255.0) as u8;
                pixels[i + 2] = (tint[2] * shade * 255.0) as u8;
                pixels[i + 3] = (alpha * 255.0) as u8;
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_is_deterministic_and_bounded() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..1000 {
            let v = a.next();
            assert_eq!(v, b.next());
            assert!(v <= Lcg::MAX);
        }
    }

    #[test]
    fn random_balls_start_on_screen() {
        let mut rng = Lcg::new(42);
        for _ in 0..500 {
            let b = Ball::random(&mut rng);
            assert!(b.x >= 0.0 && b.x < BOUND_X);
            assert!(b.y >= 0.0 && b.y < BOUND_Y);
            assert!((-2.0..=2.0).contains(&b.dx));
            assert!(b.id < 4);
            assert_eq!(b.color >> 24, 0xFF);
        }
    }

    #[test]
    fn balls_bounce_off_the_edges() {
        let mut b = Ball { x: BOUND_X, y: 10.0, dx: 1.5, dy: 0.0, angle: 359.0, color: 0, id: 0 };
        b.step();
        assert_eq!(b.dx, -1.5);
        assert_eq!(b.angle, 0.0);
        b.step();
        assert_eq!(b.x, BOUND_X);
    }

    #[test]
    fn cells_tile_the_sheet() {
        assert_eq!(cell_rect(0), Rect::new(0.0, 0.0, 32.0, 32.0));
        assert_eq!(cell_rect(1), Rect::new(0.0, 32.0, 32.0, 32.0));
        assert_eq!(cell_rect(2), Rect::new(32.0, 0.0, 32.0, 32.0));
        assert_eq!(cell_rect(3), Rect::new(32.0, 32.0, 32.0, 32.0));
    }

    #[test]
    fn sheet_has_opaque_centers_and_clear_corners() {
        let px = ball_sheet();
        assert_eq!(px.len(), 64 * 64 * 4);
        for id in 0..4 {
            let o = cell_rect(id).origin;
            let center = ((o.y as usize + 16) * 64 + o.x as usize + 16) * 4;
            let corner = (o.y as usize * 64 + o.x as usize) * 4;
            assert_eq!(px[center + 3], 0xFF);
            assert_eq!(px[corner + 3], 0);
        }
    }
}
