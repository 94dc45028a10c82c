//! Animated gradient backdrop with drifting glow particles.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameContext, Layer};
use crate::draw::{Color, Surface};
use crate::geometry::pt;

/// Height of one gradient band in pixels
const ROW_STEP: f32 = 4.0;
/// Base clear color, a deep navy
const BASE: Color = Color::rgb(10.0 / 255.0, 10.0 / 255.0, 30.0 / 255.0);
/// Fraction of the surface treated as the respawn strip on each edge
const RESPAWN_STRIP: f32 = 0.1;
/// Glow rings per particle
const GLOW_STEPS: usize = 3;

#[derive(Clone, Debug, PartialEq)]
struct Particle {
    /// Position in normalized surface coordinates (0-1 on both axes)
    u: f32,
    v: f32,
    /// Velocity in normalized units per second
    du: f32,
    dv: f32,
    radius: f32,
    hue: f32,
}

pub struct Background {
    particles: Vec<Particle>,
    rng: StdRng,
    /// Spectrum mean, smoothed so particles swell rather than flicker
    level: f32,
}

impl Background {
    pub fn new(count: usize) -> Self {
        Self::from_rng(count, StdRng::from_rng(&mut rand::rng()))
    }

    /// Reproducible particle layout.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self::from_rng(count, StdRng::seed_from_u64(seed))
    }

    fn from_rng(count: usize, mut rng: StdRng) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                u: rng.random_range(0.0..1.0),
                v: rng.random_range(0.0..1.0),
                du: rng.random_range(-0.04..0.04),
                dv: rng.random_range(-0.03..0.03),
                radius: rng.random_range(2.0..6.0),
                hue: rng.random_range(0.0..360.0),
            })
            .collect();

        Self {
            particles,
            rng,
            level: 0.0,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Respawn in the strip along the edge opposite to the one crossed.
    /// Each axis wraps on its own, so a corner exit lands in the opposite corner.
    fn wrap(rng: &mut StdRng, p: &mut Particle) {
        let u_out = !(0.0..=1.0).contains(&p.u);
        let v_out = !(0.0..=1.0).contains(&p.v);
        if u_out {
            let strip = rng.random_range(0.0..RESPAWN_STRIP);
            p.u = if p.u > 1.0 { strip } else { 1.0 - strip };
            if !v_out {
                p.v = rng.random_range(0.0..1.0);
            }
        }
        if v_out {
            let strip = rng.random_range(0.0..RESPAWN_STRIP);
            p.v = if p.v > 1.0 { strip } else { 1.0 - strip };
            if !u_out {
                p.u = rng.random_range(0.0..1.0);
            }
        }
    }
}

impl Layer for Background {
    fn name(&self) -> &'static str {
        "background"
    }

    fn update(&mut self, ctx: &FrameContext) {
        let dt = if ctx.dt.is_finite() { ctx.dt.max(0.0) } else { 0.0 };
        self.level = self.level * 0.9 + ctx.spectrum.mean() * 0.1;

        let speed = 1.0 + self.level * 3.0;
        for p in self.particles.iter_mut() {
            p.u += p.du * speed * dt;
            p.v += p.dv * speed * dt;
            Self::wrap(&mut self.rng, p);
        }
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        surface.background(BASE);

        let b = ctx.bounds;
        if b.is_degenerate() || !ctx.clock.is_finite() {
            return;
        }

        // Row gradient, hue rolling slowly with the clock
        let rows = (b.h / ROW_STEP).ceil() as usize;
        let band_h = b.h / rows as f32;
        for row in 0..rows {
            let t = row as f32 / rows as f32;
            let hue = 220.0 + ctx.clock * 12.0 + t * 70.0;
            let color = Color::hsv(hue, 0.55, 0.06 + 0.12 * t);
            let y = b.bottom() + band_h * (row as f32 + 0.5);
            surface.rect(pt(b.x, y), b.w, band_h + 0.5, color);
        }

        // Soft edge: a few nested discs with falling alpha
        for p in &self.particles {
            let center = pt(b.left() + p.u * b.w, b.bottom() + p.v * b.h);
            let radius = p.radius * (1.0 + self.level * 2.0);
            let color = Color::hsv(p.hue + ctx.clock * 20.0, 0.6, 1.0);
            for step in 0..GLOW_STEPS {
                let k = (GLOW_STEPS - step) as f32;
                surface.circle(center, radius * k, color.with_alpha(0.08 * (step + 1) as f32));
            }
        }
    }
}
