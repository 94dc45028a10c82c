//! Radial spectrum: spokes around a pulsing disc with orbiting satellites.

use std::f32::consts::TAU;

use super::{FrameContext, Layer};
use crate::audio::NUM_BARS;
use crate::draw::{Color, Surface};
use crate::geometry::{pt, Point};

/// Below this shorter-side size the layout collapses
pub(crate) const MIN_EXTENT: f32 = 40.0;
const SATELLITES: usize = 12;

pub(crate) fn polar(center: Point, angle: f32, radius: f32) -> Point {
    pt(center.x + angle.cos() * radius, center.y + angle.sin() * radius)
}

/// Shorter side of the surface, or None when too small to draw in.
pub(crate) fn extent(ctx: &FrameContext) -> Option<f32> {
    let b = ctx.bounds;
    if b.is_degenerate() || !ctx.clock.is_finite() {
        return None;
    }
    let extent = b.w.min(b.h);
    (extent >= MIN_EXTENT).then_some(extent)
}

#[derive(Default)]
pub struct RadialSpectrum;

impl RadialSpectrum {
    pub fn new() -> Self {
        Self
    }

    /// Spoke length for bin `i`: grows with magnitude, breathes with time.
    fn spoke_len(mag: f32, i: usize, clock: f32, max_len: f32) -> f32 {
        let osc = 0.85 + 0.15 * (clock * 3.0 + i as f32 * 0.3).sin();
        (4.0 + mag * max_len) * osc
    }
}

impl Layer for RadialSpectrum {
    fn name(&self) -> &'static str {
        "radial"
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let Some(extent) = extent(ctx) else {
            return;
        };
        let center = ctx.bounds.center();
        let clock = ctx.clock;
        let inner = extent * 0.12;
        let max_len = extent * 0.26;

        for i in 0..NUM_BARS {
            let mag = ctx.spectrum.get(i);
            let angle = i as f32 / NUM_BARS as f32 * TAU + clock * 0.2;
            let len = Self::spoke_len(mag, i, clock, max_len);
            let color = Color::hsv(
                i as f32 / NUM_BARS as f32 * 360.0 + clock * 30.0,
                0.8,
                0.5 + 0.5 * mag,
            );
            surface.line(
                polar(center, angle, inner),
                polar(center, angle, inner + len),
                2.0,
                color,
            );
        }

        // Disc radius follows total spectral energy
        let energy = ctx.spectrum.mean();
        let pulse = (clock * 4.0 + ctx.spectrum.sum() * 0.05).sin();
        let disc = inner * (0.55 + 0.35 * energy + 0.08 * pulse);
        surface.circle(center, disc, Color::hsv(clock * 25.0, 0.6, 0.35 + 0.5 * energy));
        surface.ring(center, inner, 1.5, Color::WHITE.with_alpha(0.25 + 0.5 * energy));

        for k in 0..SATELLITES {
            let mag = ctx.spectrum.get(k * NUM_BARS / SATELLITES);
            let angle = k as f32 / SATELLITES as f32 * TAU - clock * 0.6;
            let orbit = inner + max_len * (0.6 + 0.4 * mag) + 6.0 * (clock * 2.0 + k as f32).sin();
            let color = Color::hsv(k as f32 * 30.0 + clock * 40.0, 0.5, 1.0).with_alpha(0.8);
            surface.circle(polar(center, angle, orbit), 3.0 + 4.0 * mag, color);
        }
    }
}
