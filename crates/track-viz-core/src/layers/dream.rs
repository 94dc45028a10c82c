//! Dream variants of the radial and bar layers.
//!
//! Slower, larger and softer than the defaults. They draw onto the trail
//! surface, which keeps a faded copy of previous frames, so their motion
//! smears into long trails.

use std::f32::consts::TAU;

use super::radial::{extent, polar};
use super::{FrameContext, Layer, Pass};
use crate::audio::NUM_BARS;
use crate::draw::{Color, Surface};
use crate::geometry::pt;

/// Per-frame (at 60 Hz) weight kept from the previous smoothed level
const SMOOTHING: f32 = 0.88;

/// Exponential smoothing that behaves the same at any frame rate.
fn smooth(levels: &mut [f32; NUM_BARS], ctx: &FrameContext) {
    let dt = if ctx.dt.is_finite() { ctx.dt.max(0.0) } else { 0.0 };
    let keep = SMOOTHING.powf(dt * 60.0);
    for (i, level) in levels.iter_mut().enumerate() {
        *level = *level * keep + ctx.spectrum.get(i) * (1.0 - keep);
    }
}

pub struct DreamRadial {
    levels: [f32; NUM_BARS],
}

impl Default for DreamRadial {
    fn default() -> Self {
        Self::new()
    }
}

impl DreamRadial {
    pub fn new() -> Self {
        Self {
            levels: [0.0; NUM_BARS],
        }
    }
}

impl Layer for DreamRadial {
    fn name(&self) -> &'static str {
        "dream_radial"
    }

    fn pass(&self) -> Pass {
        Pass::Trail
    }

    fn update(&mut self, ctx: &FrameContext) {
        smooth(&mut self.levels, ctx);
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let Some(extent) = extent(ctx) else {
            return;
        };
        let center = ctx.bounds.center();
        let clock = ctx.clock;
        let inner = extent * 0.16;
        let max_len = extent * 0.3;

        for (i, &level) in self.levels.iter().enumerate() {
            let angle = i as f32 / NUM_BARS as f32 * TAU + clock * 0.05;
            let sway = 0.9 + 0.1 * (clock * 0.7 + i as f32 * 0.15).sin();
            let len = (6.0 + level * max_len) * sway;
            let color = Color::hsv(200.0 + i as f32 * 1.2 + clock * 8.0, 0.45, 0.6 + 0.4 * level)
                .with_alpha(0.45);
            surface.line(
                polar(center, angle, inner),
                polar(center, angle, inner + len),
                3.5,
                color,
            );
        }

        let mean = self.levels.iter().sum::<f32>() / NUM_BARS as f32;
        let halo = inner * (0.7 + 0.3 * mean + 0.05 * (clock * 0.8).sin());
        surface.ring(center, halo, 4.0, Color::hsv(clock * 10.0, 0.35, 1.0).with_alpha(0.35));
    }
}

pub struct DreamBars {
    levels: [f32; NUM_BARS],
}

impl Default for DreamBars {
    fn default() -> Self {
        Self::new()
    }
}

impl DreamBars {
    pub fn new() -> Self {
        Self {
            levels: [0.0; NUM_BARS],
        }
    }
}

impl Layer for DreamBars {
    fn name(&self) -> &'static str {
        "dream_bars"
    }

    fn pass(&self) -> Pass {
        Pass::Trail
    }

    fn update(&mut self, ctx: &FrameContext) {
        smooth(&mut self.levels, ctx);
    }

    /// Bars mirrored above and below the horizontal centre line, swaying slowly.
    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let b = ctx.bounds;
        if extent(ctx).is_none() {
            return;
        }
        let slot = b.w * 0.8 / NUM_BARS as f32;
        if slot < 1.0 {
            return;
        }

        let sway = (ctx.clock * 0.5).sin() * b.w * 0.02;
        let left = b.x - b.w * 0.4 + sway;
        let max_half = b.h * 0.4;

        for (i, &level) in self.levels.iter().enumerate() {
            let x = left + slot * (i as f32 + 0.5);
            let half = (level * max_half).max(0.5);
            let color = Color::hsv(280.0 - i as f32 * 1.5 + ctx.clock * 6.0, 0.4, 0.9)
                .with_alpha(0.3);
            surface.rect(pt(x, b.y), slot * 0.7, half * 2.0, color);
        }
    }
}
