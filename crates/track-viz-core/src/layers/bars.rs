//! Extruded spectrum bars with a lit top face and a floor reflection.

use super::{FrameContext, Layer};
use crate::audio::NUM_BARS;
use crate::draw::{Color, Surface};
use crate::geometry::pt;

/// Minimum horizontal room per bar, in pixels
const MIN_SLOT: f32 = 2.0;
/// Bar row spans this fraction of the surface width
const SPAN: f32 = 0.9;
const REFLECTION: f32 = 0.35;

/// Cyan at rest, shifting toward green-white as the bar grows.
pub fn bar_color(mag: f32) -> Color {
    let m = mag.clamp(0.0, 1.0);
    Color::rgb(100.0 / 255.0, (200.0 + 55.0 * m) / 255.0, (255.0 - 200.0 * m) / 255.0)
}

/// Width multiplier for bar `i`: full at the centre, narrower toward the edges.
pub fn taper(i: usize) -> f32 {
    let mid = (NUM_BARS - 1) as f32 / 2.0;
    let dist = (i as f32 - mid).abs() / mid;
    0.85 - 0.45 * dist
}

#[derive(Default)]
pub struct Bars3d;

impl Bars3d {
    pub fn new() -> Self {
        Self
    }
}

impl Layer for Bars3d {
    fn name(&self) -> &'static str {
        "bars_3d"
    }

    fn draw(&self, ctx: &FrameContext, surface: &mut dyn Surface) {
        let b = ctx.bounds;
        if b.is_degenerate() || b.h < super::radial::MIN_EXTENT {
            return;
        }
        let slot = b.w * SPAN / NUM_BARS as f32;
        if slot < MIN_SLOT {
            return;
        }

        let left = b.x - b.w * SPAN / 2.0;
        let base_y = b.bottom() + b.h * 0.22;
        let max_h = b.h * 0.42;

        for i in 0..NUM_BARS {
            let mag = ctx.spectrum.get(i);
            let x = left + slot * (i as f32 + 0.5);
            let width = slot * taper(i);
            let height = (mag * max_h).max(1.0);
            let depth = width * 0.4;
            let top = base_y + height;
            let color = bar_color(mag);

            // Reflection first, then the side, front and top faces
            let rh = height * REFLECTION;
            surface.rect(pt(x, base_y - rh / 2.0), width, rh, color.with_alpha(0.18));

            let (l, r) = (x - width / 2.0, x + width / 2.0);
            surface.polygon(
                &[
                    pt(r, base_y),
                    pt(r + depth, base_y + depth * 0.6),
                    pt(r + depth, top + depth * 0.6),
                    pt(r, top),
                ],
                color.darken(0.4),
            );
            surface.rect(pt(x, base_y + height / 2.0), width, height, color);
            surface.polygon(
                &[
                    pt(l, top),
                    pt(r, top),
                    pt(r + depth, top + depth * 0.6),
                    pt(l + depth, top + depth * 0.6),
                ],
                color.lighten(0.35),
            );
        }
    }
}
