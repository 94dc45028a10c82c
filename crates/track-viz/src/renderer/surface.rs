//! [`Surface`] backed by a nannou [`Draw`].

use nannou::prelude::*;
use track_viz_core::{Color, Point, Surface};

fn vec(p: Point) -> Vec2 {
    pt2(p.x, p.y)
}

/// Forwards engine drawing calls to nannou.
pub struct NannouSurface<'a> {
    draw: &'a Draw,
    fade: Option<f32>,
}

impl<'a> NannouSurface<'a> {
    pub fn new(draw: &'a Draw) -> Self {
        Self { draw, fade: None }
    }

    /// Retain factor requested this frame, if any.
    pub fn fade_requested(&self) -> Option<f32> {
        self.fade
    }
}

impl Surface for NannouSurface<'_> {
    fn background(&mut self, c: Color) {
        self.draw.background().rgba(c.r, c.g, c.b, c.a);
    }

    fn line(&mut self, start: Point, end: Point, weight: f32, c: Color) {
        self.draw
            .line()
            .start(vec(start))
            .end(vec(end))
            .weight(weight)
            .rgba(c.r, c.g, c.b, c.a);
    }

    fn polygon(&mut self, points: &[Point], c: Color) {
        if points.len() < 3 {
            return;
        }
        self.draw
            .polygon()
            .points(points.iter().copied().map(vec))
            .rgba(c.r, c.g, c.b, c.a);
    }

    fn rect(&mut self, center: Point, w: f32, h: f32, c: Color) {
        self.draw
            .rect()
            .x_y(center.x, center.y)
            .w_h(w, h)
            .rgba(c.r, c.g, c.b, c.a);
    }

    fn circle(&mut self, center: Point, radius: f32, c: Color) {
        self.draw
            .ellipse()
            .x_y(center.x, center.y)
            .radius(radius)
            .rgba(c.r, c.g, c.b, c.a);
    }

    fn ring(&mut self, center: Point, radius: f32, weight: f32, c: Color) {
        self.draw
            .ellipse()
            .x_y(center.x, center.y)
            .radius(radius)
            .no_fill()
            .stroke_weight(weight)
            .stroke(rgba(c.r, c.g, c.b, c.a));
    }

    fn text(&mut self, text: &str, center: Point, size: u32, c: Color) {
        self.draw
            .text(text)
            .x_y(center.x, center.y)
            .font_size(size)
            .no_line_wrap()
            .rgba(c.r, c.g, c.b, c.a);
    }

    fn fade(&mut self, retain: f32) {
        self.fade = Some(retain);
    }
}
